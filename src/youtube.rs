use async_trait::async_trait;
use eyre::Result;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ORIGIN, USER_AGENT};

use crate::captions::{self, CaptionText, LanguagePreference};
use crate::http;

pub const YOUTUBE_ORIGIN: &str = "https://www.youtube.com";

const PLAYER_PATH: &str = "/youtubei/v1/player?prettyPrint=false";

const ANDROID_CLIENT_VERSION: &str = "20.10.38";
const ANDROID_SDK_VERSION: u32 = 30;
const ANDROID_USER_AGENT: &str = "com.google.android.youtube/20.10.38 (Linux; U; Android 11) gzip";

const WEB_CLIENT_VERSION: &str = "2.20241126.01.00";

/// One way of recovering caption text for a video
#[async_trait]
pub trait CaptionStrategy: Send + Sync {
    /// Short identifier used in logs and the diagnostic trail
    fn name(&self) -> &str;

    /// `Ok(None)` means the strategy ran but found nothing usable.
    async fn fetch(&self, video_id: &str) -> Result<Option<CaptionText>>;
}

/// InnerTube client identity to impersonate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InnerTubeClient {
    Android,
    Web,
}

impl InnerTubeClient {
    fn strategy_name(&self) -> &'static str {
        match self {
            InnerTubeClient::Android => "android",
            InnerTubeClient::Web => "web",
        }
    }

    fn request_body(&self, video_id: &str, hl: &str) -> serde_json::Value {
        let client = match self {
            InnerTubeClient::Android => serde_json::json!({
                "clientName": "ANDROID",
                "clientVersion": ANDROID_CLIENT_VERSION,
                "androidSdkVersion": ANDROID_SDK_VERSION,
                "hl": hl,
                "gl": "US"
            }),
            InnerTubeClient::Web => serde_json::json!({
                "clientName": "WEB",
                "clientVersion": WEB_CLIENT_VERSION,
                "hl": hl,
                "gl": "US"
            }),
        };
        serde_json::json!({
            "context": { "client": client },
            "videoId": video_id
        })
    }

    fn headers(&self) -> HeaderMap {
        let (user_agent, client_id, version) = match self {
            InnerTubeClient::Android => (ANDROID_USER_AGENT, "3", ANDROID_CLIENT_VERSION),
            InnerTubeClient::Web => (http::DESKTOP_USER_AGENT, "1", WEB_CLIENT_VERSION),
        };
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
        headers.insert(ORIGIN, HeaderValue::from_static(YOUTUBE_ORIGIN));
        headers.insert(
            HeaderName::from_static("x-youtube-client-name"),
            HeaderValue::from_static(client_id),
        );
        headers.insert(
            HeaderName::from_static("x-youtube-client-version"),
            HeaderValue::from_static(version),
        );
        headers
    }
}

/// Ask the InnerTube player endpoint for caption tracks while posing as a
/// first-party client.
pub struct InnerTubePlayer {
    client: reqwest::Client,
    identity: InnerTubeClient,
    pref: LanguagePreference,
    origin: String,
}

impl InnerTubePlayer {
    pub fn new(client: reqwest::Client, identity: InnerTubeClient, pref: LanguagePreference) -> Self {
        Self {
            client,
            identity,
            pref,
            origin: YOUTUBE_ORIGIN.to_string(),
        }
    }

    /// Point the strategy at another host (scheme + authority, no trailing slash)
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

#[async_trait]
impl CaptionStrategy for InnerTubePlayer {
    fn name(&self) -> &str {
        self.identity.strategy_name()
    }

    async fn fetch(&self, video_id: &str) -> Result<Option<CaptionText>> {
        let body = self.identity.request_body(video_id, &self.pref.primary);
        let url = format!("{}{PLAYER_PATH}", self.origin);
        let resp = http::post_json(&self.client, &url, self.identity.headers(), &body).await?;

        let Some(tracks) = captions::tracks_from_player_response(&resp) else {
            let status = resp
                .pointer("/playabilityStatus/status")
                .and_then(|s| s.as_str())
                .unwrap_or("unknown");
            debug!("{}: no captionTracks in player response (playability={status})", self.name());
            return Ok(None);
        };

        captions::fetch_track_text(&self.client, &tracks, &self.pref).await
    }
}

/// Scrape the public watch page for the embedded `captionTracks` array
pub struct WatchPage {
    client: reqwest::Client,
    pref: LanguagePreference,
    origin: String,
}

impl WatchPage {
    pub fn new(client: reqwest::Client, pref: LanguagePreference) -> Self {
        Self {
            client,
            pref,
            origin: YOUTUBE_ORIGIN.to_string(),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

#[async_trait]
impl CaptionStrategy for WatchPage {
    fn name(&self) -> &str {
        "watch-page"
    }

    async fn fetch(&self, video_id: &str) -> Result<Option<CaptionText>> {
        let url = format!("{}/watch?v={video_id}", self.origin);
        let html = http::get_text(&self.client, &url).await?;

        let Some(tracks) = captions::extract_caption_tracks(&html) else {
            debug!("watch-page: captionTracks not found in {} bytes of markup", html.len());
            return Ok(None);
        };

        captions::fetch_track_text(&self.client, &tracks, &self.pref).await
    }
}

/// Strategies in their default order: ANDROID player, WEB player, watch page
pub fn default_strategies(client: &reqwest::Client, pref: &LanguagePreference) -> Vec<Box<dyn CaptionStrategy>> {
    vec![
        Box::new(InnerTubePlayer::new(client.clone(), InnerTubeClient::Android, pref.clone())),
        Box::new(InnerTubePlayer::new(client.clone(), InnerTubeClient::Web, pref.clone())),
        Box::new(WatchPage::new(client.clone(), pref.clone())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeYouTube, spawn_fake_youtube};

    const JA_XML: &str = r#"<transcript><text start="0" dur="1">こんにちは</text><text start="1" dur="1">世界 &amp;#39;字幕&amp;#39;</text></transcript>"#;
    const EN_XML: &str = r#"<transcript><text start="0" dur="1">hello</text><text start="1" dur="1">world</text></transcript>"#;

    const PLAYER_WITH_TRACKS: &str = r#"{
        "playabilityStatus": {"status": "OK"},
        "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
            {"languageCode": "en", "baseUrl": "{origin}/api/timedtext?lang=en"},
            {"languageCode": "ja", "baseUrl": "{origin}/api/timedtext?lang=ja"}
        ]}}
    }"#;

    fn client() -> reqwest::Client {
        http::build_client(http::DEFAULT_TIMEOUT).unwrap()
    }

    fn player(fake: &FakeYouTube, identity: InnerTubeClient) -> InnerTubePlayer {
        InnerTubePlayer::new(client(), identity, LanguagePreference::default()).with_origin(&fake.origin)
    }

    fn watch_page(fake: &FakeYouTube) -> WatchPage {
        WatchPage::new(client(), LanguagePreference::default()).with_origin(&fake.origin)
    }

    #[tokio::test]
    async fn test_android_player_fetches_preferred_track() {
        let fake = spawn_fake_youtube(Some(PLAYER_WITH_TRACKS), "", &[("ja", JA_XML), ("en", EN_XML)]).await;

        let found = player(&fake, InnerTubeClient::Android).fetch("vid").await.unwrap().unwrap();
        assert_eq!(found.language, "ja");
        assert_eq!(found.text, "こんにちは 世界 '字幕'");

        let requests = fake.player_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["videoId"], "vid");
        assert_eq!(requests[0]["context"]["client"]["clientName"], "ANDROID");
    }

    #[tokio::test]
    async fn test_web_player_without_captions_is_none() {
        let fake = spawn_fake_youtube(
            Some(r#"{"playabilityStatus": {"status": "LOGIN_REQUIRED"}}"#),
            "",
            &[],
        )
        .await;

        let found = player(&fake, InnerTubeClient::Web).fetch("vid").await.unwrap();
        assert!(found.is_none());
        assert_eq!(fake.player_requests.lock().unwrap()[0]["context"]["client"]["clientName"], "WEB");
    }

    #[tokio::test]
    async fn test_player_error_status_is_err() {
        let fake = spawn_fake_youtube(None, "", &[]).await;
        assert!(player(&fake, InnerTubeClient::Android).fetch("vid").await.is_err());
    }

    #[tokio::test]
    async fn test_track_without_base_url_is_none() {
        let fake = spawn_fake_youtube(
            Some(r#"{"captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [{"languageCode": "ja", "baseUrl": ""}]}}}"#),
            "",
            &[("ja", JA_XML)],
        )
        .await;
        assert!(player(&fake, InnerTubeClient::Android).fetch("vid").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_track_without_text_is_none() {
        let fake = spawn_fake_youtube(Some(PLAYER_WITH_TRACKS), "", &[("ja", "<transcript></transcript>")]).await;
        assert!(player(&fake, InnerTubeClient::Android).fetch("vid").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_watch_page_scrapes_embedded_tracks() {
        let page = r#"<html><script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"languageCode":"fr","baseUrl":"{origin}/api/timedtext?lang=fr"},{"languageCode":"en-US","baseUrl":"{origin}/api/timedtext?lang=en"}],"audioTracks":[]}}};</script></html>"#;
        let fake = spawn_fake_youtube(None, page, &[("en", EN_XML)]).await;

        let found = watch_page(&fake).fetch("vid").await.unwrap().unwrap();
        assert_eq!(found.language, "en-US");
        assert_eq!(found.text, "hello world");
    }

    #[tokio::test]
    async fn test_watch_page_without_marker_is_none() {
        let fake = spawn_fake_youtube(None, "<html>consent wall</html>", &[]).await;
        assert!(watch_page(&fake).fetch("vid").await.unwrap().is_none());
    }

    #[test]
    fn test_android_request_body() {
        let body = InnerTubeClient::Android.request_body("dQw4w9WgXcQ", "ja");
        assert_eq!(body["videoId"], "dQw4w9WgXcQ");
        assert_eq!(body["context"]["client"]["clientName"], "ANDROID");
        assert_eq!(body["context"]["client"]["androidSdkVersion"], 30);
        assert_eq!(body["context"]["client"]["hl"], "ja");
    }

    #[test]
    fn test_web_request_body() {
        let body = InnerTubeClient::Web.request_body("dQw4w9WgXcQ", "en");
        assert_eq!(body["context"]["client"]["clientName"], "WEB");
        assert_eq!(body["context"]["client"]["clientVersion"], WEB_CLIENT_VERSION);
        assert!(body["context"]["client"].get("androidSdkVersion").is_none());
    }

    #[test]
    fn test_headers_identify_client() {
        let headers = InnerTubeClient::Android.headers();
        assert_eq!(headers[USER_AGENT], ANDROID_USER_AGENT);
        assert_eq!(headers["x-youtube-client-name"], "3");

        let headers = InnerTubeClient::Web.headers();
        assert_eq!(headers[USER_AGENT], http::DESKTOP_USER_AGENT);
        assert_eq!(headers["x-youtube-client-name"], "1");
    }

    #[test]
    fn test_default_strategy_order() {
        let client = reqwest::Client::new();
        let names: Vec<String> = default_strategies(&client, &LanguagePreference::default())
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["android", "web", "watch-page"]);
    }
}
