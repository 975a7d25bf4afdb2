use std::sync::LazyLock;

use eyre::Result;
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::http;

const CAPTION_TRACKS_MARKER: &str = "\"captionTracks\":";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static TEXT_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<text[^>]*>(.*?)</text>").unwrap());

/// One subtitle stream offered for a video
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "languageCode", default)]
    pub language_code: String,
    #[serde(rename = "baseUrl", default)]
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

/// Text assembled from one caption track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionText {
    pub language: String,
    pub text: String,
}

/// Language preference used when picking a track
#[derive(Debug, Clone)]
pub struct LanguagePreference {
    pub primary: String,
    pub fallback_prefix: String,
}

impl Default for LanguagePreference {
    fn default() -> Self {
        Self {
            primary: "ja".to_string(),
            fallback_prefix: "en".to_string(),
        }
    }
}

/// Locate the `captionTracks` array embedded in raw page markup.
///
/// Scans from the first `[` after the marker, counting bracket depth until it
/// returns to zero. Brackets inside JSON strings are not special-cased.
pub fn extract_caption_tracks(html: &str) -> Option<Vec<CaptionTrack>> {
    let pos = html.find(CAPTION_TRACKS_MARKER)?;
    let start = pos + html[pos..].find('[')?;

    let mut depth = 0usize;
    let mut end = None;
    for (i, &b) in html.as_bytes()[start..].iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + i);
                    break;
                }
            }
            _ => {}
        }
    }

    let slice = &html[start..=end?];
    match serde_json::from_str(slice) {
        Ok(tracks) => Some(tracks),
        Err(e) => {
            debug!("captionTracks array did not parse: {e}");
            None
        }
    }
}

/// Read caption tracks out of an InnerTube player response
pub fn tracks_from_player_response(json: &serde_json::Value) -> Option<Vec<CaptionTrack>> {
    let resp = PlayerResponse::deserialize(json).ok()?;
    resp.captions?.player_captions_tracklist_renderer?.caption_tracks
}

/// Pick a track: exact primary language, then fallback prefix, then the first.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], pref: &LanguagePreference) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language_code == pref.primary)
        .or_else(|| {
            tracks
                .iter()
                .find(|t| !t.language_code.is_empty() && t.language_code.starts_with(&pref.fallback_prefix))
        })
        .or_else(|| tracks.first())
}

/// Strip inner tags and decode the fixed entity set. `&amp;` goes first so
/// double-escaped input (`&amp;#39;`) ends up fully decoded.
pub fn decode_entities(s: &str) -> String {
    TAG_RE
        .replace_all(s, "")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .trim()
        .to_string()
}

/// Join all non-empty `<text>` spans of a caption document with single spaces
pub fn assemble_caption_text(xml: &str) -> String {
    TEXT_SPAN_RE
        .captures_iter(xml)
        .map(|caps| decode_entities(&caps[1]))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Select a track, download it and assemble its text.
///
/// Returns `None` when there is no usable track or the track carries no text.
pub async fn fetch_track_text(
    client: &reqwest::Client,
    tracks: &[CaptionTrack],
    pref: &LanguagePreference,
) -> Result<Option<CaptionText>> {
    let Some(track) = select_track(tracks, pref) else {
        return Ok(None);
    };
    if track.base_url.is_empty() {
        debug!("Selected track {} has no baseUrl", track.language_code);
        return Ok(None);
    }

    debug!("Using caption track: lang={}", track.language_code);
    let xml = http::get_text(client, &track.base_url).await?;
    let text = assemble_caption_text(&xml);

    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(CaptionText {
        language: track.language_code.clone(),
        text,
    }))
}
