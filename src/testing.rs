use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use eyre::{Result, bail};
use serde_json::Value;

use crate::captions::CaptionText;
use crate::summarize::Generator;
use crate::youtube::CaptionStrategy;

pub enum Behavior {
    Fail(&'static str),
    Nothing,
    Text(String),
}

pub struct StubStrategy {
    name: &'static str,
    behavior: Behavior,
}

#[async_trait]
impl CaptionStrategy for StubStrategy {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, _video_id: &str) -> Result<Option<CaptionText>> {
        match &self.behavior {
            Behavior::Fail(msg) => bail!("{msg}"),
            Behavior::Nothing => Ok(None),
            Behavior::Text(text) => Ok(Some(CaptionText {
                language: "ja".to_string(),
                text: text.clone(),
            })),
        }
    }
}

pub fn stub(name: &'static str, behavior: Behavior) -> Box<dyn CaptionStrategy> {
    Box::new(StubStrategy { name, behavior })
}

pub fn text(s: impl Into<String>) -> Behavior {
    Behavior::Text(s.into())
}

/// Replies with a fixed string (or error) and records every prompt it saw
#[derive(Clone)]
pub struct CannedGenerator {
    reply: String,
    fail_with: Option<String>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl CannedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_with: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            reply: String::new(),
            fail_with: Some(msg.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(ref msg) = self.fail_with {
            bail!("{msg}");
        }
        Ok(self.reply.clone())
    }
}

/// Local stand-in for the YouTube surfaces the strategies talk to.
/// `{origin}` in the player JSON and page markup is replaced with the
/// server's own address.
pub struct FakeYouTube {
    pub origin: String,
    pub player_requests: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct FakeState {
    origin: String,
    player: Option<String>,
    page: String,
    captions: HashMap<String, String>,
    player_requests: Arc<Mutex<Vec<Value>>>,
}

/// `player: None` makes the player endpoint answer 500
pub async fn spawn_fake_youtube(player: Option<&str>, page: &str, captions: &[(&str, &str)]) -> FakeYouTube {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    let player_requests = Arc::new(Mutex::new(Vec::new()));

    let state = FakeState {
        origin: origin.clone(),
        player: player.map(str::to_string),
        page: page.to_string(),
        captions: captions
            .iter()
            .map(|(lang, xml)| (lang.to_string(), xml.to_string()))
            .collect(),
        player_requests: player_requests.clone(),
    };

    let app = Router::new()
        .route("/youtubei/v1/player", post(fake_player))
        .route("/watch", get(fake_watch))
        .route("/api/timedtext", get(fake_timedtext))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeYouTube { origin, player_requests }
}

async fn fake_player(State(state): State<FakeState>, Json(body): Json<Value>) -> Response {
    state.player_requests.lock().unwrap().push(body);
    match &state.player {
        Some(json) => (
            [(header::CONTENT_TYPE, "application/json")],
            json.replace("{origin}", &state.origin),
        )
            .into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "player unavailable").into_response(),
    }
}

async fn fake_watch(State(state): State<FakeState>) -> Html<String> {
    Html(state.page.replace("{origin}", &state.origin))
}

async fn fake_timedtext(State(state): State<FakeState>, Query(query): Query<HashMap<String, String>>) -> String {
    query
        .get("lang")
        .and_then(|lang| state.captions.get(lang))
        .cloned()
        .unwrap_or_default()
}
