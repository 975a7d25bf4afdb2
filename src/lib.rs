pub mod captions;
pub mod config;
pub mod fallback;
pub mod http;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod summarize;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;

use serde::{Deserialize, Deserializer, Serialize};

/// Caption text recovered for a video
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub video_id: String,
    pub language: String,
    /// Name of the strategy that produced the text
    pub strategy: String,
    pub text: String,
}

/// Who is watching, used only to tailor the prompt.
///
/// Each field decodes on its own: a value of the wrong type is dropped
/// without discarding the rest of the context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListenerContext {
    #[serde(deserialize_with = "lenient_string")]
    pub role: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub tools: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub current_challenge: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Non-string entries are skipped; anything but an array is empty
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Shape the model is asked to produce. Not enforced on the server response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub title: String,
    #[serde(default)]
    pub usable_items: Vec<UsableItem>,
    #[serde(default)]
    pub action_plan: Vec<ActionItem>,
    #[serde(default)]
    pub memos: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UsableItem {
    pub id: String,
    pub point: String,
    pub context: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionItem {
    pub id: String,
    pub action: String,
    pub timing: String,
}

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // Bare 11-character video ID
    if regex::Regex::new(r"^[a-zA-Z0-9_-]{11}$").ok()?.is_match(input) {
        return Some(input.to_string());
    }

    let patterns = [
        r"youtube\.com/watch\?.*v=([a-zA-Z0-9_-]{11})",
        r"youtu\.be/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/live/([a-zA-Z0-9_-]{11})",
    ];

    patterns.iter().find_map(|p| {
        regex::Regex::new(p)
            .ok()?
            .captures(input)
            .map(|caps| caps[1].to_string())
    })
}

/// Resolve a caller-supplied identifier: URLs are reduced to their ID,
/// anything else passes through trimmed.
pub fn normalize_video_id(input: &str) -> String {
    extract_video_id(input).unwrap_or_else(|| input.trim().to_string())
}
