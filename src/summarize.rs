use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, bail, eyre};
use log::debug;

use crate::ListenerContext;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-6";
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// Per-call limit for generation; separate from the caption fetch timeout
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Transcript characters embedded in the prompt
pub const TRANSCRIPT_CHAR_LIMIT: usize = 10_000;

pub const INVALID_RESPONSE: &str = "AIのレスポンスが不正です";

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

const OUTPUT_FORMAT: &str = r#"{
  "title": "動画の内容を表すタイトル（20文字以内）",
  "usableItems": [
    {
      "id": "u1",
      "point": "あなたの仕事で使えること（30文字以内）",
      "context": "なぜ・どのように使えるか。視聴者のツールや課題に具体的に言及（100文字以内）"
    },
    { "id": "u2", "point": "...", "context": "..." },
    { "id": "u3", "point": "...", "context": "..." }
  ],
  "actionPlan": [
    { "id": "a1", "action": "明日から実践できる具体的なアクション（50文字以内）", "timing": "今日中" },
    { "id": "a2", "action": "...", "timing": "今週中" },
    { "id": "a3", "action": "...", "timing": "今月中" }
  ],
  "memos": [
    "動画からの重要な学び・気づき（各50文字以内、3〜5個）"
  ]
}"#;

/// Single-turn text generation
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Anthropic Messages API. The key is read from `ANTHROPIC_API_KEY` on every call.
pub struct AnthropicGenerator {
    client: reqwest::Client,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl AnthropicGenerator {
    pub fn new(client: reqwest::Client, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| eyre!("ANTHROPIC_API_KEY environment variable not set"))?;

        debug!("Generating via Anthropic API with model {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let resp = self
            .client
            .post(ANTHROPIC_URL)
            .timeout(self.timeout)
            .header("x-api-key", &api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Anthropic API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        extract_anthropic_text(&json)
    }
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String> {
    if let Some(content) = json.get("content").and_then(|c| c.as_array()) {
        let text: String = content
            .iter()
            .filter_map(|block| {
                if block.get("type")?.as_str()? == "text" {
                    block.get("text")?.as_str().map(|s| s.to_string())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Ok(text);
        }
    }
    bail!("unexpected Anthropic API response format");
}

/// First `limit` characters of `s`
pub fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Blank after trimming counts as absent
fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

/// Fill the instruction template with listener context and the truncated transcript
pub fn build_prompt(context: &ListenerContext, transcript: &str) -> String {
    let role = or_default(context.role.as_deref(), "—");
    let tools = context.tools.join(", ");
    let tools = or_default(Some(tools.as_str()), "なし");
    let challenge = or_default(context.current_challenge.as_deref(), "なし");
    let transcript = truncate_chars(transcript, TRANSCRIPT_CHAR_LIMIT);

    format!(
        "あなたはセミナー動画の内容を視聴者の仕事文脈に翻訳するAIです。
以下のトランスクリプトを分析し、視聴者の職種・ツール・課題に合わせた実践的なアウトプットを日本語で生成してください。

## 視聴者のコンテキスト
- 職種: {role}
- よく使うツール: {tools}
- 今の課題: {challenge}

## 動画トランスクリプト
{transcript}

## 出力形式（必ずこのJSONのみを返してください。前置き・後置き不要）
{OUTPUT_FORMAT}"
    )
}

/// Span from the first `{` to the last `}` of free-form model output
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the model's reply into the JSON object it was asked to emit
pub fn parse_analysis(text: &str) -> Result<serde_json::Value> {
    let Some(raw) = extract_json_object(text) else {
        debug!("No JSON object in model output ({} chars)", text.len());
        bail!(INVALID_RESPONSE);
    };
    serde_json::from_str(raw).map_err(|e| {
        debug!("Model output did not parse as JSON: {e}");
        eyre!(INVALID_RESPONSE)
    })
}

/// Build the prompt, run the generator and return the parsed object verbatim
pub async fn analyze(generator: &dyn Generator, context: &ListenerContext, transcript: &str) -> Result<serde_json::Value> {
    let prompt = build_prompt(context, transcript);
    let reply = generator.generate(&prompt).await?;
    parse_analysis(&reply)
}
