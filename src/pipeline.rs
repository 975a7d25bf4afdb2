use std::fmt;

use eyre::Result;
use log::{error, info};

use crate::config::Config;
use crate::fallback::{Attempt, ChainReport, FallbackChain};
use crate::summarize::{self, AnthropicGenerator, Generator};
use crate::{ListenerContext, http, youtube};

pub const NO_CAPTIONS_MESSAGE: &str =
    "この動画には字幕がありません。字幕（自動生成を含む）がある動画のURLを入力してください。";

pub const ANALYSIS_FAILED_PREFIX: &str = "AI解析に失敗しました: ";

/// Why a request could not produce an analysis
#[derive(Debug)]
pub enum AnalyzeError {
    /// Every caption strategy came back empty or failed
    NoCaptions { trail: Vec<Attempt> },
    /// The generation call failed or its output was unusable
    Generation(eyre::Report),
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzeError::NoCaptions { .. } => write!(f, "{NO_CAPTIONS_MESSAGE}"),
            AnalyzeError::Generation(e) => write!(f, "{ANALYSIS_FAILED_PREFIX}{e}"),
        }
    }
}

impl std::error::Error for AnalyzeError {}

/// Caption chain plus generator: everything one request needs
pub struct Analyzer {
    chain: FallbackChain,
    generator: Box<dyn Generator>,
}

impl Analyzer {
    pub fn new(chain: FallbackChain, generator: Box<dyn Generator>) -> Self {
        Self { chain, generator }
    }

    /// Wire the default strategies and the Anthropic generator from config
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http::build_client(config.timeout())?;
        let strategies = youtube::default_strategies(&client, &config.language_preference());
        let generator = AnthropicGenerator::new(http::build_api_client()?, config.model(), config.max_tokens())
            .with_timeout(config.generation_timeout());
        Ok(Self::new(FallbackChain::new(strategies), Box::new(generator)))
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.chain.names()
    }

    /// Run only the caption chain
    pub async fn transcript(&self, video_id: &str) -> ChainReport {
        self.chain.run(video_id).await
    }

    /// Recover captions, then turn them into a tailored analysis
    pub async fn analyze(
        &self,
        video_id: &str,
        context: &ListenerContext,
    ) -> std::result::Result<serde_json::Value, AnalyzeError> {
        let report = self.chain.run(video_id).await;
        let Some(transcript) = report.transcript else {
            return Err(AnalyzeError::NoCaptions { trail: report.trail });
        };

        match summarize::analyze(self.generator.as_ref(), context, &transcript.text).await {
            Ok(value) => {
                info!("Analysis for {video_id} complete (captions via {})", transcript.strategy);
                Ok(value)
            }
            Err(e) => {
                error!("Analysis for {video_id} failed: {e:#}");
                Err(AnalyzeError::Generation(e))
            }
        }
    }
}
