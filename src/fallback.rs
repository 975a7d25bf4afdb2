use log::{debug, info, warn};
use serde::Serialize;

use crate::Transcript;
use crate::youtube::CaptionStrategy;

/// Why a strategy did not produce text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Empty,
    Error,
}

/// One unsuccessful attempt in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub strategy: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of running the chain: the first transcript found, plus every
/// attempt that failed before it.
#[derive(Debug, Clone)]
pub struct ChainReport {
    pub transcript: Option<Transcript>,
    pub trail: Vec<Attempt>,
}

/// Ordered list of named strategies, tried one at a time
pub struct FallbackChain {
    strategies: Vec<Box<dyn CaptionStrategy>>,
}

impl FallbackChain {
    pub fn new(strategies: Vec<Box<dyn CaptionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy in order until one yields non-empty text.
    /// Strategy errors are recorded, never propagated.
    pub async fn run(&self, video_id: &str) -> ChainReport {
        let mut trail = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.name();
            debug!("Trying caption strategy {name} for {video_id}");

            let (outcome, message) = match strategy.fetch(video_id).await {
                Ok(Some(found)) if !found.text.trim().is_empty() => {
                    info!(
                        "Captions for {video_id} via {name}: lang={}, {} chars",
                        found.language,
                        found.text.chars().count()
                    );
                    return ChainReport {
                        transcript: Some(Transcript {
                            video_id: video_id.to_string(),
                            language: found.language,
                            strategy: name.to_string(),
                            text: found.text,
                        }),
                        trail,
                    };
                }
                Ok(_) => (Outcome::Empty, None),
                Err(e) => (Outcome::Error, Some(format!("{e:#}"))),
            };

            debug!("Strategy {name} failed for {video_id}: {outcome:?} {}", message.as_deref().unwrap_or(""));
            trail.push(Attempt {
                strategy: name.to_string(),
                outcome,
                message,
            });
        }

        warn!("All {} caption strategies failed for {video_id}", self.strategies.len());
        ChainReport { transcript: None, trail }
    }
}
