use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::captions::LanguagePreference;
use crate::http;
use crate::summarize;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bind: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub generation_timeout_secs: Option<u64>,
    pub primary_lang: Option<String>,
    pub fallback_lang_prefix: Option<String>,
}

impl Config {
    /// Load config from ~/.config/ytbrief/config.toml if it exists
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(summarize::DEFAULT_MODEL)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(summarize::DEFAULT_MAX_TOKENS)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs.map(Duration::from_secs).unwrap_or(http::DEFAULT_TIMEOUT)
    }

    pub fn generation_timeout(&self) -> Duration {
        self.generation_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(summarize::DEFAULT_GENERATION_TIMEOUT)
    }

    pub fn language_preference(&self) -> LanguagePreference {
        let default = LanguagePreference::default();
        LanguagePreference {
            primary: self.primary_lang.clone().unwrap_or(default.primary),
            fallback_prefix: self.fallback_lang_prefix.clone().unwrap_or(default.fallback_prefix),
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytbrief")
        .join("config.toml")
}
