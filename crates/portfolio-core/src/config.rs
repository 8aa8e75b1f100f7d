use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::prompt::DEFAULT_SYSTEM_PROMPT;
use crate::provider::Provider;

pub const DEFAULT_SCENE: &str = "portfolio_assistant";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// On-disk configuration: a set of named chat scenes.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scene: Option<String>,
    #[serde(default)]
    pub scenes: HashMap<String, SceneSettings>,
}

/// One scene entry. Every tuning field is optional and falls back to the
/// crate defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SceneSettings {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Preamble template with `{{name}}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl SceneSettings {
    pub fn model(&self) -> &str {
        self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or(DEFAULT_MODEL)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    /// Configured key, else the provider's environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| {
                self.provider
                    .api_key_env()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.is_empty())
            })
    }
}

impl Config {
    pub fn new() -> Self {
        let scene = SceneSettings {
            provider: Provider::OpenAI,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            ..SceneSettings::default()
        };

        Self {
            default_scene: Some(DEFAULT_SCENE.to_string()),
            scenes: HashMap::from([(DEFAULT_SCENE.to_string(), scene)]),
        }
    }

    /// Load from `path`, or the per-user config file. A missing file yields
    /// the default config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::get_config_path()?,
        };

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("invalid config {}: {}", config_path.display(), e))?;

        tracing::info!(
            path = %config_path.display(),
            scenes = config.scenes.len(),
            "loaded config"
        );
        Ok(config)
    }

    pub fn scene_name(&self) -> &str {
        self.default_scene.as_deref().unwrap_or(DEFAULT_SCENE)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("portfolio-chat").join("config.json"))
    }
}
