//! Configuration management for docquery
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.docquery/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{RagError, Result};
use crate::model::{RetryPolicy, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::rag::{PromptTemplates, RagConfig};
use crate::types::GenerationConfig;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub retry: RetryConfig,
    pub rag: RagConfig,
    pub prompts: PromptTemplates,
    pub logging: LoggingConfig,
}

/// Generation endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline key; takes precedence over `api_key_env`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Synthesis sampling temperature
    pub temperature: f32,
    /// Synthesis output budget
    pub max_output_tokens: u32,
}

/// Retry and deadline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub jitter: bool,
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            request_timeout_secs: 30,
            jitter: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl RetryConfig {
    /// Build the client retry policy
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::with_config(self.max_retries, self.base_delay_ms)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_jitter(self.jitter)
    }
}

impl ModelConfig {
    /// Sampling parameters for the synthesis call
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            top_p: None,
            top_k: None,
        }
    }

    /// Resolve the API key from config or environment
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env).map_err(|_| {
            RagError::ConfigError(format!(
                "No API key: set model.api_key or the {} environment variable",
                self.api_key_env
            ))
        })
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| RagError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".docquery").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.rag.max_chunk_size == 0 {
            return Err(RagError::ConfigError(
                "max_chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.rag.batch_size == 0 {
            return Err(RagError::ConfigError(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if self.retry.request_timeout_secs == 0 {
            return Err(RagError::ConfigError(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.base_delay_ms == 0 {
            return Err(RagError::ConfigError(
                "base_delay_ms must be greater than 0".to_string(),
            ));
        }

        for (name, temperature) in [
            ("model.temperature", self.model.temperature),
            ("rag.filter_temperature", self.rag.filter_temperature),
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(RagError::ConfigError(format!(
                    "{} must be between 0.0 and 2.0",
                    name
                )));
            }
        }

        if let Some(problem) = self.prompts.missing_placeholders().into_iter().next() {
            return Err(RagError::ConfigError(problem));
        }

        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(RagError::ConfigError(format!(
                    "Invalid log level: {}",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RagError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RagError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Render as TOML, hiding any inline API key
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.model.api_key.is_some() {
            shown.model.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| RagError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}
