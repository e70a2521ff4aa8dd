//! Configuration system.
//!
//! Hierarchical configuration with file and environment overrides: an
//! optional TOML file provides the base, `MOCKFORGE_*` environment
//! variables override individual fields, and `GEMINI_API_KEY` fills in the
//! provider credential when the file leaves it unset.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::logging::LoggingConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockforgeConfig {
    /// Generation backend settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Batch queue tuning
    #[serde(default)]
    pub queue: QueueSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key. Falls back to the GEMINI_API_KEY environment variable.
    pub api_key: Option<String>,

    /// Service base URL, without the versioned path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Image-generation model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Output aspect ratio requested from the model.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_aspect_ratio() -> String {
    "1:1".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            aspect_ratio: default_aspect_ratio(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.is_empty() {
            return Err("model cannot be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("base_url is not a valid URL: {}", self.base_url));
        }
        Ok(())
    }
}

/// Batch queue tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Worker count; 1 keeps calls strictly sequential under the rate limit.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Fixed spacing delay before each generation call, in milliseconds.
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,

    /// Base backoff delay after a rate-limited attempt, in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Total attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_concurrency() -> usize {
    1
}

fn default_item_delay_ms() -> u64 {
    2000
}

fn default_retry_base_delay_ms() -> u64 {
    4000
}

fn default_max_attempts() -> usize {
    5
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            item_delay_ms: default_item_delay_ms(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl QueueSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be at least 1".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

impl MockforgeConfig {
    /// Load layered configuration: optional file, then MOCKFORGE_* env
    /// overrides, then the GEMINI_API_KEY credential fallback.
    pub fn load(file: Option<&Path>) -> Result<Self, GenerationError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("MOCKFORGE")
                .separator("__")
                .try_parsing(true),
        );

        let mut loaded: MockforgeConfig = builder.build()?.try_deserialize()?;

        if loaded.provider.api_key.is_none() {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                if !key.is_empty() {
                    loaded.provider.api_key = Some(key);
                }
            }
        }

        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        self.provider
            .validate()
            .map_err(|e| GenerationError::Configuration(format!("provider: {e}")))?;
        self.queue
            .validate()
            .map_err(|e| GenerationError::Configuration(format!("queue: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Serialize access to process environment across tests
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn default_config_targets_gemini() {
        let config = MockforgeConfig::default();
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.provider.model, "gemini-2.5-flash-image");
        assert_eq!(config.provider.aspect_ratio, "1:1");
        assert_eq!(config.queue.concurrency, 1);
        assert_eq!(config.queue.item_delay_ms, 2000);
        assert_eq!(config.queue.retry_base_delay_ms, 4000);
        assert_eq!(config.queue.max_attempts, 5);
    }

    #[test]
    fn load_from_toml_file() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("mockforge.toml");

        std::fs::write(
            &config_file,
            r#"
[provider]
api_key = "file-key"
model = "gemini-2.5-flash-image"

[queue]
concurrency = 2
item_delay_ms = 500

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = MockforgeConfig::load(Some(&config_file)).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.queue.concurrency, 2);
        assert_eq!(config.queue.item_delay_ms, 500);
        // unset fields keep their defaults
        assert_eq!(config.queue.max_attempts, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn gemini_api_key_env_fills_missing_credential() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let original = std::env::var("GEMINI_API_KEY").ok();

        std::env::set_var("GEMINI_API_KEY", "env-key");
        let config = MockforgeConfig::load(None).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("env-key"));

        match original {
            Some(value) => std::env::set_var("GEMINI_API_KEY", value),
            None => std::env::remove_var("GEMINI_API_KEY"),
        }
    }

    #[test]
    fn file_credential_wins_over_env() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let original = std::env::var("GEMINI_API_KEY").ok();
        std::env::set_var("GEMINI_API_KEY", "env-key");

        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("mockforge.toml");
        std::fs::write(&config_file, "[provider]\napi_key = \"file-key\"\n").unwrap();

        let config = MockforgeConfig::load(Some(&config_file)).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("file-key"));

        match original {
            Some(value) => std::env::set_var("GEMINI_API_KEY", value),
            None => std::env::remove_var("GEMINI_API_KEY"),
        }
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = MockforgeConfig::default();
        config.queue.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = MockforgeConfig::default();
        config.provider.base_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        let mut config = MockforgeConfig::default();
        config.provider.model = String::new();
        assert!(config.validate().is_err());
    }
}
