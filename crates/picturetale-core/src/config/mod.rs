//! Configuration management for picturetale.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file both work.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Web server settings
    pub server: ServerConfig,

    /// Upload and request limits
    pub limits: LimitsConfig,

    /// Caption stage
    pub caption: CaptionConfig,

    /// Story stage
    pub story: StoryConfig,

    /// Narration stage
    pub narration: NarrationConfig,

    /// Hugging Face Inference API
    pub huggingface: HuggingFaceConfig,

    /// OpenAI API
    pub openai: OpenAiConfig,

    /// Local Ollama server
    pub ollama: OllamaConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.picturetale.picturetale/config.toml
    /// - Linux: ~/.config/picturetale/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\picturetale\config\config.toml
    ///
    /// Falls back to ~/.picturetale/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "picturetale", "picturetale")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".picturetale").join("config.toml")
            })
    }

    /// Whether any stage is served by the Hugging Face Inference API.
    pub fn uses_huggingface(&self) -> bool {
        self.caption.provider == "huggingface"
            || self.story.provider == "huggingface"
            || self.narration.provider == "huggingface"
    }

    /// Whether any stage is served by OpenAI.
    pub fn uses_openai(&self) -> bool {
        self.caption.provider == "openai"
            || self.story.provider == "openai"
            || self.narration.provider == "openai"
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.limits.request_timeout_ms, 30000);
        assert_eq!(config.story.max_length, 300);
        assert_eq!(config.caption.provider, "huggingface");
        assert_eq!(config.huggingface.tts_models.len(), 5);
        assert!(!config.narration.fallback_to_browser);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[story]"));
        assert!(toml.contains("[[huggingface.tts_models]]"));
        assert!(toml.contains("length_scale"));
    }

    #[test]
    fn test_toml_roundtrip_keeps_tts_parameters() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.huggingface.tts_models, config.huggingface.tts_models);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[story]\nprovider = \"openai\"\nmax_length = 120\n\n[narration]\nprovider = \"browser\""
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.story.provider, "openai");
        assert_eq!(config.story.max_length, 120);
        assert_eq!(config.narration.provider, "browser");
        // Untouched sections keep their defaults
        assert_eq!(config.caption.provider, "huggingface");
        assert!(config.story.prompt_intro.starts_with("Write a meaningful story"));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\nmax_upload_mb = 0").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_upload_mb"));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[story\nprovider = ").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_provider_usage() {
        let mut config = Config::default();
        assert!(config.uses_huggingface());
        assert!(!config.uses_openai());

        config.caption.provider = "openai".to_string();
        config.story.provider = "ollama".to_string();
        config.narration.provider = "browser".to_string();
        assert!(!config.uses_huggingface());
        assert!(config.uses_openai());
    }
}
