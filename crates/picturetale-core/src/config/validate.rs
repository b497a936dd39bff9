//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

const CAPTION_PROVIDERS: &[&str] = &["huggingface", "openai", "ollama"];
const STORY_PROVIDERS: &[&str] = &["huggingface", "openai", "ollama"];
const NARRATION_PROVIDERS: &[&str] = &["huggingface", "openai", "browser"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        check_provider("caption.provider", &self.caption.provider, CAPTION_PROVIDERS)?;
        check_provider("story.provider", &self.story.provider, STORY_PROVIDERS)?;
        check_provider(
            "narration.provider",
            &self.narration.provider,
            NARRATION_PROVIDERS,
        )?;
        if self.story.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "story.max_length must be > 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.story.temperature) {
            return Err(ConfigError::ValidationError(
                "story.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !(0.1..=10.0).contains(&self.narration.voice.rate) {
            return Err(ConfigError::ValidationError(
                "narration.voice.rate must be between 0.1 and 10.0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.narration.voice.pitch) {
            return Err(ConfigError::ValidationError(
                "narration.voice.pitch must be between 0.0 and 2.0".into(),
            ));
        }
        if self.narration.provider == "huggingface" && self.huggingface.tts_models.is_empty() {
            return Err(ConfigError::ValidationError(
                "huggingface.tts_models must list at least one model".into(),
            ));
        }
        Ok(())
    }
}

fn check_provider(key: &str, value: &str, allowed: &[&str]) -> Result<(), ConfigError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{key} must be one of {}, got '{value}'",
            allowed.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.request_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = Config::default();
        config.caption.provider = "browser".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("caption.provider"));

        let mut config = Config::default();
        config.narration.provider = "ollama".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("narration.provider"));
    }

    #[test]
    fn test_validate_rejects_temperature_out_of_range() {
        let mut config = Config::default();
        config.story.temperature = 2.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));

        config.story.temperature = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_voice() {
        let mut config = Config::default();
        config.narration.voice.rate = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("voice.rate"));
    }

    #[test]
    fn test_validate_requires_tts_models_for_huggingface() {
        let mut config = Config::default();
        config.huggingface.tts_models.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tts_models"));

        // Not needed when narration runs elsewhere
        config.narration.provider = "browser".to_string();
        assert!(config.validate().is_ok());
    }
}
