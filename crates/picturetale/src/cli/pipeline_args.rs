//! Provider and credential flags shared by `serve` and `run`.

use clap::Args;
use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use picturetale_core::providers::resolve_env_var;
use picturetale_core::Config;

use super::types::{SpeechProvider, TextProvider};

/// Stage provider overrides and API credentials.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Caption provider (overrides config)
    #[arg(long, value_enum)]
    pub caption_provider: Option<TextProvider>,

    /// Story provider (overrides config)
    #[arg(long, value_enum)]
    pub story_provider: Option<TextProvider>,

    /// Narration provider (overrides config)
    #[arg(long, value_enum)]
    pub narration_provider: Option<SpeechProvider>,

    /// Fall back to browser speech when every TTS model fails
    #[arg(long)]
    pub fallback_to_browser: bool,

    /// Hugging Face API token
    #[arg(long, env = "HUGGINGFACEHUB_API_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_key: Option<String>,
}

impl PipelineArgs {
    /// Apply overrides to the loaded config.
    ///
    /// Flags and environment variables take priority over the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(provider) = self.caption_provider {
            config.caption.provider = provider.to_string();
        }
        if let Some(provider) = self.story_provider {
            config.story.provider = provider.to_string();
        }
        if let Some(provider) = self.narration_provider {
            config.narration.provider = provider.to_string();
        }
        if self.fallback_to_browser {
            config.narration.fallback_to_browser = true;
        }
        if let Some(token) = self.hf_token.as_deref().filter(|t| !t.is_empty()) {
            config.huggingface.api_token = token.to_string();
        }
        if let Some(key) = self.openai_key.as_deref().filter(|k| !k.is_empty()) {
            config.openai.api_key = key.to_string();
        }
    }
}

/// Whether the config still lacks a usable Hugging Face token.
pub fn missing_hf_token(config: &Config) -> bool {
    config.uses_huggingface() && resolve_env_var(&config.huggingface.api_token).is_none()
}

/// Ask for a Hugging Face token on the terminal if none is configured.
///
/// The token is used for this process only and never written to disk.
pub fn prompt_for_missing_token(config: &mut Config) -> anyhow::Result<()> {
    if !missing_hf_token(config) || !console::user_attended_stderr() {
        return Ok(());
    }

    let warn = Style::new().for_stderr().yellow();
    eprintln!(
        "  {}",
        warn.apply_to("HUGGINGFACEHUB_API_TOKEN not set (get one at https://huggingface.co/settings/tokens)")
    );

    let token: String = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Hugging Face API token")
        .allow_empty_password(true)
        .interact()?;

    if !token.trim().is_empty() {
        config.huggingface.api_token = token.trim().to_string();
    }
    Ok(())
}
