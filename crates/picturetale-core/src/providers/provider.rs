//! Stage adapter traits, request types, and the provider factory.
//!
//! Each pipeline stage talks to its external model through one trait. The
//! factory picks the implementation named in config.

use crate::config::{Config, StoryConfig};
use crate::error::{ConfigError, PipelineError};
use crate::types::{AudioArtifact, Caption, ImagePayload, Stage, Story};
use async_trait::async_trait;
use std::time::Duration;

use super::browser::{BrowserNarrator, FallbackNarrator};
use super::huggingface::{HuggingFaceApi, HuggingFaceCaptioner, HuggingFaceNarrator, HuggingFaceStoryteller};
use super::ollama::{OllamaApi, OllamaCaptioner, OllamaStoryteller};
use super::openai::{OpenAiApi, OpenAiCaptioner, OpenAiNarrator, OpenAiStoryteller};

/// Prompt used by chat-style vision models to produce a caption.
pub const CAPTION_PROMPT: &str =
    "Describe this image in one short sentence, like a photo caption. \
     Mention the main subject and the setting.";

/// A request to expand a caption into a story.
#[derive(Debug, Clone)]
pub struct StoryRequest {
    /// Caption the story is about
    pub caption: String,
    /// Instruction placed in front of the caption
    pub intro: String,
    /// Full prompt sent to the model
    pub prompt: String,
    /// Maximum generated length in tokens
    pub max_length: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl StoryRequest {
    /// Build a story request from a caption and the story settings.
    pub fn from_caption(caption: &Caption, config: &StoryConfig) -> Self {
        let caption = caption.text.trim().to_string();
        let intro = config.prompt_intro.trim().to_string();
        Self {
            prompt: format!("{intro} {caption}"),
            caption,
            intro,
            max_length: config.max_length,
            temperature: config.temperature,
        }
    }

    /// Turn raw generated text into story text.
    ///
    /// Completion models echo the prompt. The instruction is removed, the
    /// caption is kept as the story's opening.
    pub fn extract_story(&self, generated: &str) -> String {
        let text = generated.trim();
        text.strip_prefix(self.intro.as_str())
            .map(str::trim)
            .unwrap_or(text)
            .to_string()
    }
}

/// Caption stage adapter.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the session holds `Arc<dyn CaptionProvider>`).
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Provider name for logging (e.g., "huggingface", "ollama").
    fn name(&self) -> &str;

    /// Describe the image.
    async fn caption(&self, image: &ImagePayload) -> Result<Caption, PipelineError>;
}

/// Story stage adapter.
#[async_trait]
pub trait StoryProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Generate a story for the request.
    async fn generate(&self, request: &StoryRequest) -> Result<Story, PipelineError>;
}

/// Narration stage adapter.
#[async_trait]
pub trait NarrationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Turn the story into something playable.
    async fn narrate(&self, story: &Story) -> Result<AudioArtifact, PipelineError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Map a transport-level `reqwest` failure to `ModelUnavailable`.
pub(crate) fn request_failed(
    stage: Stage,
    provider: &str,
    timeout: Duration,
    err: reqwest::Error,
) -> PipelineError {
    let message = if err.is_timeout() {
        format!("{provider} request timed out after {}ms", timeout.as_millis())
    } else {
        format!("{provider} request failed: {err}")
    };
    PipelineError::ModelUnavailable {
        stage,
        message,
        status_code: err.status().map(|s| s.as_u16()),
    }
}

/// Map a non-success HTTP response to `ModelUnavailable`.
pub(crate) async fn http_failure(
    stage: Stage,
    provider: &str,
    resp: reqwest::Response,
) -> PipelineError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    PipelineError::ModelUnavailable {
        stage,
        message: format!("{provider} HTTP {status}: {text}"),
        status_code: Some(status.as_u16()),
    }
}

/// Factory that creates each stage's adapter from config.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the caption adapter named by `caption.provider`.
    pub fn caption(config: &Config) -> Result<Box<dyn CaptionProvider>, ConfigError> {
        let timeout = request_timeout(config);
        match config.caption.provider.as_str() {
            "huggingface" => Ok(Box::new(HuggingFaceCaptioner::new(
                huggingface_api(config)?,
                &config.huggingface.caption_model,
            ))),
            "openai" => Ok(Box::new(OpenAiCaptioner::new(
                openai_api(config)?,
                &config.openai.caption_model,
            ))),
            "ollama" => Ok(Box::new(OllamaCaptioner::new(
                OllamaApi::new(&config.ollama.endpoint, timeout),
                &config.ollama.caption_model,
            ))),
            other => Err(unknown_provider("caption", other)),
        }
    }

    /// Create the story adapter named by `story.provider`.
    pub fn story(config: &Config) -> Result<Box<dyn StoryProvider>, ConfigError> {
        let timeout = request_timeout(config);
        match config.story.provider.as_str() {
            "huggingface" => Ok(Box::new(HuggingFaceStoryteller::new(
                huggingface_api(config)?,
                &config.huggingface.story_model,
            ))),
            "openai" => Ok(Box::new(OpenAiStoryteller::new(
                openai_api(config)?,
                &config.openai.story_model,
            ))),
            "ollama" => Ok(Box::new(OllamaStoryteller::new(
                OllamaApi::new(&config.ollama.endpoint, timeout),
                &config.ollama.story_model,
            ))),
            other => Err(unknown_provider("story", other)),
        }
    }

    /// Create the narration adapter named by `narration.provider`.
    ///
    /// Server-side narrators are wrapped in a browser fallback when
    /// `narration.fallback_to_browser` is set.
    pub fn narration(config: &Config) -> Result<Box<dyn NarrationProvider>, ConfigError> {
        let voice = config.narration.voice.clone();
        let server_side: Box<dyn NarrationProvider> = match config.narration.provider.as_str() {
            "huggingface" => Box::new(HuggingFaceNarrator::new(
                huggingface_api(config)?,
                config.huggingface.tts_models.clone(),
            )),
            "openai" => Box::new(OpenAiNarrator::new(
                openai_api(config)?,
                &config.openai.tts_model,
                &config.openai.tts_voice,
            )),
            "browser" => return Ok(Box::new(BrowserNarrator::new(voice))),
            other => return Err(unknown_provider("narration", other)),
        };

        if config.narration.fallback_to_browser {
            Ok(Box::new(FallbackNarrator::new(
                server_side,
                BrowserNarrator::new(voice),
            )))
        } else {
            Ok(server_side)
        }
    }
}

fn request_timeout(config: &Config) -> Duration {
    Duration::from_millis(config.limits.request_timeout_ms)
}

fn huggingface_api(config: &Config) -> Result<HuggingFaceApi, ConfigError> {
    let token = resolve_env_var(&config.huggingface.api_token).ok_or_else(|| {
        ConfigError::ValidationError(
            "Hugging Face API token not set. Set HUGGINGFACEHUB_API_TOKEN env var.".to_string(),
        )
    })?;
    Ok(HuggingFaceApi::new(
        &config.huggingface.endpoint,
        &token,
        request_timeout(config),
    ))
}

fn openai_api(config: &Config) -> Result<OpenAiApi, ConfigError> {
    let api_key = resolve_env_var(&config.openai.api_key).ok_or_else(|| {
        ConfigError::ValidationError("OpenAI API key not set. Set OPENAI_API_KEY env var.".to_string())
    })?;
    Ok(OpenAiApi::new(
        &config.openai.endpoint,
        &api_key,
        request_timeout(config),
    ))
}

fn unknown_provider(stage: &str, provider: &str) -> ConfigError {
    ConfigError::ValidationError(format!("Unknown {stage} provider: {provider}"))
}
