//! Sub-configuration structs with their defaults.

use crate::types::VoiceParams;
use serde::{Deserialize, Serialize};

/// Web server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Resource limits for uploads and provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_upload_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Per-request timeout for provider calls in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 20,
            max_image_dimension: 10000,
            request_timeout_ms: 30000,
        }
    }
}

impl LimitsConfig {
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// Caption stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Provider: "huggingface", "openai", or "ollama"
    pub provider: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
        }
    }
}

/// Story stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    /// Provider: "huggingface", "openai", or "ollama"
    pub provider: String,

    /// Instruction placed in front of the caption
    pub prompt_intro: String,

    /// Maximum generated length in tokens
    pub max_length: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            prompt_intro: "Write a meaningful story in about 300 words about".to_string(),
            max_length: 300,
            temperature: 0.9,
        }
    }
}

/// Narration stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Provider: "huggingface", "openai", or "browser"
    pub provider: String,

    /// Hand the story to the browser's speech engine when server-side
    /// synthesis fails on every model
    pub fallback_to_browser: bool,

    /// Voice used for browser speech directives
    pub voice: VoiceParams,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            fallback_to_browser: false,
            voice: VoiceParams::default(),
        }
    }
}

/// Hugging Face Inference API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    /// Inference API base URL
    pub endpoint: String,

    /// API token (supports ${ENV_VAR} syntax)
    pub api_token: String,

    /// Image-to-text model
    pub caption_model: String,

    /// Text-generation model
    pub story_model: String,

    /// Text-to-speech models, tried in order
    pub tts_models: Vec<TtsModelConfig>,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co".to_string(),
            api_token: "${HUGGINGFACEHUB_API_TOKEN}".to_string(),
            caption_model: "Salesforce/blip-image-captioning-base".to_string(),
            story_model: "gpt2".to_string(),
            tts_models: vec![
                TtsModelConfig::new("microsoft/speecht5_tts"),
                TtsModelConfig::new("facebook/mms-tts-eng"),
                TtsModelConfig::new("suno/bark-small"),
                TtsModelConfig::new("espnet/kan-bayashi_ljspeech_vits"),
                TtsModelConfig {
                    name: "facebook/fastspeech2-en-ljspeech".to_string(),
                    parameters: Some(serde_json::json!({
                        "normalize": true,
                        "phonemize": true,
                        "length_scale": 1.0,
                    })),
                },
            ],
        }
    }
}

/// A text-to-speech model in the narration fallback chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsModelConfig {
    /// Model id on the Hugging Face hub
    pub name: String,

    /// Extra `parameters` object sent with the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

impl TtsModelConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parameters: None,
        }
    }
}

/// OpenAI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Vision model for captions
    pub caption_model: String,

    /// Chat model for stories
    pub story_model: String,

    /// Speech model for narration
    pub tts_model: String,

    /// Speech voice
    pub tts_voice: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: "${OPENAI_API_KEY}".to_string(),
            caption_model: "gpt-4o-mini".to_string(),
            story_model: "gpt-4o-mini".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
        }
    }
}

/// Ollama (local) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Vision model for captions
    pub caption_model: String,

    /// Text model for stories
    pub story_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            caption_model: "llava".to_string(),
            story_model: "llama3.2".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
