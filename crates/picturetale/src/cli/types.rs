//! CLI enum types for stage provider overrides.

use clap::ValueEnum;

/// Providers that can caption an image or write a story.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TextProvider {
    /// Hugging Face Inference API
    Huggingface,
    /// OpenAI API
    Openai,
    /// Local Ollama instance
    Ollama,
}

impl std::fmt::Display for TextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextProvider::Huggingface => write!(f, "huggingface"),
            TextProvider::Openai => write!(f, "openai"),
            TextProvider::Ollama => write!(f, "ollama"),
        }
    }
}

/// Providers that can narrate a story.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SpeechProvider {
    /// Hugging Face TTS models, tried in order
    Huggingface,
    /// OpenAI speech endpoint
    Openai,
    /// The browser's own speech engine (web UI only)
    Browser,
}

impl std::fmt::Display for SpeechProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechProvider::Huggingface => write!(f, "huggingface"),
            SpeechProvider::Openai => write!(f, "openai"),
            SpeechProvider::Browser => write!(f, "browser"),
        }
    }
}
