//! Stage adapters for external model providers.
//!
//! Provides one trait per stage plus implementations for the Hugging Face
//! Inference API, OpenAI, a local Ollama server, and browser-side speech.

pub(crate) mod browser;
pub(crate) mod huggingface;
pub(crate) mod ollama;
pub(crate) mod openai;
pub(crate) mod provider;

pub use browser::{BrowserNarrator, FallbackNarrator};
pub use provider::{
    resolve_env_var, CaptionProvider, NarrationProvider, ProviderFactory, StoryProvider,
    StoryRequest,
};
