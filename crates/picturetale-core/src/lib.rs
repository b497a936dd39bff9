//! picturetale core - turn a photo into a narrated short story.
//!
//! Three hosted models do the work; this crate validates the upload,
//! sequences the calls, and hands each stage's output to the next:
//!
//! ```text
//! Image → Caption (image-to-text) → Story (text generation) → Audio (text-to-speech)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use picturetale_core::{Config, Picturetale};
//!
//! #[tokio::main]
//! async fn main() -> picturetale_core::Result<()> {
//!     let app = Picturetale::new(Config::load()?)?;
//!     let mut session = app.session();
//!
//!     let caption = session.submit_image(std::fs::read("dog.jpg")?, "image/jpeg").await?;
//!     let story = session.expand_to_story(&caption).await?;
//!     let audio = session.narrate(&story).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, PicturetaleError, PipelineError, PipelineResult, Result};
pub use pipeline::{Pipeline, Session, SessionSnapshot, UploadValidator};
pub use providers::{CaptionProvider, NarrationProvider, StoryProvider, StoryRequest};
pub use types::{
    AudioArtifact, Caption, ImagePayload, MediaType, SpeechDirective, Stage, StageState, Story,
    VoiceParams,
};

use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point: a configured pipeline that hands out sessions.
pub struct Picturetale {
    config: Config,
    pipeline: Arc<Pipeline>,
}

impl Picturetale {
    /// Build the pipeline described by `config`.
    pub fn new(config: Config) -> Result<Self> {
        tracing::debug!("Initializing picturetale v{}", VERSION);
        config.validate()?;
        let pipeline = Arc::new(Pipeline::from_config(&config)?);
        Ok(Self { config, pipeline })
    }

    /// Wrap an already-assembled pipeline.
    pub fn with_pipeline(config: Config, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Start a new, empty session.
    pub fn session(&self) -> Session {
        Session::new(self.pipeline.clone())
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the stage adapters this instance was built with.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}
