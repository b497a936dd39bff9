//! The caption → story → narration pipeline.
//!
//! - **validate**: upload checks that run before any provider call
//! - **session**: the controller holding one interaction's intermediate results

pub mod session;
pub mod validate;

pub use session::{Session, SessionSnapshot};
pub use validate::UploadValidator;

use std::sync::Arc;

use crate::config::{Config, StoryConfig};
use crate::error::ConfigError;
use crate::providers::{CaptionProvider, NarrationProvider, ProviderFactory, StoryProvider};

/// The three stage adapters plus the settings the controller needs.
///
/// Immutable once built and shared between sessions.
pub struct Pipeline {
    pub(crate) validator: UploadValidator,
    pub(crate) story_config: StoryConfig,
    pub(crate) caption: Arc<dyn CaptionProvider>,
    pub(crate) story: Arc<dyn StoryProvider>,
    pub(crate) narration: Arc<dyn NarrationProvider>,
}

impl Pipeline {
    /// Assemble a pipeline from explicit adapters.
    pub fn new(
        config: &Config,
        caption: Arc<dyn CaptionProvider>,
        story: Arc<dyn StoryProvider>,
        narration: Arc<dyn NarrationProvider>,
    ) -> Self {
        Self {
            validator: UploadValidator::new(config.limits.clone()),
            story_config: config.story.clone(),
            caption,
            story,
            narration,
        }
    }

    /// Build every adapter from config.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let caption = ProviderFactory::caption(config)?;
        let story = ProviderFactory::story(config)?;
        let narration = ProviderFactory::narration(config)?;
        tracing::info!(
            "Pipeline: caption={}, story={}, narration={}",
            caption.name(),
            story.name(),
            narration.name()
        );
        Ok(Self::new(
            config,
            Arc::from(caption),
            Arc::from(story),
            Arc::from(narration),
        ))
    }

    /// Provider names in stage order, for display.
    pub fn provider_names(&self) -> [&str; 3] {
        [self.caption.name(), self.story.name(), self.narration.name()]
    }
}
