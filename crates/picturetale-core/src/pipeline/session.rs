//! Session controller for one interactive caption → story → narration run.
//!
//! The session owns the intermediate results of a single user interaction and
//! calls each stage when asked. Nothing is retried automatically: a failed
//! stage leaves earlier results in place, so the caller can simply invoke the
//! same method again.

use std::sync::Arc;

use serde::Serialize;

use super::Pipeline;
use crate::error::PipelineError;
use crate::providers::StoryRequest;
use crate::types::{AudioArtifact, Caption, ImagePayload, MediaType, Stage, StageState, Story};

/// Intermediate state for one interaction.
pub struct Session {
    pipeline: Arc<Pipeline>,
    image: Option<ImagePayload>,
    caption: Option<Caption>,
    story: Option<Story>,
    audio: Option<AudioArtifact>,
    states: [StageState; 3],
}

/// Serializable view of a session, without binary payloads.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<Caption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<Story>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioArtifact>,
    pub caption_state: StageState,
    pub story_state: StageState,
    pub narration_state: StageState,
}

impl Session {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            image: None,
            caption: None,
            story: None,
            audio: None,
            states: Default::default(),
        }
    }

    /// Validate an upload and caption it.
    ///
    /// Invalid uploads are rejected before the caption provider is called and
    /// leave the session untouched. An accepted upload starts a fresh
    /// interaction: any previous caption, story, and audio are dropped.
    pub async fn submit_image(
        &mut self,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<Caption, PipelineError> {
        let image = self.pipeline.validator.validate(bytes, media_type)?;
        let (width, height) = image.dimensions();
        tracing::info!(
            "Accepted {} upload ({} bytes, {width}x{height})",
            image.media_type(),
            image.len()
        );

        self.clear();
        self.begin(Stage::Caption);
        let result = self.pipeline.caption.caption(&image).await;
        self.image = Some(image);

        let caption = self.finish(
            Stage::Caption,
            result.and_then(|caption| {
                if caption.is_blank() {
                    Err(PipelineError::unavailable(
                        Stage::Caption,
                        format!("{} returned an empty caption", caption.model),
                    ))
                } else {
                    Ok(caption)
                }
            }),
        )?;

        self.caption = Some(caption.clone());
        Ok(caption)
    }

    /// Expand a caption into a story.
    ///
    /// A new story replaces any previous one and invalidates its audio.
    pub async fn expand_to_story(&mut self, caption: &Caption) -> Result<Story, PipelineError> {
        if caption.is_blank() {
            return Err(PipelineError::InvalidInput("caption is empty".to_string()));
        }

        let request = StoryRequest::from_caption(caption, &self.pipeline.story_config);
        self.begin(Stage::Story);
        let result = self.pipeline.story.generate(&request).await;

        let story = self.finish(
            Stage::Story,
            result.and_then(|story| {
                if story.is_blank() {
                    Err(PipelineError::unavailable(
                        Stage::Story,
                        format!("{} returned an empty story", story.model),
                    ))
                } else {
                    Ok(story)
                }
            }),
        )?;

        self.story = Some(story.clone());
        self.audio = None;
        self.states[Stage::Narration.index()] = StageState::NotStarted;
        Ok(story)
    }

    /// Narrate a story.
    pub async fn narrate(&mut self, story: &Story) -> Result<AudioArtifact, PipelineError> {
        if story.is_blank() {
            return Err(PipelineError::InvalidInput("story is empty".to_string()));
        }

        self.begin(Stage::Narration);
        let result = self.pipeline.narration.narrate(story).await;

        let audio = self.finish(
            Stage::Narration,
            result.and_then(|audio| {
                if audio.is_empty() {
                    Err(PipelineError::Synthesis(
                        "narration produced no audio".to_string(),
                    ))
                } else {
                    Ok(audio)
                }
            }),
        )?;

        self.audio = Some(audio.clone());
        Ok(audio)
    }

    /// Expand the caption held by this session.
    pub async fn expand_current_caption(&mut self) -> Result<Story, PipelineError> {
        let caption = self.caption.clone().ok_or_else(|| {
            PipelineError::InvalidInput("no caption yet, upload an image first".to_string())
        })?;
        self.expand_to_story(&caption).await
    }

    /// Narrate the story held by this session.
    pub async fn narrate_current_story(&mut self) -> Result<AudioArtifact, PipelineError> {
        let story = self.story.clone().ok_or_else(|| {
            PipelineError::InvalidInput("no story yet, generate a story first".to_string())
        })?;
        self.narrate(&story).await
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    pub fn caption(&self) -> Option<&Caption> {
        self.caption.as_ref()
    }

    pub fn story(&self) -> Option<&Story> {
        self.story.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioArtifact> {
        self.audio.as_ref()
    }

    pub fn state(&self, stage: Stage) -> &StageState {
        &self.states[stage.index()]
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            image_media_type: self.image.as_ref().map(|i| i.media_type()),
            caption: self.caption.clone(),
            story: self.story.clone(),
            audio: self.audio.clone(),
            caption_state: self.state(Stage::Caption).clone(),
            story_state: self.state(Stage::Story).clone(),
            narration_state: self.state(Stage::Narration).clone(),
        }
    }

    /// Drop all intermediate results.
    pub fn clear(&mut self) {
        self.image = None;
        self.caption = None;
        self.story = None;
        self.audio = None;
        self.states = Default::default();
    }

    fn begin(&mut self, stage: Stage) {
        tracing::debug!("{stage} stage requested");
        self.states[stage.index()] = StageState::Requested;
    }

    fn finish<T>(
        &mut self,
        stage: Stage,
        result: Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        self.states[stage.index()] = match &result {
            Ok(_) => {
                tracing::info!("{stage} stage completed");
                StageState::Completed
            }
            Err(e) => {
                tracing::error!("{stage} stage failed: {e}");
                StageState::Failed {
                    message: e.to_string(),
                }
            }
        };
        result
    }
}
