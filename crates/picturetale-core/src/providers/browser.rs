//! Client-side narration.
//!
//! The browser narrator does not call any model: it hands the story and a
//! voice to the page, which speaks it with the Web Speech API.

use super::provider::NarrationProvider;
use crate::error::PipelineError;
use crate::types::{AudioArtifact, SpeechDirective, Story, VoiceParams};
use async_trait::async_trait;

/// Produces a [`SpeechDirective`] for the client's speech engine.
pub struct BrowserNarrator {
    voice: VoiceParams,
}

impl BrowserNarrator {
    pub fn new(voice: VoiceParams) -> Self {
        Self { voice }
    }
}

#[async_trait]
impl NarrationProvider for BrowserNarrator {
    fn name(&self) -> &str {
        "browser"
    }

    async fn narrate(&self, story: &Story) -> Result<AudioArtifact, PipelineError> {
        let text = story.text.trim();
        if text.is_empty() {
            return Err(PipelineError::Synthesis("nothing to speak".to_string()));
        }
        Ok(AudioArtifact::Directive(SpeechDirective {
            text: text.to_string(),
            voice: self.voice.clone(),
        }))
    }
}

/// Server-side narration that degrades to a browser directive.
///
/// A rejected token (HTTP 401) is not masked: the user has to fix it.
pub struct FallbackNarrator {
    primary: Box<dyn NarrationProvider>,
    fallback: BrowserNarrator,
    name: String,
}

impl FallbackNarrator {
    pub fn new(primary: Box<dyn NarrationProvider>, fallback: BrowserNarrator) -> Self {
        let name = format!("{}+{}", primary.name(), fallback.name());
        Self {
            primary,
            fallback,
            name,
        }
    }
}

#[async_trait]
impl NarrationProvider for FallbackNarrator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn narrate(&self, story: &Story) -> Result<AudioArtifact, PipelineError> {
        match self.primary.narrate(story).await {
            Ok(audio) => Ok(audio),
            Err(e) if e.status_code() == Some(401) => Err(e),
            Err(e) => {
                tracing::warn!("{} narration failed, handing story to the browser: {e}", self.primary.name());
                self.fallback.narrate(story).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    struct Failing(PipelineError);

    #[async_trait]
    impl NarrationProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn narrate(&self, _story: &Story) -> Result<AudioArtifact, PipelineError> {
            Err(self.0.clone())
        }
    }

    fn story() -> Story {
        Story::new("  A dog waited by the gate. ", "gpt2", 5)
    }

    #[tokio::test]
    async fn test_browser_directive_carries_voice() {
        let voice = VoiceParams {
            lang: "en-GB".to_string(),
            rate: 0.9,
            ..VoiceParams::default()
        };
        let artifact = BrowserNarrator::new(voice.clone())
            .narrate(&story())
            .await
            .unwrap();
        match artifact {
            AudioArtifact::Directive(d) => {
                assert_eq!(d.text, "A dog waited by the gate.");
                assert_eq!(d.voice, voice);
            }
            other => panic!("expected directive, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_browser_rejects_blank_story() {
        let err = BrowserNarrator::new(VoiceParams::default())
            .narrate(&Story::new(" ", "gpt2", 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "synthesis_error");
    }

    #[tokio::test]
    async fn test_fallback_on_synthesis_error() {
        let narrator = FallbackNarrator::new(
            Box::new(Failing(PipelineError::Synthesis("all models failed".into()))),
            BrowserNarrator::new(VoiceParams::default()),
        );
        assert_eq!(narrator.name(), "failing+browser");
        let artifact = narrator.narrate(&story()).await.unwrap();
        assert!(matches!(artifact, AudioArtifact::Directive(_)));
    }

    #[tokio::test]
    async fn test_no_fallback_on_unauthorized() {
        let narrator = FallbackNarrator::new(
            Box::new(Failing(PipelineError::ModelUnavailable {
                stage: Stage::Narration,
                message: "Invalid Hugging Face API token".into(),
                status_code: Some(401),
            })),
            BrowserNarrator::new(VoiceParams::default()),
        );
        let err = narrator.narrate(&story()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }
}
