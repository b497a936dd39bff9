//! OpenAI adapters.
//!
//! Captions and stories use the Chat Completions API (the image travels as a
//! data URL in the user message). Narration uses the speech endpoint.

use super::provider::{
    http_failure, request_failed, CaptionProvider, NarrationProvider, StoryProvider, StoryRequest,
    CAPTION_PROMPT,
};
use crate::error::PipelineError;
use crate::types::{AudioArtifact, Caption, ImagePayload, Stage, Story};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Shared HTTP client for the OpenAI API.
#[derive(Clone)]
pub struct OpenAiApi {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OpenAiApi {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/{}", self.endpoint, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(self.timeout)
    }

    /// Run a single-message chat completion and return the trimmed reply.
    async fn chat(
        &self,
        stage: Stage,
        model: &str,
        content: Vec<ChatContent>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<(String, String), PipelineError> {
        let body = ChatRequest {
            model: model.to_string(),
            max_tokens,
            temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
        };

        let resp = self
            .post("chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed(stage, "OpenAI", self.timeout, e))?;

        if !resp.status().is_success() {
            return Err(http_failure(stage, "OpenAI", resp).await);
        }

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| {
            PipelineError::unavailable(stage, format!("Failed to parse OpenAI response: {e}"))
        })?;

        let text = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PipelineError::unavailable(stage, "OpenAI returned no content")
            })?;

        Ok((text, chat_resp.model))
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Vision captioning via Chat Completions.
pub struct OpenAiCaptioner {
    api: OpenAiApi,
    model: String,
}

impl OpenAiCaptioner {
    pub fn new(api: OpenAiApi, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl CaptionProvider for OpenAiCaptioner {
    fn name(&self) -> &str {
        "openai"
    }

    async fn caption(&self, image: &ImagePayload) -> Result<Caption, PipelineError> {
        let start = Instant::now();
        let content = vec![
            ChatContent::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            },
            ChatContent::Text {
                text: CAPTION_PROMPT.to_string(),
            },
        ];
        let (text, model) = self
            .api
            .chat(Stage::Caption, &self.model, content, 60, 0.2)
            .await?;
        Ok(Caption::new(text, model, start.elapsed().as_millis() as u64))
    }
}

/// Story generation via Chat Completions.
pub struct OpenAiStoryteller {
    api: OpenAiApi,
    model: String,
}

impl OpenAiStoryteller {
    pub fn new(api: OpenAiApi, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl StoryProvider for OpenAiStoryteller {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &StoryRequest) -> Result<Story, PipelineError> {
        let start = Instant::now();
        let content = vec![ChatContent::Text {
            text: request.prompt.clone(),
        }];
        let (generated, model) = self
            .api
            .chat(
                Stage::Story,
                &self.model,
                content,
                request.max_length,
                request.temperature,
            )
            .await?;
        Ok(Story::new(
            request.extract_story(&generated),
            model,
            start.elapsed().as_millis() as u64,
        ))
    }
}

/// Server-side speech via the audio/speech endpoint.
pub struct OpenAiNarrator {
    api: OpenAiApi,
    model: String,
    voice: String,
}

impl OpenAiNarrator {
    pub fn new(api: OpenAiApi, model: &str, voice: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
            voice: voice.to_string(),
        }
    }
}

#[async_trait]
impl NarrationProvider for OpenAiNarrator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn narrate(&self, story: &Story) -> Result<AudioArtifact, PipelineError> {
        let body = SpeechRequest {
            model: &self.model,
            input: &story.text,
            voice: &self.voice,
            response_format: "wav",
        };

        let resp = self
            .api
            .post("audio/speech")
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed(Stage::Narration, "OpenAI", self.api.timeout, e))?;

        if !resp.status().is_success() {
            return Err(http_failure(Stage::Narration, "OpenAI", resp).await);
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| request_failed(Stage::Narration, "OpenAI", self.api.timeout, e))?;
        if bytes.is_empty() {
            return Err(PipelineError::Synthesis(format!(
                "{} returned no audio",
                self.model
            )));
        }

        Ok(AudioArtifact::Audio {
            bytes: bytes.to_vec(),
            media_type: "audio/wav".to_string(),
            model: self.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_content_serialization() {
        let content = vec![
            ChatContent::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,AQID".to_string(),
                },
            },
            ChatContent::Text {
                text: "describe".to_string(),
            },
        ];
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json[0]["type"], "image_url");
        assert_eq!(json[0]["image_url"]["url"], "data:image/png;base64,AQID");
        assert_eq!(json[1]["type"], "text");
        assert_eq!(json[1]["text"], "describe");
    }

    #[test]
    fn test_speech_request_serialization() {
        let json = serde_json::to_value(SpeechRequest {
            model: "tts-1",
            input: "Once upon a time",
            voice: "alloy",
            response_format: "wav",
        })
        .unwrap();
        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["voice"], "alloy");
        assert_eq!(json["response_format"], "wav");
    }

    #[test]
    fn test_chat_response_without_content_parses() {
        let body = r#"{"model": "gpt-4o-mini", "choices": [{"message": {"content": null}}]}"#;
        let resp: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(resp.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_model_unavailable() {
        let api = OpenAiApi::new("http://127.0.0.1:9/v1", "sk-test", Duration::from_millis(500));
        let storyteller = OpenAiStoryteller::new(api, "gpt-4o-mini");
        let request = StoryRequest {
            caption: "a dog".to_string(),
            intro: "Tell a story about".to_string(),
            prompt: "Tell a story about a dog".to_string(),
            max_length: 50,
            temperature: 0.5,
        };
        let err = storyteller.generate(&request).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ModelUnavailable {
                stage: Stage::Story,
                ..
            }
        ));
    }
}
