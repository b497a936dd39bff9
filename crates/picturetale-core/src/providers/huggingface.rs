//! Hugging Face Inference API adapters.
//!
//! All three stages talk to `POST {endpoint}/models/{model}`:
//! - captioning sends raw image bytes,
//! - text generation sends `{"inputs", "parameters"}`,
//! - text-to-speech sends `{"inputs"}` and receives audio bytes.
//!
//! Narration walks an ordered list of TTS models because hosted TTS models
//! are frequently cold (503) or withdrawn (404).

use super::provider::{
    http_failure, request_failed, CaptionProvider, NarrationProvider, StoryProvider, StoryRequest,
};
use crate::config::TtsModelConfig;
use crate::error::PipelineError;
use crate::types::{AudioArtifact, Caption, ImagePayload, Stage, Story};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Bodies at least this large are accepted as audio even without an
/// `audio/*` content type.
const MIN_UNLABELED_AUDIO_BYTES: usize = 1000;

/// Shared HTTP client for the Inference API.
#[derive(Clone)]
pub struct HuggingFaceApi {
    endpoint: String,
    token: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HuggingFaceApi {
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.endpoint, model)
    }

    fn post(&self, model: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.model_url(model))
            .header("Authorization", format!("Bearer {}", self.token))
            .timeout(self.timeout)
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

/// Inference API answers either a list or a single object.
#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratedBody {
    List(Vec<Generated>),
    Single(Generated),
}

/// Extract `generated_text` from an Inference API JSON body.
fn parse_generated_text(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<GeneratedBody>(body).ok()? {
        GeneratedBody::List(items) => items.into_iter().next().map(|g| g.generated_text),
        GeneratedBody::Single(g) => Some(g.generated_text),
    }
}

// --- Caption ---

/// Image-to-text via the Inference API.
pub struct HuggingFaceCaptioner {
    api: HuggingFaceApi,
    model: String,
}

impl HuggingFaceCaptioner {
    pub fn new(api: HuggingFaceApi, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl CaptionProvider for HuggingFaceCaptioner {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn caption(&self, image: &ImagePayload) -> Result<Caption, PipelineError> {
        let start = Instant::now();

        let resp = self
            .api
            .post(&self.model)
            .header("Content-Type", image.media_type().mime())
            .body(image.bytes().to_vec())
            .send()
            .await
            .map_err(|e| request_failed(Stage::Caption, "Hugging Face", self.api.timeout, e))?;

        if !resp.status().is_success() {
            return Err(http_failure(Stage::Caption, "Hugging Face", resp).await);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| request_failed(Stage::Caption, "Hugging Face", self.api.timeout, e))?;
        let text = parse_generated_text(&body).ok_or_else(|| {
            PipelineError::unavailable(
                Stage::Caption,
                "Failed to parse Hugging Face caption response",
            )
        })?;

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(PipelineError::unavailable(
                Stage::Caption,
                format!("{} returned an empty caption", self.model),
            ));
        }

        Ok(Caption::new(
            text,
            self.model.clone(),
            start.elapsed().as_millis() as u64,
        ))
    }
}

// --- Story ---

#[derive(Serialize)]
struct TextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: TextGenerationParameters,
}

#[derive(Serialize)]
struct TextGenerationParameters {
    max_length: u32,
    temperature: f32,
    return_full_text: bool,
}

/// Text generation via the Inference API.
pub struct HuggingFaceStoryteller {
    api: HuggingFaceApi,
    model: String,
}

impl HuggingFaceStoryteller {
    pub fn new(api: HuggingFaceApi, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl StoryProvider for HuggingFaceStoryteller {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn generate(&self, request: &StoryRequest) -> Result<Story, PipelineError> {
        let start = Instant::now();

        let body = TextGenerationRequest {
            inputs: &request.prompt,
            parameters: TextGenerationParameters {
                max_length: request.max_length,
                temperature: request.temperature,
                return_full_text: true,
            },
        };

        let resp = self
            .api
            .post(&self.model)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed(Stage::Story, "Hugging Face", self.api.timeout, e))?;

        if !resp.status().is_success() {
            return Err(http_failure(Stage::Story, "Hugging Face", resp).await);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| request_failed(Stage::Story, "Hugging Face", self.api.timeout, e))?;
        let generated = parse_generated_text(&body).ok_or_else(|| {
            PipelineError::unavailable(Stage::Story, "Failed to parse Hugging Face story response")
        })?;

        let text = request.extract_story(&generated);
        if text.is_empty() {
            return Err(PipelineError::unavailable(
                Stage::Story,
                format!("{} returned an empty story", self.model),
            ));
        }

        Ok(Story::new(
            text,
            self.model.clone(),
            start.elapsed().as_millis() as u64,
        ))
    }
}

// --- Narration ---

#[derive(Serialize)]
struct TtsRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a serde_json::Value>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// What a single TTS model answered.
#[derive(Debug, PartialEq)]
enum TtsOutcome {
    /// Playable audio with its media type.
    Audio(String),
    /// The token was refused; no other model will accept it either.
    Unauthorized,
    /// This model could not help; try the next one.
    Rejected(String),
}

/// Classify a TTS response by status, content type, and body.
fn classify_tts_response(status: u16, content_type: &str, body: &[u8]) -> TtsOutcome {
    match status {
        200 => {
            if content_type.contains("audio") || body.len() > MIN_UNLABELED_AUDIO_BYTES {
                let media_type = if content_type.starts_with("audio/") {
                    content_type.to_string()
                } else {
                    "audio/wav".to_string()
                };
                TtsOutcome::Audio(media_type)
            } else if let Ok(err) = serde_json::from_slice::<ErrorBody>(body) {
                TtsOutcome::Rejected(err.error)
            } else {
                TtsOutcome::Rejected(format!("response was not audio ({} bytes)", body.len()))
            }
        }
        401 => TtsOutcome::Unauthorized,
        404 => TtsOutcome::Rejected("model not found".to_string()),
        503 => TtsOutcome::Rejected("model loading".to_string()),
        other => TtsOutcome::Rejected(format!("HTTP {other}")),
    }
}

/// Text-to-speech over an ordered chain of Inference API models.
pub struct HuggingFaceNarrator {
    api: HuggingFaceApi,
    models: Vec<TtsModelConfig>,
}

impl HuggingFaceNarrator {
    pub fn new(api: HuggingFaceApi, models: Vec<TtsModelConfig>) -> Self {
        Self { api, models }
    }
}

#[async_trait]
impl NarrationProvider for HuggingFaceNarrator {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn narrate(&self, story: &Story) -> Result<AudioArtifact, PipelineError> {
        let total = self.models.len();
        let mut failures = Vec::with_capacity(total);
        let mut any_answered = false;

        for (i, model) in self.models.iter().enumerate() {
            tracing::info!("Trying TTS model {}/{}: {}", i + 1, total, model.name);

            let body = TtsRequest {
                inputs: &story.text,
                parameters: model.parameters.as_ref(),
            };

            let resp = match self.api.post(&model.name).json(&body).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    let err = request_failed(Stage::Narration, &model.name, self.api.timeout, e);
                    tracing::warn!("{err}");
                    failures.push(format!("{}: {err}", model.name));
                    continue;
                }
            };

            let status = resp.status().as_u16();
            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            let bytes = match resp.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err = request_failed(Stage::Narration, &model.name, self.api.timeout, e);
                    tracing::warn!("{err}");
                    failures.push(format!("{}: {err}", model.name));
                    continue;
                }
            };
            any_answered = true;

            match classify_tts_response(status, &content_type, &bytes) {
                TtsOutcome::Audio(media_type) => {
                    tracing::info!("Audio generated using {} ({} bytes)", model.name, bytes.len());
                    return Ok(AudioArtifact::Audio {
                        bytes: bytes.to_vec(),
                        media_type,
                        model: model.name.clone(),
                    });
                }
                TtsOutcome::Unauthorized => {
                    return Err(PipelineError::ModelUnavailable {
                        stage: Stage::Narration,
                        message: "Invalid Hugging Face API token".to_string(),
                        status_code: Some(401),
                    });
                }
                TtsOutcome::Rejected(reason) => {
                    tracing::warn!("TTS model {}: {reason}", model.name);
                    failures.push(format!("{}: {reason}", model.name));
                }
            }
        }

        let summary = format!("all {total} TTS models failed: {}", failures.join("; "));
        if any_answered {
            Err(PipelineError::Synthesis(summary))
        } else {
            Err(PipelineError::unavailable(Stage::Narration, summary))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generated_text_list() {
        let body = br#"[{"generated_text": "a dog sitting on grass"}]"#;
        assert_eq!(
            parse_generated_text(body),
            Some("a dog sitting on grass".to_string())
        );
    }

    #[test]
    fn test_parse_generated_text_object() {
        let body = br#"{"generated_text": "a cat on a sofa"}"#;
        assert_eq!(parse_generated_text(body), Some("a cat on a sofa".to_string()));
    }

    #[test]
    fn test_parse_generated_text_rejects_other_shapes() {
        assert_eq!(parse_generated_text(br#"[]"#), None);
        assert_eq!(parse_generated_text(br#"{"error": "loading"}"#), None);
        assert_eq!(parse_generated_text(b"not json"), None);
    }

    #[test]
    fn test_classify_labeled_audio() {
        let outcome = classify_tts_response(200, "audio/flac", &[0u8; 10]);
        assert_eq!(outcome, TtsOutcome::Audio("audio/flac".to_string()));
    }

    #[test]
    fn test_classify_large_unlabeled_body_as_wav() {
        let outcome = classify_tts_response(200, "application/octet-stream", &[0u8; 4096]);
        assert_eq!(outcome, TtsOutcome::Audio("audio/wav".to_string()));
    }

    #[test]
    fn test_classify_json_error_body() {
        let body = br#"{"error": "Model is currently loading"}"#;
        let outcome = classify_tts_response(200, "application/json", body);
        assert_eq!(
            outcome,
            TtsOutcome::Rejected("Model is currently loading".to_string())
        );
    }

    #[test]
    fn test_classify_status_codes() {
        assert_eq!(classify_tts_response(401, "", b""), TtsOutcome::Unauthorized);
        assert_eq!(
            classify_tts_response(404, "", b""),
            TtsOutcome::Rejected("model not found".to_string())
        );
        assert_eq!(
            classify_tts_response(503, "", b""),
            TtsOutcome::Rejected("model loading".to_string())
        );
        assert_eq!(
            classify_tts_response(500, "", b""),
            TtsOutcome::Rejected("HTTP 500".to_string())
        );
    }

    #[test]
    fn test_tts_request_includes_parameters_only_when_set() {
        let params = serde_json::json!({"length_scale": 1.0});
        let with = serde_json::to_value(TtsRequest {
            inputs: "hi",
            parameters: Some(&params),
        })
        .unwrap();
        assert_eq!(with["parameters"]["length_scale"], 1.0);

        let without = serde_json::to_value(TtsRequest {
            inputs: "hi",
            parameters: None,
        })
        .unwrap();
        assert!(without.get("parameters").is_none());
    }

    #[test]
    fn test_model_url() {
        let api = HuggingFaceApi::new(
            "https://api-inference.huggingface.co/",
            "hf_x",
            Duration::from_secs(1),
        );
        assert_eq!(
            api.model_url("Salesforce/blip-image-captioning-base"),
            "https://api-inference.huggingface.co/models/Salesforce/blip-image-captioning-base"
        );
    }

    #[tokio::test]
    async fn test_narrator_unreachable_endpoint_is_model_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments.
        let api = HuggingFaceApi::new("http://127.0.0.1:9", "hf_x", Duration::from_millis(500));
        let narrator = HuggingFaceNarrator::new(
            api,
            vec![
                TtsModelConfig::new("a/first"),
                TtsModelConfig::new("b/second"),
            ],
        );
        let story = Story::new("Once upon a time.", "gpt2", 1);
        let err = narrator.narrate(&story).await.unwrap_err();
        match err {
            PipelineError::ModelUnavailable { stage, message, .. } => {
                assert_eq!(stage, Stage::Narration);
                assert!(message.contains("all 2 TTS models failed"), "got: {message}");
                assert!(message.contains("a/first"));
                assert!(message.contains("b/second"));
            }
            other => panic!("expected ModelUnavailable, got {other:?}"),
        }
    }
}
