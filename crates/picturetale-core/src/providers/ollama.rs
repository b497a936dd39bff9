//! Ollama adapters for local caption and story models.
//!
//! Talks to a local Ollama instance via its HTTP API.
//! No authentication required, just needs Ollama running locally.

use super::provider::{
    http_failure, request_failed, CaptionProvider, StoryProvider, StoryRequest, CAPTION_PROMPT,
};
use crate::error::PipelineError;
use crate::types::{Caption, ImagePayload, Stage, Story};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Shared HTTP client for a local Ollama server.
#[derive(Clone)]
pub struct OllamaApi {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaApi {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn generate(
        &self,
        stage: Stage,
        body: &OllamaRequest<'_>,
    ) -> Result<String, PipelineError> {
        let url = format!("{}/api/generate", self.endpoint);

        let resp = self
            .client
            .post(&url)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_failed(stage, "Ollama", self.timeout, e))?;

        if !resp.status().is_success() {
            return Err(http_failure(stage, "Ollama", resp).await);
        }

        let ollama_resp: OllamaResponse = resp.json().await.map_err(|e| {
            PipelineError::unavailable(stage, format!("Failed to parse Ollama response: {e}"))
        })?;

        let text = ollama_resp.response.trim().to_string();
        if text.is_empty() {
            return Err(PipelineError::unavailable(
                stage,
                "Ollama returned empty response, no content generated",
            ));
        }
        Ok(text)
    }
}

/// Ollama /api/generate request body.
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama /api/generate response.
#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Captioning with a local vision model.
pub struct OllamaCaptioner {
    api: OllamaApi,
    model: String,
}

impl OllamaCaptioner {
    pub fn new(api: OllamaApi, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl CaptionProvider for OllamaCaptioner {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn caption(&self, image: &ImagePayload) -> Result<Caption, PipelineError> {
        let start = Instant::now();
        let body = OllamaRequest {
            model: &self.model,
            prompt: CAPTION_PROMPT,
            images: vec![image.to_base64()],
            stream: false,
            options: OllamaOptions {
                temperature: 0.2,
                num_predict: 60,
            },
        };
        let text = self.api.generate(Stage::Caption, &body).await?;
        Ok(Caption::new(
            text,
            self.model.clone(),
            start.elapsed().as_millis() as u64,
        ))
    }
}

/// Story generation with a local text model.
pub struct OllamaStoryteller {
    api: OllamaApi,
    model: String,
}

impl OllamaStoryteller {
    pub fn new(api: OllamaApi, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl StoryProvider for OllamaStoryteller {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &StoryRequest) -> Result<Story, PipelineError> {
        let start = Instant::now();
        let body = OllamaRequest {
            model: &self.model,
            prompt: &request.prompt,
            images: Vec::new(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_length,
            },
        };
        let generated = self.api.generate(Stage::Story, &body).await?;
        Ok(Story::new(
            request.extract_story(&generated),
            self.model.clone(),
            start.elapsed().as_millis() as u64,
        ))
    }
}
