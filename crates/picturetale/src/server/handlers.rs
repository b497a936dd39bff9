//! Route handlers for the web UI and its JSON API.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use picturetale_core::{AudioArtifact, Caption, PipelineError, Story};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ApiState};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Filename stem offered for the narration download.
const AUDIO_FILE_STEM: &str = "story_audio";

#[derive(Debug, Default, Deserialize)]
struct StoryBody {
    caption: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NarrationBody {
    story: Option<String>,
}

/// Parse an optional JSON body; an empty body yields the default.
fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

/// Single-page UI.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Accept an uploaded image and caption it.
///
/// Bodies over the router's length limit never reach the validator; they are
/// reported as invalid input like any other oversize upload.
pub async fn upload_image(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map_err(upload_rejection)?;
    let media_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let mut session = state.session.lock().await;
    let caption = session.submit_image(body.to_vec(), media_type).await?;

    Ok(Json(json!({
        "caption": caption.text,
        "model": caption.model,
        "latency_ms": caption.latency_ms,
    })))
}

fn upload_rejection(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::Pipeline(PipelineError::InvalidInput(
            "upload too large: request body exceeds the upload limit".to_string(),
        ))
    } else {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Expand the posted caption, or the held one, into a story.
pub async fn generate_story(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: StoryBody = optional_json(&body)?;

    let mut session = state.session.lock().await;
    let story = match request.caption {
        Some(text) => session.expand_to_story(&Caption::new(text, "client", 0)).await?,
        None => session.expand_current_caption().await?,
    };

    Ok(Json(json!({
        "story": story.text,
        "model": story.model,
        "latency_ms": story.latency_ms,
    })))
}

/// Narrate the posted story, or the held one.
///
/// Server-side audio is returned as raw bytes; a speech directive as JSON.
pub async fn narrate(State(state): State<ApiState>, body: Bytes) -> Result<Response, ApiError> {
    let request: NarrationBody = optional_json(&body)?;

    let mut session = state.session.lock().await;
    let artifact = match request.story {
        Some(text) => session.narrate(&Story::new(text, "client", 0)).await?,
        None => session.narrate_current_story().await?,
    };

    Ok(match artifact {
        AudioArtifact::Audio {
            bytes, media_type, ..
        } => ([(header::CONTENT_TYPE, media_type)], bytes).into_response(),
        directive @ AudioArtifact::Directive(_) => Json(directive).into_response(),
    })
}

/// Stage states and held text for the current interaction.
pub async fn session_snapshot(State(state): State<ApiState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    Json(session.snapshot())
}

/// Download the last synthesized audio.
pub async fn download_audio(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let session = state.session.lock().await;
    match session.audio() {
        Some(
            artifact @ AudioArtifact::Audio {
                bytes, media_type, ..
            },
        ) => Ok((
            [
                (header::CONTENT_TYPE, media_type.clone()),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{AUDIO_FILE_STEM}.{}\"",
                        artifact.file_extension()
                    ),
                ),
            ],
            bytes.clone(),
        )
            .into_response()),
        _ => Err(ApiError::NotFound("no synthesized audio yet".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{ImageFormat, RgbImage};
    use picturetale_core::{
        CaptionProvider, Config, ImagePayload, NarrationProvider, Pipeline, PipelineError,
        Session, SpeechDirective, StoryProvider, StoryRequest, VoiceParams,
    };
    use std::io::Cursor;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FixedCaption {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl CaptionProvider for FixedCaption {
        fn name(&self) -> &str {
            "mock"
        }

        async fn caption(&self, _image: &ImagePayload) -> Result<Caption, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Caption::new("a dog sitting on grass", "mock-caption", 3))
        }
    }

    struct EchoStory;

    #[async_trait]
    impl StoryProvider for EchoStory {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(&self, request: &StoryRequest) -> Result<Story, PipelineError> {
            Ok(Story::new(
                format!(
                    "{}. The dog watched the clouds drift by. Then it ran home.",
                    request.caption
                ),
                "mock-story",
                5,
            ))
        }
    }

    struct WavNarrator;

    #[async_trait]
    impl NarrationProvider for WavNarrator {
        fn name(&self) -> &str {
            "mock"
        }

        async fn narrate(&self, _story: &Story) -> Result<AudioArtifact, PipelineError> {
            Ok(AudioArtifact::Audio {
                bytes: b"RIFF\0\0\0\0WAVEfmt ".to_vec(),
                media_type: "audio/wav".to_string(),
                model: "mock-tts".to_string(),
            })
        }
    }

    struct SpeakInBrowser;

    #[async_trait]
    impl NarrationProvider for SpeakInBrowser {
        fn name(&self) -> &str {
            "mock"
        }

        async fn narrate(&self, story: &Story) -> Result<AudioArtifact, PipelineError> {
            Ok(AudioArtifact::Directive(SpeechDirective {
                text: story.text.clone(),
                voice: VoiceParams::default(),
            }))
        }
    }

    fn state_with(narration: Arc<dyn NarrationProvider>) -> (ApiState, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let pipeline = Pipeline::new(
            &Config::default(),
            Arc::new(FixedCaption {
                calls: calls.clone(),
            }),
            Arc::new(EchoStory),
            narration,
        );
        let session = Session::new(Arc::new(pipeline));
        (ApiState::new(session), calls)
    }

    fn png_bytes() -> Bytes {
        let mut out = Cursor::new(Vec::new());
        RgbImage::new(8, 8)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        Bytes::from(out.into_inner())
    }

    fn png_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "image/png".parse().unwrap());
        headers
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_full_interaction() {
        let (state, _) = state_with(Arc::new(WavNarrator));

        let Json(caption) = upload_image(State(state.clone()), png_headers(), Ok(png_bytes()))
            .await
            .unwrap();
        assert_eq!(caption["caption"], "a dog sitting on grass");

        let Json(story) = generate_story(State(state.clone()), Bytes::new())
            .await
            .unwrap();
        let story_text = story["story"].as_str().unwrap();
        assert!(story_text.contains("dog"));
        assert!(story_text.len() >= "a dog sitting on grass".len());

        let response = narrate(State(state.clone()), Bytes::new()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");

        let download = download_audio(State(state.clone())).await.unwrap();
        assert_eq!(
            download.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"story_audio.wav\""
        );
        let bytes = axum::body::to_bytes(download.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"RIFF"));

        let snapshot = json_body(session_snapshot(State(state)).await.into_response()).await;
        assert_eq!(snapshot["caption_state"]["state"], "completed");
        assert_eq!(snapshot["story_state"]["state"], "completed");
        assert_eq!(snapshot["narration_state"]["state"], "completed");
        assert_eq!(snapshot["audio"]["kind"], "audio");
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected_without_captioning() {
        let (state, calls) = state_with(Arc::new(WavNarrator));

        let err = upload_image(State(state), png_headers(), Ok(Bytes::new()))
            .await
            .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["kind"], "invalid_input");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_story_without_caption() {
        let (state, _) = state_with(Arc::new(WavNarrator));

        let err = generate_story(State(state), Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_story_from_posted_caption() {
        let (state, calls) = state_with(Arc::new(WavNarrator));

        let body = Bytes::from_static(br#"{"caption": "a cat on a windowsill"}"#);
        let Json(story) = generate_story(State(state), body).await.unwrap();
        assert!(story["story"]
            .as_str()
            .unwrap()
            .starts_with("a cat on a windowsill"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let (state, _) = state_with(Arc::new(WavNarrator));

        let err = generate_story(State(state), Bytes::from_static(b"{not json"))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversize_upload_is_invalid_input() {
        let (state, calls) = state_with(Arc::new(WavNarrator));
        let router = crate::server::create_router(state, 1024);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { axum::serve(listener, router).await });

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/api/image"))
            .header("Content-Type", "image/png")
            .body(vec![0u8; 4096])
            .send()
            .await
            .unwrap();
        let status = response.status();
        let body: Value = response.json().await.unwrap();
        server.abort();

        assert_eq!(status.as_u16(), 400);
        assert_eq!(body["kind"], "invalid_input");
        assert!(body["error"].as_str().unwrap().contains("upload too large"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    struct FlacNarrator;

    #[async_trait]
    impl NarrationProvider for FlacNarrator {
        fn name(&self) -> &str {
            "mock"
        }

        async fn narrate(&self, _story: &Story) -> Result<AudioArtifact, PipelineError> {
            Ok(AudioArtifact::Audio {
                bytes: b"fLaC\0\0\0\x22".to_vec(),
                media_type: "audio/flac".to_string(),
                model: "mock-tts".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_download_name_follows_media_type() {
        let (state, _) = state_with(Arc::new(FlacNarrator));

        let body = Bytes::from_static(br#"{"story": "Once upon a time."}"#);
        narrate(State(state.clone()), body).await.unwrap();

        let download = download_audio(State(state)).await.unwrap();
        assert_eq!(download.headers()[header::CONTENT_TYPE], "audio/flac");
        assert_eq!(
            download.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"story_audio.flac\""
        );
    }

    #[tokio::test]
    async fn test_directive_narration_is_json() {
        let (state, _) = state_with(Arc::new(SpeakInBrowser));

        let body = Bytes::from_static(br#"{"story": "Once upon a time."}"#);
        let response = narrate(State(state.clone()), body).await.unwrap();
        let directive = json_body(response).await;
        assert_eq!(directive["kind"], "directive");
        assert_eq!(directive["text"], "Once upon a time.");
        assert_eq!(directive["voice"]["lang"], "en-US");

        // Nothing to download when the client speaks the story
        let err = download_audio(State(state)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
