//! Core data types passed between pipeline stages.
//!
//! The pipeline is linear: an [`ImagePayload`] becomes a [`Caption`], the
//! caption becomes a [`Story`], and the story becomes an [`AudioArtifact`].
//! None of these values are mutated once produced.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Image media types accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl MediaType {
    /// Parse a MIME type such as `image/png` or `image/jpeg; charset=binary`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Map a file extension (without the dot) to a media type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Infer the media type from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// The canonical MIME string.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// An uploaded image that passed validation.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    media_type: MediaType,
    width: u32,
    height: u32,
}

impl ImagePayload {
    /// Only the upload validator constructs payloads, so every payload is
    /// known to be a non-empty, decodable image.
    pub(crate) fn new(bytes: Vec<u8>, media_type: MediaType, width: u32, height: u32) -> Self {
        Self {
            bytes,
            media_type,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64-encoded image bytes.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type.mime(), self.to_base64())
    }
}

/// Short description of an image produced by the caption stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// Caption text
    pub text: String,
    /// Model identifier that produced the caption
    pub model: String,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

impl Caption {
    pub fn new(text: impl Into<String>, model: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            latency_ms,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when the caption has no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Narrative text expanded from a caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Story text
    pub text: String,
    /// Model identifier that produced the story
    pub model: String,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

impl Story {
    pub fn new(text: impl Into<String>, model: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            latency_ms,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when the story has no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Voice parameters for client-side speech synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceParams {
    /// BCP 47 language tag (e.g., "en-US")
    pub lang: String,
    /// Speaking rate, 1.0 is normal speed
    pub rate: f32,
    /// Pitch, 1.0 is the default pitch
    pub pitch: f32,
    /// Preferred voice name, if the client has it installed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            rate: 1.0,
            pitch: 1.0,
            voice_name: None,
        }
    }
}

/// Instruction for a client-side speech engine to speak the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechDirective {
    pub text: String,
    pub voice: VoiceParams,
}

/// Playable narration of a story.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioArtifact {
    /// Audio synthesized server-side by a TTS model.
    Audio {
        #[serde(skip)]
        bytes: Vec<u8>,
        media_type: String,
        model: String,
    },
    /// Synthesis delegated to the client.
    Directive(SpeechDirective),
}

impl AudioArtifact {
    /// True when there is nothing to play.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Audio { bytes, .. } => bytes.is_empty(),
            Self::Directive(directive) => directive.text.trim().is_empty(),
        }
    }

    /// Raw audio bytes, if synthesized server-side.
    pub fn audio_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Audio { bytes, .. } => Some(bytes),
            Self::Directive(_) => None,
        }
    }

    /// File extension matching the audio's media type.
    ///
    /// Unknown or missing types fall back to `wav`.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Audio { media_type, .. } => audio_extension(media_type),
            Self::Directive(_) => "wav",
        }
    }
}

fn audio_extension(media_type: &str) -> &'static str {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/webm" => "webm",
        "audio/aac" => "aac",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        _ => "wav",
    }
}

/// The three pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Caption,
    Story,
    Narration,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Caption, Stage::Story, Stage::Narration];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Caption => 0,
            Self::Story => 1,
            Self::Narration => 2,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Caption => "caption",
            Self::Story => "story",
            Self::Narration => "narration",
        };
        f.write_str(name)
    }
}

/// Progress of a single stage within a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StageState {
    #[default]
    NotStarted,
    Requested,
    Completed,
    Failed {
        message: String,
    },
}
