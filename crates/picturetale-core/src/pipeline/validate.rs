//! Upload validation before any provider is called.

use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::types::{ImagePayload, MediaType};

/// Validates uploaded bytes and turns them into an [`ImagePayload`].
#[derive(Debug, Clone)]
pub struct UploadValidator {
    limits: LimitsConfig,
}

impl UploadValidator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Validate an upload.
    ///
    /// Checks, in order:
    /// - bytes are non-empty
    /// - declared media type is a supported image type
    /// - size is within limits
    /// - content starts with a known image signature
    /// - image dimensions are within limits
    ///
    /// When the declared type disagrees with the content, the content wins.
    pub fn validate(&self, bytes: Vec<u8>, media_type: &str) -> Result<ImagePayload, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::InvalidInput("upload is empty".to_string()));
        }

        let declared = MediaType::from_mime(media_type).ok_or_else(|| {
            PipelineError::InvalidInput(format!(
                "unsupported media type '{media_type}' (expected JPEG, PNG, WebP or GIF)"
            ))
        })?;

        let max_bytes = self.limits.max_upload_bytes();
        if bytes.len() > max_bytes {
            return Err(PipelineError::InvalidInput(format!(
                "upload too large: {}MB > {}MB",
                bytes.len() / (1024 * 1024),
                self.limits.max_upload_mb
            )));
        }

        let detected = detect_format(&bytes).ok_or_else(|| {
            PipelineError::InvalidInput(
                "unrecognized image format (invalid magic bytes)".to_string(),
            )
        })?;
        if detected != declared {
            tracing::warn!("Upload declared as {declared} but content is {detected}, using {detected}");
        }

        let (width, height) = read_dimensions(&bytes)?;
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::InvalidInput(format!(
                "image too large: {width}x{height} > {max_dim}"
            )));
        }

        Ok(ImagePayload::new(bytes, detected, width, height))
    }
}

/// Identify the image format from its leading bytes.
pub fn detect_format(bytes: &[u8]) -> Option<MediaType> {
    if bytes.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
        return Some(MediaType::Jpeg);
    }

    // PNG: 89 50 4E 47
    if bytes[0] == 0x89 && bytes[1] == b'P' && bytes[2] == b'N' && bytes[3] == b'G' {
        return Some(MediaType::Png);
    }

    // GIF: GIF8
    if bytes.starts_with(b"GIF8") {
        return Some(MediaType::Gif);
    }

    // WebP: RIFF....WEBP
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some(MediaType::Webp);
    }

    None
}

fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32), PipelineError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::InvalidInput(format!("cannot read image: {e}")))?
        .into_dimensions()
        .map_err(|e| PipelineError::InvalidInput(format!("cannot read image header: {e}")))
}
