//! Image adapter: turns an uploaded file into the payload sent to the model.
//!
//! Only JPEG and PNG are accepted. The adapter checks the declared media type,
//! the size limit, and the file's magic bytes, then hands back the bytes
//! untouched.

use std::path::Path;

use base64::Engine;

use crate::config::LimitsConfig;
use crate::error::{AnalysisError, CalorError};

/// Image formats the analysis backend is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMediaType {
    Jpeg,
    Png,
}

impl ImageMediaType {
    /// Parse a declared media type such as `image/jpeg` or `image/png; q=1`.
    pub fn parse(declared: &str) -> Option<Self> {
        let essence = declared.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Guess the media type from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Canonical MIME string.
    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    fn matches_header(&self, bytes: &[u8]) -> bool {
        match self {
            // FF D8 FF
            Self::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
            // 89 50 4E 47
            Self::Png => bytes.starts_with(&[0x89, b'P', b'N', b'G']),
        }
    }
}

/// A file as received from the user.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    data: Vec<u8>,
    media_type: String,
    file_name: Option<String>,
}

impl UploadedImage {
    pub fn new(data: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
            file_name: None,
        }
    }

    /// Attach the client-side file name (used for logging only).
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Read an image from disk, deriving the media type from its extension.
    pub async fn from_path(path: &Path) -> Result<Self, CalorError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let media_type =
            ImageMediaType::from_extension(ext).ok_or_else(|| {
                AnalysisError::UnsupportedMediaType {
                    media_type: format!("file extension '.{ext}'"),
                }
            })?;

        let data = tokio::fs::read(path).await?;
        let mut upload = Self::new(data, media_type.as_mime());
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            upload = upload.with_file_name(name);
        }
        Ok(upload)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One image entry of a multimodal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    /// MIME type, e.g. "image/jpeg"
    pub media_type: String,
    /// Raw image bytes
    pub data: Vec<u8>,
}

impl ImagePart {
    /// Base64 encoding of the bytes, as inline request data expects.
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Build the image payload for one analysis.
///
/// Returns exactly one [`ImagePart`]. A missing or empty upload yields
/// [`AnalysisError::MissingImage`] and nothing else is checked.
pub fn prepare(
    upload: Option<UploadedImage>,
    limits: &LimitsConfig,
) -> Result<Vec<ImagePart>, AnalysisError> {
    let upload = match upload {
        Some(upload) if !upload.is_empty() => upload,
        _ => return Err(AnalysisError::MissingImage),
    };

    let media_type = ImageMediaType::parse(&upload.media_type).ok_or_else(|| {
        AnalysisError::UnsupportedMediaType {
            media_type: upload.media_type.clone(),
        }
    })?;

    if upload.len() > limits.max_file_size_bytes() {
        return Err(AnalysisError::ImageTooLarge {
            size_bytes: upload.len(),
            max_mb: limits.max_file_size_mb,
        });
    }

    if !media_type.matches_header(&upload.data) {
        return Err(AnalysisError::InvalidImage {
            message: format!("content is not a valid {} file", media_type.as_mime()),
        });
    }

    // Aliases like image/jpg go out under the canonical name
    let media_type = media_type.as_mime().to_string();

    tracing::debug!(
        file = upload.file_name().unwrap_or("<unnamed>"),
        media_type = %media_type,
        size = upload.len(),
        "Prepared image payload"
    );

    Ok(vec![ImagePart {
        media_type,
        data: upload.data,
    }])
}
