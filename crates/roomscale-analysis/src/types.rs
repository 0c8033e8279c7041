//! Shared types for the roomscale analysis contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sanitize::SafeSvg;

/// Image formats accepted for analysis.
///
/// The inference service accepts more formats than this, but the upload
/// zone only offers these three, so anything else is rejected before a
/// request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageMime {
    /// `image/png`
    #[serde(rename = "image/png")]
    Png,
    /// `image/jpeg`
    #[serde(rename = "image/jpeg")]
    Jpeg,
    /// `image/webp`
    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMime {
    /// All supported formats, in the order shown to the user.
    pub const ALL: [Self; 3] = [Self::Png, Self::Jpeg, Self::Webp];

    /// The MIME type string sent to the inference service.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    /// Parse a MIME type string such as `image/jpeg`.
    ///
    /// Matching is ASCII case-insensitive and ignores parameters
    /// (`image/png; charset=binary`). `image/jpg` is accepted as an
    /// alias some browsers still report.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("image/png") {
            Some(Self::Png)
        } else if essence.eq_ignore_ascii_case("image/jpeg")
            || essence.eq_ignore_ascii_case("image/jpg")
        {
            Some(Self::Jpeg)
        } else if essence.eq_ignore_ascii_case("image/webp") {
            Some(Self::Webp)
        } else {
            None
        }
    }

    /// Infer the format from a filename's extension.
    #[must_use]
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        if ext.eq_ignore_ascii_case("png") {
            Some(Self::Png)
        } else if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") {
            Some(Self::Jpeg)
        } else if ext.eq_ignore_ascii_case("webp") {
            Some(Self::Webp)
        } else {
            None
        }
    }

    /// Detect the format from the leading bytes of an image file.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Encoding`] if the bytes are empty, the
    /// format is unrecognized, or it is not PNG, JPEG, or WebP.
    pub fn sniff(bytes: &[u8]) -> Result<Self, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::Encoding("image file is empty".into()));
        }
        let format = image::guess_format(bytes)
            .map_err(|e| AnalysisError::Encoding(format!("unrecognized image data: {e}")))?;
        Self::from_format(format)
    }

    /// Determine the format of a named image file.
    ///
    /// The content decides. The extension of `name` is only consulted
    /// when the header is not a recognized image format at all; a file
    /// whose content is a known but unsupported format (a GIF renamed
    /// `room.jpg`) is rejected rather than relabelled.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Encoding`] if the file is empty, its
    /// content is an unsupported format, or neither content nor name
    /// identify a supported format.
    pub fn detect(name: &str, bytes: &[u8]) -> Result<Self, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::Encoding(format!("{name} is empty")));
        }
        match image::guess_format(bytes) {
            Ok(format) => Self::from_format(format),
            Err(_) => Self::from_filename(name)
                .ok_or_else(|| AnalysisError::Encoding(format!("unsupported file type: {name}"))),
        }
    }

    fn from_format(format: image::ImageFormat) -> Result<Self, AnalysisError> {
        match format {
            image::ImageFormat::Png => Ok(Self::Png),
            image::ImageFormat::Jpeg => Ok(Self::Jpeg),
            image::ImageFormat::WebP => Ok(Self::Webp),
            other => Err(AnalysisError::Encoding(format!(
                "unsupported image format: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded image ready to send to the inference service.
///
/// Built by [`crate::encode::encode_image`] and consumed exactly once by
/// an [`InferenceService`](crate::InferenceService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Standard-alphabet, padded base64 of the image bytes. Never
    /// carries a `data:` prefix.
    pub image_base64: String,
    /// Format of the encoded image.
    pub mime: ImageMime,
}

/// A single labeled dimension estimate, e.g. "Ceiling Height: ~8 feet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// What was measured.
    pub label: String,
    /// The estimate including units.
    pub estimate: String,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.estimate)
    }
}

/// The structured object the inference service is asked to return.
///
/// Field names follow the response schema (`annotatedImageSvg`), so this
/// type deserializes directly from the service's JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Estimates in display order. May be empty.
    pub dimensions: Vec<Dimension>,
    /// Overlay markup exactly as returned. Untrusted.
    pub annotated_image_svg: String,
}

/// A validated, sanitized analysis ready for display.
///
/// This is the only form the presentation layer accepts; the raw
/// [`AnalysisResult`] never reaches the render tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Estimates in display order.
    pub dimensions: Vec<Dimension>,
    /// Sanitized overlay in the normalized 0-100 coordinate space.
    pub overlay: SafeSvg,
}

/// Coarse classification of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The local image could not be read or encoded.
    Encoding,
    /// No credential was configured.
    Configuration,
    /// The inference service or the network failed.
    Service,
    /// The service response was malformed or incomplete.
    Parse,
}

/// Errors that can occur while analyzing an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The image file could not be read or is not a supported image.
    #[error("could not read image: {0}")]
    Encoding(String),

    /// The inference service credential is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network, authentication, rate-limit, or service-side failure.
    ///
    /// `status` is the HTTP status when the service answered at all.
    #[error("error analyzing image: {message}")]
    Service {
        /// HTTP status code, if a response was received.
        status: Option<u16>,
        /// Upstream message, passed through unchanged.
        message: String,
    },

    /// The response text was not the expected structured object.
    #[error("could not parse analysis response: {0}")]
    Parse(String),
}

impl AnalysisError {
    /// The taxonomy entry this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Service { .. } => ErrorKind::Service,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }
}
