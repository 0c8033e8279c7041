//! Image encoding: raw bytes to a transport-safe base64 payload.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::types::{AnalysisError, AnalysisRequest, ImageMime};

/// Encode image bytes into an [`AnalysisRequest`].
///
/// The payload is standard-alphabet, padded base64 with no `data:`
/// framing.
///
/// # Errors
///
/// Returns [`AnalysisError::Encoding`] if `bytes` is empty.
pub fn encode_image(bytes: &[u8], mime: ImageMime) -> Result<AnalysisRequest, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::Encoding("image file is empty".into()));
    }
    Ok(AnalysisRequest {
        image_base64: STANDARD.encode(bytes),
        mime,
    })
}

/// Remove a `data:<mime>;base64,` prefix, if present.
///
/// Text without a prefix is returned unchanged.
#[must_use]
pub fn strip_data_url_prefix(text: &str) -> &str {
    if text.starts_with("data:")
        && let Some((_, payload)) = text.split_once(',')
    {
        payload
    } else {
        text
    }
}

impl AnalysisRequest {
    /// Build a request from a full data URL such as
    /// `data:image/png;base64,iVBORw0...`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Encoding`] if the text is not a base64
    /// data URL, the MIME type is unsupported, or the payload is empty
    /// or not valid base64.
    pub fn from_data_url(text: &str) -> Result<Self, AnalysisError> {
        let rest = text
            .strip_prefix("data:")
            .ok_or_else(|| AnalysisError::Encoding("not a data URL".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AnalysisError::Encoding("data URL has no payload".into()))?;
        let mime_str = header
            .strip_suffix(";base64")
            .ok_or_else(|| AnalysisError::Encoding("data URL is not base64-encoded".into()))?;
        let mime = ImageMime::from_mime(mime_str).ok_or_else(|| {
            AnalysisError::Encoding(format!("unsupported image type: {mime_str}"))
        })?;
        if payload.is_empty() {
            return Err(AnalysisError::Encoding("image file is empty".into()));
        }
        STANDARD
            .decode(payload)
            .map_err(|e| AnalysisError::Encoding(format!("invalid base64 payload: {e}")))?;
        Ok(Self {
            image_base64: payload.to_owned(),
            mime,
        })
    }

    /// Decode the payload back to raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Encoding`] if the payload is not valid
    /// base64.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, AnalysisError> {
        STANDARD
            .decode(&self.image_base64)
            .map_err(|e| AnalysisError::Encoding(format!("invalid base64 payload: {e}")))
    }

    /// Render the request back into a `data:` URL.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.image_base64)
    }
}
