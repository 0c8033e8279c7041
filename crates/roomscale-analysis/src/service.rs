//! The inference service seam and the analysis pipeline driver.
//!
//! # Strategy pattern
//!
//! [`InferenceService`] is the one operation the core needs from the
//! outside world: turn an encoded image into response text. The HTTP
//! client lives in `roomscale-client`; tests substitute in-memory
//! services. [`analyze`] sequences the stages around it.

use crate::encode::encode_image;
use crate::parse::parse_response;
use crate::sanitize::sanitize_overlay;
use crate::session::AnalysisTicket;
use crate::types::{Analysis, AnalysisError, AnalysisRequest, ImageMime};

/// A service that runs one multimodal inference request.
///
/// Implementations send the fixed instruction
/// ([`crate::prompt::INSTRUCTION`]) and the image, constrain the output
/// to [`crate::prompt::response_schema`], and return the raw response
/// text. They must not retry.
// Futures are not `Send` on wasm32, so the trait is used with static
// dispatch only.
#[allow(async_fn_in_trait)]
pub trait InferenceService {
    /// Send one request and return the raw response text.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Service`] for transport or service-side
    /// failures.
    async fn generate(&self, request: &AnalysisRequest) -> Result<String, AnalysisError>;
}

impl<S: InferenceService + ?Sized> InferenceService for &S {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        (**self).generate(request).await
    }
}

/// Run the full analysis pipeline on raw image bytes.
///
/// # Pipeline steps
///
/// 1. Encode the bytes as base64
/// 2. Send one request to the inference service
/// 3. Parse and validate the response
/// 4. Sanitize the overlay markup
///
/// Each step completes before the next begins.
///
/// # Errors
///
/// Returns the first error raised by any step: [`AnalysisError::Encoding`],
/// [`AnalysisError::Service`], or [`AnalysisError::Parse`].
pub async fn analyze<S: InferenceService>(
    service: &S,
    bytes: &[u8],
    mime: ImageMime,
) -> Result<Analysis, AnalysisError> {
    // 1. Encode.
    let request = encode_image(bytes, mime)?;
    tracing::debug!(mime = %mime, encoded_len = request.image_base64.len(), "image encoded");

    // 2. Inference.
    let text = service.generate(&request).await?;
    tracing::debug!(response_len = text.len(), "response received");

    // 3. Parse.
    let result = parse_response(&text)?;

    // 4. Sanitize.
    let overlay = sanitize_overlay(&result.annotated_image_svg)?;

    tracing::info!(dimensions = result.dimensions.len(), "analysis complete");
    Ok(Analysis {
        dimensions: result.dimensions,
        overlay,
    })
}

/// Run the pipeline for a ticket handed out by
/// [`Session::begin_analysis`](crate::Session::begin_analysis).
///
/// # Errors
///
/// See [`analyze`].
pub async fn analyze_ticket<S: InferenceService>(
    service: &S,
    ticket: &AnalysisTicket,
) -> Result<Analysis, AnalysisError> {
    analyze(service, ticket.bytes(), ticket.mime()).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    /// Returns a fixed response and records every request.
    struct Canned {
        response: Result<String, AnalysisError>,
        calls: Cell<usize>,
        last: RefCell<Option<AnalysisRequest>>,
    }

    impl Canned {
        fn new(response: Result<&str, AnalysisError>) -> Self {
            Self {
                response: response.map(str::to_owned),
                calls: Cell::new(0),
                last: RefCell::new(None),
            }
        }
    }

    impl InferenceService for Canned {
        async fn generate(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
            self.calls.set(self.calls.get() + 1);
            *self.last.borrow_mut() = Some(request.clone());
            self.response.clone()
        }
    }

    const SCENARIO: &str = r#"{"dimensions":[{"label":"Ceiling Height","estimate":"~8 feet"}],"annotatedImageSvg":"<line x1=\"10\" y1=\"5\" x2=\"10\" y2=\"95\" stroke=\"yellow\" stroke-dasharray=\"1,1\"/>"}"#;

    #[tokio::test]
    async fn analyze_scenario_response() {
        let service = Canned::new(Ok(SCENARIO));
        let analysis = analyze(&service, b"jpeg bytes", ImageMime::Jpeg).await.unwrap();
        assert_eq!(analysis.dimensions.len(), 1);
        assert_eq!(analysis.dimensions[0].to_string(), "Ceiling Height: ~8 feet");
        assert!(analysis.overlay.as_str().contains("<line"));
        assert_eq!(service.calls.get(), 1);
    }

    #[tokio::test]
    async fn analyze_sends_encoded_image() {
        let service = Canned::new(Ok(SCENARIO));
        analyze(&service, b"room", ImageMime::Png).await.unwrap();
        let sent = service.last.borrow().clone().unwrap();
        assert_eq!(sent.image_base64, "cm9vbQ==");
        assert_eq!(sent.mime, ImageMime::Png);
    }

    #[tokio::test]
    async fn analyze_empty_image_skips_service() {
        let service = Canned::new(Ok(SCENARIO));
        let result = analyze(&service, &[], ImageMime::Png).await;
        assert!(matches!(result, Err(AnalysisError::Encoding(_))));
        assert_eq!(service.calls.get(), 0);
    }

    #[tokio::test]
    async fn analyze_passes_service_error_through() {
        let service = Canned::new(Err(AnalysisError::Service {
            status: Some(503),
            message: "The model is overloaded".into(),
        }));
        let result = analyze(&service, b"x", ImageMime::Jpeg).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "error analyzing image: The model is overloaded"
        );
    }

    #[tokio::test]
    async fn analyze_non_json_response() {
        let service = Canned::new(Ok("Here are the dimensions of your room!"));
        let result = analyze(&service, b"x", ImageMime::Jpeg).await;
        assert!(matches!(result, Err(AnalysisError::Parse(_))));
    }

    #[tokio::test]
    async fn analyze_malformed_overlay() {
        let service = Canned::new(Ok(r#"{"dimensions":[],"annotatedImageSvg":"<g><line>"}"#));
        let result = analyze(&service, b"x", ImageMime::Jpeg).await;
        assert!(matches!(result, Err(AnalysisError::Parse(_))));
    }

    #[tokio::test]
    async fn analyze_through_reference_service() {
        let service = Canned::new(Ok(SCENARIO));
        let by_ref = &service;
        analyze(&by_ref, b"x", ImageMime::Jpeg).await.unwrap();
        assert_eq!(service.calls.get(), 1);
    }
}
