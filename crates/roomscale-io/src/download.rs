//! Saving the annotated export.
//!
//! The export is handed to the browser as an [`ObjectUrl`] and saved by
//! clicking a detached `<a download>` pointing at it.

use wasm_bindgen::JsCast;
use web_sys::HtmlAnchorElement;

use crate::object_url::{BrowserError, ObjectUrl};

/// MIME type of the annotated export.
pub const SVG_MIME: &str = "image/svg+xml";

/// Download file name for an exported analysis of `stem`.
///
/// Falls back to `room` when the photo's name has no usable stem.
#[must_use]
pub fn export_filename(stem: &str) -> String {
    let stem = stem.trim();
    if stem.is_empty() {
        "room-annotated.svg".to_owned()
    } else {
        format!("{stem}-annotated.svg")
    }
}

/// Offer `contents` to the user as a file named `filename`.
///
/// The object URL is revoked on return; the browser has already
/// resolved it by the time the click handler finishes.
///
/// # Errors
///
/// Returns [`BrowserError`] if there is no document or a browser call
/// fails.
pub fn save_as(contents: &[u8], mime: &str, filename: &str) -> Result<(), BrowserError> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or(BrowserError::NoDocument)?;
    let body = document.body().ok_or(BrowserError::NoDocument)?;

    let url = ObjectUrl::from_bytes(contents, mime)?;
    let anchor: HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into()
        .map_err(|_| BrowserError::Js("created element is not an anchor".into()))?;
    anchor.set_href(url.as_str());
    anchor.set_download(filename);

    body.append_child(&anchor)?;
    anchor.click();
    if let Err(e) = body.remove_child(&anchor) {
        tracing::debug!(error = ?e, "failed to remove download anchor");
    }

    tracing::debug!(filename, bytes = contents.len(), "download started");
    Ok(())
}

/// Save an annotated SVG under the name derived from `stem`.
///
/// # Errors
///
/// See [`save_as`].
pub fn save_svg(svg: &str, stem: &str) -> Result<(), BrowserError> {
    save_as(svg.as_bytes(), SVG_MIME, &export_filename(stem))
}
