//! Object URLs for in-memory files.
//!
//! The photo preview and the SVG download both hand the browser a
//! `blob:` URL for bytes held in Rust. [`ObjectUrl`] owns such a URL and
//! revokes it when dropped: the preview's lives as long as the selected
//! image in the session, the download's only until the click has been
//! dispatched.
//!
//! Requires a browser environment (`wasm32-unknown-unknown` target).

use std::fmt;

use wasm_bindgen::JsValue;
use web_sys::{Blob, BlobPropertyBag, Url};

/// Errors from the browser APIs used by this crate.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    Js(String),

    /// There is no `window.document` to attach elements to.
    #[error("no document available")]
    NoDocument,
}

impl From<JsValue> for BrowserError {
    fn from(value: JsValue) -> Self {
        Self::Js(format!("{value:?}"))
    }
}

/// A `blob:` URL for a byte buffer, revoked on drop.
pub struct ObjectUrl {
    url: String,
}

impl ObjectUrl {
    /// Copy `bytes` into a `Blob` of type `mime` and create a URL for it.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Js`] if the `Blob` or the URL cannot be
    /// created.
    pub fn from_bytes(bytes: &[u8], mime: &str) -> Result<Self, BrowserError> {
        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(mime);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;
        tracing::trace!(%url, mime, bytes = bytes.len(), "object URL created");
        Ok(Self { url })
    }

    /// The URL, usable as an `<img src>` or `<a href>`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if let Err(e) = Url::revoke_object_url(&self.url) {
            tracing::warn!(url = %self.url, error = ?e, "failed to revoke object URL");
        }
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url).finish()
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
