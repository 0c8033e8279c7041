//! Annotated SVG export.
//!
//! Produces one standalone SVG: the photo embedded as a base64 data URL
//! with the sanitized overlay stretched over it, so the file looks the
//! same as the on-screen result when opened on its own.
//!
//! The document uses the photo's pixel size as its `viewBox`. The
//! overlay keeps its normalized `0 0 100 100` space with
//! `preserveAspectRatio="none"` and is sized to the full document.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::io::Cursor;

use svg::Document;
use svg::node::Node;
use svg::node::element::{Description, Image, Title};

use roomscale_analysis::{Analysis, Dimension, ImageMime, encode_image};

/// Errors from [`to_annotated_svg`].
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The photo's pixel size could not be determined.
    #[error("could not read image size: {0}")]
    ImageSize(String),

    /// The photo could not be embedded.
    #[error("could not embed image: {0}")]
    Embed(String),
}

/// Metadata to embed in the SVG document.
///
/// When present, `<title>` and `<desc>` are emitted before the content.
/// Text values are XML-escaped by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, typically the photo's file stem.
    pub title: Option<&'a str>,

    /// Document description. [`to_annotated_svg`] falls back to
    /// [`describe_dimensions`] when this is `None`.
    pub description: Option<&'a str>,
}

/// One `label: estimate` line per dimension.
#[must_use]
pub fn describe_dimensions(dimensions: &[Dimension]) -> String {
    dimensions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read the pixel size of an encoded image without decoding it.
fn image_size(bytes: &[u8]) -> Result<(u32, u32), ExportError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ExportError::ImageSize(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ExportError::ImageSize(e.to_string()))
}

/// Serialize the photo and its overlay to a standalone SVG string.
///
/// # Errors
///
/// Returns [`ExportError::ImageSize`] if the image header cannot be
/// read, or [`ExportError::Embed`] if the bytes are empty.
pub fn to_annotated_svg(
    image: &[u8],
    mime: ImageMime,
    analysis: &Analysis,
    metadata: &SvgMetadata<'_>,
) -> Result<String, ExportError> {
    let (width, height) = image_size(image)?;
    let data_url = encode_image(image, mime)
        .map_err(|e| ExportError::Embed(e.to_string()))?
        .to_data_url();

    let mut doc = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0, 0, width, height));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    let description = metadata
        .description
        .map_or_else(|| describe_dimensions(&analysis.dimensions), str::to_owned);
    if !description.is_empty() {
        doc = doc.add(Description::new().add(svg::node::Text::new(description)));
    }

    doc = doc.add(
        Image::new()
            .set("href", data_url)
            .set("x", 0)
            .set("y", 0)
            .set("width", width)
            .set("height", height)
            .set("preserveAspectRatio", "none"),
    );

    let mut overlay = analysis.overlay.element().clone();
    overlay.assign("x", 0);
    overlay.assign("y", 0);
    overlay.assign("width", width);
    overlay.assign("height", height);
    doc = doc.add(overlay);

    Ok(doc.to_string())
}
