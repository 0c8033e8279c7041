//! roomscale-export: Pure format serializers (sans-IO)
//!
//! Combines the analysed photo and its sanitized overlay into a single
//! self-contained SVG document.

pub mod svg;

pub use crate::svg::{ExportError, SvgMetadata, describe_dimensions, to_annotated_svg};
