//! roomscale-io: Browser I/O and Dioxus component library.
//!
//! Handles file uploads, object URLs for the photo preview and the
//! export download, and provides the UI components for the roomscale
//! web application.

pub mod components;
pub mod download;
pub mod object_url;

pub use components::{
    AnalyzeButton, AnnotatedImage, DimensionTable, ErrorBanner, ExportButton, FileUpload,
    PhotoPreview, ResultsPanel,
};
pub use object_url::{BrowserError, ObjectUrl};
