//! Dioxus UI components for roomscale.
//!
//! Provides the upload drop zone, the photo preview, the analyze button
//! and failure banner, the annotated result view, and the export button.

mod export;
mod feedback;
mod photo;
mod results;
mod upload;

pub use export::ExportButton;
pub use feedback::{AnalyzeButton, ErrorBanner};
pub use photo::PhotoPreview;
pub use results::{AnnotatedImage, DimensionTable, ResultsPanel};
pub use upload::FileUpload;
