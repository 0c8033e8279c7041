//! Session state: the orchestrator's single mutable record.
//!
//! [`Session`] owns the selected image and the current display mode and
//! enforces the transitions between them:
//!
//! ```text
//! Idle ──select──▶ Ready ──begin──▶ Analyzing ──finish──▶ Complete | Failed
//!  ▲                 ▲                                       │
//!  └──── clear ──────┴────────────── select / clear ─────────┘
//! ```
//!
//! The session is sans-IO. [`Session::begin_analysis`] hands out an
//! [`AnalysisTicket`] carrying the image to analyze; the caller runs the
//! (asynchronous) pipeline and reports back with [`Session::finish`].
//! Every ticket is stamped with a generation number, and any transition
//! that invalidates in-flight work bumps the generation, so an outcome
//! that resolves after a clear or a new selection is recognized as stale
//! and dropped without touching the state.
//!
//! The session is generic over a preview handle `P` (for example a
//! browser object URL). The handle lives inside [`SelectedImage`] and is
//! dropped when the image is cleared or replaced, which lets RAII
//! handles release their resources at exactly that point.

use std::rc::Rc;
use std::sync::Arc;

use crate::types::{Analysis, AnalysisError, ImageMime};

/// An image chosen by the user, plus its preview handle.
#[derive(Debug)]
pub struct SelectedImage<P = ()> {
    bytes: Arc<[u8]>,
    name: String,
    mime: ImageMime,
    preview: P,
}

impl<P> SelectedImage<P> {
    /// Create a new selection.
    #[must_use]
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        name: impl Into<String>,
        mime: ImageMime,
        preview: P,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            name: name.into(),
            mime,
            preview,
        }
    }

    /// Raw file bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Raw file bytes, shared.
    #[must_use]
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Original filename.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filename without its extension, for naming exports.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(base, _)| base)
    }

    /// Image format.
    #[must_use]
    pub const fn mime(&self) -> ImageMime {
        self.mime
    }

    /// The preview handle.
    #[must_use]
    pub const fn preview(&self) -> &P {
        &self.preview
    }
}

/// Which display mode the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No image selected.
    Idle,
    /// An image is selected; no analysis has run for it yet.
    ImageSelected,
    /// A request is in flight.
    Analyzing,
    /// The last analysis succeeded.
    Complete,
    /// The last analysis failed.
    Failed,
}

#[derive(Debug)]
enum State {
    Idle,
    Ready,
    Analyzing,
    Complete(Rc<Analysis>),
    Failed(String),
}

/// Permission to run one analysis, handed out by
/// [`Session::begin_analysis`].
///
/// Carries everything the pipeline needs, so the session does not have
/// to be borrowed while the request is in flight.
#[derive(Debug, Clone)]
#[must_use = "an analysis ticket must be passed back to Session::finish"]
pub struct AnalysisTicket {
    generation: u64,
    bytes: Arc<[u8]>,
    mime: ImageMime,
}

impl AnalysisTicket {
    /// The generation this ticket belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Image bytes to analyze.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Format of the image.
    #[must_use]
    pub const fn mime(&self) -> ImageMime {
        self.mime
    }
}

/// What [`Session::finish`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The outcome was stored; the session is now `Complete` or `Failed`.
    Applied,
    /// The ticket was outdated; the outcome was discarded.
    Stale,
}

/// The orchestrator's session record.
#[derive(Debug)]
pub struct Session<P = ()> {
    image: Option<SelectedImage<P>>,
    state: State,
    generation: u64,
}

impl<P> Default for Session<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Session<P> {
    /// An empty session in the `Idle` phase.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            image: None,
            state: State::Idle,
            generation: 0,
        }
    }

    /// Current display mode.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Ready => Phase::ImageSelected,
            State::Analyzing => Phase::Analyzing,
            State::Complete(_) => Phase::Complete,
            State::Failed(_) => Phase::Failed,
        }
    }

    /// The selected image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&SelectedImage<P>> {
        self.image.as_ref()
    }

    /// The analysis for the selected image, in the `Complete` phase.
    #[must_use]
    pub fn analysis(&self) -> Option<Rc<Analysis>> {
        match &self.state {
            State::Complete(analysis) => Some(Rc::clone(analysis)),
            _ => None,
        }
    }

    /// The user-facing error message, in the `Failed` phase.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            State::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_analyzing(&self) -> bool {
        matches!(self.state, State::Analyzing)
    }

    /// Whether the analyze action should be enabled.
    #[must_use]
    pub const fn can_analyze(&self) -> bool {
        self.image.is_some() && !self.is_analyzing()
    }

    /// The current generation. Increases on every select, clear, and
    /// analysis start.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the selected image, discarding any result, error, or
    /// in-flight analysis.
    ///
    /// Returns the previously selected image so the caller can observe
    /// its release; dropping it releases the preview handle.
    pub fn select_image(&mut self, image: SelectedImage<P>) -> Option<SelectedImage<P>> {
        self.generation += 1;
        self.state = State::Ready;
        tracing::debug!(generation = self.generation, name = image.name(), "image selected");
        self.image.replace(image)
    }

    /// Drop the selected image and return to `Idle`.
    ///
    /// An analysis still in flight becomes stale.
    pub fn clear(&mut self) -> Option<SelectedImage<P>> {
        self.generation += 1;
        self.state = State::Idle;
        tracing::debug!(generation = self.generation, "session cleared");
        self.image.take()
    }

    /// Start an analysis of the selected image.
    ///
    /// Clears any previous result or error. Returns `None` and leaves the
    /// session untouched if no image is selected or an analysis is
    /// already in flight.
    pub fn begin_analysis(&mut self) -> Option<AnalysisTicket> {
        if self.is_analyzing() {
            return None;
        }
        let image = self.image.as_ref()?;
        self.generation += 1;
        self.state = State::Analyzing;
        tracing::debug!(generation = self.generation, "analysis started");
        Some(AnalysisTicket {
            generation: self.generation,
            bytes: Arc::clone(&image.bytes),
            mime: image.mime,
        })
    }

    /// Store the outcome of the analysis started with `ticket`.
    ///
    /// Errors are converted to their display message. Outcomes for a
    /// ticket that is no longer current, or that arrive when the session
    /// is not analyzing, are discarded.
    pub fn finish(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: Result<Analysis, AnalysisError>,
    ) -> Commit {
        if ticket.generation != self.generation || !self.is_analyzing() {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale analysis outcome"
            );
            return Commit::Stale;
        }
        self.state = match outcome {
            Ok(analysis) => State::Complete(Rc::new(analysis)),
            Err(e) => State::Failed(e.to_string()),
        };
        Commit::Applied
    }
}
