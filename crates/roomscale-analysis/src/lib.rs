//! roomscale-analysis: The room analysis contract (sans-IO).
//!
//! Covers everything between "the user picked a photo" and "the page
//! shows an annotated result", except the network call itself:
//! base64 encoding -> inference request (instruction + output schema)
//! -> response parsing/validation -> overlay sanitizing, plus the
//! session state machine that sequences them.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and strings. The HTTP client lives in `roomscale-client`
//! and all browser interaction lives in `roomscale-io`.

pub mod encode;
pub mod parse;
pub mod prompt;
pub mod sanitize;
pub mod service;
pub mod session;
pub mod types;

pub use encode::{encode_image, strip_data_url_prefix};
pub use parse::{MAX_DIMENSIONS, parse_response};
pub use sanitize::{SafeSvg, sanitize_overlay};
pub use service::{InferenceService, analyze, analyze_ticket};
pub use session::{AnalysisTicket, Commit, Phase, SelectedImage, Session};
pub use types::{
    Analysis, AnalysisError, AnalysisRequest, AnalysisResult, Dimension, ErrorKind, ImageMime,
};
