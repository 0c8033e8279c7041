//! roomscale-client: Gemini inference over HTTPS.
//!
//! Implements [`roomscale_analysis::InferenceService`] with `reqwest`,
//! which uses the browser `fetch` API on `wasm32` and hyper elsewhere.

pub mod config;
pub mod gemini;

pub use config::{API_KEY_VARS, ClientConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use gemini::{GeminiClient, GenerateContentRequest, extract_text, service_error};
