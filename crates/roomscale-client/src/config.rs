//! Client configuration, resolved once at startup and injected.

use std::fmt;

/// Default Gemini REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default multimodal model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// Configuration for [`GeminiClient`](crate::GeminiClient).
///
/// A missing key is not an error here; it surfaces as
/// [`AnalysisError::Configuration`](roomscale_analysis::AnalysisError::Configuration)
/// when a client is built for the first analysis.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service credential.
    pub api_key: Option<String>,
    /// Model identifier, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// Base URL up to and including the API version.
    pub endpoint: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ClientConfig {
    /// Defaults plus the first non-empty key from [`API_KEY_VARS`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults plus the first non-empty key returned by `lookup` for
    /// the names in [`API_KEY_VARS`].
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|name| lookup(name).filter(|k| !k.trim().is_empty()));
        Self::default().with_api_key(api_key)
    }

    /// Set the API key. Blank keys are treated as absent.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the endpoint. A trailing slash is removed.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = endpoint.trim_end_matches('/').to_owned();
        self
    }

    /// Whether a credential is present.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_key() {
        let config = ClientConfig::default();
        assert!(!config.has_api_key());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn lookup_prefers_gemini_api_key() {
        let config = ClientConfig::from_lookup(|name| Some(format!("{name}-value")));
        assert_eq!(config.api_key.as_deref(), Some("GEMINI_API_KEY-value"));
    }

    #[test]
    fn lookup_falls_back_to_api_key() {
        let config =
            ClientConfig::from_lookup(|name| (name == "API_KEY").then(|| "fallback".to_owned()));
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn lookup_without_variables_has_no_key() {
        assert!(!ClientConfig::from_lookup(|_| None).has_api_key());
    }

    #[test]
    fn lookup_skips_blank_values() {
        let config = ClientConfig::from_lookup(|name| {
            Some(if name == "GEMINI_API_KEY" { String::new() } else { "second".to_owned() })
        });
        assert_eq!(config.api_key.as_deref(), Some("second"));
    }

    #[test]
    fn blank_key_is_absent() {
        let config = ClientConfig::default().with_api_key(Some("   ".into()));
        assert!(!config.has_api_key());
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let config = ClientConfig::default().with_endpoint("http://localhost:8080/v1beta/");
        assert_eq!(config.endpoint, "http://localhost:8080/v1beta");
    }
}
