use std::fmt::{self, Debug, Display};
use std::str::FromStr;

const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// How the API key is attached to each request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AuthMode {
    /// As the `key` query parameter.
    #[default]
    Query,
    /// As an `Authorization: Bearer` header.
    Header,
}

/// Error returned when parsing an unknown [`AuthMode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseAuthModeError(String);

impl Display for ParseAuthModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown auth mode `{}`, expected `query` or `header`",
            self.0
        )
    }
}

impl std::error::Error for ParseAuthModeError {}

impl FromStr for AuthMode {
    type Err = ParseAuthModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" => Ok(AuthMode::Query),
            "header" | "bearer" => Ok(AuthMode::Header),
            _ => Err(ParseAuthModeError(s.to_owned())),
        }
    }
}

/// Builder for [`GeminiConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfigBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    auth_mode: Option<AuthMode>,
}

impl GeminiConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
            auth_mode: None,
        }
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL, e.g. a proxy in front of the API.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets how the API key is sent.
    #[inline]
    pub fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
        self.auth_mode = Some(auth_mode);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> GeminiConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        GeminiConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth_mode: self.auth_mode.unwrap_or_default(),
        }
    }
}

impl Debug for GeminiConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("auth_mode", &self.auth_mode)
            .finish()
    }
}

/// Configuration for the Gemini provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) auth_mode: AuthMode,
}

impl GeminiConfig {
    /// Returns the model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the base URL, without a trailing slash.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns how the API key is sent.
    #[inline]
    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("auth_mode", &self.auth_mode)
            .finish()
    }
}
