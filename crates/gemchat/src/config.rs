use std::env;
use std::error::Error;
use std::fmt::{self, Display};

use gemchat_gemini::{
    AuthMode, GeminiConfig, GeminiConfigBuilder, ParseAuthModeError,
};

/// Environment variable holding the API key. Required.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
/// Environment variable overriding the model name.
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// Environment variable overriding the API base URL.
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
/// Environment variable selecting how the key is sent (`query` or
/// `header`).
pub const AUTH_MODE_VAR: &str = "GEMINI_AUTH_MODE";

/// Error returned when the environment doesn't describe a usable
/// configuration.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The API key is not set, or set to a blank string.
    MissingApiKey,
    /// The auth mode is not one of the known values.
    InvalidAuthMode(ParseAuthModeError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => {
                write!(f, "{API_KEY_VAR} environment variable is not set")
            }
            ConfigError::InvalidAuthMode(err) => {
                write!(f, "invalid {AUTH_MODE_VAR}: {err}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::MissingApiKey => None,
            ConfigError::InvalidAuthMode(err) => Some(err),
        }
    }
}

/// Reads the provider configuration from the process environment.
#[inline]
pub fn config_from_env() -> Result<GeminiConfig, ConfigError> {
    config_from_lookup(|name| env::var(name).ok())
}

/// Reads the provider configuration through `lookup`, which maps a
/// variable name to its value.
///
/// Blank values count as unset. Unset optional variables leave the
/// builder defaults in place.
pub fn config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<GeminiConfig, ConfigError> {
    let var = |name: &str| {
        lookup(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    };

    let api_key = var(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)?;
    let mut builder = GeminiConfigBuilder::with_api_key(api_key);
    if let Some(model) = var(MODEL_VAR) {
        builder = builder.with_model(model);
    }
    if let Some(base_url) = var(BASE_URL_VAR) {
        builder = builder.with_base_url(base_url);
    }
    if let Some(auth_mode) = var(AUTH_MODE_VAR) {
        let auth_mode = auth_mode
            .parse::<AuthMode>()
            .map_err(ConfigError::InvalidAuthMode)?;
        builder = builder.with_auth_mode(auth_mode);
    }

    let config = builder.build();
    debug!("loaded config: {config:?}");
    Ok(config)
}
