//! A terminal chat client for the Gemini API.
//!
//! The crate includes a CLI for chatting in the terminal. The library part
//! holds what the CLI needs besides the core: reading the configuration
//! from the environment and rendering messages.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod config;
pub mod render;

pub use config::{
    API_KEY_VAR, AUTH_MODE_VAR, BASE_URL_VAR, ConfigError, MODEL_VAR,
    config_from_env, config_from_lookup,
};

/// Re-exports of [`gemchat_core`] crate.
pub mod core {
    pub use gemchat_core::*;
}
