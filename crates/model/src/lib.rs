//! An abstraction layer for remote text-generation services.
//!
//! This crate establishes a small protocol between the chat core and the
//! services it talks to: one prompt goes out, a list of candidates comes
//! back. The chat core only depends on these types, so a provider can be
//! swapped (or faked in tests) without touching the conversation logic.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
