use std::error::Error;

use crate::error::ErrorKind;
use crate::request::CompletionRequest;
use crate::response::CompletionResponse;

/// The error type for a completion provider.
pub trait ProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a completion provider, which turns one prompt
/// into a list of candidate completions with a single round trip.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime. Several
/// requests may be in flight at the same time.
pub trait CompletionProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ProviderError;

    /// Sends a request to the service.
    ///
    /// The returned future must not borrow `self`, so that it can be moved
    /// into a spawned task.
    fn send_request(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, Self::Error>>
    + Send
    + 'static;
}
