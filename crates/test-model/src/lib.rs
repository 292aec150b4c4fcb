//! A local fake completion provider for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use gemchat_model::{
    CompletionProvider, CompletionRequest, CompletionResponse, ErrorKind,
    ProviderError,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A local fake provider for testing purpose.
///
/// Before sending requests, you need to set up the script, which is how the
/// service should answer each prompt. Prompts without a preset reply fail
/// with an [`ErrorKind::Other`] error. Clones share the request counter, so
/// a test can keep one clone around and hand the other to the code under
/// test.
///
/// # Note
///
/// This type is not optimized for production use, every request clones its
/// preset reply. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: HashMap<String, PresetReply>,
    delay: Option<Duration>,
    requests: Arc<AtomicUsize>,
}

impl TestModelProvider {
    /// Sets the reply for `prompt`, replacing any earlier one.
    #[inline]
    pub fn add_reply<S: Into<String>>(
        &mut self,
        prompt: S,
        reply: PresetReply,
    ) {
        self.script.insert(prompt.into(), reply);
    }

    /// Sets the default delay for replies that don't specify their own.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns how many requests have been issued so far.
    #[inline]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl CompletionProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, Self::Error>>
    + Send
    + 'static {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let reply = self.script.get(&req.prompt).cloned();
        let delay = reply
            .as_ref()
            .and_then(|r| r.delay_ms)
            .map(Duration::from_millis)
            .or(self.delay)
            .unwrap_or(Duration::from_millis(1));

        async move {
            sleep(delay).await;
            let Some(reply) = reply else {
                return Err(Error {
                    message: "no preset reply for this prompt",
                    kind: ErrorKind::Other,
                });
            };
            match reply.outcome {
                PresetOutcome::Candidates(candidates) => {
                    Ok(CompletionResponse { candidates })
                }
                PresetOutcome::Failure(failure) => Err(Error {
                    message: "simulated failure",
                    kind: failure.into(),
                }),
            }
        }
    }
}
