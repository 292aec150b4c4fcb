use std::pin::Pin;
use std::sync::Arc;

use gemchat_model::{
    CompletionProvider, CompletionRequest, CompletionResponse, ProviderError,
};
use tracing::Instrument;

use crate::Message;

/// Text of the bot message appended when the service answered but gave
/// nothing usable back.
pub const FALLBACK_REPLY: &str = "Sorry, I didn't understand that.";

/// Text of the bot message appended when the request failed.
pub const ERROR_REPLY: &str = "Error connecting to the API.";

/// Outcome of a single request, with the provider's error type erased.
pub type CompletionResult =
    Result<CompletionResponse, Box<dyn ProviderError>>;

type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = CompletionResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(CompletionRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a completion provider that turns one utterance into
/// one bot message.
///
/// The provider type is erased, so the session doesn't need a generic
/// parameter. Cloning is cheap and clones share the provider.
#[derive(Clone)]
pub struct CompletionClient {
    handler_fn: HandlerFn,
}

impl CompletionClient {
    /// Creates a client that sends its requests through `provider`.
    #[inline]
    pub fn new<P: CompletionProvider + 'static>(provider: P) -> Self {
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    fut.await.map_err(|err| {
                        Box::new(err) as Box<dyn ProviderError>
                    })
                }
                .instrument(trace_span!("completion req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request for `prompt` and returns the raw outcome.
    #[inline]
    pub async fn send_request(&self, prompt: &str) -> CompletionResult {
        (self.handler_fn)(CompletionRequest::new(prompt)).await
    }

    /// Sends a request for `prompt` and resolves it into a bot message.
    ///
    /// This never fails: a response without usable text becomes
    /// [`FALLBACK_REPLY`], and any error becomes [`ERROR_REPLY`]. Errors
    /// are logged and go no further.
    pub async fn reply_to(&self, prompt: &str) -> Message {
        let result = self.send_request(prompt).await;
        Message::bot(reply_text(&result))
    }
}

fn reply_text(result: &CompletionResult) -> &str {
    match result {
        Ok(resp) => {
            let text = resp.first_output();
            if text.is_none() {
                debug!(
                    "no usable candidate in {} candidate(s)",
                    resp.candidates.len()
                );
            }
            text.unwrap_or(FALLBACK_REPLY)
        }
        Err(err) => {
            warn!(kind = %err.kind(), "completion request failed: {err}");
            ERROR_REPLY
        }
    }
}

#[cfg(test)]
mod tests {
    use gemchat_model::{Candidate, ErrorKind};
    use gemchat_test_model::{PresetFailure, PresetReply, TestModelProvider};

    use super::*;
    use crate::Sender;

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_reply("Hi", PresetReply::output("How are you?"));
        let client = CompletionClient::new(provider.clone());

        for _ in 0..3 {
            let resp = client.send_request("Hi").await.unwrap();
            assert_eq!(resp.first_output(), Some("How are you?"));
        }
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let client = CompletionClient::new(TestModelProvider::default());
        let err = client.send_request("Hi").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_reply_to() {
        let mut provider = TestModelProvider::default();
        provider.add_reply("hello", PresetReply::output("Hello!"));
        provider.add_reply("nothing", PresetReply::empty());
        provider.add_reply(
            "blank",
            PresetReply::with_candidates([
                Candidate::with_output(""),
                Candidate::with_output("not this one"),
            ]),
        );
        provider.add_reply(
            "offline",
            PresetReply::failure(PresetFailure::Transport),
        );
        provider.add_reply(
            "garbage",
            PresetReply::failure(PresetFailure::MalformedBody),
        );
        let client = CompletionClient::new(provider);

        let msg = client.reply_to("hello").await;
        assert_eq!(msg.sender(), Sender::Bot);
        assert_eq!(msg.text(), "Hello!");

        assert_eq!(client.reply_to("nothing").await.text(), FALLBACK_REPLY);
        assert_eq!(client.reply_to("blank").await.text(), FALLBACK_REPLY);
        assert_eq!(client.reply_to("offline").await.text(), ERROR_REPLY);
        assert_eq!(client.reply_to("garbage").await.text(), ERROR_REPLY);
        assert_eq!(client.reply_to("unscripted").await.text(), ERROR_REPLY);
    }
}
