use gemchat_model::CompletionProvider;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use super::ChatSession;
use super::state::{SessionState, run_session};
use crate::Message;
use crate::completion::CompletionClient;
use crate::conversation::Conversation;

/// [`ChatSession`] builder.
pub struct ChatSessionBuilder {
    client: CompletionClient,
    conversation: Conversation,
    on_typing_changed: Option<Box<dyn Fn(bool) + Send + Sync>>,
}

impl ChatSessionBuilder {
    /// Creates a new builder with the specified completion provider.
    #[inline]
    pub fn with_provider<P: CompletionProvider + 'static>(provider: P) -> Self {
        Self::with_client(CompletionClient::new(provider))
    }

    /// Creates a new builder with an existing completion client.
    #[inline]
    pub fn with_client(client: CompletionClient) -> Self {
        Self {
            client,
            conversation: Conversation::new(),
            on_typing_changed: None,
        }
    }

    /// Attaches a callback to be invoked with every appended message.
    ///
    /// Callbacks run on the session task, in the order they were attached.
    /// They should return quickly.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.conversation.subscribe(move |msg, _| on_message(msg));
        self
    }

    /// Attaches a callback to be invoked whenever the typing flag flips.
    #[inline]
    pub fn on_typing_changed(
        mut self,
        on_typing_changed: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_typing_changed = Some(Box::new(on_typing_changed));
        self
    }

    /// Builds the session and spawns its task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn build(self) -> ChatSession {
        let Self {
            client,
            conversation,
            on_typing_changed,
        } = self;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (typing_tx, typing_rx) = watch::channel(false);

        let state = SessionState {
            client,
            conversation,
            in_flight: Default::default(),
            reply_txs: Default::default(),
            typing_tx,
            on_typing_changed,
        };
        tokio::spawn(
            run_session(state, cmd_rx).instrument(trace_span!("session")),
        );

        ChatSession {
            cmd_tx,
            typing: typing_rx,
        }
    }
}
