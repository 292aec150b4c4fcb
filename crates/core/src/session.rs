mod builder;
mod state;
#[cfg(test)]
mod tests;

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot, watch};

use crate::Message;
pub use builder::ChatSessionBuilder;
use state::Command;

/// A chat session, which owns a conversation and a completion client.
///
/// All mutations happen on a single task spawned by
/// [`ChatSessionBuilder::build`]. This type is only a handle to it, so it
/// is cheap to clone and every clone talks to the same session.
///
/// Requests are never serialized: the user may send another message while
/// earlier ones are still waiting for a reply, and the bot messages are
/// appended in the order the requests settle. The session is "typing" as
/// long as at least one request is in flight.
///
/// The task outlives its handles. When the last handle is dropped, the
/// requests in flight still settle and their replies are appended before
/// the task quits.
#[derive(Clone)]
pub struct ChatSession {
    cmd_tx: mpsc::UnboundedSender<Command>,
    typing: watch::Receiver<bool>,
}

impl ChatSession {
    /// Sends a user message.
    ///
    /// The text is trimmed first. Blank text is ignored: nothing is
    /// appended, no request is issued, and `None` is returned. Otherwise
    /// the user message is already in the conversation and the session is
    /// typing by the time this method returns. The returned
    /// [`PendingReply`] resolves to the bot message once the request
    /// settles. Awaiting it is optional, the reply is appended either way.
    ///
    /// `None` is also returned if the session task is gone, which only
    /// happens while the runtime shuts down.
    pub async fn send_message(&self, text: &str) -> Option<PendingReply> {
        let text = text.trim();
        if text.is_empty() {
            trace!("ignoring blank input");
            return None;
        }

        let (accepted_tx, accepted_rx) = oneshot::channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Send {
                text: text.to_owned(),
                accepted: accepted_tx,
                reply: reply_tx,
            })
            .ok()?;
        accepted_rx.await.ok()?;
        Some(PendingReply { rx: reply_rx })
    }

    /// Returns a copy of the conversation and the typing flag, taken at
    /// the same point in time.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Snapshot(tx)).is_err() {
            return SessionSnapshot::default();
        }
        rx.await.unwrap_or_default()
    }

    /// Returns `true` if at least one request is in flight.
    #[inline]
    pub fn is_typing(&self) -> bool {
        *self.typing.borrow()
    }

    /// Returns a receiver that observes the typing flag.
    #[inline]
    pub fn typing_changes(&self) -> watch::Receiver<bool> {
        self.typing.clone()
    }

    /// Waits until no request is in flight.
    pub async fn wait_idle(&self) {
        let mut typing = self.typing.clone();
        // An error means the task is gone, so nothing is in flight either.
        typing.wait_for(|typing| !*typing).await.ok();
    }
}

/// The state of a session at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// All messages in insertion order.
    pub messages: Vec<Message>,
    /// Whether any request was in flight.
    pub typing: bool,
}

/// The bot reply to a message sent with [`ChatSession::send_message`].
///
/// Resolves to `None` only if the session task went away before the
/// request settled.
#[derive(Debug)]
pub struct PendingReply {
    rx: oneshot::Receiver<Message>,
}

impl Future for PendingReply {
    type Output = Option<Message>;

    #[inline]
    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}
