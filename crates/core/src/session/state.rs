use std::collections::HashMap;
use std::fmt::{self, Debug};

use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{self, JoinError, JoinSet};
use tracing::Instrument;

use super::SessionSnapshot;
use crate::Message;
use crate::completion::{CompletionClient, ERROR_REPLY};
use crate::conversation::Conversation;

pub enum Command {
    Send {
        text: String,
        accepted: oneshot::Sender<()>,
        reply: oneshot::Sender<Message>,
    },
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Send { text, .. } => f
                .debug_struct("Send")
                .field("text", text)
                .finish_non_exhaustive(),
            Command::Snapshot(_) => f.write_str("Snapshot"),
        }
    }
}

pub struct SessionState {
    pub client: CompletionClient,
    pub conversation: Conversation,
    pub in_flight: JoinSet<Message>,
    pub reply_txs: HashMap<task::Id, oneshot::Sender<Message>>,
    pub typing_tx: watch::Sender<bool>,
    pub on_typing_changed: Option<Box<dyn Fn(bool) + Send + Sync>>,
}

impl SessionState {
    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Send {
                text,
                accepted,
                reply,
            } => {
                self.conversation.add_message(Message::user(text.clone()));
                self.spawn_completion(text, reply);
                self.update_typing();
                accepted.send(()).ok();
            }
            Command::Snapshot(tx) => {
                tx.send(SessionSnapshot {
                    messages: self.conversation.messages().to_vec(),
                    typing: !self.in_flight.is_empty(),
                })
                .ok();
            }
        }
    }

    fn spawn_completion(
        &mut self,
        text: String,
        reply_tx: oneshot::Sender<Message>,
    ) {
        let client = self.client.clone();
        let handle = self.in_flight.spawn(
            async move { client.reply_to(&text).await }
                .instrument(trace_span!("completion")),
        );
        trace!("spawned completion task {}", handle.id());
        self.reply_txs.insert(handle.id(), reply_tx);
    }

    fn settle(&mut self, joined: Result<(task::Id, Message), JoinError>) {
        // A task that died without a reply still counts as settled, the
        // typing flag must come down either way.
        let (id, reply) = match joined {
            Ok(joined) => joined,
            Err(err) => {
                warn!("completion task {} failed: {err}", err.id());
                (err.id(), Message::bot(ERROR_REPLY))
            }
        };

        self.conversation.add_message(reply.clone());
        self.update_typing();
        let Some(reply_tx) = self.reply_txs.remove(&id) else {
            warn!("settled task {id} was not in flight");
            return;
        };
        // The caller may have dropped its `PendingReply`.
        reply_tx.send(reply).ok();
    }

    fn update_typing(&mut self) {
        let typing = !self.in_flight.is_empty();
        let changed = self.typing_tx.send_if_modified(|current| {
            if *current == typing {
                return false;
            }
            *current = typing;
            true
        });
        if !changed {
            return;
        }
        debug!("typing: {typing}");
        if let Some(on_typing_changed) = &self.on_typing_changed {
            on_typing_changed(typing);
        }
    }
}

pub async fn run_session(
    mut state: SessionState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    debug!("started");
    let mut accepting = true;
    while accepting || !state.in_flight.is_empty() {
        select! {
            biased;

            Some(joined) = state.in_flight.join_next_with_id() => {
                state.settle(joined);
            }
            cmd = cmd_rx.recv(), if accepting => {
                let Some(cmd) = cmd else {
                    debug!(
                        "all handles dropped, {} request(s) in flight",
                        state.in_flight.len()
                    );
                    accepting = false;
                    continue;
                };
                trace!("received command: {cmd:?}");
                state.handle_command(cmd);
            }
            else => break,
        }
    }
    debug!("will terminate");
}
