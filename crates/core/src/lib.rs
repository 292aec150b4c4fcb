//! Core logic of the chat client: the conversation log, the completion
//! client and the session that ties them together.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod completion;
pub mod conversation;
mod message;
mod session;

pub use completion::{
    CompletionClient, CompletionResult, ERROR_REPLY, FALLBACK_REPLY,
};
pub use message::{Message, MessageId, Sender};
pub use session::{
    ChatSession, ChatSessionBuilder, PendingReply, SessionSnapshot,
};
