use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sender {
    /// The person typing into the chat.
    User,
    /// The remote text-generation service.
    Bot,
}

impl Sender {
    #[inline]
    fn tag(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// Identifier of a message, unique within the process.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    fn generate(sender: Sender, timestamp: &DateTime<Utc>) -> Self {
        // Millisecond timestamps alone collide when two messages are
        // created back to back, the sequence number breaks the tie.
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "{}-{}-{}",
            timestamp.timestamp_millis(),
            seq,
            sender.tag()
        ))
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One turn in the conversation.
///
/// Messages are immutable: the text is kept exactly as it was written or
/// received, markdown and fenced code blocks included. Formatting is left
/// to whoever renders it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    sender: Sender,
    text: String,
    timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message written by the user.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::new(Sender::User, text.into())
    }

    /// Creates a message from the bot.
    #[inline]
    pub fn bot<S: Into<String>>(text: S) -> Self {
        Self::new(Sender::Bot, text.into())
    }

    fn new(sender: Sender, text: String) -> Self {
        let timestamp = Utc::now();
        Self {
            id: MessageId::generate(sender, &timestamp),
            sender,
            text,
            timestamp,
        }
    }

    /// Returns the identifier of this message.
    #[inline]
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns who wrote this message.
    #[inline]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the raw text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the creation time. Only meant for display.
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_constructors() {
        let msg = Message::user("**hi**");
        assert_eq!(msg.sender(), Sender::User);
        assert_eq!(msg.text(), "**hi**");
        assert!(msg.id().as_str().ends_with("-user"));

        let msg = Message::bot("```rust\nfn main() {}\n```");
        assert_eq!(msg.sender(), Sender::Bot);
        assert_eq!(msg.text(), "```rust\nfn main() {}\n```");
        assert!(msg.id().to_string().ends_with("-bot"));
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = (0..1000)
            .map(|i| Message::user(format!("{i}")).id().clone())
            .collect();
        assert_eq!(ids.len(), 1000);
    }
}
