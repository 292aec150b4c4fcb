//! Conversation-related types.

use std::fmt::{self, Debug};

use crate::Message;

type Observer = Box<dyn Fn(&Message, &[Message]) + Send + Sync>;

/// Represents a conversation: an append-only log of messages.
///
/// This is the single source of truth for what the UI displays. Messages
/// are kept in insertion order, and there is no way to edit, remove or
/// reorder them once appended.
#[derive(Default)]
pub struct Conversation {
    messages: Vec<Message>,
    observers: Vec<Observer>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer.
    ///
    /// The observer is invoked with the newly appended message and the
    /// full log every time [`Conversation::add_message`] is called.
    pub fn subscribe(
        &mut self,
        observer: impl Fn(&Message, &[Message]) + Send + Sync + 'static,
    ) {
        self.observers.push(Box::new(observer));
    }

    /// Appends a message to the end of the log.
    ///
    /// All observers are notified, in registration order, before this
    /// method returns.
    pub fn add_message(&mut self, message: Message) {
        trace!("appending message {}", message.id());
        self.messages.push(message);
        let Some(appended) = self.messages.last() else {
            return;
        };
        for observer in &self.observers {
            observer(appended, &self.messages);
        }
    }

    /// Returns all messages in insertion order.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no message has been appended yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("messages", &self.messages)
            .field("observers", &self.observers.len())
            .finish()
    }
}
