/// A request to be sent to the completion provider.
///
/// Only the current utterance is carried; earlier turns of the conversation
/// are not replayed to the service.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompletionRequest {
    /// The user's prompt text.
    pub prompt: String,
}

impl CompletionRequest {
    /// Creates a request for the given prompt.
    #[inline]
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}
