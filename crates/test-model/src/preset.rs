use std::time::Duration;

use gemchat_model::{Candidate, ErrorKind};
use serde::{Deserialize, Serialize};

/// The kind of failure a preset reply simulates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFailure {
    Transport,
    Status,
    MalformedBody,
}

impl From<PresetFailure> for ErrorKind {
    fn from(failure: PresetFailure) -> Self {
        match failure {
            PresetFailure::Transport => ErrorKind::Transport,
            PresetFailure::Status => ErrorKind::Status,
            PresetFailure::MalformedBody => ErrorKind::MalformedBody,
        }
    }
}

/// What the fake service answers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetOutcome {
    #[serde(rename = "candidates")]
    Candidates(Vec<Candidate>),
    #[serde(rename = "failure")]
    Failure(PresetFailure),
}

/// The preset reply for one prompt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetReply {
    pub outcome: PresetOutcome,
    /// If set, overrides the provider's delay for this reply.
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

impl PresetReply {
    /// A reply with a single candidate carrying `text`.
    #[inline]
    pub fn output<S: Into<String>>(text: S) -> Self {
        Self::with_candidates([Candidate::with_output(text)])
    }

    /// A successful reply with the specified candidates.
    #[inline]
    pub fn with_candidates(candidates: impl Into<Vec<Candidate>>) -> Self {
        Self {
            outcome: PresetOutcome::Candidates(candidates.into()),
            delay_ms: None,
        }
    }

    /// A successful reply without any candidate.
    #[inline]
    pub fn empty() -> Self {
        Self::with_candidates(Vec::new())
    }

    /// A failed request.
    #[inline]
    pub fn failure(failure: PresetFailure) -> Self {
        Self {
            outcome: PresetOutcome::Failure(failure),
            delay_ms: None,
        }
    }

    /// Sets how long the request takes to settle.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(delay.as_millis() as u64);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let reply = PresetReply::output("Hello!")
            .with_delay(Duration::from_millis(20));
        let serialized = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            serialized,
            json!({
                "outcome": {
                    "type": "candidates",
                    "data": [{ "output": "Hello!", "finish_reason": null }]
                },
                "delay_ms": 20
            })
        );
        let deserialized: PresetReply =
            serde_json::from_value(serialized).unwrap();
        assert_eq!(reply, deserialized);
    }

    #[test]
    fn test_deserialize_failure() {
        let reply: PresetReply = serde_json::from_value(json!({
            "outcome": { "type": "failure", "data": "transport" }
        }))
        .unwrap();
        assert_eq!(reply, PresetReply::failure(PresetFailure::Transport));
    }
}
