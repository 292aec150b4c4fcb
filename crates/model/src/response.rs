use serde::{Deserialize, Serialize};

/// One proposed completion returned by the service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// The generated text, if the service produced any.
    pub output: Option<String>,
    /// The reason the service stopped generating, as reported by it.
    pub finish_reason: Option<String>,
}

impl Candidate {
    /// Creates a candidate carrying the given output text.
    #[inline]
    pub fn with_output<S: Into<String>>(output: S) -> Self {
        Self {
            output: Some(output.into()),
            finish_reason: None,
        }
    }
}

/// A complete response from the completion provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The candidates, in the order the service ranked them.
    pub candidates: Vec<Candidate>,
}

impl CompletionResponse {
    /// Creates a response with the specified candidates.
    #[inline]
    pub fn with_candidates(candidates: impl Into<Vec<Candidate>>) -> Self {
        Self {
            candidates: candidates.into(),
        }
    }

    /// Returns the output text of the first candidate.
    ///
    /// Only the first candidate is ever consulted. `None` is returned when
    /// there are no candidates, or the first one has no (or empty) text.
    pub fn first_output(&self) -> Option<&str> {
        self.candidates
            .first()?
            .output
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}
