use gemchat_model::{Candidate, CompletionRequest, CompletionResponse};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCandidate {
    pub content: Option<ResponseContent>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub status: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Part {
    text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &CompletionRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part {
                text: req.prompt.clone(),
            }],
        }],
    }
}

impl GenerateContentResponse {
    pub fn into_completion_response(self) -> CompletionResponse {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            debug!("prompt was blocked: {reason}");
        }
        CompletionResponse {
            candidates: self
                .candidates
                .into_iter()
                .map(ResponseCandidate::into_candidate)
                .collect(),
        }
    }
}

impl ResponseCandidate {
    fn into_candidate(self) -> Candidate {
        // A candidate may split its answer across several parts, stitch
        // them back together. No text part at all means no output.
        let output = self.content.and_then(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .reduce(|mut acc, text| {
                    acc.push_str(&text);
                    acc
                })
        });
        Candidate {
            output,
            finish_reason: self.finish_reason,
        }
    }
}

impl ErrorResponse {
    /// Best-effort extraction of the service's own error message.
    pub fn describe(body: &str) -> Option<String> {
        let resp = serde_json::from_str::<ErrorResponse>(body).ok()?;
        match (resp.error.status, resp.error.message) {
            (Some(status), Some(message)) => {
                Some(format!("{status}: {message}"))
            }
            (None, Some(message)) => Some(message),
            (Some(status), None) => Some(status),
            (None, None) => None,
        }
    }
}
