//! A completion provider for Google's Gemini `generateContent` API.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use gemchat_model::{
    CompletionProvider, CompletionRequest, CompletionResponse, ErrorKind,
    ProviderError,
};
use mime::Mime;
use reqwest::{Client, RequestBuilder, Url, header};

pub use config::{
    AuthMode, GeminiConfig, GeminiConfigBuilder, ParseAuthModeError,
};
use proto::{ErrorResponse, GenerateContentResponse};

/// Error type for [`GeminiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Gemini model provider.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> Result<Url, Error> {
        let config = &self.config;
        let raw = format!(
            "{}/models/{}:generateContent",
            config.base_url, config.model
        );
        let mut url = Url::parse(&raw).map_err(|err| {
            Error::new(
                format!("invalid endpoint {raw}: {err}"),
                ErrorKind::Other,
            )
        })?;
        if config.auth_mode == AuthMode::Query {
            url.query_pairs_mut().append_pair("key", &config.api_key);
        }
        Ok(url)
    }

    fn build_request(
        &self,
        req: &CompletionRequest,
    ) -> Result<RequestBuilder, Error> {
        let body = proto::create_request(req);
        let mut builder = self
            .client
            .post(self.endpoint()?)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .json(&body);
        if self.config.auth_mode == AuthMode::Header {
            builder = builder.bearer_auth(&self.config.api_key);
        }
        Ok(builder)
    }
}

impl CompletionProvider for GeminiProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, Self::Error>>
    + Send
    + 'static {
        trace!(
            model = %self.config.model,
            auth_mode = ?self.config.auth_mode,
            "building request"
        );
        let request = self.build_request(req);

        async move {
            let resp = request?.send().await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let detail = ErrorResponse::describe(&body)
                    .unwrap_or_else(|| "no details".to_owned());
                return Err(Error::new(
                    format!("server returned {status} ({detail})"),
                    ErrorKind::Status,
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            if let Some(content_type) = &content_type {
                let is_json = content_type
                    .parse::<Mime>()
                    .map(|m| {
                        m.subtype() == mime::JSON
                            || m.suffix() == Some(mime::JSON)
                    })
                    .unwrap_or(false);
                if !is_json {
                    return Err(Error::new(
                        format!("unexpected content type: {content_type}"),
                        ErrorKind::MalformedBody,
                    ));
                }
            }

            let body = resp.text().await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;
            trace!("got response body: {body}");
            let parsed = serde_json::from_str::<GenerateContentResponse>(&body)
                .map_err(|err| {
                    Error::new(format!("{err}"), ErrorKind::MalformedBody)
                })?;
            Ok(parsed.into_completion_response())
        }
    }
}
