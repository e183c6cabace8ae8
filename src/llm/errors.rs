use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("client setup failed: {0}")]
    Config(String),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("api error {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("response contained no content")]
    EmptyResponse,

    #[error("extraction permits closed")]
    Closed,
}

impl LlmError {
    /// Rate limits, server errors and transport hiccups are worth another try.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || status.is_server_error()
            }
            Self::Config(_) | Self::Parse(_) | Self::EmptyResponse | Self::Closed => false,
        }
    }

    pub(crate) fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
