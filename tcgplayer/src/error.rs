use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Response error:\nStatusCode: {0}\nText: {1}")]
    Response(reqwest::StatusCode, String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Malformed catalog entry at index {index}: {reason}")]
    MalformedCatalogEntry { index: usize, reason: String },

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Collection cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Network, HTTP status and body-shape failures. These are the only
    /// errors worth retrying.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Request(_) | Error::Response(..) | Error::MalformedResponse(_)
        )
    }

    /// Transport failures that may clear up on their own. A 4xx other than
    /// 429 is the client's fault and is returned at once.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Response(status, _) => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            other => other.is_transport(),
        }
    }
}
