use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the Flow API: {0}")]
    Transport(String),
    #[error("The Flow API did not respond in time: {0}")]
    Timeout(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Flow reported an unknown payment status code: {0}")]
    UnknownStatus(i64),
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),
}

impl FlowApiError {
    /// Whether repeating the same call later could succeed. Flow rejecting a request outright (4xx) is not retryable;
    /// everything that points at the network or at Flow itself is.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::QueryError { status, .. } => *status >= 500,
            Self::JsonError(_) | Self::UnknownStatus(_) => true,
            Self::Initialization(_) | Self::InvalidRequest(_) => false,
        }
    }
}

impl From<reqwest::Error> for FlowApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
