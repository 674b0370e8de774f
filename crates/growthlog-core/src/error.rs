use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrowthError {
    #[error("results file not found: {0}")]
    ResultsNotFound(String),

    #[error("invalid results file '{path}': {reason}")]
    InvalidResults { path: String, reason: String },

    #[error("invalid date format '{0}': expected 'short' or 'padded'")]
    InvalidDateFormat(String),

    #[error("invalid sink '{0}': expected 'auto', 'remote' or 'local'")]
    InvalidSinkChoice(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GrowthError>;

/// Failures at a sink boundary. `MetricsSink::append` logs these and turns
/// them into a boolean; callers that want the detail use `try_append`.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("destination error: {0}")]
    Destination(String),

    #[error("encode error: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        SinkError::Transport(err.to_string())
    }
}

impl From<csv::Error> for SinkError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(_) => SinkError::Destination(err.to_string()),
            _ => SinkError::Encode(err.to_string()),
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Destination(err.to_string())
    }
}
