use thiserror::Error;

/// Failure talking to one of the HTTP collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Non-2xx response; `body` is the raw response text.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid JSON response: {0}")]
    Decode(String),
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A command was issued before the state it depends on exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("select an action first")]
    NoActionSelected,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}

impl MonitorError {
    pub fn is_transport(&self) -> bool {
        matches!(self, MonitorError::Transport(_))
    }
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
