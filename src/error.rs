//! Error types for the Bus Tracker client.

use thiserror::Error;

/// Failure to turn a response envelope into records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The upstream API answered with an `error` element instead of data.
    #[error("upstream error: {message}")]
    Upstream { message: String },
    /// The envelope or one of its records has an unexpected shape.
    #[error("malformed envelope: {0}")]
    Malformed(String),
}

/// Broad classification used when logging a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    UpstreamData,
    /// Nothing was sent: the client is missing configuration.
    Config,
}

#[derive(Debug, Error)]
pub enum BusTrackerError {
    /// Connection failure or a non-2xx status.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid XML body: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("record does not match {kind}: {source}")]
    Record {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing configuration: {0}")]
    Config(String),
}

impl BusTrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BusTrackerError::Transport(_) | BusTrackerError::InvalidUrl(_) => ErrorKind::Transport,
            BusTrackerError::Config(_) => ErrorKind::Config,
            _ => ErrorKind::UpstreamData,
        }
    }

    /// The upstream error message, when the API reported one.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            BusTrackerError::Envelope(EnvelopeError::Upstream { message }) => Some(message),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BusTrackerError>;
