use crate::command::Command;
use crate::types::{CorrelationId, HandleId, SdpType};
use thiserror::Error;

/// Failure reported by a media engine behind a [`crate::Peer`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("Constraints rejected: {0}")]
    Constraints(String),

    #[error("Failed to apply {sdp_type} description: {reason}")]
    Description { sdp_type: SdpType, reason: String },

    #[error("Media engine error: {0}")]
    Engine(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing context field: {field}")]
    MissingField { field: String },

    #[error("Context field {field} is not a {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    #[error("Unsupported command: {0}")]
    UnsupportedCommand(Command),

    #[error("Unknown correlation: {0}")]
    UnknownCorrelation(String),

    #[error("Unknown handle: {0}")]
    UnknownHandle(HandleId),

    #[error("Out of sequence: {0}")]
    OutOfSequence(String),

    #[error("Peer {handle} negotiation failed")]
    Peer {
        handle: HandleId,
        #[source]
        source: PeerError,
    },

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Plugin session closed")]
    SessionClosed,

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, expected: &'static str) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            expected,
        }
    }

    pub(crate) fn unknown_token(token: CorrelationId) -> Self {
        Self::UnknownCorrelation(format!("no pending operation for {token}"))
    }

    /// Whether the error stems from an event or completion that does not match
    /// any in-flight operation.
    #[must_use]
    pub const fn is_correlation_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownCorrelation(_) | Self::UnknownHandle(_) | Self::OutOfSequence(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
