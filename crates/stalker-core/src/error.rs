//! Error types for the Stalker portal client
//!
//! Every failure carries the portal [`Operation`] that produced it together
//! with the underlying cause. StalkerError implements Serialize so it can be
//! handed to JSON or IPC callers as a plain message.

use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Portal operation an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `stb/handshake`
    Handshake,
    /// `itv/get_all_channels`
    GetChannels,
    /// `itv/create_link`
    CreateLink,
    /// `itv/get_epg`
    GetEpg,
    /// EPG to XMLTV conversion
    ConvertXmltv,
    /// Channel logo download
    DownloadLogo,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Handshake => "handshake",
            Operation::GetChannels => "get_all_channels",
            Operation::CreateLink => "create_link",
            Operation::GetEpg => "get_epg",
            Operation::ConvertXmltv => "xmltv conversion",
            Operation::DownloadLogo => "logo download",
        };
        f.write_str(name)
    }
}

/// Error type for Stalker portal operations
#[derive(Error, Debug)]
pub enum StalkerError {
    /// The request could not be sent or the body could not be read
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    /// The portal answered with a non-success status
    #[error("{operation} returned HTTP {status}")]
    Status { operation: Operation, status: u16 },

    /// The portal rejected the session (HTTP 401/403)
    #[error("{operation} rejected the session token (HTTP {status})")]
    Unauthorized { operation: Operation, status: u16 },

    /// The response body was not the expected envelope
    #[error("Failed to decode {operation} response: {message}")]
    Decode { operation: Operation, message: String },

    /// The handshake failed; wraps the transport or decode cause
    #[error("Authentication failed: {0}")]
    Auth(#[source] Box<StalkerError>),

    /// The configured timezone identifier is not a known IANA zone
    #[error("Unknown timezone: {zone}")]
    Timezone { zone: String },

    /// Missing or malformed caller input
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A portal or logo URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Writing to local storage failed
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StalkerError {
    /// Operation the error belongs to, if it came from a portal call
    pub fn operation(&self) -> Option<Operation> {
        match self {
            StalkerError::Transport { operation, .. }
            | StalkerError::Status { operation, .. }
            | StalkerError::Unauthorized { operation, .. }
            | StalkerError::Decode { operation, .. } => Some(*operation),
            StalkerError::Auth(_) => Some(Operation::Handshake),
            _ => None,
        }
    }

    /// True when the portal no longer accepts the current token.
    ///
    /// The client never re-authenticates on its own; callers seeing this
    /// should invalidate the session and retry.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StalkerError::Unauthorized { .. })
    }

    pub(crate) fn decode(operation: Operation, message: impl Into<String>) -> Self {
        StalkerError::Decode {
            operation,
            message: message.into(),
        }
    }
}

/// Serialize StalkerError as its display string
impl Serialize for StalkerError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for Stalker portal operations
pub type Result<T> = std::result::Result<T, StalkerError>;
