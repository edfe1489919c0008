//! Error types for the HubSpot contacts client.
//!
//! # Design
//! Four kinds, one per stage of a request: encoding the body, moving bytes
//! over the wire, the server refusing the request, and decoding the reply.
//! A non-2xx response keeps its status and raw body verbatim; the server's
//! error schema is never interpreted.

use std::fmt;

/// Errors returned by every client operation.
#[derive(Debug)]
pub enum ClientError {
    /// The request payload could not be serialized to JSON.
    Encoding(serde_json::Error),

    /// The request could not be sent or the response could not be read.
    Transport(Box<ureq::Error>),

    /// The server answered with a status outside `[200, 300)`.
    Api { status: u16, body: String },

    /// A 2xx response body did not match the expected shape.
    Decoding(serde_json::Error),
}

impl ClientError {
    /// Status code of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport(e) if matches!(**e, ureq::Error::Timeout(_)))
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Encoding(e) => write!(f, "failed to encode request body: {e}"),
            ClientError::Transport(e) => write!(f, "failed to execute request: {e}"),
            ClientError::Api { status, body } => write!(f, "API error (status {status}): {body}"),
            ClientError::Decoding(e) => write!(f, "failed to decode response: {e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Encoding(e) | ClientError::Decoding(e) => Some(e),
            ClientError::Transport(e) => Some(e.as_ref()),
            ClientError::Api { .. } => None,
        }
    }
}

impl From<ureq::Error> for ClientError {
    fn from(e: ureq::Error) -> Self {
        ClientError::Transport(Box::new(e))
    }
}
