//! Upstream API error types.

use thiserror::Error;

/// Errors produced by the Amap client.
///
/// `Http`, `Api` and `NoMatches` are expected outcomes that a tool reports to
/// its caller as text. `Transport` and `Decode` are faults.
#[derive(Debug, Error)]
pub enum AmapError {
    /// The upstream answered with a non-200 HTTP status.
    #[error("request error: {status} {body}")]
    Http { status: u16, body: String },

    /// HTTP 200, but the upstream `status` field was not `"1"`.
    #[error("request error: {status} {info}")]
    Api { status: u16, info: String },

    /// Geocoding succeeded but matched nothing.
    #[error("request error: 200 no geocode match for address: {address}")]
    NoMatches { address: String },

    /// Network-level failure (connect, timeout, body read).
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream body could not be decoded.
    #[error("malformed upstream response: {0}")]
    Decode(String),
}

impl AmapError {
    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether this error is a fault rather than a reportable upstream outcome.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode(_))
    }
}
