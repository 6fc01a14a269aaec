//! Error types for transports.

use thiserror::Error;

/// Errors that can occur while opening or reading the event stream.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for the server.
    #[error("Request timed out")]
    Timeout,

    /// The stream went quiet for longer than the idle timeout.
    #[error("No data received for {0} ms")]
    Idle(u64),

    /// The response body failed mid-stream.
    #[error("Stream interrupted: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            SourceError::Stream(err.to_string())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}
