//! Error types for the remote PES client.
use thiserror::Error;

/// Represents errors that can occur while talking to the PES.
///
/// Any of these aborts the current operation on the resource involved; the
/// client never retries.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned status {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("An API key is required to push records")]
    MissingApiKey,

    #[error("Unexpected response body from {url}: {reason}")]
    InvalidBody { url: String, reason: String },

    #[error("Prerequisite collection `{0}` could not be fetched")]
    PrerequisiteUnavailable(&'static str),
}
