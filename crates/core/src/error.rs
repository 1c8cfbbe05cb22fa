//! Error taxonomy for calls against the upstream API.

use thiserror::Error;

/// Failures raised while talking to the upstream service.
///
/// Empty results (no tracks, nothing left after filtering) are not errors
/// and never show up here; see [`crate::pipeline::Fetched`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection failure, timeout or a non-2xx HTTP status.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The JSON envelope carried a non-zero `code`.
    #[error("{endpoint} returned code {code}: {message}")]
    Service {
        endpoint: &'static str,
        code: i64,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },
}

impl ApiError {
    /// True for network level failures, which no fallback tier swallows.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub(crate) fn malformed(endpoint: &'static str, reason: impl Into<String>) -> Self {
        ApiError::Malformed {
            endpoint,
            reason: reason.into(),
        }
    }
}
