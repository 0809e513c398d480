//! Error types for interception.

use thiserror::Error;

/// Contract violations raised by the interception entry points.
///
/// None of these are retried; each leaves the registry and every dispatch
/// table exactly as they were before the failing call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpyError {
    /// Malformed call, such as the wrong number of identifying arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("undefined method '{method}' for {receiver}")]
    NoSuchMethod { receiver: String, method: String },

    #[error("'{method}' on {receiver} is already spied")]
    AlreadySpied { receiver: String, method: String },

    #[error("'{method}' on {receiver} is not spied")]
    MethodNotSpied { receiver: String, method: String },
}
