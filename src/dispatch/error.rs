//! Errors raised by dispatched calls.

use thiserror::Error;

use crate::value::{ConversionError, Value};

/// Failure of a dispatched call.
///
/// Implementations return these too; a spy forwards them untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    #[error("undefined method '{method}' for {receiver}")]
    NoMethod { receiver: String, method: String },

    #[error("private method '{method}' called for {receiver}")]
    PrivateMethod { receiver: String, method: String },

    #[error("protected method '{method}' called for {receiver}")]
    ProtectedMethod { receiver: String, method: String },

    #[error("wrong number of arguments for '{method}' (given {given}, expected {expected})")]
    ArgumentCount {
        method: String,
        given: usize,
        expected: usize,
    },

    /// Error raised by the callable itself.
    #[error("{0}")]
    Raised(String),

    #[error("argument conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}

impl CallError {
    pub fn raised(message: impl Into<String>) -> Self {
        CallError::Raised(message.into())
    }
}

/// Fail with [`CallError::ArgumentCount`] unless exactly `expected` arguments were passed.
pub fn check_arity(method: &str, args: &[Value], expected: usize) -> Result<(), CallError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(CallError::ArgumentCount {
            method: method.to_string(),
            given: args.len(),
            expected,
        })
    }
}
