//! Dynamic values passed through spyglass dispatch tables.
//!
//! Every spyable callable takes its arguments as a slice of [`Value`] and
//! returns a [`Value`]. Argument matchers compare calls by value equality, so
//! this crate is deliberately small: a closed set of value shapes with
//! `From`/`TryFrom` conversions for the common Rust types.
//!
//! With the `derive` feature, `#[derive(ArgValue)]` generates the conversions
//! for user structs and enums.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod value;

pub use value::{FromValue, Value};

#[cfg(feature = "derive")]
pub use spyglass_derive::ArgValue;

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Errors produced when converting a [`Value`] back into a Rust type.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The value had a different shape than the target type expects.
    TypeMismatch { expected: String, got: String },
    /// A numeric value does not fit in the target integer type.
    OutOfRange { target: &'static str, value: String },
    ExpectedList(String),
    ExpectedTuple(String),
    ExpectedRecord(String),
    ExpectedVariant(String),
    ExpectedOption(String),
    MissingField(String),
    MissingIndex(usize),
    WrongFieldCount { expected: usize, got: usize },
    /// A variant value named a case the target enum does not have.
    UnknownCase { type_name: String, case_name: String },
    UnexpectedPayload,
    FieldError(String, Box<ConversionError>),
    IndexError(usize, Box<ConversionError>),
    PayloadError(Box<ConversionError>),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {}, got {}", expected, got)
            }
            Self::OutOfRange { target, value } => {
                write!(f, "value {} out of range for {}", value, target)
            }
            Self::ExpectedList(got) => write!(f, "expected list, got {}", got),
            Self::ExpectedTuple(got) => write!(f, "expected tuple, got {}", got),
            Self::ExpectedRecord(got) => write!(f, "expected record, got {}", got),
            Self::ExpectedVariant(got) => write!(f, "expected variant, got {}", got),
            Self::ExpectedOption(got) => write!(f, "expected option, got {}", got),
            Self::MissingField(name) => write!(f, "missing field '{}'", name),
            Self::MissingIndex(i) => write!(f, "missing element at index {}", i),
            Self::WrongFieldCount { expected, got } => {
                write!(f, "wrong field count: expected {}, got {}", expected, got)
            }
            Self::UnknownCase {
                type_name,
                case_name,
            } => write!(f, "unknown case '{}' for {}", case_name, type_name),
            Self::UnexpectedPayload => write!(f, "unexpected payload on unit case"),
            Self::FieldError(name, inner) => write!(f, "field '{}': {}", name, inner),
            Self::IndexError(i, inner) => write!(f, "index {}: {}", i, inner),
            Self::PayloadError(inner) => write!(f, "payload: {}", inner),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConversionError {}

/// Build a `[Value; N]` argument list from anything convertible into [`Value`].
///
/// ```
/// use spyglass_value::{args, Value};
///
/// let call = args![1, "two", 3.0];
/// assert_eq!(call[1], Value::String("two".into()));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        {
            let empty: [$crate::Value; 0] = [];
            empty
        }
    };
    ($($arg:expr),+ $(,)?) => {
        [$($crate::Value::from($arg)),+]
    };
}

#[doc(hidden)]
pub mod __private {
    pub use alloc::boxed::Box;
    pub use alloc::string::String;
    pub use alloc::vec;
    pub use alloc::vec::Vec;
    pub use core::convert::{From, TryFrom};
    pub use core::result::Result::{self, Err, Ok};
}
