//! Runtime values

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::ConversionError;

/// A value passed to or returned from a dispatched callable.
///
/// Equality is structural, except that integers compare by numeric value
/// whichever of `S64`/`U64` holds them. Floats follow IEEE semantics, so a
/// `NaN` argument never matches a `NaN` matcher.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// The "nothing" result of a callable that produces no value.
    Unit,
    Bool(bool),
    S64(i64),
    U64(u64),
    F64(f64),
    Char(char),
    String(String),
    Bytes(Vec<u8>),

    List(Vec<Value>),
    Tuple(Vec<Value>),
    Option(Option<Box<Value>>),
    Record {
        type_name: String,
        fields: Vec<(String, Value)>,
    },
    Variant {
        type_name: String,
        case_name: String,
        payload: Vec<Value>,
    },
}

impl Value {
    /// Short name of this value's shape, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::S64(_) => "s64",
            Value::U64(_) => "u64",
            Value::F64(_) => "f64",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Option(_) => "option",
            Value::Record { .. } => "record",
            Value::Variant { .. } => "variant",
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of the value; unsigned values that fit are widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::S64(n) => Some(*n),
            Value::U64(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a field of a record value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => {
                fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Build a record value from `(name, value)` pairs.
    pub fn record<N, V>(type_name: impl Into<String>, fields: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        Value::Record {
            type_name: type_name.into(),
            fields: fields
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::S64(a), Value::U64(b)) | (Value::U64(b), Value::S64(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::S64(a), Value::S64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Option(a), Value::Option(b)) => a == b,
            (
                Value::Record {
                    type_name: ta,
                    fields: fa,
                },
                Value::Record {
                    type_name: tb,
                    fields: fb,
                },
            ) => ta == tb && fa == fb,
            (
                Value::Variant {
                    type_name: ta,
                    case_name: ca,
                    payload: pa,
                },
                Value::Variant {
                    type_name: tb,
                    case_name: cb,
                    payload: pb,
                },
            ) => ta == tb && ca == cb && pa == pb,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::S64(n) => write!(f, "{}", n),
            Value::U64(n) => write!(f, "{}", n),
            Value::F64(n) => write!(f, "{:?}", n),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                write!(f, ")")
            }
            Value::Option(None) => write!(f, "None"),
            Value::Option(Some(inner)) => write!(f, "Some({})", inner),
            Value::Record { type_name, fields } => {
                write!(f, "{} {{", type_name)?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}: {}", name, value)?;
                }
                write!(f, " }}")
            }
            Value::Variant {
                type_name,
                case_name,
                payload,
            } => {
                write!(f, "{}::{}", type_name, case_name)?;
                if !payload.is_empty() {
                    write!(f, "(")?;
                    write_seq(f, payload)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

// ============================================================================
// From implementations for primitives
// ============================================================================

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self { Value::S64(i64::from(v)) }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self { Value::U64(u64::from(v)) }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::U64(v as u64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F64(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(String::from(v))
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Option(v.map(|x| Box::new(x.into())))
    }
}

impl<T: Into<Value>> From<Box<T>> for Value {
    fn from(v: Box<T>) -> Self {
        (*v).into()
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::Tuple(alloc::vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Value::Tuple(alloc::vec![a.into(), b.into(), c.into()])
    }
}

// ============================================================================
// TryFrom implementations for primitives
// ============================================================================

fn mismatch(expected: &str, got: &Value) -> ConversionError {
    ConversionError::TypeMismatch {
        expected: String::from(expected),
        got: String::from(got.kind()),
    }
}

macro_rules! impl_try_from_int {
    ($($ty:ty),*) => {
        $(impl TryFrom<Value> for $ty {
            type Error = ConversionError;
            fn try_from(v: Value) -> Result<Self, Self::Error> {
                let out_of_range = |value: String| ConversionError::OutOfRange {
                    target: stringify!($ty),
                    value,
                };
                match v {
                    Value::S64(n) => <$ty>::try_from(n).map_err(|_| out_of_range(n.to_string())),
                    Value::U64(n) => <$ty>::try_from(n).map_err(|_| out_of_range(n.to_string())),
                    other => Err(mismatch(stringify!($ty), &other)),
                }
            }
        })*
    };
}

impl_try_from_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl TryFrom<Value> for () {
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Unit => Ok(()),
            other => Err(mismatch("unit", &other)),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Bool(x) => Ok(x),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::F64(x) => Ok(x),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl TryFrom<Value> for char {
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Char(x) => Ok(x),
            other => Err(mismatch("char", &other)),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::String(x) => Ok(x),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl<T: TryFrom<Value, Error = ConversionError>> TryFrom<Value> for Vec<T> {
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    T::try_from(item).map_err(|e| ConversionError::IndexError(i, Box::new(e)))
                })
                .collect(),
            other => Err(ConversionError::ExpectedList(format!("{}", other.kind()))),
        }
    }
}

impl<A, B> TryFrom<Value> for (A, B)
where
    A: TryFrom<Value, Error = ConversionError>,
    B: TryFrom<Value, Error = ConversionError>,
{
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Tuple(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                let a = next_element::<A>(&mut items, 0)?;
                let b = next_element::<B>(&mut items, 1)?;
                Ok((a, b))
            }
            other => Err(ConversionError::ExpectedTuple(format!("{}", other))),
        }
    }
}

impl<A, B, C> TryFrom<Value> for (A, B, C)
where
    A: TryFrom<Value, Error = ConversionError>,
    B: TryFrom<Value, Error = ConversionError>,
    C: TryFrom<Value, Error = ConversionError>,
{
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Tuple(items) if items.len() == 3 => {
                let mut items = items.into_iter();
                let a = next_element::<A>(&mut items, 0)?;
                let b = next_element::<B>(&mut items, 1)?;
                let c = next_element::<C>(&mut items, 2)?;
                Ok((a, b, c))
            }
            other => Err(ConversionError::ExpectedTuple(format!("{}", other))),
        }
    }
}

fn next_element<T: TryFrom<Value, Error = ConversionError>>(
    items: &mut impl Iterator<Item = Value>,
    index: usize,
) -> Result<T, ConversionError> {
    let item = items.next().ok_or(ConversionError::MissingIndex(index))?;
    T::try_from(item).map_err(|e| ConversionError::IndexError(index, Box::new(e)))
}

// ============================================================================
// FromValue trait - avoids coherence issues with TryFrom for Option<T>
// ============================================================================

/// Conversion out of a [`Value`].
///
/// Exists alongside `TryFrom<Value>` because the blanket
/// `impl<T, U> TryFrom<U> for T where U: Into<T>` rules out a direct
/// `TryFrom<Value> for Option<T>`.
pub trait FromValue: Sized {
    fn from_value(v: Value) -> Result<Self, ConversionError>;
}

impl<T: TryFrom<Value, Error = ConversionError>> FromValue for T {
    fn from_value(v: Value) -> Result<Self, ConversionError> {
        T::try_from(v)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(v: Value) -> Result<Self, ConversionError> {
        match v {
            Value::Option(None) => Ok(None),
            Value::Option(Some(inner)) => T::from_value(*inner).map(Some),
            other => Err(ConversionError::ExpectedOption(format!("{}", other.kind()))),
        }
    }
}
