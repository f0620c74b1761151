//! Argument Values
//!
//! Dynamic argument model for memoized calls and its canonical hashable form.

use crate::error::{CacheError, Result};

// == Arg Value ==
/// A single call argument as seen by the key deriver.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Immutable sequence, hashable when every member is
    Tuple(Vec<ArgValue>),
    /// Mutable sequence, never hashable
    List(Vec<ArgValue>),
    /// Mutable mapping, never hashable
    Map(Vec<(ArgValue, ArgValue)>),
    /// Mutable unordered set, never hashable
    Set(Vec<ArgValue>),
}

impl ArgValue {
    /// Name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::None => "none",
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::Str(_) => "str",
            ArgValue::Bytes(_) => "bytes",
            ArgValue::Tuple(_) => "tuple",
            ArgValue::List(_) => "list",
            ArgValue::Map(_) => "map",
            ArgValue::Set(_) => "set",
        }
    }

    // == Canonicalize ==
    /// Converts the value into its hashable key form.
    ///
    /// Fails with `UnhashableArgument` for mutable containers and for NaN,
    /// which is not equal to itself.
    pub fn canonicalize(&self) -> Result<KeyPart> {
        match self {
            ArgValue::None => Ok(KeyPart::None),
            ArgValue::Bool(b) => Ok(KeyPart::Bool(*b)),
            ArgValue::Int(i) => Ok(KeyPart::Int(*i)),
            ArgValue::Float(f) => {
                if f.is_nan() {
                    return Err(CacheError::UnhashableArgument(
                        "NaN is not equal to itself".to_string(),
                    ));
                }
                // -0.0 == 0.0, so both share one bit pattern
                let normalized = if *f == 0.0 { 0.0f64 } else { *f };
                Ok(KeyPart::Float(normalized.to_bits()))
            }
            ArgValue::Str(s) => Ok(KeyPart::Str(s.clone())),
            ArgValue::Bytes(b) => Ok(KeyPart::Bytes(b.clone())),
            ArgValue::Tuple(items) => items
                .iter()
                .map(ArgValue::canonicalize)
                .collect::<Result<Vec<_>>>()
                .map(KeyPart::Tuple),
            ArgValue::List(_) | ArgValue::Map(_) | ArgValue::Set(_) => {
                Err(CacheError::UnhashableArgument(format!(
                    "{} is a mutable container",
                    self.type_name()
                )))
            }
        }
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Str(value)
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(value: Vec<u8>) -> Self {
        ArgValue::Bytes(value)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArgValue::None, Into::into)
    }
}

// == Key Part ==
/// Canonical, hashable form of an `ArgValue`.
///
/// Floats are stored by bit pattern after normalization, which gives
/// `Eq` and `Hash` a consistent meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    None,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<KeyPart>),
}

// == Call Args ==
/// Positional and keyword arguments of a single call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    keywords: Vec<(String, ArgValue)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing an earlier value for the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.keywords.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.keywords.push((name, value)),
        }
        self
    }

    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    pub fn keywords(&self) -> &[(String, ArgValue)] {
        &self.keywords
    }

    /// Looks up a keyword argument by name.
    pub fn keyword(&self, name: &str) -> Option<&ArgValue> {
        self.keywords
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}
