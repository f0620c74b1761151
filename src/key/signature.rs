//! Signature Binding
//!
//! Normalizes positional and keyword forms of the same logical argument.
//! A `Signature` is declared once per memoized function and compiled into a
//! `Binder` at decoration time; the binder is then reused on every call.

use std::collections::HashSet;

use crate::error::{CacheError, Result};
use crate::key::value::{ArgValue, CallArgs, KeyPart};

/// Declared parameter of a memoized function.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<ArgValue>,
}

// == Signature ==
/// Parameter list of a memoized function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
    var_positional: bool,
    var_keywords: bool,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter without a default.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Adds a parameter with a default value.
    pub fn optional(mut self, name: impl Into<String>, default: impl Into<ArgValue>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    /// Accepts extra positional arguments.
    pub fn with_var_positional(mut self) -> Self {
        self.var_positional = true;
        self
    }

    /// Accepts extra keyword arguments.
    pub fn with_var_keywords(mut self) -> Self {
        self.var_keywords = true;
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    // == Compile ==
    /// Validates the declaration and precomputes default key parts.
    pub fn compile(&self) -> Result<Binder> {
        let mut seen = HashSet::new();
        let mut saw_default = false;
        let mut params = Vec::with_capacity(self.params.len());

        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                return Err(CacheError::InvalidConfig(format!(
                    "duplicate parameter '{}'",
                    param.name
                )));
            }
            let default = match &param.default {
                Some(value) => {
                    saw_default = true;
                    Some(value.canonicalize()?)
                }
                None if saw_default => {
                    return Err(CacheError::InvalidConfig(format!(
                        "required parameter '{}' follows a parameter with a default",
                        param.name
                    )));
                }
                None => None,
            };
            params.push((param.name.clone(), default));
        }

        Ok(Binder {
            params,
            var_positional: self.var_positional,
            var_keywords: self.var_keywords,
        })
    }
}

// == Bound Args ==
/// Arguments after binding: one value per declared parameter, in
/// declaration order, followed by the variadic remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundArgs {
    pub positional: Vec<KeyPart>,
    pub keywords: Vec<(String, KeyPart)>,
}

// == Binder ==
/// Compiled form of a `Signature`.
#[derive(Debug, Clone)]
pub struct Binder {
    params: Vec<(String, Option<KeyPart>)>,
    var_positional: bool,
    var_keywords: bool,
}

impl Binder {
    // == Bind ==
    /// Maps a call onto the declared parameters.
    pub fn bind(&self, args: &CallArgs) -> Result<BoundArgs> {
        let declared = self.params.len();
        let mut slots: Vec<Option<KeyPart>> = vec![None; declared];
        let mut extra_positional = Vec::new();
        let mut extra_keywords = Vec::new();

        for (index, value) in args.positional().iter().enumerate() {
            if index < declared {
                slots[index] = Some(value.canonicalize()?);
            } else if self.var_positional {
                extra_positional.push(value.canonicalize()?);
            } else {
                return Err(CacheError::SignatureMismatch(format!(
                    "takes {} positional arguments but {} were given",
                    declared,
                    args.positional().len()
                )));
            }
        }

        for (name, value) in args.keywords() {
            match self.params.iter().position(|(p, _)| p == name) {
                Some(index) if slots[index].is_some() => {
                    return Err(CacheError::SignatureMismatch(format!(
                        "multiple values for argument '{}'",
                        name
                    )));
                }
                Some(index) => slots[index] = Some(value.canonicalize()?),
                None if self.var_keywords => {
                    extra_keywords.push((name.clone(), value.canonicalize()?));
                }
                None => {
                    return Err(CacheError::SignatureMismatch(format!(
                        "unexpected keyword argument '{}'",
                        name
                    )));
                }
            }
        }

        let mut positional = Vec::with_capacity(declared + extra_positional.len());
        for ((name, default), slot) in self.params.iter().zip(slots) {
            match slot.or_else(|| default.clone()) {
                Some(part) => positional.push(part),
                None => {
                    return Err(CacheError::SignatureMismatch(format!(
                        "missing required argument '{}'",
                        name
                    )));
                }
            }
        }
        positional.extend(extra_positional);
        extra_keywords.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(BoundArgs {
            positional,
            keywords: extra_keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binder() -> Binder {
        Signature::new()
            .required("a")
            .optional("b", 10)
            .compile()
            .unwrap()
    }

    #[test]
    fn test_positional_and_keyword_forms_collapse() {
        let binder = binder();
        let by_position = binder.bind(&CallArgs::new().arg(1).arg(2)).unwrap();
        let by_keyword = binder.bind(&CallArgs::new().arg(1).kwarg("b", 2)).unwrap();
        let all_keywords = binder
            .bind(&CallArgs::new().kwarg("b", 2).kwarg("a", 1))
            .unwrap();

        assert_eq!(by_position, by_keyword);
        assert_eq!(by_position, all_keywords);
    }

    #[test]
    fn test_defaults_are_filled() {
        let binder = binder();
        let implicit = binder.bind(&CallArgs::new().arg(1)).unwrap();
        let explicit = binder.bind(&CallArgs::new().arg(1).arg(10)).unwrap();
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn test_too_many_positional() {
        let result = binder().bind(&CallArgs::new().arg(1).arg(2).arg(3));
        assert!(matches!(result, Err(CacheError::SignatureMismatch(_))));
    }

    #[test]
    fn test_unknown_keyword() {
        let result = binder().bind(&CallArgs::new().arg(1).kwarg("c", 3));
        assert!(matches!(result, Err(CacheError::SignatureMismatch(_))));
    }

    #[test]
    fn test_duplicate_value() {
        let result = binder().bind(&CallArgs::new().arg(1).kwarg("a", 1));
        assert!(matches!(result, Err(CacheError::SignatureMismatch(_))));
    }

    #[test]
    fn test_missing_required() {
        let result = binder().bind(&CallArgs::new().kwarg("b", 1));
        assert!(matches!(result, Err(CacheError::SignatureMismatch(_))));
    }

    #[test]
    fn test_variadics_capture_extras() {
        let binder = Signature::new()
            .required("a")
            .with_var_positional()
            .with_var_keywords()
            .compile()
            .unwrap();

        let bound = binder
            .bind(&CallArgs::new().arg(1).arg(2).kwarg("z", 0).kwarg("y", 0))
            .unwrap();

        assert_eq!(bound.positional, vec![KeyPart::Int(1), KeyPart::Int(2)]);
        let names: Vec<&str> = bound.keywords.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["y", "z"]);
    }

    #[test]
    fn test_compile_rejects_bad_declarations() {
        let duplicate = Signature::new().required("a").required("a").compile();
        assert!(matches!(duplicate, Err(CacheError::InvalidConfig(_))));

        let ordering = Signature::new().optional("a", 1).required("b").compile();
        assert!(matches!(ordering, Err(CacheError::InvalidConfig(_))));

        let unhashable_default = Signature::new()
            .optional("a", ArgValue::List(vec![]))
            .compile();
        assert!(matches!(
            unhashable_default,
            Err(CacheError::UnhashableArgument(_))
        ));
    }
}
