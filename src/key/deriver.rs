//! Key Deriver
//!
//! Turns a function identity plus call arguments into a `CacheKey`.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::key::signature::{Binder, Signature};
use crate::key::value::{CallArgs, KeyPart};

// == Cache Key ==
/// Canonical key of one memoized call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    function: Arc<str>,
    positional: Vec<KeyPart>,
    keywords: Vec<(String, KeyPart)>,
}

impl CacheKey {
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn positional(&self) -> &[KeyPart] {
        &self.positional
    }

    pub fn keywords(&self) -> &[(String, KeyPart)] {
        &self.keywords
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        let mut first = true;
        for part in &self.positional {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", part)?;
            first = false;
        }
        for (name, part) in &self.keywords {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", name, part)?;
            first = false;
        }
        write!(f, ")")
    }
}

// == Key Deriver ==
/// Derives cache keys for one memoized function.
///
/// Without a signature, keys are strict: positional arguments in call order
/// and keyword arguments sorted by name, so `f(1, b=2)` and `f(1, 2)` are
/// distinct. With a signature, both forms bind to the same parameters first.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    function: Arc<str>,
    binder: Option<Binder>,
}

impl KeyDeriver {
    /// Creates a strict deriver for the named function.
    pub fn new(function: impl Into<Arc<str>>) -> Self {
        Self {
            function: function.into(),
            binder: None,
        }
    }

    /// Creates a deriver that binds calls to `signature` before keying.
    pub fn with_signature(function: impl Into<Arc<str>>, signature: &Signature) -> Result<Self> {
        Ok(Self {
            function: function.into(),
            binder: Some(signature.compile()?),
        })
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn binds_signature(&self) -> bool {
        self.binder.is_some()
    }

    // == Derive ==
    /// Builds the key for `args`.
    ///
    /// Fails with `UnhashableArgument` when a value cannot be keyed, or with
    /// `SignatureMismatch` when the call does not fit the signature.
    pub fn derive(&self, args: &CallArgs) -> Result<CacheKey> {
        let (positional, keywords) = match &self.binder {
            Some(binder) => {
                let bound = binder.bind(args)?;
                (bound.positional, bound.keywords)
            }
            None => {
                let positional = args
                    .positional()
                    .iter()
                    .map(|v| v.canonicalize())
                    .collect::<Result<Vec<_>>>()?;
                let mut keywords = args
                    .keywords()
                    .iter()
                    .map(|(name, v)| -> Result<(String, KeyPart)> {
                        Ok((name.clone(), v.canonicalize()?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                keywords.sort_by(|a, b| a.0.cmp(&b.0));
                (positional, keywords)
            }
        };

        Ok(CacheKey {
            function: Arc::clone(&self.function),
            positional,
            keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::key::value::ArgValue;

    #[test]
    fn test_same_args_same_key() {
        let deriver = KeyDeriver::new("square");
        let a = deriver.derive(&CallArgs::new().arg(3)).unwrap();
        let b = deriver.derive(&CallArgs::new().arg(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_function_identity_discriminates() {
        let args = CallArgs::new().arg(3);
        let a = KeyDeriver::new("square").derive(&args).unwrap();
        let b = KeyDeriver::new("cube").derive(&args).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_argument_values_discriminate() {
        let deriver = KeyDeriver::new("add");
        let a = deriver.derive(&CallArgs::new().arg(1).arg(2)).unwrap();
        let b = deriver.derive(&CallArgs::new().arg(1).arg(3)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_keyword_order_is_irrelevant() {
        let deriver = KeyDeriver::new("f");
        let a = deriver
            .derive(&CallArgs::new().kwarg("x", 1).kwarg("y", 2))
            .unwrap();
        let b = deriver
            .derive(&CallArgs::new().kwarg("y", 2).kwarg("x", 1))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_strict_mode_keeps_forms_apart() {
        let deriver = KeyDeriver::new("f");
        let positional = deriver.derive(&CallArgs::new().arg(1).arg(2)).unwrap();
        let keyword = deriver.derive(&CallArgs::new().arg(1).kwarg("b", 2)).unwrap();
        assert_ne!(positional, keyword);
    }

    #[test]
    fn test_bound_mode_collapses_forms() {
        let signature = Signature::new().required("a").required("b");
        let deriver = KeyDeriver::with_signature("f", &signature).unwrap();
        assert!(deriver.binds_signature());

        let positional = deriver.derive(&CallArgs::new().arg(1).arg(2)).unwrap();
        let keyword = deriver.derive(&CallArgs::new().arg(1).kwarg("b", 2)).unwrap();
        assert_eq!(positional, keyword);
    }

    #[test]
    fn test_extra_keyword_is_distinct() {
        let deriver = KeyDeriver::new("f");
        let plain = deriver.derive(&CallArgs::new().arg(3)).unwrap();
        let flagged = deriver
            .derive(&CallArgs::new().arg(3).kwarg("extra_kw", true))
            .unwrap();
        assert_ne!(plain, flagged);
    }

    #[test]
    fn test_unhashable_argument_fails() {
        let deriver = KeyDeriver::new("f");
        let result = deriver.derive(&CallArgs::new().arg(ArgValue::List(vec![])));
        assert!(matches!(result, Err(CacheError::UnhashableArgument(_))));

        let result = deriver.derive(&CallArgs::new().kwarg("m", ArgValue::Map(vec![])));
        assert!(matches!(result, Err(CacheError::UnhashableArgument(_))));
    }

    #[test]
    fn test_display() {
        let key = KeyDeriver::new("f")
            .derive(&CallArgs::new().arg(1).kwarg("b", "x"))
            .unwrap();
        assert_eq!(key.to_string(), "f(Int(1), b=Str(\"x\"))");
    }
}
