//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::cache::{make_key, CacheKey, KeyPart, KeySource};
use crate::error::{CacheError, Result};

/// Request body for POST /caches/:name/discard
///
/// Names the entry to drop by the arguments of the call that produced it.
/// Both fields default to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscardRequest {
    /// Positional arguments, in call order
    #[serde(default)]
    pub args: Vec<Value>,
    /// Keyword arguments
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl KeySource for DiscardRequest {
    fn cache_key(&self) -> Result<CacheKey> {
        let args = self
            .args
            .iter()
            .enumerate()
            .map(|(i, value)| json_key_part(value, &format!("positional argument {}", i)))
            .collect::<Result<Vec<_>>>()?;
        let kwargs = self
            .kwargs
            .iter()
            .map(|(name, value)| {
                let part = json_key_part(value, &format!("keyword argument `{}`", name))?;
                Ok((name.clone(), part))
            })
            .collect::<Result<Vec<_>>>()?;

        make_key(&args, kwargs)
    }
}

/// Converts a JSON value to a key argument.
///
/// Integers stay integers, other numbers become floats and arrays become
/// tuples. Objects are mutable mappings and cannot be hashed.
pub fn json_key_part(value: &Value, what: &str) -> Result<KeyPart> {
    match value {
        Value::Null => Ok(KeyPart::None),
        Value::Bool(b) => Ok(KeyPart::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(KeyPart::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(KeyPart::from(u))
            } else {
                n.as_f64().map(KeyPart::from).ok_or_else(|| {
                    CacheError::Unhashable(format!("{} is not a representable number", what))
                })
            }
        }
        Value::String(s) => Ok(KeyPart::from(s.as_str())),
        Value::Array(items) => items
            .iter()
            .map(|item| json_key_part(item, what))
            .collect::<Result<Vec<_>>>()
            .map(KeyPart::Tuple),
        Value::Object(_) => Err(CacheError::Unhashable(format!(
            "{} is a JSON object",
            what
        ))),
    }
}
