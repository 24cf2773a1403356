//! Values, parameter maps and result payloads.

use std::collections::BTreeMap;
use std::fmt;

use acid_error::{AcidError, Result};
use serde::{Deserialize, Serialize};

/// A single field value: an integer, a string, or an ordered integer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Str(String),
    IntList(Vec<i64>),
}

impl Value {
    /// Human-readable kind name used in type-mismatch errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::IntList(_) => "int list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::IntList(list) => write!(f, "{list:?}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<i64>> for Value {
    fn from(list: Vec<i64>) -> Self {
        Self::IntList(list)
    }
}

/// Named fields, ordered by name.
///
/// Used both for operation parameters ([`Params`]) and for the payload a
/// committed operation returns ([`Payload`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, Value>);

/// Operation parameters.
pub type Params = Fields;

/// Operation result payload.
pub type Payload = Fields;

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_owned(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_owned(), value.into());
    }

    /// Merge every field of `other` into `self`, overwriting on collision.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Read an integer field.
    pub fn int(&self, name: &str) -> Result<i64> {
        match self.0.get(name) {
            Some(Value::Int(v)) => Ok(*v),
            Some(_) => Err(AcidError::TypeMismatch {
                name: name.to_owned(),
                expected: "int",
            }),
            None => Err(AcidError::missing(name)),
        }
    }

    /// Read an integer-list field.
    pub fn int_list(&self, name: &str) -> Result<&[i64]> {
        match self.0.get(name) {
            Some(Value::IntList(list)) => Ok(list),
            Some(_) => Err(AcidError::TypeMismatch {
                name: name.to_owned(),
                expected: "int list",
            }),
            None => Err(AcidError::missing(name)),
        }
    }

    /// Read a string field.
    pub fn text(&self, name: &str) -> Result<&str> {
        match self.0.get(name) {
            Some(Value::Str(s)) => Ok(s),
            Some(_) => Err(AcidError::TypeMismatch {
                name: name.to_owned(),
                expected: "string",
            }),
            None => Err(AcidError::missing(name)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}
