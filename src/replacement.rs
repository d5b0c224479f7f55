// used to print out readable forms of a value
use std::fmt;

use std::collections::HashMap;

/// A literal value usable in a `DEFAULTS` block, an include override object,
/// or a caller-supplied override set.
///
/// Parsing order matters: booleans are tried before integers and integers
/// before floats, so that `true`/`false` are never mistaken for a malformed
/// number and `1` stays an integer rather than becoming `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplacementValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl ReplacementValue {
    /// Parses a raw literal as it appears in the fixture grammar.
    ///
    /// Quoted text (single or double quotes) becomes [`ReplacementValue::Text`]
    /// with the quotes stripped. Anything that is neither quoted, boolean nor
    /// numeric is treated as `null`, matching the spelled-out `null` literal.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.len() >= 2
            && ((trimmed.starts_with('\'') && trimmed.ends_with('\''))
                || (trimmed.starts_with('"') && trimmed.ends_with('"')))
        {
            return Self::Text(trimmed[1..trimmed.len() - 1].to_owned());
        }
        if let Ok(boolean) = trimmed.parse::<bool>() {
            return Self::Boolean(boolean);
        }
        if let Ok(integer) = trimmed.parse::<i64>() {
            return Self::Integer(integer);
        }
        if let Ok(float) = trimmed.parse::<f64>() {
            return Self::Float(float);
        }
        Self::Null
    }

    /// The textual form substituted into a script, or `None` for `Null`,
    /// which has no textual form and must not appear in resolved output.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Integer(integer) => Some(integer.to_string()),
            Self::Float(float) => Some(float.to_string()),
            Self::Boolean(boolean) => Some(boolean.to_string()),
            Self::Null => None,
        }
    }
}

impl From<&str> for ReplacementValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}
impl From<String> for ReplacementValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}
impl From<i32> for ReplacementValue {
    fn from(integer: i32) -> Self {
        Self::Integer(integer as i64)
    }
}
impl From<i64> for ReplacementValue {
    fn from(integer: i64) -> Self {
        Self::Integer(integer)
    }
}
impl From<f64> for ReplacementValue {
    fn from(float: f64) -> Self {
        Self::Float(float)
    }
}
impl From<bool> for ReplacementValue {
    fn from(boolean: bool) -> Self {
        Self::Boolean(boolean)
    }
}

/// Named replacement values with case-insensitive names.
///
/// Names are lower-cased once at insertion, so lookups never have to compare
/// case-insensitively. The last writer for a name wins, which is what lets
/// caller overrides replace extracted defaults.
#[derive(Debug, Clone, Default)]
pub struct ReplacementSet {
    values: HashMap<String, ReplacementValue>,
}

impl ReplacementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<ReplacementValue>) -> &mut Self {
        self.values.insert(name.to_lowercase(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ReplacementValue> {
        self.values.get(&name.to_lowercase())
    }

    /// Layers `overrides` on top of this set. Every name present in
    /// `overrides` replaces whatever value was here before.
    pub fn merge(&mut self, overrides: &ReplacementSet) {
        for (name, value) in &overrides.values {
            self.values.insert(name.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<ReplacementValue>> FromIterator<(K, V)> for ReplacementSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.set(name.as_ref(), value);
        }
        set
    }
}

/// A loosely-typed cell value as reported by the database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(integer) => Some(*integer),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<rusqlite::types::Value> for SqlValue {
    fn from(value: rusqlite::types::Value) -> Self {
        use rusqlite::types::Value;
        match value {
            Value::Null => Self::Null,
            Value::Integer(integer) => Self::Integer(integer),
            Value::Real(real) => Self::Real(real),
            Value::Text(text) => Self::Text(text),
            Value::Blob(blob) => Self::Blob(blob),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(integer) => write!(f, "{}", integer),
            Self::Real(real) => write!(f, "{}", real),
            Self::Text(text) => write!(f, "{}", text),
            Self::Blob(blob) => write!(f, "<blob {} bytes>", blob.len()),
        }
    }
}
