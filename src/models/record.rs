//! Content record data structure.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Reference to a field of an exported row, by header name or zero-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    Index(usize),
    Name(String),
}

impl FieldRef {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Index(i) => write!(f, "#{i}"),
            FieldRef::Name(n) => f.write_str(n),
        }
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// One exported row describing an item, list or guide.
///
/// Records share the header of the table they were read from and are never
/// mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    /// Line in the source table where the record starts (1-based, header is line 1)
    pub line: u64,
    header: Arc<[String]>,
    values: Vec<String>,
}

impl ContentRecord {
    pub fn new(line: u64, header: Arc<[String]>, values: Vec<String>) -> Self {
        Self {
            line,
            header,
            values,
        }
    }

    /// Look up a field value by reference. Missing fields read as `None`.
    pub fn get(&self, field: &FieldRef) -> Option<&str> {
        let index = match field {
            FieldRef::Index(i) => *i,
            FieldRef::Name(name) => self.header.iter().position(|h| h == name)?,
        };
        self.values.get(index).map(String::as_str)
    }

    /// Look up a field value by header name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.get(&FieldRef::name(name))
    }

    /// Header names of the source table.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Values in header order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Ordered (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}
