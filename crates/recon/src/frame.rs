use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Encoding kind
// ---------------------------------------------------------------------------

/// How categorical attributes are laid out in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingKind {
    /// Categorical attributes stay as text; the model encodes them itself.
    Raw,
    /// One binary indicator column per category.
    OneHot,
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::OneHot => write!(f, "one_hot"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the cell. Text cells have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A single-row table with named, ordered columns.
///
/// Request-scoped: built per submission and dropped after the prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFrame {
    kind: EncodingKind,
    columns: Vec<(String, Value)>,
}

impl EncodedFrame {
    pub fn new(kind: EncodingKind) -> Self {
        Self { kind, columns: Vec::new() }
    }

    pub fn kind(&self) -> EncodingKind {
        self.kind
    }

    /// Append a column. Names are unique; a repeated name replaces the value in place.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add a zero-valued column for each absent name.
    pub fn fill_zero<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            let name = name.as_ref();
            if !self.contains(name) {
                self.columns.push((name.to_string(), Value::Int(0)));
            }
        }
    }

    /// New frame holding exactly `order`'s columns, in that order.
    ///
    /// Returns the names this frame lacks when any are absent.
    pub fn select<S: AsRef<str>>(&self, order: &[S]) -> Result<EncodedFrame, Vec<String>> {
        let mut missing = Vec::new();
        let mut columns = Vec::with_capacity(order.len());
        for name in order {
            let name = name.as_ref();
            match self.get(name) {
                Some(v) => columns.push((name.to_string(), v.clone())),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(EncodedFrame { kind: self.kind, columns })
        } else {
            Err(missing)
        }
    }
}

/// Serialized as a JSON object with keys in column order.
impl Serialize for EncodedFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
