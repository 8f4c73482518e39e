//! Structured document content.
//!
//! A planning document is a [`SectionTree`]: a mapping from section
//! identifier to arbitrarily nested [`FieldValue`]s. Values are a closed
//! variant so that diff and edit logic can match exhaustively instead of
//! inspecting types at runtime.
//!
//! Values serialize as plain JSON. Integral JSON numbers become
//! [`Scalar::Int`]; every other number becomes [`Scalar::Float`]. Integers
//! beyond the `i64` range are rejected by [`FieldValue::from_json`] and by
//! deserialization.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::error::TypeError;
use crate::path::{FieldPath, PathSegment};

/// A leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Name of the scalar type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Text(_) => "text",
        }
    }

    /// Returns the text if this is a [`Scalar::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => write!(f, "{s}"),
        }
    }
}

/// The shape of a [`FieldValue`], used to detect type changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    List,
    Map,
}

/// A node of document content: a scalar, an ordered list, or a nested map.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(into = "Value")]
pub enum FieldValue {
    Scalar(Scalar),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn null() -> Self {
        FieldValue::Scalar(Scalar::Null)
    }

    /// A text scalar.
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Scalar(Scalar::Text(s.into()))
    }

    pub fn empty_map() -> Self {
        FieldValue::Map(BTreeMap::new())
    }

    pub fn empty_list() -> Self {
        FieldValue::List(Vec::new())
    }

    /// The shape of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Scalar(_) => ValueKind::Scalar,
            FieldValue::List(_) => ValueKind::List,
            FieldValue::Map(_) => ValueKind::Map,
        }
    }

    /// The leaf value if this is a scalar.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The items if this is a list.
    pub fn as_list(&self) -> Option<&Vec<FieldValue>> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// The entries if this is a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a direct child by segment.
    ///
    /// Keys address map entries, indices address list elements; any other
    /// combination yields `None`.
    pub fn child(&self, segment: &PathSegment) -> Option<&FieldValue> {
        match (self, segment) {
            (FieldValue::Map(map), PathSegment::Key(key)) => map.get(key),
            (FieldValue::List(items), PathSegment::Index(i)) => items.get(*i),
            _ => None,
        }
    }

    /// Resolve a relative path below this value.
    pub fn get_path(&self, path: &FieldPath) -> Option<&FieldValue> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Convert plain JSON, failing on integers that do not fit in `i64`.
    pub fn from_json(value: Value) -> Result<Self, TypeError> {
        Ok(match value {
            Value::Number(n) if n.is_u64() && n.as_i64().is_none() => {
                return Err(TypeError::IntegerOutOfRange(n.to_string()));
            }
            Value::Array(items) => FieldValue::List(
                items
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => FieldValue::Map(
                map.into_iter()
                    .map(|(k, v)| Ok((k, Self::from_json(v)?)))
                    .collect::<Result<_, TypeError>>()?,
            ),
            other => other.into(),
        })
    }

    /// Convert to a plain JSON value.
    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FieldValue::from_json(value).map_err(serde::de::Error::custom)
    }
}

/// Lossless for every JSON value except integers above `i64::MAX`, which
/// become the nearest `Float`. Use [`FieldValue::from_json`] to reject them.
impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Scalar(Scalar::Null),
            Value::Bool(b) => FieldValue::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Scalar(Scalar::Int(i)),
                None => FieldValue::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => FieldValue::Scalar(Scalar::Text(s)),
            Value::Array(items) => FieldValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                FieldValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Scalar(Scalar::Null) => Value::Null,
            FieldValue::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            FieldValue::Scalar(Scalar::Int(i)) => Value::Number(i.into()),
            // Non-finite floats have no JSON form.
            FieldValue::Scalar(Scalar::Float(x)) => {
                Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
            }
            FieldValue::Scalar(Scalar::Text(s)) => Value::String(s),
            FieldValue::List(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            FieldValue::Map(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(s: Scalar) -> Self {
        FieldValue::Scalar(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::text(s)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Scalar(Scalar::Bool(b))
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Scalar(Scalar::Int(i))
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Scalar(Scalar::Float(x))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(s) => write!(f, "{s}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// The content of a document: section identifier to nested content.
///
/// Backed by a `BTreeMap`, so iteration (and therefore diff output) follows
/// sorted section order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionTree(BTreeMap<String, FieldValue>);

impl SectionTree {
    /// Create an empty section tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Any other JSON shape is rejected.
    pub fn from_json(value: Value) -> Result<Self, TypeError> {
        match FieldValue::from_json(value)? {
            FieldValue::Map(map) => Ok(Self(map)),
            other => Err(TypeError::NotAnObject(format!("{:?}", other.kind()))),
        }
    }

    /// The tree as a JSON object.
    pub fn to_json(&self) -> Value {
        FieldValue::Map(self.0.clone()).to_json()
    }

    /// Insert or replace a whole section, returning the previous content.
    pub fn insert_section(
        &mut self,
        id: impl Into<String>,
        content: FieldValue,
    ) -> Option<FieldValue> {
        self.0.insert(id.into(), content)
    }

    /// Content of one section.
    pub fn section(&self, id: &str) -> Option<&FieldValue> {
        self.0.get(id)
    }

    /// Iterate sections in sorted id order.
    pub fn sections(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, FieldValue> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut BTreeMap<String, FieldValue> {
        &mut self.0
    }

    /// Resolve an absolute path (first segment is the section id).
    pub fn get_path(&self, path: &FieldPath) -> Option<&FieldValue> {
        let (first, rest) = path.segments().split_first()?;
        let root = match first {
            PathSegment::Key(section) => self.0.get(section)?,
            PathSegment::Index(_) => return None,
        };
        rest.iter().try_fold(root, |node, segment| node.child(segment))
    }

    /// BLAKE3 digest (hex) of the canonical JSON encoding.
    ///
    /// Map keys serialize in sorted order, so equal trees always hash equal.
    pub fn content_hash(&self) -> Result<String, TypeError> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }
}

impl FromIterator<(String, FieldValue)> for SectionTree {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, FieldValue>> for SectionTree {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        Self(map)
    }
}
