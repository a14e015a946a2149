//! Document values as handed to and from the store.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ObjectId, OdmError, Result};

/// A stored document: field name to encoded value.
pub type Document = BTreeMap<String, Value>;

/// A single encoded value inside a document.
///
/// Variants:
/// - Primitive types: Null, Bool, Int32, Int64, Float64, String, Binary
/// - Temporal: DateTime
/// - Identifier: ObjectId
/// - Collection types: Array, Object (embedded document)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Binary(Vec<u8>),
    DateTime(chrono::DateTime<chrono::FixedOffset>),
    ObjectId(ObjectId),
    Array(Vec<Value>),
    Object(Document),
}

impl Value {
    /// Get the type name as a string
    ///
    /// # Example
    /// ```rust
    /// use monodoc_common::Value;
    ///
    /// assert_eq!(Value::Int32(42).type_name(), "int32");
    /// assert_eq!(Value::from("Hello").type_name(), "string");
    /// ```
    pub fn type_name(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::DateTime(_) => "datetime",
            Value::ObjectId(_) => "objectid",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(oid) => Some(*oid),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Value::Object(doc) => Some(doc),
            _ => None,
        }
    }

    /// Equality as a query predicate sees it: numbers compare by value
    /// across widths, everything else structurally.
    pub fn query_eq(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert a JSON value. Strings stay strings; use
    /// [`Value::ObjectId`] explicitly for identifiers.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => Value::Int32(small),
                        Err(_) => Value::Int64(i),
                    }
                } else if let Some(f) = n.as_f64() {
                    Value::Float64(f)
                } else {
                    return Err(OdmError::TypeError {
                        expected: "number representable as i64 or f64".into(),
                        actual: n.to_string(),
                    });
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<Result<_>>()?,
            ),
            serde_json::Value::Object(map) => Value::Object(document_from_json_map(map)?),
        })
    }
}

fn document_from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Result<Document> {
    map.into_iter()
        .map(|(k, v)| Ok((k, Value::from_json(v)?)))
        .collect()
}

/// Build a [`Document`] from a JSON object.
///
/// # Example
/// ```rust
/// use monodoc_common::{Value, document_from_json};
///
/// let doc = document_from_json(serde_json::json!({"name": "X"})).unwrap();
/// assert_eq!(doc["name"], Value::from("X"));
/// ```
pub fn document_from_json(json: serde_json::Value) -> Result<Document> {
    match json {
        serde_json::Value::Object(map) => document_from_json_map(map),
        other => Err(OdmError::TypeError {
            expected: "object".into(),
            actual: other.to_string(),
        }),
    }
}

/// Read a dotted path (`a.b.c`) out of a document.
///
/// Returns `None` when a segment is missing or traverses a non-object.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Mutable counterpart of [`get_path`].
pub fn get_path_mut<'a>(doc: &'a mut Document, path: &str) -> Option<&'a mut Value> {
    let mut segments = path.split('.');
    let mut current = doc.get_mut(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(inner) => inner.get_mut(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write `value` at a dotted path, creating intermediate objects.
///
/// Fails when an intermediate segment holds a non-object value.
pub fn set_path(doc: &mut Document, path: &str, value: Value) -> Result<()> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut target = doc;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            let slot = target
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Document::new()));
            if slot.is_null() {
                *slot = Value::Object(Document::new());
            }
            target = match slot {
                Value::Object(inner) => inner,
                other => {
                    return Err(OdmError::TypeError {
                        expected: format!("object at {segment} in {path}"),
                        actual: other.type_name().into_owned(),
                    });
                }
            };
        }
    }

    target.insert(leaf.to_string(), value);
    Ok(())
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int32(i) => write!(f, "{i}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Binary(b) => write!(f, "Binary({} bytes)", b.len()),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::ObjectId(oid) => write!(f, "ObjectId({oid})"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(doc) => {
                write!(f, "{{")?;
                for (i, (k, v)) in doc.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
