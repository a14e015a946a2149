//! Store client contract.
//!
//! The mapper never talks to a server directly. Callers hand it
//! [`Collection`] handles; every cascade step is one `update_all` call on
//! one of them.

use std::fmt;
use std::ops::AddAssign;
use std::sync::Arc;

use async_trait::async_trait;
use monodoc_common::{Document, ObjectId, Result, Value};

pub use crate::schema::IndexSpec;

pub mod memory;

pub use memory::{MemoryCollection, MemoryDatabase};

/// Conjunction of equality predicates on dotted paths.
///
/// A path that crosses an array matches when any element matches, so
/// `children._id` finds documents whose `children` array holds that id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match documents whose `_id` equals `id`.
    pub fn by_id(id: ObjectId) -> Self {
        Self::new().eq("_id", id)
    }

    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((path.into(), value.into()));
        self
    }

    pub fn from_document(doc: Document) -> Self {
        Self {
            clauses: doc.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(path, expected)| path_matches(doc, path, expected))
    }
}

fn path_matches(doc: &Document, path: &str, expected: &Value) -> bool {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    match (doc.get(head), rest) {
        // absent fields only match an explicit null
        (None, _) => expected.is_null(),
        (Some(value), None) => value_matches(value, expected),
        (Some(Value::Object(inner)), Some(rest)) => path_matches(inner, rest, expected),
        (Some(Value::Array(items)), Some(rest)) => items
            .iter()
            .any(|item| matches!(item, Value::Object(inner) if path_matches(inner, rest, expected))),
        (Some(_), Some(_)) => expected.is_null(),
    }
}

fn value_matches(value: &Value, expected: &Value) -> bool {
    match (value, expected) {
        (Value::Array(items), expected) if !matches!(expected, Value::Array(_)) => {
            items.iter().any(|item| item.query_eq(expected))
        }
        _ => value.query_eq(expected),
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (path, value)) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{path}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// A single update operator applied to every matched document.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Replace the value at `path`. Setting `Null` empties it.
    Set { path: String, value: Value },
    /// Remove array elements at `path` matching `matching`.
    Pull { path: String, matching: Filter },
    /// Append `value` to the array at `path`, creating it if absent.
    Push { path: String, value: Value },
}

impl Update {
    pub fn set(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Update::Set {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn unset(path: impl Into<String>) -> Self {
        Update::Set {
            path: path.into(),
            value: Value::Null,
        }
    }

    pub fn pull(path: impl Into<String>, matching: Filter) -> Self {
        Update::Pull {
            path: path.into(),
            matching,
        }
    }

    pub fn push(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Update::Push {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Operator name as the store spells it.
    pub fn operator(&self) -> &'static str {
        match self {
            Update::Set { .. } => "$set",
            Update::Pull { .. } => "$pull",
            Update::Push { .. } => "$push",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Update::Set { path, .. } | Update::Pull { path, .. } | Update::Push { path, .. } => {
                path
            }
        }
    }
}

/// Result of an `update_all` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateInfo {
    pub matched: u64,
    pub modified: u64,
}

impl AddAssign for UpdateInfo {
    fn add_assign(&mut self, other: Self) {
        self.matched += other.matched;
        self.modified += other.modified;
    }
}

/// Handle to one collection of the underlying store.
///
/// Deadlines and retries belong to the implementation; the mapper issues
/// each call once and waits for it.
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    /// Apply `update` to every document matching `filter`.
    async fn update_all(&self, filter: &Filter, update: &Update) -> Result<UpdateInfo>;

    /// Create `index` unless an identical one exists.
    async fn ensure_index(&self, index: &IndexSpec) -> Result<()>;
}

/// Resolves collection names to handles.
pub trait Database: Send + Sync {
    fn collection(&self, name: &str) -> Arc<dyn Collection>;
}
