//! In-memory store.
//!
//! Implements the [`Collection`] contract over plain vectors guarded by
//! `parking_lot` locks. Each `update_all` holds the collection's write lock
//! for its duration, so a single call is atomic within one collection;
//! nothing spans collections. Index specs are recorded but not enforced.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use monodoc_common::{Document, OdmError, Result, Value, get_path, get_path_mut, set_path};
use parking_lot::RwLock;

use super::{Collection, Database, Filter, IndexSpec, Update, UpdateInfo};

#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    documents: RwLock<Vec<Document>>,
    indexes: RwLock<Vec<IndexSpec>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
            indexes: RwLock::new(Vec::new()),
        }
    }

    pub fn insert(&self, doc: Document) {
        self.documents.write().push(doc);
    }

    pub fn find(&self, filter: &Filter) -> Vec<Document> {
        self.documents
            .read()
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect()
    }

    pub fn find_one(&self, filter: &Filter) -> Option<Document> {
        self.documents
            .read()
            .iter()
            .find(|doc| filter.matches(doc))
            .cloned()
    }

    pub fn all(&self) -> Vec<Document> {
        self.documents.read().clone()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    pub fn indexes(&self) -> Vec<IndexSpec> {
        self.indexes.read().clone()
    }

    /// Apply one operator to one document, reporting whether it changed.
    fn apply(doc: &mut Document, update: &Update) -> Result<bool> {
        match update {
            Update::Set { path, value } => {
                if get_path(doc, path) == Some(value) {
                    return Ok(false);
                }
                set_path(doc, path, value.clone())?;
                Ok(true)
            }
            Update::Pull { path, matching } => match get_path_mut(doc, path) {
                None | Some(Value::Null) => Ok(false),
                Some(Value::Array(items)) => {
                    let before = items.len();
                    items.retain(|item| match item {
                        Value::Object(inner) => !matching.matches(inner),
                        _ => true,
                    });
                    Ok(items.len() != before)
                }
                Some(other) => Err(OdmError::Store(format!(
                    "cannot pull from {path}: field holds {}",
                    other.type_name()
                ))),
            },
            Update::Push { path, value } => match get_path_mut(doc, path) {
                None | Some(Value::Null) => {
                    set_path(doc, path, Value::Array(vec![value.clone()]))?;
                    Ok(true)
                }
                Some(Value::Array(items)) => {
                    items.push(value.clone());
                    Ok(true)
                }
                Some(other) => Err(OdmError::Store(format!(
                    "cannot push to {path}: field holds {}",
                    other.type_name()
                ))),
            },
        }
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn update_all(&self, filter: &Filter, update: &Update) -> Result<UpdateInfo> {
        let mut documents = self.documents.write();
        let mut info = UpdateInfo::default();
        for doc in documents.iter_mut().filter(|doc| filter.matches(doc)) {
            info.matched += 1;
            if Self::apply(doc, update)? {
                info.modified += 1;
            }
        }
        Ok(info)
    }

    async fn ensure_index(&self, index: &IndexSpec) -> Result<()> {
        let mut indexes = self.indexes.write();
        if !indexes.contains(index) {
            indexes.push(index.clone());
        }
        Ok(())
    }
}

/// A set of named in-memory collections, created on first use.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    collections: RwLock<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete handle, for seeding and inspecting data.
    pub fn memory_collection(&self, name: &str) -> Arc<MemoryCollection> {
        if let Some(existing) = self.collections.read().get(name) {
            return Arc::clone(existing);
        }
        Arc::clone(
            self.collections
                .write()
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryCollection::new(name))),
        )
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Database for MemoryDatabase {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        self.memory_collection(name)
    }
}
