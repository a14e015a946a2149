//! Construction of registered documents.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use monodoc_common::{Result, SchemaError};

use crate::registry::Registry;
use crate::schema::{DocumentDescriptor, IndexSpec, Model, ParsedIndex, RelationDescriptor};

/// Hands out documents bound to their registered metadata.
#[derive(Debug, Clone)]
pub struct DocumentFactory {
    registry: Arc<Registry>,
}

impl DocumentFactory {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Wrap `proto` with the descriptor registered for `T`.
    ///
    /// Fails with `MissingBase` when `T` does not embed the base document at
    /// all, and with `NotRegistered` when it does but was never registered.
    pub fn new_document<T: Model>(&self, proto: T) -> Result<Doc<T>> {
        match self.registry.descriptor::<T>() {
            Some(descriptor) => Ok(Doc {
                value: proto,
                descriptor: Arc::clone(descriptor),
            }),
            None => {
                let schema = T::schema();
                let type_name = schema.type_name().to_string();
                if schema.has_base() {
                    Err(SchemaError::NotRegistered { type_name }.into())
                } else {
                    Err(SchemaError::MissingBase { type_name }.into())
                }
            }
        }
    }
}

/// A document together with its type's metadata.
#[derive(Debug, Clone)]
pub struct Doc<T> {
    value: T,
    descriptor: Arc<DocumentDescriptor>,
}

impl<T> Doc<T> {
    pub fn descriptor(&self) -> &DocumentDescriptor {
        &self.descriptor
    }

    pub fn collection(&self) -> &str {
        &self.descriptor.collection
    }

    pub fn get_parsed_index(&self, field: &str) -> Option<&[ParsedIndex]> {
        self.descriptor.parsed_index(field)
    }

    pub fn get_all_parsed_index(&self) -> BTreeMap<String, Option<Vec<ParsedIndex>>> {
        self.descriptor.all_parsed_index()
    }

    pub fn get_index(&self, field: &str) -> Vec<IndexSpec> {
        self.descriptor.index(field)
    }

    pub fn get_all_index(&self) -> Vec<IndexSpec> {
        self.descriptor.all_index()
    }

    pub fn relations(&self) -> &[RelationDescriptor] {
        &self.descriptor.relations
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Doc<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Doc<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
