//! Process-wide metadata registry.
//!
//! Populated once at startup through [`Registry::register`], then shared
//! read-only (usually as `Arc<Registry>`) with the document factory, the
//! index-creation routine, and whoever assembles cascade configurations.
//! Registration needs `&mut self`, so no locking is involved once the
//! registry is shared.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use monodoc_common::{Result, SchemaError};

use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::schema::{
    DocumentDescriptor, IndexSpec, Model, ParsedIndex, RelationDescriptor, Schema,
};

#[derive(Debug, Default)]
pub struct Registry {
    config: RegistryConfig,
    types: HashMap<TypeId, Arc<DocumentDescriptor>>,
    names: HashMap<String, TypeId>,
    /// Registration order, for deterministic iteration.
    order: Vec<TypeId>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Register a batch of document types.
    ///
    /// References may point at types registered earlier or anywhere in
    /// the same batch. The batch is validated as a whole: on error nothing
    /// from it is inserted.
    pub fn register(&mut self, schemas: impl IntoIterator<Item = Schema>) -> Result<()> {
        let schemas: Vec<Schema> = schemas.into_iter().collect();
        let reject = self.config.duplicate_policy == DuplicatePolicy::Reject;

        let mut batch: HashMap<String, TypeId> = HashMap::new();
        for schema in &schemas {
            let duplicate = self.types.contains_key(&schema.type_id())
                || batch.values().any(|id| *id == schema.type_id());
            if duplicate && reject {
                return Err(SchemaError::AlreadyRegistered {
                    type_name: schema.type_name().to_string(),
                }
                .into());
            }

            // a type keeps the name it was first registered under
            let registered_as = self
                .types
                .get(&schema.type_id())
                .map(|d| d.type_name.as_str())
                .or_else(|| {
                    batch
                        .iter()
                        .find(|(_, id)| **id == schema.type_id())
                        .map(|(name, _)| name.as_str())
                });
            if let Some(previous) = registered_as
                && previous != schema.type_name()
            {
                return Err(SchemaError::RegisteredUnderOtherName {
                    type_name: schema.type_name().to_string(),
                    previous: previous.to_string(),
                }
                .into());
            }

            let clashes = |owner: Option<&TypeId>| owner.is_some_and(|id| *id != schema.type_id());
            if clashes(batch.get(schema.type_name())) || clashes(self.names.get(schema.type_name()))
            {
                return Err(SchemaError::AlreadyRegistered {
                    type_name: schema.type_name().to_string(),
                }
                .into());
            }
            batch.insert(schema.type_name().to_string(), schema.type_id());
        }

        let resolve = |name: &str| batch.get(name).or_else(|| self.names.get(name)).copied();
        let descriptors = schemas
            .iter()
            .map(|schema| DocumentDescriptor::build(schema, resolve))
            .collect::<std::result::Result<Vec<_>, SchemaError>>()?;

        for descriptor in descriptors {
            tracing::info!(
                "Registered {} -> collection '{}' ({} indexes, {} relations)",
                descriptor.type_name,
                descriptor.collection,
                descriptor.all_index().len(),
                descriptor.relations.len()
            );

            let type_id = descriptor.type_id;
            if self.types.contains_key(&type_id) {
                tracing::warn!("Replacing registration of {}", descriptor.type_name);
            } else {
                self.order.push(type_id);
            }
            self.names.insert(descriptor.type_name.clone(), type_id);
            self.types.insert(type_id, Arc::new(descriptor));
        }

        Ok(())
    }

    /// Register a single type.
    pub fn register_type<T: Model>(&mut self) -> Result<()> {
        self.register([T::schema()])
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn is_registered<T: Model>(&self) -> bool {
        self.types.contains_key(&TypeId::of::<T>())
    }

    pub fn descriptor<T: Model>(&self) -> Option<&Arc<DocumentDescriptor>> {
        self.descriptor_of(TypeId::of::<T>())
    }

    pub fn descriptor_of(&self, type_id: TypeId) -> Option<&Arc<DocumentDescriptor>> {
        self.types.get(&type_id)
    }

    pub fn descriptor_by_name(&self, name: &str) -> Option<&Arc<DocumentDescriptor>> {
        self.names.get(name).and_then(|id| self.types.get(id))
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<DocumentDescriptor>> {
        self.order.iter().filter_map(|id| self.types.get(id))
    }

    pub fn collection_of<T: Model>(&self) -> Option<&str> {
        self.descriptor::<T>().map(|d| d.collection.as_str())
    }

    /// Index declarations of `field` on `T`; `None` for unregistered types,
    /// unknown fields, and fields without an index.
    pub fn get_parsed_index<T: Model>(&self, field: &str) -> Option<&[ParsedIndex]> {
        self.descriptor::<T>()?.parsed_index(field)
    }

    /// One entry per declared field of `T` (the base embedding included).
    pub fn get_all_parsed_index<T: Model>(&self) -> BTreeMap<String, Option<Vec<ParsedIndex>>> {
        self.descriptor::<T>()
            .map(|d| d.all_parsed_index())
            .unwrap_or_default()
    }

    pub fn get_index<T: Model>(&self, field: &str) -> Vec<IndexSpec> {
        self.descriptor::<T>()
            .map(|d| d.index(field))
            .unwrap_or_default()
    }

    pub fn get_all_index<T: Model>(&self) -> Vec<IndexSpec> {
        self.descriptor::<T>()
            .map(|d| d.all_index())
            .unwrap_or_default()
    }

    pub fn relations<T: Model>(&self) -> &[RelationDescriptor] {
        self.descriptor::<T>()
            .map(|d| d.relations.as_slice())
            .unwrap_or_default()
    }

    /// Relations on any registered type that point at `target`, with the
    /// descriptor that owns each. These are the places holding
    /// denormalized copies of `target` documents.
    pub fn relations_targeting(
        &self,
        target: &str,
    ) -> Vec<(&DocumentDescriptor, &RelationDescriptor)> {
        self.descriptors()
            .flat_map(|d| {
                d.relations
                    .iter()
                    .filter(move |r| r.target == target)
                    .map(move |r| (d.as_ref(), r))
            })
            .collect()
    }
}
