use std::fmt;
use std::sync::Arc;

use monodoc_common::{OdmError, Result};

use crate::schema::{RelationDescriptor, RelationType};
use crate::store::{Collection, Filter};

/// One denormalization target of a document.
///
/// Built right before a cascade call and dropped after it.
#[derive(Clone)]
pub struct CascadeConfig {
    pub collection: Arc<dyn Collection>,
    pub relation: RelationType,
    /// Path on the related document that holds the copy.
    pub through: String,
    /// Documents currently related to the source. Never empty.
    pub query: Filter,
    /// Documents related before the foreign key changed.
    pub old_query: Option<Filter>,
    /// Source properties copied next to the primary key.
    pub properties: Vec<String>,
}

impl CascadeConfig {
    pub fn builder(collection: Arc<dyn Collection>, relation: RelationType) -> CascadeConfigBuilder {
        CascadeConfigBuilder {
            collection,
            relation: Ok(relation),
            through: String::new(),
            query: Filter::new(),
            old_query: None,
            properties: Vec::new(),
        }
    }

    /// The old query, unless it is absent or matches everything.
    pub(crate) fn effective_old_query(&self) -> Option<&Filter> {
        self.old_query.as_ref().filter(|q| !q.is_empty())
    }
}

impl fmt::Debug for CascadeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeConfig")
            .field("collection", &self.collection.name())
            .field("relation", &self.relation)
            .field("through", &self.through)
            .field("query", &self.query)
            .field("old_query", &self.old_query)
            .field("properties", &self.properties)
            .finish()
    }
}

pub struct CascadeConfigBuilder {
    collection: Arc<dyn Collection>,
    relation: Result<RelationType>,
    through: String,
    query: Filter,
    old_query: Option<Filter>,
    properties: Vec<String>,
}

impl CascadeConfigBuilder {
    /// Take the cardinality from its raw code instead; unknown codes fail
    /// in [`build`](Self::build).
    pub fn relation_code(mut self, code: u8) -> Self {
        self.relation = RelationType::try_from(code);
        self
    }

    pub fn through(mut self, path: impl Into<String>) -> Self {
        self.through = path.into();
        self
    }

    pub fn query(mut self, query: Filter) -> Self {
        self.query = query;
        self
    }

    pub fn old_query(mut self, query: Filter) -> Self {
        self.old_query = Some(query);
        self
    }

    pub fn properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Result<CascadeConfig> {
        let relation = self.relation?;
        if self.through.is_empty() {
            return Err(OdmError::InvalidOperation(format!(
                "cascade into {} has no through-property",
                self.collection.name()
            )));
        }
        if self.query.is_empty() {
            return Err(OdmError::InvalidOperation(format!(
                "cascade into {}.{} has no query for the related documents",
                self.collection.name(),
                self.through
            )));
        }
        Ok(CascadeConfig {
            collection: self.collection,
            relation,
            through: self.through,
            query: self.query,
            old_query: self.old_query,
            properties: self.properties,
        })
    }
}

impl RelationDescriptor {
    /// Start a config that copies into the field holding this relation.
    ///
    /// `collection` must be the collection of the type declaring the
    /// relation, not of its target.
    pub fn cascade_config(&self, collection: Arc<dyn Collection>) -> CascadeConfigBuilder {
        CascadeConfig::builder(collection, self.relation).through(self.path.clone())
    }
}

/// Capability of documents whose fields are copied into other collections.
pub trait Cascade: Send + Sync {
    fn cascade_configs(&self) -> Vec<CascadeConfig>;
}
