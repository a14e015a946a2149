//! Declarative document schemas.
//!
//! Every storable type describes itself once through a [`Schema`]: the
//! base document embedding (which also carries the collection binding),
//! its fields with their storage paths, index declarations, and reference
//! targets. The registry turns these into immutable descriptors at
//! startup.
//!
//! ```
//! use monodoc::schema::{BaseField, DocumentBase, Field, Model, Schema};
//! use monodoc_common::ObjectId;
//!
//! struct Person {
//!     base: DocumentBase,
//!     name: String,
//! }
//!
//! impl Model for Person {
//!     fn schema() -> Schema {
//!         Schema::of::<Self>()
//!             .base(BaseField::new().collection("people"))
//!             .field(Field::new("Name").index("{name},unique"))
//!     }
//!
//!     fn id(&self) -> Option<ObjectId> {
//!         self.base.id
//!     }
//! }
//! ```

use std::any::TypeId;

use monodoc_common::{Document, ObjectId, Result};

use crate::cascade::Cascade;

pub mod descriptor;
pub mod index;

pub use descriptor::{
    DocumentDescriptor, FieldDescriptor, REL_MANY, REL_ONE, RelationDescriptor, RelationType,
};
pub use index::{GrammarError, IndexOption, IndexSpec, ParsedIndex, parse_index};

/// A type that can be stored as a document.
pub trait Model: Send + Sync + 'static {
    /// Declarative description of the type, read once at registration.
    fn schema() -> Schema
    where
        Self: Sized;

    /// Primary key, `None` until the document has been saved.
    fn id(&self) -> Option<ObjectId>;

    /// Cascade capability. Types that replicate fields into related
    /// documents return `Some(self)`.
    fn cascade(&self) -> Option<&dyn Cascade> {
        None
    }
}

/// Fields every stored document carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentBase {
    pub id: Option<ObjectId>,
    /// Milliseconds since the epoch.
    pub created: Option<i64>,
    pub modified: Option<i64>,
}

impl DocumentBase {
    /// Field name the embedding is registered under.
    pub const FIELD_NAME: &'static str = "DocumentBase";
    pub const ID_PATH: &'static str = "_id";
    pub const CREATED_PATH: &'static str = "created";
    pub const MODIFIED_PATH: &'static str = "modified";

    pub fn paths() -> [&'static str; 3] {
        [Self::ID_PATH, Self::CREATED_PATH, Self::MODIFIED_PATH]
    }

    /// Assign an id if the document has none yet.
    pub fn ensure_id(&mut self) -> Result<ObjectId> {
        match self.id {
            Some(id) => Ok(id),
            None => {
                let id = ObjectId::new()?;
                self.id = Some(id);
                Ok(id)
            }
        }
    }

    /// Stamp modification time, and creation time on first call.
    pub fn touch(&mut self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        self.created.get_or_insert(now);
        self.modified = Some(now);
    }

    /// Write the base fields into a prepared snapshot.
    pub fn write_into(&self, doc: &mut Document) {
        doc.insert(Self::ID_PATH.into(), self.id.into());
        doc.insert(Self::CREATED_PATH.into(), self.created.into());
        doc.insert(Self::MODIFIED_PATH.into(), self.modified.into());
    }
}

/// Reference container shape, before the target is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReferenceShape {
    One,
    Many,
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) path: Option<String>,
    pub(crate) index: Option<String>,
    pub(crate) collection: Option<String>,
    pub(crate) reference: Option<ReferenceShape>,
    pub(crate) target: Option<String>,
    pub(crate) base: bool,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            index: None,
            collection: None,
            reference: None,
            target: None,
            base: false,
        }
    }

    /// Storage path. Defaults to the lowercased field name.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Index declaration, see [`index`] for the grammar.
    pub fn index(mut self, declaration: impl Into<String>) -> Self {
        self.index = Some(declaration.into());
        self
    }

    /// Collection binding. Only meaningful on the base embedding.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Holds a single reference.
    pub fn reference(mut self) -> Self {
        self.reference = Some(ReferenceShape::One);
        self
    }

    /// Holds a list of references.
    pub fn references(mut self) -> Self {
        self.reference = Some(ReferenceShape::Many);
        self
    }

    /// Type name of the referenced documents. Implies [`Field::reference`]
    /// when no shape was given.
    pub fn target(mut self, type_name: impl Into<String>) -> Self {
        self.reference.get_or_insert(ReferenceShape::One);
        self.target = Some(type_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn storage_path(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }
}

/// The base document embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseField {
    collection: Option<String>,
    index: Option<String>,
}

impl BaseField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    pub fn index(mut self, declaration: impl Into<String>) -> Self {
        self.index = Some(declaration.into());
        self
    }
}

impl From<BaseField> for Field {
    fn from(base: BaseField) -> Self {
        Field {
            name: DocumentBase::FIELD_NAME.to_string(),
            path: None,
            index: base.index,
            collection: base.collection,
            reference: None,
            target: None,
            base: true,
        }
    }
}

/// Schema of one document type, in declaration order.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: String,
    pub(crate) fields: Vec<Field>,
}

impl Schema {
    /// Start a schema for `T`, named after its unqualified type name.
    pub fn of<T: 'static>() -> Self {
        let full = std::any::type_name::<T>();
        let without_generics = full.split('<').next().unwrap_or(full);
        let short = without_generics
            .rsplit("::")
            .next()
            .unwrap_or(without_generics);
        Self {
            type_id: TypeId::of::<T>(),
            type_name: short.to_string(),
            fields: Vec::new(),
        }
    }

    /// Override the name reference targets use for this type.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.type_name = name.into();
        self
    }

    /// Embed the base document.
    pub fn base(mut self, base: BaseField) -> Self {
        self.fields.push(base.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn has_base(&self) -> bool {
        self.fields.iter().any(|f| f.base)
    }
}
