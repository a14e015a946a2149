//! Document types shared by the unit tests.

use monodoc_common::ObjectId;

use crate::cascade::{Cascade, CascadeConfig};
use crate::schema::{BaseField, DocumentBase, Field, Model, Schema};

/// Lacks the base embedding.
#[derive(Debug, Clone, Default)]
pub struct BadDocument {
    pub name: String,
    pub surname: String,
}

impl Model for BadDocument {
    fn schema() -> Schema {
        Schema::of::<Self>()
            .field(Field::new("Name"))
            .field(Field::new("Surname"))
    }

    fn id(&self) -> Option<ObjectId> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentWithModel {
    pub base: DocumentBase,
    pub name: String,
    pub surname: String,
}

impl Model for DocumentWithModel {
    fn schema() -> Schema {
        Schema::of::<Self>()
            .base(BaseField::new().collection("test"))
            .field(Field::new("Name"))
            .field(Field::new("Surname"))
    }

    fn id(&self) -> Option<ObjectId> {
        self.base.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentWithModelAndIdx {
    pub base: DocumentBase,
    pub name: String,
    pub surname: String,
}

impl Model for DocumentWithModelAndIdx {
    fn schema() -> Schema {
        Schema::of::<Self>()
            .base(
                BaseField::new()
                    .collection("test")
                    .index("{name,surname},unique"),
            )
            .field(Field::new("Name").index("{name},unique,sparse"))
            .field(Field::new("Surname"))
    }

    fn id(&self) -> Option<ObjectId> {
        self.base.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentWithChildren {
    pub base: DocumentBase,
    pub name: String,
    pub surname: String,
    pub childs: Vec<ObjectId>,
    pub child: Option<ObjectId>,
}

impl Model for DocumentWithChildren {
    fn schema() -> Schema {
        Schema::of::<Self>()
            .base(
                BaseField::new()
                    .collection("parent-collection")
                    .index("{name,surname},unique"),
            )
            .field(
                Field::new("Name")
                    .index("{name},unique,sparse")
                    .collection("parent-colleciton"),
            )
            .field(Field::new("Surname"))
            .field(Field::new("Childs").references().target("DocumentChild"))
            .field(Field::new("Child").reference().target("DocumentChild"))
    }

    fn id(&self) -> Option<ObjectId> {
        self.base.id
    }
}

/// Holds a reference list without naming its target type.
#[derive(Debug, Clone, Default)]
pub struct DocumentWithChildrenNoRef {
    pub base: DocumentBase,
    pub name: String,
    pub surname: String,
    pub child: Vec<ObjectId>,
}

impl Model for DocumentWithChildrenNoRef {
    fn schema() -> Schema {
        Schema::of::<Self>()
            .base(
                BaseField::new()
                    .collection("parent-collection")
                    .index("{name,surname},unique"),
            )
            .field(
                Field::new("Name")
                    .index("{name},unique,sparse")
                    .collection("parent-colleciton"),
            )
            .field(Field::new("Surname"))
            .field(Field::new("Child").references())
    }

    fn id(&self) -> Option<ObjectId> {
        self.base.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentChild {
    pub base: DocumentBase,
    pub name: String,
    pub surname: String,
}

impl Model for DocumentChild {
    fn schema() -> Schema {
        Schema::of::<Self>()
            .base(
                BaseField::new()
                    .collection("child-collection")
                    .index("{name,surname},unique"),
            )
            .field(Field::new("Name").index("{name},unique,sparse"))
            .field(Field::new("Surname"))
    }

    fn id(&self) -> Option<ObjectId> {
        self.base.id
    }
}

/// A child document that replicates itself into its parents.
#[derive(Debug, Clone, Default)]
pub struct CascadingChild {
    pub base: DocumentBase,
    pub name: String,
    pub cascades: Vec<CascadeConfig>,
}

impl Model for CascadingChild {
    fn schema() -> Schema {
        Schema::of::<Self>()
            .base(BaseField::new().collection("children"))
            .field(Field::new("Name"))
    }

    fn id(&self) -> Option<ObjectId> {
        self.base.id
    }

    fn cascade(&self) -> Option<&dyn Cascade> {
        Some(self)
    }
}

impl Cascade for CascadingChild {
    fn cascade_configs(&self) -> Vec<CascadeConfig> {
        self.cascades.clone()
    }
}
