//! MonoDoc object-document mapper
//!
//! Keeps denormalized copies consistent across collections of a document
//! store without multi-collection transactions, driven by schema metadata
//! declared once per document type.
//!
//! Modules:
//! * `schema`: Declaration API, index grammar and per-type descriptors.
//! * `registry`: Write-once store of descriptors.
//! * `factory`: Documents bound to their registered metadata.
//! * `cascade`: Save and delete propagation into related collections.
//! * `store`: Collection contract and an in-memory implementation.
//! * `indexes`: Startup creation of declared indexes.
//! * `config`, `logging`: Ambient setup for hosting applications.

pub mod cascade;
pub mod config;
pub mod factory;
pub mod indexes;
pub mod logging;
pub mod registry;
pub mod schema;
pub mod store;

#[cfg(test)]
mod fixtures;

pub use cascade::{Cascade, CascadeConfig, CascadeEngine, CascadeOutcome, CascadeReport};
pub use config::Config;
pub use factory::{Doc, DocumentFactory};
pub use indexes::ensure_indexes;
pub use registry::Registry;
pub use schema::{BaseField, DocumentBase, Field, Model, RelationType, Schema};
pub use store::{Collection, Database, Filter, Update, UpdateInfo};

pub use monodoc_common::{Document, ObjectId, OdmError, Result, SchemaError, Value};
