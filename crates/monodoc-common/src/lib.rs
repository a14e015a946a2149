//! Common library for MonoDoc
//!
//! Types shared by the object-document mapper and the stores it talks to.
//!
//! Modules:
//! * `error`: Defines error types and handling.
//! * `object_id`: Defines the 12-byte document identifier.
//! * `value`: Defines document values and dotted-path access.

pub mod error;
pub mod object_id;
pub mod value;

// Re-export commonly used types at the base
pub use error::*;
pub use object_id::ObjectId;
pub use value::{Document, Value, document_from_json, get_path, get_path_mut, set_path};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
