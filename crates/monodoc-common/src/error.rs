//! Error definitions for MonoDoc

use thiserror::Error;

/// Structural problems found while registering document schemas.
///
/// These are programmer errors: a registry that produced one of these
/// should not be used to serve requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("type {type_name} does not embed the base document")]
    MissingBase { type_name: String },

    #[error("field {type_name}.{field} is a reference but declares no target type")]
    MissingReferenceTarget { type_name: String, field: String },

    #[error("field {type_name}.{field} references unregistered type {target}")]
    UnknownReferenceTarget {
        type_name: String,
        field: String,
        target: String,
    },

    #[error("invalid index on {type_name}.{field}: {reason}")]
    InvalidIndex {
        type_name: String,
        field: String,
        reason: String,
    },

    #[error("index on {type_name}.{field} covers undeclared field {index_field}")]
    UnknownIndexField {
        type_name: String,
        field: String,
        index_field: String,
    },

    #[error("field {field} declared twice on {type_name}")]
    DuplicateField { type_name: String, field: String },

    #[error("type {type_name} is already registered")]
    AlreadyRegistered { type_name: String },

    #[error("type {type_name} is already registered as {previous}")]
    RegisteredUnderOtherName { type_name: String, previous: String },

    #[error("type {type_name} is not registered")]
    NotRegistered { type_name: String },
}

impl SchemaError {
    /// Name of the document type the error was raised for.
    pub fn type_name(&self) -> &str {
        match self {
            SchemaError::MissingBase { type_name }
            | SchemaError::MissingReferenceTarget { type_name, .. }
            | SchemaError::UnknownReferenceTarget { type_name, .. }
            | SchemaError::InvalidIndex { type_name, .. }
            | SchemaError::UnknownIndexField { type_name, .. }
            | SchemaError::DuplicateField { type_name, .. }
            | SchemaError::AlreadyRegistered { type_name }
            | SchemaError::RegisteredUnderOtherName { type_name, .. }
            | SchemaError::NotRegistered { type_name } => type_name,
        }
    }
}

/// Represents errors that can occur during MonoDoc operations.
///
/// # Example
/// ```rust
/// use monodoc_common::OdmError;
///
/// fn example() -> monodoc_common::Result<()> {
///     Err(OdmError::MissingId("document has not been saved".into()))
/// }
///
/// match example() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error occurred: {e}"),
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum OdmError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Invalid relation type: {0}")]
    InvalidRelation(String),

    #[error("Missing identifier: {0}")]
    MissingId(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, OdmError>;

impl OdmError {
    /// Get the inner message without the type prefix.
    pub fn message(&self) -> String {
        match self {
            OdmError::Schema(err) => err.to_string(),
            OdmError::TypeError { expected, actual } => {
                format!("expected {expected}, got {actual}")
            }
            OdmError::InvalidRelation(msg)
            | OdmError::MissingId(msg)
            | OdmError::Store(msg)
            | OdmError::Parse(msg)
            | OdmError::Config(msg)
            | OdmError::Io(msg)
            | OdmError::InvalidOperation(msg) => msg.clone(),
        }
    }

    /// Get a short error kind name
    pub fn kind(&self) -> &'static str {
        match self {
            OdmError::Schema(_) => "schema_error",
            OdmError::InvalidRelation(_) => "invalid_relation",
            OdmError::MissingId(_) => "missing_id",
            OdmError::Store(_) => "store_error",
            OdmError::TypeError { .. } => "type_error",
            OdmError::Parse(_) => "parse_error",
            OdmError::Config(_) => "config_error",
            OdmError::Io(_) => "io_error",
            OdmError::InvalidOperation(_) => "invalid_operation",
        }
    }

    /// Whether this error was raised while validating schemas.
    pub fn is_schema(&self) -> bool {
        matches!(self, OdmError::Schema(_))
    }
}

impl From<std::io::Error> for OdmError {
    fn from(err: std::io::Error) -> Self {
        OdmError::Io(err.to_string())
    }
}
