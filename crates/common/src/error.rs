use thiserror::Error;

use crate::types::TypeTag;

/// Schema/binding failures raised while resolving a field-to-column binding.
///
/// All variants are fatal for task initialization: they are raised before any
/// row is read and are never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The source schema has fewer columns than the target declares fields.
    #[error("source schema has {columns} columns but target record declares {fields} fields")]
    TooFewColumns { fields: usize, columns: usize },

    /// A bound column's type differs from the field's declared type.
    #[error("type mismatch for field '{field}': declared {expected}, column is {actual}")]
    TypeMismatch {
        field: String,
        expected: TypeTag,
        actual: TypeTag,
    },

    /// Two target fields share a case-insensitive name (ByName mode only).
    #[error("duplicate target field name '{name}' (names are matched case-insensitively)")]
    DuplicateFieldName { name: String },

    /// No source column matches the field name (ByName mode only).
    #[error("no source column matches target field '{field}'")]
    FieldNotFound { field: String },
}

/// Row-level failures raised while materializing records from a cursor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaterializeError {
    /// A bound column was NULL with no default configured and null
    /// suppression disabled.
    #[error("null value in column {column} for field '{field}' with no default configured")]
    UnhandledNull { field: String, column: usize },
}

/// Canonical rowbind error taxonomy used across crates.
///
/// Classification guidance:
/// - [`RbError::InvalidConfig`]: configuration/template contract violations
///   caught before any row is read
/// - [`RbError::Schema`]: binding-time schema resolution failures
/// - [`RbError::Materialize`]: per-row materialization failures
/// - [`RbError::Execution`]: cursor transport/decode failures reported by the
///   underlying execution service
/// - [`RbError::Io`]: raw filesystem/network IO failures from std APIs
/// - [`RbError::Unsupported`]: valid request for intentionally unimplemented
///   behavior
#[derive(Debug, Error)]
pub enum RbError {
    /// Invalid or inconsistent configuration state.
    ///
    /// Examples:
    /// - default-value template whose schema differs from the target schema
    /// - invalid error-tolerance thresholds
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Binding-time schema failures (see [`SchemaError`]).
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Row materialization failures (see [`MaterializeError`]).
    #[error("materialize error: {0}")]
    Materialize(#[from] MaterializeError),

    /// Runtime failures from the underlying cursor/execution service.
    ///
    /// Examples:
    /// - row fetch/decode failure reported by the cursor
    /// - worker connection dropped mid-task
    #[error("execution error: {0}")]
    Execution(String),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Valid request for a feature/shape not implemented in current version.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Standard rowbind result alias.
pub type Result<T> = std::result::Result<T, RbError>;
