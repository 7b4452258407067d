//! Client-side schema binding and record materialization for a
//! RecordService-style distributed query service.
//!
//! Architecture role:
//! - declares the target record shape and models source schemas
//!   ([`schema`]);
//! - resolves field-to-column bindings by ordinal or case-insensitive name
//!   ([`binding`]);
//! - materializes cursor rows into schema-checked records with a
//!   per-field null policy ([`materialize`]);
//! - drives one task end to end with guaranteed cursor release
//!   ([`driver`]).
//!
//! The query-execution service itself is external: it sits behind
//! [`driver::ExecutionClient`] and yields rows through [`cursor::RowCursor`].
//! [`mem`] provides in-memory implementations of both for tests.

pub mod binding;
pub mod cursor;
pub mod driver;
pub mod materialize;
pub mod mem;
pub mod record;
pub mod schema;

pub use binding::Binding;
pub use cursor::RowCursor;
pub use driver::{ExecutionClient, TaskDescriptor, TaskDriver};
pub use materialize::{Materializer, RowStats};
pub use record::{Record, Value};
pub use schema::{ColumnSpec, FieldSpec, RecordSchema};
