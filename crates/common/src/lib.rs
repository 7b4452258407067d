//! Shared configuration, error types, IDs, type tags, and observability
//! primitives for rowbind crates.
//!
//! Architecture role:
//! - defines binding/null-policy configuration passed across layers
//! - provides common [`RbError`] / [`Result`] contracts
//! - hosts the task-level metrics registry
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`ids`]
//! - [`metrics`]
//! - [`types`]

pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod types;

pub use config::{BindConfig, BindMode, ToleranceConfig};
pub use error::{MaterializeError, RbError, Result, SchemaError};
pub use ids::*;
pub use metrics::MetricsRegistry;
pub use types::TypeTag;
