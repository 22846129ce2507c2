//! Request payload validation.
//!
//! A route's schema is a base document with an optional extension merged on
//! top of it. Both are merged and compiled once at startup and shared
//! read-only between requests.

pub mod compiled;
pub mod registry;

pub use compiled::{merge_schemas, CompiledSchema, SchemaViolation};
pub use registry::{SchemaError, SchemaRegistry};
