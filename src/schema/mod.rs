//! JSON Schema export
//!
//! Describes the JSON form of a registered entity: properties keyed by wire
//! name in declared order, with each entity's table name under `x-table`.

pub mod builder;

pub use builder::{json_schema, SchemaBuilder, DRAFT_2020_12};
