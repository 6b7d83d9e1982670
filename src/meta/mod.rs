//! Entity metadata
//!
//! Each entity type declares its shape statically: an ordered list of
//! `(field name, wire name, type tag)` triples. Live values are exposed
//! through [`FieldDescriptor`]s without any runtime reflection.

pub mod entity;
pub mod field;
pub mod registry;
pub mod tag;

pub use entity::{Entity, EntityShape, FieldDef, FieldDescriptor};
pub use field::Field;
pub use registry::Registry;
pub use tag::TypeTag;
