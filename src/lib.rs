//! # Ingot - typed entities to flat tables and back
//!
//! A library for flattening strongly-typed entity graphs into `(path, value)`
//! pairs and CSV rows, and for rebuilding the entities from them.
//!
//! ## Modules
//!
//! - **meta**: Entity metadata, the `entity!` macro and the shape registry
//! - **flat**: The flattening and unflattening engine
//! - **table**: CSV rendering of flattened entities
//! - **schema**: JSON Schema export from registered shapes
//! - **model**: A sample entity model used by the command-line tools
//!
//! ## Quick Start
//!
//! ```rust
//! use ingot::{entity, Codec, CodecConfig};
//!
//! entity! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Post as "post" {
//!         pub name: String => "name",
//!         pub tags: Vec<String> => "tags",
//!     }
//! }
//!
//! # fn main() -> ingot::Result<()> {
//! let codec = Codec::for_root::<Post>(CodecConfig::default())?;
//! let post = Post {
//!     name: "p1".to_string(),
//!     tags: vec!["x".to_string(), "y".to_string()],
//! };
//!
//! let pairs = codec.encode(&post)?;
//! let paths: Vec<String> = pairs.iter().map(|p| p.path.to_string()).collect();
//! assert_eq!(paths, vec!["name", "tags[0]", "tags[1]"]);
//!
//! let back: Post = codec.decode(&pairs)?;
//! assert_eq!(back, post);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod flat;
pub mod logging;
pub mod meta;
pub mod model;
pub mod schema;
pub mod table;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, FlatError, Result};
pub use flat::{Codec, Decoder, Encoder, FlatPath, Node, NodeKind, Record, Segment};
pub use meta::{Entity, EntityShape, Field, FieldDef, FieldDescriptor, Registry, TypeTag};
pub use schema::json_schema;
pub use table::{Table, TableConfig};
pub use types::{CodecConfig, FlatPair, FlatValue, Naming, ScalarKind, ScalarValue};

/// Flatten one entity; its type must be registered with `registry`
pub fn encode<T: Entity>(registry: &Registry, entity: &T, config: &CodecConfig) -> Result<Vec<FlatPair>> {
    registry.shape_of(T::TYPE_NAME)?;
    flat::encode_entity(entity, config)
}

/// Rebuild an entity of type `T` from its flat pairs
pub fn decode<T: Entity>(registry: &Registry, pairs: &[FlatPair], config: &CodecConfig) -> Result<T> {
    Decoder::new(registry, config).decode(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Project, User};

    #[test]
    fn test_basic_flattening() {
        let registry = Registry::for_root::<User>().unwrap();
        let config = CodecConfig::default();
        let user = User {
            name: "Ann".to_string(),
            projects: vec![Project::default(), Project::default()],
            ..Default::default()
        };

        let pairs = encode(&registry, &user, &config).unwrap();
        assert!(pairs.iter().any(|p| p.path.to_string() == "projects[1].tags"));
        assert_eq!(decode::<User>(&registry, &pairs, &config).unwrap(), user);
    }

    #[test]
    fn test_encode_requires_registration() {
        let registry = Registry::new();
        let err = encode(&registry, &Project::default(), &CodecConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnregisteredType);
    }
}
