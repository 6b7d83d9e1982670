//! Flattening and unflattening of entity graphs
//!
//! An entity encodes to an ordered sequence of [`FlatPair`]s, one per leaf:
//!
//! - nested entity fields extend the path with `.field`
//! - list elements extend it with `[i]`; an empty list is one `EmptyList` pair
//! - map entries extend it with `{key}`; an empty map is one `EmptyMap` pair
//! - `None` is a single `Null` pair
//! - an entity whose type has no fields is one `EmptyEntity` pair
//!
//! Decoding reverses the walk, using the registered shapes to decide which
//! pairs belong to which field.

pub mod decoder;
pub mod encoder;
pub mod node;
pub mod path;

pub use decoder::Decoder;
pub use encoder::{encode_entity, Encoder};
pub use node::{Node, NodeKind, Record};
pub use path::{escape_key, unescape_key, FlatPath, Segment};

use crate::error::Result;
use crate::meta::{Entity, EntityShape, FieldDescriptor, Registry};
use crate::types::{CodecConfig, FlatPair};

/// A registry of shapes plus the settings used to encode and decode with it
#[derive(Debug, Clone, Default)]
pub struct Codec {
    registry: Registry,
    config: CodecConfig,
}

impl Codec {
    pub fn new(registry: Registry, config: CodecConfig) -> Result<Self> {
        registry.validate()?;
        Ok(Codec { registry, config })
    }

    /// A codec for `T` and every entity type reachable from it
    pub fn for_root<T: Entity>(config: CodecConfig) -> Result<Self> {
        Ok(Codec {
            registry: Registry::for_root::<T>()?,
            config,
        })
    }

    /// Add `T` and its nested types, then re-check the registry
    pub fn register<T: Entity>(&mut self) -> Result<&mut Self> {
        self.registry.register::<T>();
        self.registry.validate()?;
        Ok(self)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn shape_of<T: Entity>(&self) -> Result<&EntityShape> {
        self.registry.shape_of(T::TYPE_NAME)
    }

    pub fn describe<'a, T: Entity>(&self, entity: &'a T) -> Result<Vec<FieldDescriptor<'a>>> {
        self.shape_of::<T>()?;
        Ok(entity.describe())
    }

    pub fn encode<T: Entity>(&self, entity: &T) -> Result<Vec<FlatPair>> {
        self.shape_of::<T>()?;
        encode_entity(entity, &self.config)
    }

    pub fn decode<T: Entity>(&self, pairs: &[FlatPair]) -> Result<T> {
        Decoder::new(&self.registry, &self.config).decode(pairs)
    }
}
