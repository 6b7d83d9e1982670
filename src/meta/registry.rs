use crate::error::{FlatError, Result};
use crate::meta::entity::{Entity, EntityShape};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

// Field and wire names become path segments and column headers
static NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Entity shapes by type name
///
/// Shapes come either from [`Registry::register`], which walks a type's
/// fields and registers every entity type it reaches, or are injected as
/// configuration with [`Registry::insert_shape`]. Call
/// [`Registry::validate`] once after registration.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    shapes: BTreeMap<String, EntityShape>,
    // type names claimed by more than one distinct shape
    conflicts: BTreeSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register `T` and its validated closure of nested entity types
    pub fn for_root<T: Entity>() -> Result<Self> {
        let mut registry = Registry::new();
        registry.register::<T>();
        registry.validate()?;
        Ok(registry)
    }

    /// Register `T` and every entity type its fields reach.
    ///
    /// A second type registered under a name already taken by a different
    /// shape is not inserted; [`Registry::validate`] reports it.
    pub fn register<T: Entity>(&mut self) -> &mut Self {
        match self.shapes.get(T::TYPE_NAME) {
            Some(existing) => {
                if *existing != T::shape() && self.conflicts.insert(T::TYPE_NAME.to_string()) {
                    warn!(type_name = T::TYPE_NAME, "type name registered with two different shapes");
                }
            }
            None => {
                self.shapes.insert(T::TYPE_NAME.to_string(), T::shape());
                T::register_fields(self);
            }
        }
        self
    }

    /// Insert or replace a shape
    pub fn insert_shape(&mut self, shape: EntityShape) -> &mut Self {
        self.shapes.insert(shape.type_name.clone(), shape);
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.shapes.contains_key(type_name)
    }

    pub fn shape_of(&self, type_name: &str) -> Result<&EntityShape> {
        self.shapes
            .get(type_name)
            .ok_or_else(|| FlatError::unregistered(type_name))
    }

    pub fn shapes(&self) -> impl Iterator<Item = &EntityShape> {
        self.shapes.values()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Check that the registry is closed and every shape is well-formed.
    ///
    /// Every entity type referenced from any registered shape, through list
    /// elements, map keys or map values, must itself be registered. Field
    /// and wire names must be identifiers and unique within their shape.
    /// Two different types registered under one name are rejected.
    pub fn validate(&self) -> Result<()> {
        if let Some(type_name) = self.conflicts.iter().next() {
            return Err(FlatError::InvalidShape {
                type_name: type_name.clone(),
                reason: format!("type name `{}` registered with two different shapes", type_name),
            });
        }

        for shape in self.shapes.values() {
            let mut field_names = HashSet::new();
            let mut wire_names = HashSet::new();

            for def in &shape.fields {
                for name in [&def.field_name, &def.wire_name] {
                    if !NAME_REGEX.is_match(name) {
                        return Err(FlatError::InvalidShape {
                            type_name: shape.type_name.clone(),
                            reason: format!("`{}` is not a valid field or wire name", name),
                        });
                    }
                }
                if !field_names.insert(def.field_name.as_str()) {
                    return Err(FlatError::InvalidShape {
                        type_name: shape.type_name.clone(),
                        reason: format!("duplicate field name `{}`", def.field_name),
                    });
                }
                if !wire_names.insert(def.wire_name.as_str()) {
                    return Err(FlatError::InvalidShape {
                        type_name: shape.type_name.clone(),
                        reason: format!("duplicate wire name `{}`", def.wire_name),
                    });
                }

                for referenced in def.type_tag.entity_refs() {
                    if !self.contains(referenced) {
                        return Err(FlatError::unregistered(referenced));
                    }
                }
            }
        }

        debug!(shapes = self.shapes.len(), "registry validated");
        Ok(())
    }
}
