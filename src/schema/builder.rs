//! Schema builder walking registered entity shapes
//!
//! Every entity reached from the root is emitted once under `$defs` and
//! referenced from everywhere else, so recursive shapes terminate.

use crate::error::Result;
use crate::meta::{EntityShape, Registry, TypeTag};
use crate::types::ScalarKind;
use serde_json::{json, Map, Value};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Builds one JSON Schema document for a root entity type
#[derive(Debug)]
pub struct SchemaBuilder<'r> {
    registry: &'r Registry,
    root: String,
    defs: Map<String, Value>,
    seen: HashSet<String>,
    pending: VecDeque<String>,
}

impl<'r> SchemaBuilder<'r> {
    pub fn new(registry: &'r Registry, root: impl Into<String>) -> Self {
        let root = root.into();
        let mut seen = HashSet::new();
        seen.insert(root.clone());
        SchemaBuilder {
            registry,
            root,
            defs: Map::new(),
            seen,
            pending: VecDeque::new(),
        }
    }

    pub fn build(mut self) -> Result<Value> {
        let root_shape = self.registry.shape_of(&self.root)?;
        let body = self.object_schema(root_shape);

        while let Some(name) = self.pending.pop_front() {
            let shape = self.registry.shape_of(&name)?;
            let schema = self.object_schema(shape);
            self.defs.insert(name, schema);
        }

        let mut schema = Map::new();
        schema.insert("$schema".to_string(), Value::String(DRAFT_2020_12.to_string()));
        schema.insert("title".to_string(), Value::String(self.root.clone()));
        if let Value::Object(body) = body {
            schema.extend(body);
        }
        if !self.defs.is_empty() {
            schema.insert("$defs".to_string(), Value::Object(self.defs));
        }

        debug!(root = %self.root, "built json schema");
        Ok(Value::Object(schema))
    }

    fn object_schema(&mut self, shape: &EntityShape) -> Value {
        let mut properties = Map::new();
        for def in &shape.fields {
            properties.insert(def.wire_name.clone(), self.tag_schema(&def.type_tag));
        }

        json!({
            "type": "object",
            "x-table": shape.table_name,
            "properties": properties,
            "additionalProperties": false,
        })
    }

    fn tag_schema(&mut self, tag: &TypeTag) -> Value {
        match tag {
            TypeTag::Scalar(kind) => scalar_schema(*kind),
            TypeTag::Entity(name) => {
                if *name == self.root {
                    return json!({ "$ref": "#" });
                }
                if self.seen.insert(name.clone()) {
                    self.pending.push_back(name.clone());
                }
                json!({ "$ref": format!("#/$defs/{}", name) })
            }
            TypeTag::ListOf(element) => json!({
                "type": "array",
                "items": self.tag_schema(element),
            }),
            TypeTag::MapOf(key, value) => match key.as_ref() {
                TypeTag::Scalar(kind) => {
                    let mut schema = json!({
                        "type": "object",
                        "additionalProperties": self.tag_schema(value),
                    });
                    if let Some(pattern) = key_pattern(*kind) {
                        schema["propertyNames"] = json!({ "pattern": pattern });
                    }
                    schema
                }
                // JSON object keys are strings, so other keys travel as entry lists
                _ => json!({
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "key": self.tag_schema(key),
                            "value": self.tag_schema(value),
                        },
                        "required": ["key", "value"],
                        "additionalProperties": false,
                    },
                }),
            },
        }
    }
}

fn scalar_schema(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::Str => json!({ "type": "string" }),
        ScalarKind::Int => json!({ "type": "integer" }),
        ScalarKind::UInt => json!({ "type": "integer", "minimum": 0 }),
        ScalarKind::Float => json!({ "type": "number" }),
        ScalarKind::Bool => json!({ "type": "boolean" }),
    }
}

fn key_pattern(kind: ScalarKind) -> Option<&'static str> {
    match kind {
        ScalarKind::Int => Some("^-?[0-9]+$"),
        ScalarKind::UInt => Some("^[0-9]+$"),
        ScalarKind::Bool => Some("^(true|false)$"),
        ScalarKind::Str | ScalarKind::Float => None,
    }
}

/// JSON Schema for the registered entity `type_name`
pub fn json_schema(registry: &Registry, type_name: &str) -> Result<Value> {
    SchemaBuilder::new(registry, type_name).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::collections::BTreeMap;

    crate::entity! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Spot as "spot" {
            zipcode: String => "zipCode",
            floor: u8 => "floor",
        }
    }

    crate::entity! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Firm as "firm" {
            title: String => "title",
            offices: BTreeMap<String, Spot> => "offices",
            archive: Vec<Spot> => "archive",
            by_code: BTreeMap<i64, bool> => "byCode",
            pairs: BTreeMap<BTreeMap<String, String>, f64> => "pairs",
            parent: Option<Box<Firm>> => "parent",
        }
    }

    fn schema() -> Value {
        let registry = Registry::for_root::<Firm>().unwrap();
        json_schema(&registry, "Firm").unwrap()
    }

    #[test]
    fn test_properties_in_declared_order() {
        let schema = schema();
        let names: Vec<&str> = schema["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["title", "offices", "archive", "byCode", "pairs", "parent"]);
        assert_eq!(schema["x-table"], "firm");
        assert_eq!(schema["$schema"], DRAFT_2020_12);
    }

    #[test]
    fn test_nested_entities_go_to_defs_once() {
        let schema = schema();
        let defs = schema["$defs"].as_object().unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs["Spot"]["properties"]["zipCode"], json!({ "type": "string" }));
        assert_eq!(defs["Spot"]["properties"]["floor"]["minimum"], 0);
        assert_eq!(
            schema["properties"]["offices"]["additionalProperties"],
            json!({ "$ref": "#/$defs/Spot" })
        );
        assert_eq!(schema["properties"]["archive"]["items"]["$ref"], "#/$defs/Spot");
        assert_eq!(schema["properties"]["parent"], json!({ "$ref": "#" }));
    }

    #[test]
    fn test_map_keys() {
        let schema = schema();
        assert_eq!(
            schema["properties"]["byCode"]["propertyNames"]["pattern"],
            "^-?[0-9]+$"
        );
        let pairs = &schema["properties"]["pairs"];
        assert_eq!(pairs["type"], "array");
        assert_eq!(pairs["items"]["properties"]["key"]["type"], "object");
        assert_eq!(pairs["items"]["properties"]["value"]["type"], "number");
    }

    #[test]
    fn test_unregistered_root() {
        let registry = Registry::new();
        let err = json_schema(&registry, "Firm").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnregisteredType);
    }
}
