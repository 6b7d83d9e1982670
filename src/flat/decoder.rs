use crate::error::{FlatError, Result};
use crate::flat::node::{Node, NodeKind, Record};
use crate::flat::path::{split_top_level, unescape_key, FlatPath, Segment};
use crate::meta::{Entity, Registry, TypeTag};
use crate::types::{CodecConfig, FlatPair, FlatValue};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A flat pair with the already-consumed prefix of its path stripped
#[derive(Debug, Clone, Copy)]
struct Slot<'p> {
    rest: &'p [Segment],
    value: &'p FlatValue,
}

impl<'p> Slot<'p> {
    fn of(pair: &'p FlatPair) -> Self {
        Slot {
            rest: pair.path.segments(),
            value: &pair.value,
        }
    }

    fn describe_value(&self) -> &'static str {
        match self.value {
            FlatValue::Value(_) => "scalar",
            FlatValue::Null => "null",
            FlatValue::EmptyList => "empty list",
            FlatValue::EmptyMap => "empty map",
            FlatValue::EmptyEntity => "empty entity",
        }
    }
}

fn segment_kind(segment: &Segment) -> &'static str {
    match segment {
        Segment::Field(_) => "field segment",
        Segment::Index(_) => "list index",
        Segment::Key(_) => "map key",
    }
}

/// Rebuilds entities from flat pairs, guided by registered shapes
pub struct Decoder<'r> {
    registry: &'r Registry,
    config: &'r CodecConfig,
}

impl<'r> Decoder<'r> {
    pub fn new(registry: &'r Registry, config: &'r CodecConfig) -> Self {
        Decoder { registry, config }
    }

    pub fn decode<E: Entity>(&self, pairs: &[FlatPair]) -> Result<E> {
        let node = self.decode_node(&TypeTag::entity(E::TYPE_NAME), pairs)?;
        let entity = E::from_node(node)?;
        debug!(entity = E::TYPE_NAME, pairs = pairs.len(), "decoded entity");
        Ok(entity)
    }

    /// Build the intermediate tree for a value of type `tag`
    pub fn decode_node(&self, tag: &TypeTag, pairs: &[FlatPair]) -> Result<Node> {
        let slots = pairs.iter().map(Slot::of).collect();
        self.decode_tagged(tag, FlatPath::root(), slots)
    }

    fn decode_tagged(&self, tag: &TypeTag, path: FlatPath, slots: Vec<Slot<'_>>) -> Result<Node> {
        if let [only] = slots.as_slice() {
            if only.rest.is_empty() && *only.value == FlatValue::Null {
                return Ok(Node::new(path, NodeKind::Null));
            }
        }

        match tag {
            TypeTag::Scalar(kind) => {
                let [only] = slots.as_slice() else {
                    return Err(FlatError::ArityMismatch {
                        path: path.to_string(),
                        found: slots.len(),
                    });
                };
                if let Some(segment) = only.rest.first() {
                    return Err(FlatError::mismatch(&path, kind, segment_kind(segment)));
                }
                match only.value {
                    FlatValue::Value(value) => Ok(Node::new(path, NodeKind::Scalar(value.clone()))),
                    _ => Err(FlatError::mismatch(&path, kind, only.describe_value())),
                }
            }
            TypeTag::Entity(type_name) => self.decode_entity(type_name, path, slots),
            TypeTag::ListOf(element) => self.decode_list(tag, element, path, slots),
            TypeTag::MapOf(key, value) => self.decode_map(tag, key, value, path, slots),
        }
    }

    /// If a slot ends here it must be the only one, and it is a sentinel or
    /// scalar standing in for the whole container.
    fn lone_value<'s, 'p>(&self, path: &FlatPath, slots: &'s [Slot<'p>]) -> Result<Option<&'s Slot<'p>>> {
        match slots.iter().find(|slot| slot.rest.is_empty()) {
            None => Ok(None),
            Some(slot) if slots.len() == 1 => Ok(Some(slot)),
            Some(_) => Err(FlatError::ArityMismatch {
                path: path.to_string(),
                found: slots.len(),
            }),
        }
    }

    fn decode_entity(&self, type_name: &str, path: FlatPath, slots: Vec<Slot<'_>>) -> Result<Node> {
        let shape = self.registry.shape_of(type_name)?;
        if let Some(slot) = self.lone_value(&path, &slots)? {
            return match slot.value {
                FlatValue::EmptyEntity if shape.fields.is_empty() => {
                    Ok(Node::new(path.clone(), NodeKind::Record(Record::new(type_name, path))))
                }
                _ => Err(FlatError::mismatch(&path, type_name, slot.describe_value())),
            };
        }

        let naming = self.config.naming;
        let mut groups: Vec<Vec<Slot<'_>>> = vec![Vec::new(); shape.fields.len()];
        for slot in slots {
            let Some((first, rest)) = slot.rest.split_first() else {
                continue;
            };
            let Segment::Field(name) = first else {
                return Err(FlatError::mismatch(&path, type_name, segment_kind(first)));
            };
            let Some(pos) = shape.position(name, naming) else {
                return Err(FlatError::UnknownField {
                    path: path.child(first.clone()).to_string(),
                    field: name.clone(),
                    type_name: type_name.to_string(),
                });
            };
            groups[pos].push(Slot {
                rest,
                value: slot.value,
            });
        }

        let mut record = Record::new(type_name, path.clone());
        for (def, group) in shape.fields.iter().zip(groups) {
            let child = path.child(Segment::Field(def.name(naming).to_string()));
            if group.is_empty() && !matches!(def.type_tag, TypeTag::Entity(_)) {
                return Err(FlatError::ArityMismatch {
                    path: child.to_string(),
                    found: 0,
                });
            }
            let node = self.decode_tagged(&def.type_tag, child, group)?;
            record.push(def.field_name.clone(), node);
        }

        Ok(Node::new(path, NodeKind::Record(record)))
    }

    fn decode_list(&self, tag: &TypeTag, element: &TypeTag, path: FlatPath, slots: Vec<Slot<'_>>) -> Result<Node> {
        if let Some(slot) = self.lone_value(&path, &slots)? {
            return match slot.value {
                FlatValue::EmptyList => Ok(Node::new(path, NodeKind::List(Vec::new()))),
                _ => Err(FlatError::mismatch(&path, tag, slot.describe_value())),
            };
        }

        let mut groups: BTreeMap<usize, Vec<Slot<'_>>> = BTreeMap::new();
        for slot in slots {
            let Some((first, rest)) = slot.rest.split_first() else {
                continue;
            };
            let Segment::Index(index) = first else {
                return Err(FlatError::mismatch(&path, tag, segment_kind(first)));
            };
            groups.entry(*index).or_default().push(Slot {
                rest,
                value: slot.value,
            });
        }

        let mut items = Vec::with_capacity(groups.len());
        for (expected, (index, group)) in groups.into_iter().enumerate() {
            if index != expected {
                return Err(FlatError::SparseList {
                    path: path.to_string(),
                    missing: expected,
                });
            }
            items.push(self.decode_tagged(element, path.child(Segment::Index(index)), group)?);
        }

        Ok(Node::new(path, NodeKind::List(items)))
    }

    fn decode_map(
        &self,
        tag: &TypeTag,
        key_tag: &TypeTag,
        value_tag: &TypeTag,
        path: FlatPath,
        slots: Vec<Slot<'_>>,
    ) -> Result<Node> {
        if let Some(slot) = self.lone_value(&path, &slots)? {
            return match slot.value {
                FlatValue::EmptyMap => Ok(Node::new(path, NodeKind::Map(Vec::new()))),
                _ => Err(FlatError::mismatch(&path, tag, slot.describe_value())),
            };
        }

        // group by key text, keeping the order keys were first seen
        let mut order: Vec<(&str, Vec<Slot<'_>>)> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for slot in slots {
            let Some((first, rest)) = slot.rest.split_first() else {
                continue;
            };
            let Segment::Key(text) = first else {
                return Err(FlatError::mismatch(&path, tag, segment_kind(first)));
            };
            let pos = *seen.entry(text.as_str()).or_insert_with(|| {
                order.push((text.as_str(), Vec::new()));
                order.len() - 1
            });
            order[pos].1.push(Slot {
                rest,
                value: slot.value,
            });
        }

        let mut entries = Vec::with_capacity(order.len());
        for (text, group) in order {
            let entry_path = path.child(Segment::Key(text.to_string()));
            let key = self.decode_key(key_tag, &entry_path, text)?;
            let value = self.decode_tagged(value_tag, entry_path, group)?;
            entries.push((key, value));
        }

        Ok(Node::new(path, NodeKind::Map(entries)))
    }

    /// Parse the text between a key's braces and decode it against `key_tag`
    fn decode_key(&self, key_tag: &TypeTag, entry_path: &FlatPath, text: &str) -> Result<Node> {
        let mut pairs = Vec::new();

        if key_tag.is_scalar() {
            let raw = unescape_key(text)?;
            pairs.push(FlatPair::new(
                FlatPath::root(),
                FlatValue::from_cell_text(&raw, entry_path)?,
            ));
        } else {
            for item in split_top_level(text, ';') {
                let parts = split_top_level(item, '=');
                let [path_text, value_text] = parts.as_slice() else {
                    return Err(FlatError::malformed(
                        entry_path.to_string(),
                        format!("composite key item `{}` is not `path=value`", item),
                    ));
                };
                let raw = unescape_key(value_text)?;
                pairs.push(FlatPair::new(
                    FlatPath::parse(path_text)?,
                    FlatValue::from_cell_text(&raw, entry_path)?,
                ));
            }
        }

        let slots = pairs.iter().map(Slot::of).collect();
        self.decode_tagged(key_tag, entry_path.clone(), slots)
    }
}
