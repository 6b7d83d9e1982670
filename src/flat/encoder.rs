use crate::error::{FlatError, Result};
use crate::flat::path::{escape_key, unescape_key, FlatPath, Segment};
use crate::meta::{Entity, Field, TypeTag};
use crate::types::{CodecConfig, FlatPair, FlatValue};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Depth-first walker that flattens one entity into `(path, value)` pairs
///
/// [`Field`] implementations drive it: scalars call [`Encoder::emit`],
/// containers call [`Encoder::list`] or [`Encoder::map`], entities call
/// [`Encoder::entity`].
pub struct Encoder<'c> {
    config: &'c CodecConfig,
    path: FlatPath,
    pairs: Vec<FlatPair>,
    /// Identities of the shared values currently being walked
    ancestors: HashSet<usize>,
}

impl<'c> Encoder<'c> {
    pub fn new(config: &'c CodecConfig) -> Self {
        Encoder {
            config,
            path: FlatPath::root(),
            pairs: Vec::new(),
            ancestors: HashSet::new(),
        }
    }

    pub fn path(&self) -> &FlatPath {
        &self.path
    }

    pub fn finish(self) -> Vec<FlatPair> {
        self.pairs
    }

    /// Emit a leaf at the current path
    pub fn emit(&mut self, value: FlatValue) {
        self.pairs.push(FlatPair::new(self.path.clone(), value));
    }

    /// Walk an entity's descriptors in declared order; an entity with no
    /// fields leaves a sentinel
    pub fn entity<E: Entity>(&mut self, entity: &E) -> Result<()> {
        let descriptors = entity.describe();
        if descriptors.is_empty() {
            self.emit(FlatValue::EmptyEntity);
            return Ok(());
        }

        for descriptor in descriptors {
            self.path
                .push(Segment::Field(descriptor.name(self.config.naming).to_string()));

            let found = descriptor.value.value_tag();
            if found != descriptor.type_tag {
                return Err(FlatError::mismatch(&self.path, &descriptor.type_tag, found));
            }

            descriptor.value.encode(self)?;
            self.path.pop();
        }
        Ok(())
    }

    /// Walk list elements under `[i]`; an empty list leaves a sentinel
    pub fn list<'a, I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a dyn Field>,
    {
        let mut count = 0;
        for (index, item) in items.into_iter().enumerate() {
            self.path.push(Segment::Index(index));
            item.encode(self)?;
            self.path.pop();
            count += 1;
        }

        if count == 0 {
            self.emit(FlatValue::EmptyList);
        }
        Ok(())
    }

    /// Walk map entries under `{key}`, ordered by the key's raw text
    pub fn map<'a, I>(&mut self, key_tag: &TypeTag, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a dyn Field, &'a dyn Field)>,
    {
        let mut keyed = Vec::new();
        for (key, value) in entries {
            let (order, text) = self.key_text(key_tag, key)?;
            keyed.push((order, text, value));
        }

        if keyed.is_empty() {
            self.emit(FlatValue::EmptyMap);
            return Ok(());
        }

        keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        trace!(path = %self.path, entries = keyed.len(), "ordered map entries");

        for (_, text, value) in keyed {
            self.path.push(Segment::Key(text));
            value.encode(self)?;
            self.path.pop();
        }
        Ok(())
    }

    /// Walk a shared value, failing if it is already one of its own ancestors
    pub fn shared<F>(&mut self, identity: usize, walk: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if !self.ancestors.insert(identity) {
            return Err(FlatError::CycleDetected {
                path: self.path.to_string(),
            });
        }
        let result = walk(self);
        self.ancestors.remove(&identity);
        result
    }

    /// Encode a map key, returning its raw text for ordering and the
    /// escaped text that goes between the braces.
    ///
    /// A scalar key is its cell text. Any other key is flattened on its own
    /// and written as `path=value` items joined by `;`.
    fn key_text(&mut self, key_tag: &TypeTag, key: &dyn Field) -> Result<(String, String)> {
        let mut sub = Encoder {
            config: self.config,
            path: FlatPath::root(),
            pairs: Vec::new(),
            ancestors: std::mem::take(&mut self.ancestors),
        };
        let result = key.encode(&mut sub);
        self.ancestors = sub.ancestors;
        result?;

        let pairs = sub.pairs;
        if key_tag.is_scalar() {
            return match pairs.as_slice() {
                [only] if only.path.is_root() => {
                    Ok((raw_text(&only.value), escape_key(&only.value.to_cell_text())))
                }
                _ => Err(FlatError::mismatch(&self.path, key_tag, "composite key")),
            };
        }

        let mut order = Vec::with_capacity(pairs.len());
        let mut items = Vec::with_capacity(pairs.len());
        for pair in &pairs {
            order.push(format!("{}={}", raw_path(&pair.path)?, raw_text(&pair.value)));
            items.push(format!("{}={}", pair.path, escape_key(&pair.value.to_cell_text())));
        }
        Ok((order.join(";"), items.join(";")))
    }
}

/// A scalar's own text; sentinels keep their cell token
fn raw_text(value: &FlatValue) -> String {
    match value {
        FlatValue::Value(scalar) => scalar.to_string(),
        _ => value.to_cell_text(),
    }
}

/// A path rendered with its key segments unescaped
fn raw_path(path: &FlatPath) -> Result<String> {
    let mut out = String::new();
    for segment in path.segments() {
        match segment {
            Segment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Segment::Index(index) => out.push_str(&format!("[{}]", index)),
            Segment::Key(text) => {
                out.push('{');
                out.push_str(&unescape_key(text)?);
                out.push('}');
            }
        }
    }
    Ok(out)
}

/// Flatten one entity
pub fn encode_entity<E: Entity>(entity: &E, config: &CodecConfig) -> Result<Vec<FlatPair>> {
    let mut encoder = Encoder::new(config);
    encoder.entity(entity)?;
    let pairs = encoder.finish();
    debug!(entity = E::TYPE_NAME, pairs = pairs.len(), "encoded entity");
    Ok(pairs)
}
