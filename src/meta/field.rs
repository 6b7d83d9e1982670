//! The per-value half of the metadata contract
//!
//! Every type that can sit in an entity field implements [`Field`]: it knows
//! its declared [`TypeTag`], how to walk itself into an [`Encoder`], and how
//! to read itself back out of a decoded [`Node`].

use crate::error::{FlatError, Result};
use crate::flat::encoder::Encoder;
use crate::flat::node::{Node, NodeKind};
use crate::flat::path::FlatPath;
use crate::meta::registry::Registry;
use crate::meta::tag::TypeTag;
use crate::types::{FlatValue, ScalarKind, ScalarValue};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;

pub trait Field {
    /// Tag shared by every value of this type
    fn type_tag() -> TypeTag
    where
        Self: Sized;

    /// Tag of this value, checked against the field's declared tag on encode
    fn value_tag(&self) -> TypeTag;

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()>;

    fn from_node(node: Node) -> Result<Self>
    where
        Self: Sized;

    /// Register every entity type reachable from this type
    fn register(_registry: &mut Registry)
    where
        Self: Sized,
    {
    }
}

fn invalid(path: &FlatPath, expected: &str, value: &ScalarValue) -> FlatError {
    FlatError::InvalidScalar {
        path: path.to_string(),
        expected: expected.to_string(),
        text: value.to_string(),
    }
}

macro_rules! signed_field {
    ($($t:ty),*) => {$(
        impl Field for $t {
            fn type_tag() -> TypeTag {
                TypeTag::Scalar(ScalarKind::Int)
            }

            fn value_tag(&self) -> TypeTag {
                <Self as Field>::type_tag()
            }

            fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
                encoder.emit(FlatValue::Value(ScalarValue::Int(i64::from(*self))));
                Ok(())
            }

            fn from_node(node: Node) -> Result<Self> {
                let (path, value) = node.into_scalar(ScalarKind::Int)?;
                let parsed = match &value {
                    ScalarValue::Int(i) => <$t>::try_from(*i).ok(),
                    ScalarValue::UInt(u) => <$t>::try_from(*u).ok(),
                    ScalarValue::Str(text) => text.parse::<$t>().ok(),
                    other => return Err(FlatError::mismatch(&path, ScalarKind::Int, other.kind())),
                };
                parsed.ok_or_else(|| invalid(&path, stringify!($t), &value))
            }
        }
    )*};
}

macro_rules! unsigned_field {
    ($($t:ty),*) => {$(
        impl Field for $t {
            fn type_tag() -> TypeTag {
                TypeTag::Scalar(ScalarKind::UInt)
            }

            fn value_tag(&self) -> TypeTag {
                <Self as Field>::type_tag()
            }

            fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
                encoder.emit(FlatValue::Value(ScalarValue::UInt(u64::from(*self))));
                Ok(())
            }

            fn from_node(node: Node) -> Result<Self> {
                let (path, value) = node.into_scalar(ScalarKind::UInt)?;
                let parsed = match &value {
                    ScalarValue::UInt(u) => <$t>::try_from(*u).ok(),
                    ScalarValue::Int(i) => <$t>::try_from(*i).ok(),
                    ScalarValue::Str(text) => text.parse::<$t>().ok(),
                    other => return Err(FlatError::mismatch(&path, ScalarKind::UInt, other.kind())),
                };
                parsed.ok_or_else(|| invalid(&path, stringify!($t), &value))
            }
        }
    )*};
}

macro_rules! float_field {
    ($($t:ty),*) => {$(
        impl Field for $t {
            fn type_tag() -> TypeTag {
                TypeTag::Scalar(ScalarKind::Float)
            }

            fn value_tag(&self) -> TypeTag {
                <Self as Field>::type_tag()
            }

            fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
                encoder.emit(FlatValue::Value(ScalarValue::Float(f64::from(*self))));
                Ok(())
            }

            fn from_node(node: Node) -> Result<Self> {
                let (path, value) = node.into_scalar(ScalarKind::Float)?;
                match &value {
                    ScalarValue::Float(x) => Ok(*x as $t),
                    ScalarValue::Int(i) => Ok(*i as $t),
                    ScalarValue::UInt(u) => Ok(*u as $t),
                    ScalarValue::Str(text) => text
                        .parse::<$t>()
                        .map_err(|_| invalid(&path, stringify!($t), &value)),
                    other => Err(FlatError::mismatch(&path, ScalarKind::Float, other.kind())),
                }
            }
        }
    )*};
}

signed_field!(i8, i16, i32, i64);
unsigned_field!(u8, u16, u32, u64);
float_field!(f32, f64);

impl Field for String {
    fn type_tag() -> TypeTag {
        TypeTag::Scalar(ScalarKind::Str)
    }

    fn value_tag(&self) -> TypeTag {
        <Self as Field>::type_tag()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        encoder.emit(FlatValue::Value(ScalarValue::Str(self.clone())));
        Ok(())
    }

    fn from_node(node: Node) -> Result<Self> {
        match node.into_scalar(ScalarKind::Str)? {
            (_, ScalarValue::Str(s)) => Ok(s),
            (path, other) => Err(FlatError::mismatch(&path, ScalarKind::Str, other.kind())),
        }
    }
}

impl Field for bool {
    fn type_tag() -> TypeTag {
        TypeTag::Scalar(ScalarKind::Bool)
    }

    fn value_tag(&self) -> TypeTag {
        <Self as Field>::type_tag()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        encoder.emit(FlatValue::Value(ScalarValue::Bool(*self)));
        Ok(())
    }

    fn from_node(node: Node) -> Result<Self> {
        let (path, value) = node.into_scalar(ScalarKind::Bool)?;
        match &value {
            ScalarValue::Bool(b) => Ok(*b),
            ScalarValue::Str(text) => text.parse::<bool>().map_err(|_| invalid(&path, "bool", &value)),
            other => Err(FlatError::mismatch(&path, ScalarKind::Bool, other.kind())),
        }
    }
}

impl<T: Field> Field for Option<T> {
    fn type_tag() -> TypeTag {
        T::type_tag()
    }

    fn value_tag(&self) -> TypeTag {
        T::type_tag()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        match self {
            Some(value) => value.encode(encoder),
            None => {
                encoder.emit(FlatValue::Null);
                Ok(())
            }
        }
    }

    fn from_node(node: Node) -> Result<Self> {
        match node.kind {
            NodeKind::Null => Ok(None),
            _ => T::from_node(node).map(Some),
        }
    }

    fn register(registry: &mut Registry) {
        T::register(registry);
    }
}

impl<T: Field> Field for Box<T> {
    fn type_tag() -> TypeTag {
        T::type_tag()
    }

    fn value_tag(&self) -> TypeTag {
        self.as_ref().value_tag()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        self.as_ref().encode(encoder)
    }

    fn from_node(node: Node) -> Result<Self> {
        T::from_node(node).map(Box::new)
    }

    fn register(registry: &mut Registry) {
        T::register(registry);
    }
}

impl<T: Field> Field for Vec<T> {
    fn type_tag() -> TypeTag {
        TypeTag::list(T::type_tag())
    }

    fn value_tag(&self) -> TypeTag {
        <Self as Field>::type_tag()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        encoder.list(self.iter().map(|item| item as &dyn Field))
    }

    fn from_node(node: Node) -> Result<Self> {
        node.into_list()?.into_iter().map(T::from_node).collect()
    }

    fn register(registry: &mut Registry) {
        T::register(registry);
    }
}

impl<K: Field + Ord, V: Field> Field for BTreeMap<K, V> {
    fn type_tag() -> TypeTag {
        TypeTag::map(K::type_tag(), V::type_tag())
    }

    fn value_tag(&self) -> TypeTag {
        <Self as Field>::type_tag()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        encoder.map(
            &K::type_tag(),
            self.iter().map(|(k, v)| (k as &dyn Field, v as &dyn Field)),
        )
    }

    fn from_node(node: Node) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (key, value) in node.into_map()? {
            map.insert(K::from_node(key)?, V::from_node(value)?);
        }
        Ok(map)
    }

    fn register(registry: &mut Registry) {
        K::register(registry);
        V::register(registry);
    }
}

impl<K, V, S> Field for HashMap<K, V, S>
where
    K: Field + Eq + Hash,
    V: Field,
    S: BuildHasher + Default,
{
    fn type_tag() -> TypeTag {
        TypeTag::map(K::type_tag(), V::type_tag())
    }

    fn value_tag(&self) -> TypeTag {
        <Self as Field>::type_tag()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        encoder.map(
            &K::type_tag(),
            self.iter().map(|(k, v)| (k as &dyn Field, v as &dyn Field)),
        )
    }

    fn from_node(node: Node) -> Result<Self> {
        let mut map = HashMap::with_hasher(S::default());
        for (key, value) in node.into_map()? {
            map.insert(K::from_node(key)?, V::from_node(value)?);
        }
        Ok(map)
    }

    fn register(registry: &mut Registry) {
        K::register(registry);
        V::register(registry);
    }
}

/// Shared, mutable values are the only way to build a cyclic graph, so this
/// is where the encoder tracks identity.
impl<T: Field> Field for Rc<RefCell<T>> {
    fn type_tag() -> TypeTag {
        T::type_tag()
    }

    fn value_tag(&self) -> TypeTag {
        self.borrow().value_tag()
    }

    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
        let identity = Rc::as_ptr(self) as *const () as usize;
        encoder.shared(identity, |encoder| self.borrow().encode(encoder))
    }

    fn from_node(node: Node) -> Result<Self> {
        T::from_node(node).map(|value| Rc::new(RefCell::new(value)))
    }

    fn register(registry: &mut Registry) {
        T::register(registry);
    }
}
