use crate::types::ScalarKind;
use std::fmt;

/// Declared structural type of a field
///
/// `MapOf` keys may be any tag, including another `MapOf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Scalar(ScalarKind),
    Entity(String),
    ListOf(Box<TypeTag>),
    MapOf(Box<TypeTag>, Box<TypeTag>),
}

impl TypeTag {
    pub fn entity(type_name: impl Into<String>) -> Self {
        TypeTag::Entity(type_name.into())
    }

    pub fn list(element: TypeTag) -> Self {
        TypeTag::ListOf(Box::new(element))
    }

    pub fn map(key: TypeTag, value: TypeTag) -> Self {
        TypeTag::MapOf(Box::new(key), Box::new(value))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeTag::Scalar(_))
    }

    /// Every entity type name this tag refers to, outermost first
    pub fn entity_refs(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_entity_refs(&mut names);
        names
    }

    fn collect_entity_refs<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            TypeTag::Scalar(_) => {}
            TypeTag::Entity(name) => names.push(name),
            TypeTag::ListOf(element) => element.collect_entity_refs(names),
            TypeTag::MapOf(key, value) => {
                key.collect_entity_refs(names);
                value.collect_entity_refs(names);
            }
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Scalar(kind) => write!(f, "{}", kind),
            TypeTag::Entity(name) => f.write_str(name),
            TypeTag::ListOf(element) => write!(f, "list<{}>", element),
            TypeTag::MapOf(key, value) => write!(f, "map<{}, {}>", key, value),
        }
    }
}
