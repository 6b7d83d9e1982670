use crate::error::Result;
use crate::flat::node::Record;
use crate::meta::field::Field;
use crate::meta::registry::Registry;
use crate::meta::tag::TypeTag;
use crate::types::Naming;
use std::fmt;

/// A field's static declaration: names and tag, no value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDef {
    pub field_name: String,
    /// Column name used on the wire, e.g. `zipCode` for `zipcode`
    pub wire_name: String,
    pub type_tag: TypeTag,
}

impl FieldDef {
    pub fn new(field_name: impl Into<String>, wire_name: impl Into<String>, type_tag: TypeTag) -> Self {
        FieldDef {
            field_name: field_name.into(),
            wire_name: wire_name.into(),
            type_tag,
        }
    }

    pub fn name(&self, naming: Naming) -> &str {
        match naming {
            Naming::FieldName => &self.field_name,
            Naming::WireName => &self.wire_name,
        }
    }
}

/// The ordered field declarations of one entity type
///
/// Equality compares only the ordered `(field_name, wire_name, type_tag)`
/// triples.
#[derive(Debug, Clone)]
pub struct EntityShape {
    pub type_name: String,
    pub table_name: String,
    pub fields: Vec<FieldDef>,
}

impl EntityShape {
    pub fn new(type_name: impl Into<String>, table_name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        EntityShape {
            type_name: type_name.into(),
            table_name: table_name.into(),
            fields,
        }
    }

    /// Index of the field called `name` under the given naming
    pub fn position(&self, name: &str, naming: Naming) -> Option<usize> {
        self.fields.iter().position(|def| def.name(naming) == name)
    }

    pub fn field(&self, field_name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|def| def.field_name == field_name)
    }
}

impl PartialEq for EntityShape {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for EntityShape {}

/// One field of a live entity, produced fresh by [`Entity::describe`]
pub struct FieldDescriptor<'a> {
    pub field_name: &'a str,
    pub wire_name: &'a str,
    pub type_tag: TypeTag,
    pub value: &'a dyn Field,
}

impl<'a> FieldDescriptor<'a> {
    pub fn new(field_name: &'a str, wire_name: &'a str, type_tag: TypeTag, value: &'a dyn Field) -> Self {
        FieldDescriptor {
            field_name,
            wire_name,
            type_tag,
            value,
        }
    }

    pub fn name(&self, naming: Naming) -> &'a str {
        match naming {
            Naming::FieldName => self.field_name,
            Naming::WireName => self.wire_name,
        }
    }

    pub fn def(&self) -> FieldDef {
        FieldDef::new(self.field_name, self.wire_name, self.type_tag.clone())
    }
}

impl fmt::Debug for FieldDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("field_name", &self.field_name)
            .field("wire_name", &self.wire_name)
            .field("type_tag", &self.type_tag)
            .finish_non_exhaustive()
    }
}

/// A type that encodes to one table row
///
/// Usually implemented through [`entity!`](crate::entity); a hand-written
/// implementation also needs [`entity_field!`](crate::entity_field).
pub trait Entity: Field + Sized {
    const TYPE_NAME: &'static str;

    /// Symbolic table name handed to persistence collaborators
    const TABLE_NAME: &'static str;

    fn shape() -> EntityShape;

    /// One descriptor per declared field, in declared order
    fn describe(&self) -> Vec<FieldDescriptor<'_>>;

    fn from_record(record: Record) -> Result<Self>;

    /// Register the entity types this one's fields refer to
    fn register_fields(registry: &mut Registry);
}

/// Declare an entity struct together with its metadata.
///
/// ```rust
/// use ingot::entity;
///
/// entity! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Address as "address" {
///         pub street: String => "street",
///         pub zipcode: String => "zipCode",
///     }
/// }
///
/// use ingot::Entity;
/// assert_eq!(Address::TABLE_NAME, "address");
/// assert_eq!(Address::shape().fields[1].wire_name, "zipCode");
/// ```
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident as $table:literal {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty => $wire:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Entity for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const TABLE_NAME: &'static str = $table;

            fn shape() -> $crate::EntityShape {
                $crate::EntityShape::new(
                    <Self as $crate::Entity>::TYPE_NAME,
                    <Self as $crate::Entity>::TABLE_NAME,
                    vec![
                        $(
                            $crate::FieldDef::new(
                                stringify!($field),
                                $wire,
                                <$ty as $crate::Field>::type_tag(),
                            ),
                        )*
                    ],
                )
            }

            fn describe(&self) -> Vec<$crate::FieldDescriptor<'_>> {
                vec![
                    $(
                        $crate::FieldDescriptor::new(
                            stringify!($field),
                            $wire,
                            <$ty as $crate::Field>::type_tag(),
                            &self.$field,
                        ),
                    )*
                ]
            }

            #[allow(unused_mut)]
            fn from_record(mut record: $crate::Record) -> $crate::Result<Self> {
                Ok($name {
                    $( $field: record.take::<$ty>(stringify!($field))?, )*
                })
            }

            #[allow(unused_variables)]
            fn register_fields(registry: &mut $crate::Registry) {
                $( <$ty as $crate::Field>::register(registry); )*
            }
        }

        $crate::entity_field!($name);
    };
}

/// Implement [`Field`](crate::Field) for a type that already implements
/// [`Entity`](crate::Entity).
#[macro_export]
macro_rules! entity_field {
    ($name:ty) => {
        impl $crate::Field for $name {
            fn type_tag() -> $crate::TypeTag {
                $crate::TypeTag::entity(<Self as $crate::Entity>::TYPE_NAME)
            }

            fn value_tag(&self) -> $crate::TypeTag {
                <Self as $crate::Field>::type_tag()
            }

            fn encode(&self, encoder: &mut $crate::Encoder<'_>) -> $crate::Result<()> {
                encoder.entity(self)
            }

            fn from_node(node: $crate::Node) -> $crate::Result<Self> {
                let record = node.into_record(<Self as $crate::Entity>::TYPE_NAME)?;
                <Self as $crate::Entity>::from_record(record)
            }

            fn register(registry: &mut $crate::Registry) {
                registry.register::<Self>();
            }
        }
    };
}
