//! Intermediate tree built by the decoder
//!
//! The decoder turns flat pairs into a `Node` tree shaped by type tags; typed
//! values are then read out of it with [`Field::from_node`].

use crate::error::{FlatError, Result};
use crate::flat::path::{FlatPath, Segment};
use crate::meta::Field;
use crate::types::{ScalarKind, ScalarValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Where this node sits in the entity; used for error reports
    pub path: FlatPath,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Null,
    Scalar(ScalarValue),
    Record(Record),
    List(Vec<Node>),
    /// Entries in the order they were encountered
    Map(Vec<(Node, Node)>),
}

impl Node {
    pub fn new(path: FlatPath, kind: NodeKind) -> Self {
        Node { path, kind }
    }

    pub fn describe(&self) -> &'static str {
        match self.kind {
            NodeKind::Null => "null",
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Record(_) => "entity",
            NodeKind::List(_) => "list",
            NodeKind::Map(_) => "map",
        }
    }

    fn mismatch(&self, declared: impl ToString) -> FlatError {
        FlatError::mismatch(&self.path, declared, self.describe())
    }

    pub fn into_scalar(self, declared: ScalarKind) -> Result<(FlatPath, ScalarValue)> {
        match self.kind {
            NodeKind::Scalar(value) => Ok((self.path, value)),
            _ => Err(self.mismatch(declared)),
        }
    }

    pub fn into_record(self, type_name: &str) -> Result<Record> {
        match self.kind {
            NodeKind::Record(record) if record.type_name == type_name => Ok(record),
            NodeKind::Record(record) => Err(FlatError::mismatch(&self.path, type_name, record.type_name)),
            _ => Err(self.mismatch(type_name)),
        }
    }

    pub fn into_list(self) -> Result<Vec<Node>> {
        match self.kind {
            NodeKind::List(items) => Ok(items),
            _ => Err(self.mismatch("list")),
        }
    }

    pub fn into_map(self) -> Result<Vec<(Node, Node)>> {
        match self.kind {
            NodeKind::Map(entries) => Ok(entries),
            _ => Err(self.mismatch("map")),
        }
    }
}

/// The decoded fields of one entity, in declared order
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub path: FlatPath,
    fields: Vec<(String, Node)>,
}

impl Record {
    pub fn new(type_name: impl Into<String>, path: FlatPath) -> Self {
        Record {
            type_name: type_name.into(),
            path,
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, field_name: impl Into<String>, node: Node) {
        self.fields.push((field_name.into(), node));
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Remove a field and read it as `T`
    pub fn take<T: Field>(&mut self, field_name: &str) -> Result<T> {
        let Some(pos) = self.fields.iter().position(|(name, _)| name == field_name) else {
            return Err(FlatError::ArityMismatch {
                path: self.path.child(Segment::Field(field_name.to_string())).to_string(),
                found: 0,
            });
        };
        let (_, node) = self.fields.remove(pos);
        T::from_node(node)
    }
}
