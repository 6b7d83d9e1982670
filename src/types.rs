use crate::error::{FlatError, Result};
use crate::flat::path::FlatPath;
use std::fmt;

/// The primitive kinds a scalar field can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Str,
    Int,
    UInt,
    Float,
    Bool,
}

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::Str => "string",
            ScalarKind::Int => "int",
            ScalarKind::UInt => "uint",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Str(_) => ScalarKind::Str,
            ScalarValue::Int(_) => ScalarKind::Int,
            ScalarValue::UInt(_) => ScalarKind::UInt,
            ScalarValue::Float(_) => ScalarKind::Float,
            ScalarValue::Bool(_) => ScalarKind::Bool,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Str(s) => f.write_str(s),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::UInt(u) => write!(f, "{}", u),
            ScalarValue::Float(x) => write!(f, "{}", x),
            ScalarValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

const NULL_CELL: &str = "\\N";
const EMPTY_LIST_CELL: &str = "\\L";
const EMPTY_MAP_CELL: &str = "\\M";
const EMPTY_STR_CELL: &str = "\\E";
const EMPTY_RECORD_CELL: &str = "\\R";

/// What sits at the end of a flat path: a scalar, or one of the sentinels
/// that keep "absent", "empty list" and "empty map" distinguishable.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Value(ScalarValue),
    Null,
    EmptyList,
    EmptyMap,
    /// An entity whose type declares no fields
    EmptyEntity,
}

impl FlatValue {
    pub fn str(s: impl Into<String>) -> Self {
        FlatValue::Value(ScalarValue::Str(s.into()))
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, FlatValue::Value(_))
    }

    /// Render as the text of one table cell.
    ///
    /// Sentinels are backslash tokens; real text that starts with a backslash
    /// gets it doubled, and the empty string has its own token so that an
    /// empty cell can mean "no value for this column".
    pub fn to_cell_text(&self) -> String {
        match self {
            FlatValue::Null => NULL_CELL.to_string(),
            FlatValue::EmptyList => EMPTY_LIST_CELL.to_string(),
            FlatValue::EmptyMap => EMPTY_MAP_CELL.to_string(),
            FlatValue::EmptyEntity => EMPTY_RECORD_CELL.to_string(),
            FlatValue::Value(ScalarValue::Str(s)) if s.is_empty() => EMPTY_STR_CELL.to_string(),
            FlatValue::Value(ScalarValue::Str(s)) if s.starts_with('\\') => format!("\\{}", s),
            FlatValue::Value(v) => v.to_string(),
        }
    }

    /// Inverse of [`FlatValue::to_cell_text`]. Scalars come back as
    /// `ScalarValue::Str`; typed fields parse them on decode.
    pub fn from_cell_text(text: &str, path: &FlatPath) -> Result<Self> {
        match text {
            NULL_CELL => return Ok(FlatValue::Null),
            EMPTY_LIST_CELL => return Ok(FlatValue::EmptyList),
            EMPTY_MAP_CELL => return Ok(FlatValue::EmptyMap),
            EMPTY_RECORD_CELL => return Ok(FlatValue::EmptyEntity),
            EMPTY_STR_CELL => return Ok(FlatValue::str("")),
            _ => {}
        }

        if let Some(rest) = text.strip_prefix('\\') {
            if rest.starts_with('\\') {
                return Ok(FlatValue::str(rest));
            }
            return Err(FlatError::InvalidScalar {
                path: path.to_string(),
                expected: "cell text".to_string(),
                text: text.to_string(),
            });
        }

        Ok(FlatValue::str(text))
    }
}

/// One leaf of a flattened entity
#[derive(Debug, Clone, PartialEq)]
pub struct FlatPair {
    pub path: FlatPath,
    pub value: FlatValue,
}

impl FlatPair {
    pub fn new(path: FlatPath, value: FlatValue) -> Self {
        FlatPair { path, value }
    }
}

/// Which name a field contributes to flat paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Naming {
    /// The Rust field name, e.g. `zipcode`
    #[default]
    FieldName,
    /// The declared wire (column) name, e.g. `zipCode`
    WireName,
}

/// Configuration for encoding and decoding
#[derive(Debug, Clone, Default)]
pub struct CodecConfig {
    /// Names used for field segments in flat paths
    pub naming: Naming,
}

impl CodecConfig {
    pub fn with_naming(naming: Naming) -> Self {
        CodecConfig { naming }
    }
}
