//! Domain record mapping tables.
//!
//! Each domain type describes itself with a `'static` [`ModelSchema`]: its
//! engine type name and an ordered list of property definitions. Column names
//! are looked up in this table rather than assumed equal to the Rust field
//! names.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Declared kind of a domain property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyKind {
    String,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Uuid,
    Timestamp,
    Date,
    /// Homogeneous list of the inner kind.
    List(&'static PropertyKind),
    /// Nested record with its own property table.
    Struct(&'static [PropertyDef]),
    /// Fixed-length float array used by vector indexes.
    Vector { dimension: usize },
}

impl PropertyKind {
    /// Engine type name, e.g. `INT32` or `STRING[]`.
    pub fn type_name(&self) -> String {
        match self {
            PropertyKind::String => "STRING".to_string(),
            PropertyKind::Bool => "BOOL".to_string(),
            PropertyKind::Int8 => "INT8".to_string(),
            PropertyKind::Int16 => "INT16".to_string(),
            PropertyKind::Int32 => "INT32".to_string(),
            PropertyKind::Int64 => "INT64".to_string(),
            PropertyKind::UInt8 => "UINT8".to_string(),
            PropertyKind::UInt16 => "UINT16".to_string(),
            PropertyKind::UInt32 => "UINT32".to_string(),
            PropertyKind::UInt64 => "UINT64".to_string(),
            PropertyKind::Float => "FLOAT".to_string(),
            PropertyKind::Double => "DOUBLE".to_string(),
            PropertyKind::Uuid => "UUID".to_string(),
            PropertyKind::Timestamp => "TIMESTAMP".to_string(),
            PropertyKind::Date => "DATE".to_string(),
            PropertyKind::List(inner) => format!("{}[]", inner.type_name()),
            PropertyKind::Struct(fields) => {
                let fields = fields
                    .iter()
                    .map(|f| format!("{} {}", f.column_name(), f.kind.type_name()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("STRUCT({})", fields)
            }
            PropertyKind::Vector { dimension } => format!("FLOAT[{}]", dimension),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PropertyKind::Int8
                | PropertyKind::Int16
                | PropertyKind::Int32
                | PropertyKind::Int64
                | PropertyKind::UInt8
                | PropertyKind::UInt16
                | PropertyKind::UInt32
                | PropertyKind::UInt64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PropertyKind::Float | PropertyKind::Double)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Inclusive value range of an integer kind.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            PropertyKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            PropertyKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            PropertyKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            PropertyKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            PropertyKind::UInt8 => (0, u8::MAX as i128),
            PropertyKind::UInt16 => (0, u16::MAX as i128),
            PropertyKind::UInt32 => (0, u32::MAX as i128),
            PropertyKind::UInt64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }
}

/// Constraint flag attached to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    PrimaryKey,
    Unique,
    /// The Rust field is an `Option` and accepts engine nulls.
    Optional,
}

/// Flag set stored inline in a `PropertyDef`.
const FLAG_PRIMARY_KEY: u8 = 1;
const FLAG_UNIQUE: u8 = 1 << 1;
const FLAG_OPTIONAL: u8 = 1 << 2;

/// A declared property of a domain type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyDef {
    /// Property name as serialized by serde (the Rust field name unless
    /// renamed).
    pub name: &'static str,

    /// Column name in the engine, when it differs from `name`.
    pub column: Option<&'static str>,

    pub kind: PropertyKind,

    flags: u8,
}

impl PropertyDef {
    pub const fn new(name: &'static str, kind: PropertyKind) -> Self {
        Self {
            name,
            column: None,
            kind,
            flags: 0,
        }
    }

    /// Map this property to a differently named column.
    pub const fn column(self, column: &'static str) -> Self {
        Self {
            column: Some(column),
            ..self
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            flags: self.flags | FLAG_OPTIONAL,
            ..self
        }
    }

    pub const fn primary_key(self) -> Self {
        Self {
            flags: self.flags | FLAG_PRIMARY_KEY,
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            flags: self.flags | FLAG_UNIQUE,
            ..self
        }
    }

    /// The engine column: the declared mapping, or the property name.
    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }

    pub fn has(&self, constraint: Constraint) -> bool {
        let flag = match constraint {
            Constraint::PrimaryKey => FLAG_PRIMARY_KEY,
            Constraint::Unique => FLAG_UNIQUE,
            Constraint::Optional => FLAG_OPTIONAL,
        };
        self.flags & flag != 0
    }

    pub fn is_optional(&self) -> bool {
        self.has(Constraint::Optional)
    }

    pub fn is_primary_key(&self) -> bool {
        self.has(Constraint::PrimaryKey)
    }

    /// All constraint flags set on this property.
    pub fn constraints(&self) -> Vec<Constraint> {
        [Constraint::PrimaryKey, Constraint::Unique, Constraint::Optional]
            .into_iter()
            .filter(|c| self.has(*c))
            .collect()
    }

    /// Declared dimension of a vector property.
    pub fn dimension(&self) -> Option<usize> {
        match self.kind {
            PropertyKind::Vector { dimension } => Some(dimension),
            _ => None,
        }
    }
}

/// Whether a domain type maps to a node table or a relationship table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Node,
    Rel {
        from: &'static str,
        to: &'static str,
    },
}

/// Complete mapping description of a domain type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSchema {
    /// Engine type (table) name, e.g. `Person` or `KNOWS`.
    pub name: &'static str,
    pub kind: ModelKind,
    pub properties: &'static [PropertyDef],
}

impl ModelSchema {
    pub const fn node(name: &'static str, properties: &'static [PropertyDef]) -> Self {
        Self {
            name,
            kind: ModelKind::Node,
            properties,
        }
    }

    pub const fn rel(
        name: &'static str,
        from: &'static str,
        to: &'static str,
        properties: &'static [PropertyDef],
    ) -> Self {
        Self {
            name,
            kind: ModelKind::Rel { from, to },
            properties,
        }
    }

    pub fn is_rel(&self) -> bool {
        matches!(self.kind, ModelKind::Rel { .. })
    }

    pub fn property(&self, name: &str) -> Option<&'static PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_by_column(&self, column: &str) -> Option<&'static PropertyDef> {
        self.properties.iter().find(|p| p.column_name() == column)
    }

    /// Column for a property name. A declared mapping always wins; an
    /// undeclared property maps to its own name.
    pub fn column_for<'a>(&self, name: &'a str) -> &'a str {
        match self.property(name) {
            Some(def) => def.column_name(),
            None => name,
        }
    }

    pub fn primary_key(&self) -> Option<&'static PropertyDef> {
        self.properties.iter().find(|p| p.is_primary_key())
    }

    pub fn field_count(&self) -> usize {
        self.properties.len()
    }
}

/// A domain record with a static mapping table.
///
/// Encoding and decoding go through serde, so the property names in the
/// table are the serialized field names.
pub trait GraphModel: Serialize + DeserializeOwned {
    fn schema() -> &'static ModelSchema;
}
