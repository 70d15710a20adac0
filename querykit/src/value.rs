//! Engine value model.
//!
//! `Value` is the dynamically typed representation shared by both directions
//! of the round trip: bound parameters handed to the execution service, and
//! the raw cells it returns. The variants follow the engine's native kinds
//! (sized integers, single/double floats, identifiers, temporals, nested
//! collections, graph entities).
//!
//! Equality is structural. Two values are equal only when they have the same
//! variant and equal payloads, so `Int32(1)` and `Int64(1)` are different
//! bindings.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

/// Engine-internal identifier of a node or relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternalId {
    pub table: u64,
    pub offset: u64,
}

impl InternalId {
    pub fn new(table: u64, offset: u64) -> Self {
        Self { table, offset }
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.offset)
    }
}

/// A node returned by the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeValue {
    pub id: Option<InternalId>,
    pub label: String,
    pub properties: BTreeMap<String, Value>,
}

impl NodeValue {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: InternalId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// A relationship returned by the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelValue {
    pub id: Option<InternalId>,
    pub label: String,
    pub src: Option<InternalId>,
    pub dst: Option<InternalId>,
    pub properties: BTreeMap<String, Value>,
}

impl RelValue {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn between(mut self, src: InternalId, dst: InternalId) -> Self {
        self.src = Some(src);
        self.dst = Some(dst);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// A dynamically typed engine value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    InternalId(InternalId),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Node(NodeValue),
    Rel(RelValue),
}

impl Value {
    /// Engine type name of this value, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOL",
            Value::Int8(_) => "INT8",
            Value::Int16(_) => "INT16",
            Value::Int32(_) => "INT32",
            Value::Int64(_) => "INT64",
            Value::UInt8(_) => "UINT8",
            Value::UInt16(_) => "UINT16",
            Value::UInt32(_) => "UINT32",
            Value::UInt64(_) => "UINT64",
            Value::Float(_) => "FLOAT",
            Value::Double(_) => "DOUBLE",
            Value::String(_) => "STRING",
            Value::Uuid(_) => "UUID",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Date(_) => "DATE",
            Value::InternalId(_) => "INTERNAL_ID",
            Value::List(_) => "LIST",
            Value::Map(_) => "MAP",
            Value::Node(_) => "NODE",
            Value::Rel(_) => "REL",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for every integer and floating kind.
    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(self, Value::Float(_) | Value::Double(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::Int8(_)
                | Value::Int16(_)
                | Value::Int32(_)
                | Value::Int64(_)
                | Value::UInt8(_)
                | Value::UInt16(_)
                | Value::UInt32(_)
                | Value::UInt64(_)
        )
    }

    /// Integer payload widened to `i128`, so every engine integer fits.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int8(v) => Some(*v as i128),
            Value::Int16(v) => Some(*v as i128),
            Value::Int32(v) => Some(*v as i128),
            Value::Int64(v) => Some(*v as i128),
            Value::UInt8(v) => Some(*v as i128),
            Value::UInt16(v) => Some(*v as i128),
            Value::UInt32(v) => Some(*v as i128),
            Value::UInt64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Integer payload as `i64`; `None` for non-integers or out-of-range
    /// unsigned values.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// Numeric payload as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Property map of a node, relationship or map value.
    pub fn as_properties(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            Value::Node(node) => Some(&node.properties),
            Value::Rel(rel) => Some(&rel.properties),
            _ => None,
        }
    }

    /// Label of a node or relationship value.
    pub fn label(&self) -> Option<&str> {
        match self {
            Value::Node(node) => Some(&node.label),
            Value::Rel(rel) => Some(&rel.label),
            _ => None,
        }
    }

    /// Build a value from JSON, inferring the engine kind.
    ///
    /// Integers become `Int64` (or `UInt64` when above `i64::MAX`), other
    /// numbers `Double`, arrays `List` and objects `Map`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON. Identifiers and temporals become strings in their
    /// canonical text form; non-finite floats have no JSON form and yield
    /// `None`.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;
        let json = match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int8(v) => Json::from(*v),
            Value::Int16(v) => Json::from(*v),
            Value::Int32(v) => Json::from(*v),
            Value::Int64(v) => Json::from(*v),
            Value::UInt8(v) => Json::from(*v),
            Value::UInt16(v) => Json::from(*v),
            Value::UInt32(v) => Json::from(*v),
            Value::UInt64(v) => Json::from(*v),
            Value::Float(v) => Json::Number(serde_json::Number::from_f64(*v as f64)?),
            Value::Double(v) => Json::Number(serde_json::Number::from_f64(*v)?),
            Value::String(s) => Json::String(s.clone()),
            Value::Uuid(u) => Json::String(u.hyphenated().to_string()),
            Value::Timestamp(ts) => Json::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Value::InternalId(id) => Json::String(id.to_string()),
            Value::List(items) => Json::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Value::Map(map) => Json::Object(properties_to_json(map)?),
            Value::Node(node) => Json::Object(properties_to_json(&node.properties)?),
            Value::Rel(rel) => Json::Object(properties_to_json(&rel.properties)?),
        };
        Some(json)
    }
}

fn properties_to_json(
    map: &BTreeMap<String, Value>,
) -> Option<serde_json::Map<String, serde_json::Value>> {
    map.iter()
        .map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
        .collect()
}

/// Quote a string as a single-quoted literal, escaping backslashes, quotes
/// and control characters.
pub(crate) fn quote_literal(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('\'');
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result.push('\'');
    result
}

fn write_properties(f: &mut fmt::Formatter<'_>, map: &BTreeMap<String, Value>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", key, value)?;
    }
    write!(f, "}}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Double(v) => write!(f, "{:?}", v),
            Value::String(s) => write!(f, "{}", quote_literal(s)),
            Value::Uuid(u) => write!(f, "'{}'", u.hyphenated()),
            Value::Timestamp(ts) => {
                write!(f, "'{}'", ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Date(d) => write!(f, "'{}'", d.format("%Y-%m-%d")),
            Value::InternalId(id) => write!(f, "{}", id),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => write_properties(f, map),
            Value::Node(node) => {
                write!(f, "(:{} ", node.label)?;
                write_properties(f, &node.properties)?;
                write!(f, ")")
            }
            Value::Rel(rel) => {
                write!(f, "[:{} ", rel.label)?;
                write_properties(f, &rel.properties)?;
                write!(f, "]")
            }
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    Uuid => Uuid,
    DateTime<Utc> => Timestamp,
    NaiveDate => Date,
    InternalId => InternalId,
    NodeValue => Node,
    RelValue => Rel,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Value::Int8(1), "INT8")]
    #[case(Value::UInt64(1), "UINT64")]
    #[case(Value::Double(1.0), "DOUBLE")]
    #[case(Value::from("x"), "STRING")]
    #[case(Value::Null, "NULL")]
    fn test_kind_name(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.kind_name(), expected);
    }

    #[rstest]
    fn test_structural_equality_distinguishes_kinds() {
        assert_ne!(Value::Int32(1), Value::Int64(1));
        assert_eq!(Value::from(vec![1i64, 2]), Value::from(vec![1i64, 2]));
    }

    #[rstest]
    fn test_as_i64_widens_and_rejects_overflow() {
        assert_eq!(Value::Int8(-3).as_i64(), Some(-3));
        assert_eq!(Value::UInt64(u64::MAX).as_i64(), None);
        assert_eq!(Value::from("3").as_i64(), None);
    }

    #[rstest]
    fn test_as_f64_accepts_integers() {
        assert_eq!(Value::Int32(4).as_f64(), Some(4.0));
        assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
    }

    #[rstest]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::from("a"));
    }

    #[rstest]
    fn test_display_quotes_strings() {
        assert_eq!(Value::from("it's").to_string(), "'it\\'s'");
        assert_eq!(Value::from(vec![1i64, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::Double(1.0).to_string(), "1.0");
    }

    #[rstest]
    fn test_from_json_infers_kinds() {
        let value = Value::from_json(&json!({"a": 1, "b": [true, 2.5], "c": null}));
        let map = value.as_properties().unwrap();
        assert_eq!(map["a"], Value::Int64(1));
        assert_eq!(
            map["b"],
            Value::List(vec![Value::Bool(true), Value::Double(2.5)])
        );
        assert_eq!(map["c"], Value::Null);
    }

    #[rstest]
    fn test_from_json_large_unsigned() {
        assert_eq!(Value::from_json(&json!(u64::MAX)), Value::UInt64(u64::MAX));
    }

    #[rstest]
    fn test_to_json_temporal_and_identifier() {
        let id = Uuid::nil();
        assert_eq!(
            Value::Uuid(id).to_json(),
            Some(json!("00000000-0000-0000-0000-000000000000"))
        );
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_json(), Some(json!("2024-02-29")));
    }

    #[rstest]
    fn test_to_json_rejects_nan() {
        assert_eq!(Value::Double(f64::NAN).to_json(), None);
    }

    #[rstest]
    fn test_node_properties_visible() {
        let node = Value::from(NodeValue::new("Person").with_property("name", "Ada"));
        assert_eq!(node.label(), Some("Person"));
        assert_eq!(node.as_properties().unwrap()["name"], Value::from("Ada"));
    }
}
