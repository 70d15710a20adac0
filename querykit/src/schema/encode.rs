//! Encoding domain records into engine property values.
//!
//! A record is serialized with serde, then every declared property is
//! converted according to its declared kind. Integer properties are range
//! checked against their declared width, identifiers and temporals are parsed
//! from their serde text form, and vectors are checked against their declared
//! dimension.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as Json;
use uuid::Uuid;

use super::definition::{GraphModel, ModelSchema, PropertyDef, PropertyKind};
use crate::error::QueryError;
use crate::value::Value;

/// Encoded properties of one record, keyed by column name in declaration
/// order.
pub type EncodedProperties = Vec<(String, Value)>;

/// Encode a record into `(column, value)` pairs.
///
/// `None` optional properties are omitted, as are undeclared fields that
/// serialize to null. Undeclared fields keep their serde name and an inferred
/// kind.
pub fn encode_record<M: GraphModel>(record: &M) -> Result<EncodedProperties, QueryError> {
    let schema = M::schema();
    let json = serde_json::to_value(record).map_err(|e| {
        QueryError::failure("record", format!("cannot serialize {}: {}", schema.name, e))
    })?;
    let Json::Object(mut fields) = json else {
        return Err(QueryError::failure(
            "record",
            format!("{} does not serialize to a map of properties", schema.name),
        ));
    };

    let mut encoded = Vec::with_capacity(fields.len());
    for def in schema.properties {
        let Some(json) = fields.remove(def.name) else {
            continue;
        };
        if json.is_null() {
            if def.is_optional() {
                continue;
            }
            return Err(QueryError::failure(
                "record",
                format!("{}.{} is not optional but serialized to null", schema.name, def.name),
            ));
        }
        let value = encode_property(schema, def, &json)?;
        encoded.push((def.column_name().to_string(), value));
    }

    for (name, json) in fields {
        if !json.is_null() {
            encoded.push((name, Value::from_json(&json)));
        }
    }

    Ok(encoded)
}

fn encode_property(
    schema: &ModelSchema,
    def: &PropertyDef,
    json: &Json,
) -> Result<Value, QueryError> {
    let path = format!("{}.{}", schema.name, def.name);
    if let PropertyKind::Vector { dimension } = def.kind {
        if let Json::Array(items) = json {
            if items.len() != dimension {
                return Err(QueryError::DimensionMismatch {
                    type_name: schema.name.to_string(),
                    column: def.column_name().to_string(),
                    expected: dimension,
                    actual: items.len(),
                });
            }
        }
    }
    json_to_kind(json, &def.kind, &path)
}

/// Convert a JSON value into an engine value of the declared kind.
pub(crate) fn json_to_kind(
    json: &Json,
    kind: &PropertyKind,
    path: &str,
) -> Result<Value, QueryError> {
    let fail = |message: String| QueryError::failure("record", format!("{}: {}", path, message));
    let expected = |found: &Json| {
        fail(format!(
            "expected {}, found {}",
            kind.type_name(),
            json_kind(found)
        ))
    };

    if json.is_null() {
        return Ok(Value::Null);
    }

    match kind {
        PropertyKind::String => json
            .as_str()
            .map(Value::from)
            .ok_or_else(|| expected(json)),
        PropertyKind::Bool => json.as_bool().map(Value::Bool).ok_or_else(|| expected(json)),
        PropertyKind::Int8
        | PropertyKind::Int16
        | PropertyKind::Int32
        | PropertyKind::Int64
        | PropertyKind::UInt8
        | PropertyKind::UInt16
        | PropertyKind::UInt32
        | PropertyKind::UInt64 => {
            let n = json
                .as_i64()
                .map(i128::from)
                .or_else(|| json.as_u64().map(i128::from))
                .ok_or_else(|| expected(json))?;
            integer_value(n, kind).ok_or_else(|| {
                fail(format!("{} does not fit in {}", n, kind.type_name()))
            })
        }
        PropertyKind::Float => {
            let f = json.as_f64().ok_or_else(|| expected(json))?;
            if f.is_finite() && f.abs() > f32::MAX as f64 {
                return Err(fail(format!("{} does not fit in FLOAT", f)));
            }
            Ok(Value::Float(f as f32))
        }
        PropertyKind::Double => json.as_f64().map(Value::Double).ok_or_else(|| expected(json)),
        PropertyKind::Uuid => {
            let s = json.as_str().ok_or_else(|| expected(json))?;
            Uuid::parse_str(s)
                .map(Value::Uuid)
                .map_err(|e| fail(format!("invalid UUID '{}': {}", s, e)))
        }
        PropertyKind::Timestamp => {
            let s = json.as_str().ok_or_else(|| expected(json))?;
            DateTime::parse_from_rfc3339(s)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| fail(format!("invalid timestamp '{}': {}", s, e)))
        }
        PropertyKind::Date => {
            let s = json.as_str().ok_or_else(|| expected(json))?;
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| fail(format!("invalid date '{}': {}", s, e)))
        }
        PropertyKind::List(inner) => {
            let items = json.as_array().ok_or_else(|| expected(json))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| json_to_kind(item, inner, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        PropertyKind::Vector { .. } => {
            let items = json.as_array().ok_or_else(|| expected(json))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    json_to_kind(item, &PropertyKind::Float, &format!("{}[{}]", path, i))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        PropertyKind::Struct(fields) => {
            let object = json.as_object().ok_or_else(|| expected(json))?;
            let mut map = std::collections::BTreeMap::new();
            for def in fields.iter() {
                let Some(field) = object.get(def.name) else {
                    continue;
                };
                if field.is_null() && def.is_optional() {
                    continue;
                }
                let value = json_to_kind(field, &def.kind, &format!("{}.{}", path, def.name))?;
                map.insert(def.column_name().to_string(), value);
            }
            Ok(Value::Map(map))
        }
    }
}

fn integer_value(n: i128, kind: &PropertyKind) -> Option<Value> {
    let value = match kind {
        PropertyKind::Int8 => Value::Int8(i8::try_from(n).ok()?),
        PropertyKind::Int16 => Value::Int16(i16::try_from(n).ok()?),
        PropertyKind::Int32 => Value::Int32(i32::try_from(n).ok()?),
        PropertyKind::Int64 => Value::Int64(i64::try_from(n).ok()?),
        PropertyKind::UInt8 => Value::UInt8(u8::try_from(n).ok()?),
        PropertyKind::UInt16 => Value::UInt16(u16::try_from(n).ok()?),
        PropertyKind::UInt32 => Value::UInt32(u32::try_from(n).ok()?),
        PropertyKind::UInt64 => Value::UInt64(u64::try_from(n).ok()?),
        _ => return None,
    };
    Some(value)
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Document, Person, sample_person};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn test_encode_uses_column_names_in_declaration_order() {
        let person = sample_person();
        let encoded = encode_record(&person).unwrap();
        let columns: Vec<&str> = encoded.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(
            columns,
            vec!["id", "name", "age", "email_address", "score", "active", "created_at", "tags"]
        );
    }

    #[rstest]
    fn test_encode_converts_declared_kinds() {
        let person = sample_person();
        let encoded = encode_record(&person).unwrap();
        assert_eq!(encoded[0].1, Value::Uuid(person.id));
        assert_eq!(encoded[2].1, Value::Int32(36));
        assert_eq!(encoded[6].1, Value::Timestamp(person.created_at));
    }

    #[rstest]
    fn test_encode_omits_none_optional() {
        let person = Person {
            email: None,
            ..sample_person()
        };
        let encoded = encode_record(&person).unwrap();
        assert!(encoded.iter().all(|(c, _)| c != "email_address"));
    }

    #[rstest]
    fn test_encode_vector_dimension_mismatch() {
        let doc = Document {
            id: "d1".to_string(),
            title: "t".to_string(),
            embedding: vec![0.1, 0.2],
        };
        let err = encode_record(&doc).unwrap_err();
        assert!(matches!(
            err,
            QueryError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[rstest]
    #[case(json!(300), PropertyKind::Int8)]
    #[case(json!(-1), PropertyKind::UInt32)]
    #[case(json!("x"), PropertyKind::Int64)]
    #[case(json!(1e300), PropertyKind::Float)]
    #[case(json!("not-a-uuid"), PropertyKind::Uuid)]
    fn test_json_to_kind_rejects(#[case] json: Json, #[case] kind: PropertyKind) {
        assert!(json_to_kind(&json, &kind, "T.f").is_err());
    }

    #[rstest]
    fn test_json_to_kind_list() {
        let value =
            json_to_kind(&json!([1, 2]), &PropertyKind::List(&PropertyKind::Int16), "T.f").unwrap();
        assert_eq!(value, Value::List(vec![Value::Int16(1), Value::Int16(2)]));
    }
}
