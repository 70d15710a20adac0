//! Conversion of engine values into the JSON form of a declared kind.
//!
//! The result is fed to `serde_json::from_value`, so every target is
//! expressed the way serde expects it: integers as JSON integers,
//! identifiers and temporals as their canonical strings, structs as objects
//! keyed by property name.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Number, Value as Json};
use uuid::Uuid;

use crate::error::DecodeError;
use crate::schema::{PropertyDef, PropertyKind};
use crate::value::Value;

/// Coerce a non-null engine value into the JSON form of `kind`.
///
/// `field` names the property in errors; nested elements extend it as
/// `field[i]` or `field.sub`.
pub(crate) fn coerce(value: &Value, kind: &PropertyKind, field: &str) -> Result<Json, DecodeError> {
    let mismatch = || DecodeError::mismatch(field, kind.type_name(), value);

    match kind {
        PropertyKind::String => value
            .as_str()
            .map(|s| Json::String(s.to_string()))
            .ok_or_else(mismatch),
        PropertyKind::Bool => value.as_bool().map(Json::Bool).ok_or_else(mismatch),
        PropertyKind::Int8
        | PropertyKind::Int16
        | PropertyKind::Int32
        | PropertyKind::Int64
        | PropertyKind::UInt8
        | PropertyKind::UInt16
        | PropertyKind::UInt32
        | PropertyKind::UInt64 => {
            let n = integral(value).ok_or_else(mismatch)?;
            let (min, max) = kind.integer_range().ok_or_else(mismatch)?;
            if n < min || n > max {
                return Err(mismatch());
            }
            if n < 0 {
                i64::try_from(n).map(Json::from).map_err(|_| mismatch())
            } else {
                u64::try_from(n).map(Json::from).map_err(|_| mismatch())
            }
        }
        PropertyKind::Float => {
            let f = value.as_f64().ok_or_else(mismatch)?;
            if !f.is_finite() || f.abs() > f32::MAX as f64 {
                return Err(mismatch());
            }
            Number::from_f64(f as f32 as f64)
                .map(Json::Number)
                .ok_or_else(mismatch)
        }
        PropertyKind::Double => {
            let f = value.as_f64().ok_or_else(mismatch)?;
            Number::from_f64(f).map(Json::Number).ok_or_else(mismatch)
        }
        PropertyKind::Uuid => match value {
            Value::Uuid(id) => Ok(Json::String(id.hyphenated().to_string())),
            Value::String(s) => Uuid::parse_str(s)
                .map(|id| Json::String(id.hyphenated().to_string()))
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        PropertyKind::Timestamp => {
            let ts = match value {
                Value::Timestamp(ts) => *ts,
                Value::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(|_| mismatch())?,
                _ => return Err(mismatch()),
            };
            Ok(Json::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
        }
        PropertyKind::Date => {
            let date = match value {
                Value::Date(date) => *date,
                Value::String(s) => {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| mismatch())?
                }
                _ => return Err(mismatch()),
            };
            Ok(Json::String(date.format("%Y-%m-%d").to_string()))
        }
        PropertyKind::List(inner) => {
            let items = value.as_list().ok_or_else(mismatch)?;
            coerce_items(items, inner, field).map(Json::Array)
        }
        PropertyKind::Vector { dimension } => {
            let items = value.as_list().ok_or_else(mismatch)?;
            if items.len() != *dimension {
                return Err(DecodeError::TypeMismatch {
                    field: field.to_string(),
                    expected: kind.type_name(),
                    found: format!("LIST of {} elements", items.len()),
                });
            }
            coerce_items(items, &PropertyKind::Float, field).map(Json::Array)
        }
        PropertyKind::Struct(fields) => {
            let properties = value.as_properties().ok_or_else(mismatch)?;
            let mut object = Map::new();
            for def in fields.iter() {
                let path = format!("{}.{}", field, def.name);
                let json = coerce_field(def, properties.get(def.column_name()), &path)?;
                object.insert(def.name.to_string(), json);
            }
            Ok(Json::Object(object))
        }
    }
}

/// Coerce one declared property, applying its optional flag to absent and
/// null values.
pub(crate) fn coerce_field(
    def: &PropertyDef,
    value: Option<&Value>,
    field: &str,
) -> Result<Json, DecodeError> {
    match value {
        None if def.is_optional() => Ok(Json::Null),
        None => Err(DecodeError::MissingColumn {
            name: def.column_name().to_string(),
        }),
        Some(Value::Null) if def.is_optional() => Ok(Json::Null),
        Some(Value::Null) => Err(DecodeError::NullViolation {
            field: field.to_string(),
        }),
        Some(value) => coerce(value, &def.kind, field),
    }
}

fn coerce_items(items: &[Value], kind: &PropertyKind, field: &str) -> Result<Vec<Json>, DecodeError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = format!("{}[{}]", field, i);
            if item.is_null() {
                return Err(DecodeError::NullViolation { field: path });
            }
            coerce(item, kind, &path)
        })
        .collect()
}

/// Integer payload of an integer value, or of a float holding an exact
/// integer.
fn integral(value: &Value) -> Option<i128> {
    if let Some(n) = value.as_i128() {
        return Some(n);
    }
    let f = match value {
        Value::Float(f) => *f as f64,
        Value::Double(f) => *f,
        _ => return None,
    };
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 2f64.powi(64) {
        Some(f as i128)
    } else {
        None
    }
}
