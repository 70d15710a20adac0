//! Typed decoding of result rows.
//!
//! A record is decoded from one of three sources, in order:
//!
//! 1. the column holding a node or relationship labelled with the model's
//!    type name
//! 2. the only node or relationship column, or the only column when it is a
//!    map
//! 3. the row's own columns, looked up by column name
//!
//! Each declared property is coerced by its declared kind, then the
//! assembled JSON object is deserialized with serde.

mod coerce;
pub mod row;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value as Json};
use tracing::trace;

use crate::error::DecodeError;
use crate::schema::{GraphModel, ModelSchema};
use crate::value::Value;

pub use row::{ResultSet, Row};

/// Decode one record from a row.
pub fn decode<T: GraphModel>(row: &Row<'_>) -> Result<T, DecodeError> {
    let schema = T::schema();
    match entity_source(schema, row) {
        Some((column, properties)) => {
            trace!(model = schema.name, column, "decoding from entity column");
            decode_properties(schema, |name| properties.get(name))
        }
        None => decode_properties(schema, |name| row.get(name)),
    }
}

/// Decode a record from the node, relationship or map in `column`.
pub fn decode_column<T: GraphModel>(row: &Row<'_>, column: &str) -> Result<T, DecodeError> {
    let value = row.get(column).ok_or_else(|| DecodeError::MissingColumn {
        name: column.to_string(),
    })?;
    let properties = value
        .as_properties()
        .ok_or_else(|| DecodeError::mismatch(column, "NODE", value))?;
    decode_properties(T::schema(), |name| properties.get(name))
}

/// Decode every row.
pub fn decode_all<T: GraphModel>(result: &ResultSet) -> Result<Vec<T>, DecodeError> {
    result.rows().map(|row| decode(&row)).collect()
}

/// Decode the first row, failing with `NoResults` when there is none.
pub fn decode_one<T: GraphModel>(result: &ResultSet) -> Result<T, DecodeError> {
    decode_optional(result)?.ok_or(DecodeError::NoResults)
}

/// Decode the first row, if any.
pub fn decode_optional<T: GraphModel>(result: &ResultSet) -> Result<Option<T>, DecodeError> {
    result.row(0).map(|row| decode(&row)).transpose()
}

/// Deserialize a single value without a mapping table, e.g. an aggregate
/// or a projected scalar.
pub fn decode_value<T: DeserializeOwned>(value: &Value) -> Result<T, DecodeError> {
    let type_name = std::any::type_name::<T>();
    let json = value.to_json().ok_or_else(|| DecodeError::Deserialize {
        type_name: type_name.to_string(),
        message: format!("{} value has no JSON form", value.kind_name()),
    })?;
    serde_json::from_value(json).map_err(|e| DecodeError::Deserialize {
        type_name: type_name.to_string(),
        message: e.to_string(),
    })
}

fn entity_source<'a>(
    schema: &ModelSchema,
    row: &Row<'a>,
) -> Option<(&'a str, &'a BTreeMap<String, Value>)> {
    let entities: Vec<(&'a str, &'a Value)> = row
        .iter()
        .filter(|(_, value)| matches!(value, Value::Node(_) | Value::Rel(_)))
        .collect();

    let labelled = entities
        .iter()
        .copied()
        .find(|(_, value)| value.label() == Some(schema.name));
    if let Some((column, value)) = labelled {
        return value.as_properties().map(|properties| (column, properties));
    }
    if let [(column, value)] = entities.as_slice() {
        let (column, value) = (*column, *value);
        return value.as_properties().map(|properties| (column, properties));
    }
    let mut columns = row.iter();
    match (columns.next(), columns.next()) {
        (Some((column, Value::Map(map))), None) => Some((column, map)),
        _ => None,
    }
}

fn decode_properties<'v, T: GraphModel>(
    schema: &ModelSchema,
    lookup: impl Fn(&str) -> Option<&'v Value>,
) -> Result<T, DecodeError> {
    let mut object = Map::with_capacity(schema.field_count());
    for def in schema.properties {
        let json = coerce::coerce_field(def, lookup(def.column_name()), def.name)?;
        object.insert(def.name.to_string(), json);
    }
    serde_json::from_value(Json::Object(object)).map_err(|e| DecodeError::Deserialize {
        type_name: schema.name.to_string(),
        message: e.to_string(),
    })
}
