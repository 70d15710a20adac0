//! Domain models shared by the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use querykit::{GraphModel, ModelSchema, NodeValue, PropertyDef, PropertyKind, encode_record};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub handle: String,
    pub age: i32,
    pub email: String,
    pub status: Option<String>,
    pub joined: NaiveDate,
}

const ACCOUNT_PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("id", PropertyKind::Uuid).primary_key(),
    PropertyDef::new("handle", PropertyKind::String).column("user_handle"),
    PropertyDef::new("age", PropertyKind::Int32),
    PropertyDef::new("email", PropertyKind::String).unique(),
    PropertyDef::new("status", PropertyKind::String).optional(),
    PropertyDef::new("joined", PropertyKind::Date),
];

pub static ACCOUNT_SCHEMA: ModelSchema = ModelSchema::node("Account", ACCOUNT_PROPERTIES);

impl GraphModel for Account {
    fn schema() -> &'static ModelSchema {
        &ACCOUNT_SCHEMA
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub slug: String,
    pub embedding: Vec<f32>,
}

const ARTICLE_PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("slug", PropertyKind::String).primary_key(),
    PropertyDef::new("embedding", PropertyKind::Vector { dimension: 4 }),
];

pub static ARTICLE_SCHEMA: ModelSchema = ModelSchema::node("Article", ARTICLE_PROPERTIES);

impl GraphModel for Article {
    fn schema() -> &'static ModelSchema {
        &ARTICLE_SCHEMA
    }
}

pub fn account() -> Account {
    Account {
        id: Uuid::parse_str("0b6f3a1e-4c3d-4f8e-a1b2-7c9d0e1f2a3b").unwrap(),
        handle: "grace".to_string(),
        age: 41,
        email: "grace@example.com".to_string(),
        status: Some("active".to_string()),
        joined: NaiveDate::from_ymd_opt(2021, 6, 15).unwrap(),
    }
}

/// The node an engine would return for a stored record.
pub fn node_for<M: GraphModel>(record: &M) -> NodeValue {
    encode_record(record)
        .unwrap()
        .into_iter()
        .fold(NodeValue::new(M::schema().name), |node, (column, value)| {
            node.with_property(column, value)
        })
}
