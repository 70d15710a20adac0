//! Fixture domain models shared by unit tests.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{GraphModel, ModelSchema, PropertyDef, PropertyKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub zip: Option<String>,
}

pub const ADDRESS_PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("city", PropertyKind::String),
    PropertyDef::new("zip", PropertyKind::String).optional(),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
    pub score: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub address: Option<Address>,
}

const PERSON_PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("id", PropertyKind::Uuid).primary_key(),
    PropertyDef::new("name", PropertyKind::String),
    PropertyDef::new("age", PropertyKind::Int32),
    PropertyDef::new("email", PropertyKind::String)
        .column("email_address")
        .optional()
        .unique(),
    PropertyDef::new("score", PropertyKind::Double),
    PropertyDef::new("active", PropertyKind::Bool),
    PropertyDef::new("created_at", PropertyKind::Timestamp),
    PropertyDef::new("tags", PropertyKind::List(&PropertyKind::String)),
    PropertyDef::new("address", PropertyKind::Struct(ADDRESS_PROPERTIES)).optional(),
];

pub static PERSON_SCHEMA: ModelSchema = ModelSchema::node("Person", PERSON_PROPERTIES);

impl GraphModel for Person {
    fn schema() -> &'static ModelSchema {
        &PERSON_SCHEMA
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knows {
    pub since: i64,
    pub weight: f32,
}

const KNOWS_PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("since", PropertyKind::Int64),
    PropertyDef::new("weight", PropertyKind::Float),
];

pub static KNOWS_SCHEMA: ModelSchema =
    ModelSchema::rel("KNOWS", "Person", "Person", KNOWS_PROPERTIES);

impl GraphModel for Knows {
    fn schema() -> &'static ModelSchema {
        &KNOWS_SCHEMA
    }
}

/// Relationship with no properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follows {}

pub static FOLLOWS_SCHEMA: ModelSchema = ModelSchema::rel("FOLLOWS", "Person", "Person", &[]);

impl GraphModel for Follows {
    fn schema() -> &'static ModelSchema {
        &FOLLOWS_SCHEMA
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub embedding: Vec<f32>,
}

const DOCUMENT_PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("id", PropertyKind::String).primary_key(),
    PropertyDef::new("title", PropertyKind::String),
    PropertyDef::new("embedding", PropertyKind::Vector { dimension: 3 }),
];

pub static DOCUMENT_SCHEMA: ModelSchema = ModelSchema::node("Document", DOCUMENT_PROPERTIES);

impl GraphModel for Document {
    fn schema() -> &'static ModelSchema {
        &DOCUMENT_SCHEMA
    }
}

pub fn sample_person() -> Person {
    Person {
        id: Uuid::parse_str("6f1c1c2e-8b7a-4d4e-9f3a-2b1c0d9e8f7a").expect("valid uuid"),
        name: "Ada".to_string(),
        age: 36,
        email: Some("ada@example.com".to_string()),
        score: 0.75,
        active: true,
        created_at: Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 0)
            .single()
            .expect("valid timestamp"),
        tags: vec!["math".to_string(), "engines".to_string()],
        address: None,
    }
}
