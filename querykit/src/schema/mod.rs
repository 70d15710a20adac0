//! Domain record mapping contract.
//!
//! Domain types describe their engine type name and property-to-column
//! mapping through [`GraphModel::schema`]. The reference model, the pattern
//! renderer, vector search and the result decoder all read these tables; none
//! of them reflect over Rust types at runtime.

pub mod definition;
pub mod encode;

pub use definition::{
    Constraint, GraphModel, ModelKind, ModelSchema, PropertyDef, PropertyKind,
};
pub use encode::{EncodedProperties, encode_record};
