//! Composable Cypher query construction for embedded graph databases.
//!
//! Queries are built from immutable components (patterns, predicates and
//! clauses), compiled into one statement with `$name` placeholders plus its
//! binding map, handed to an [`Executor`], and the returned rows are decoded
//! into typed domain records.
//!
//! ```ignore
//! let query = Query::new()
//!     .matching(NodePattern::of::<Person>("p"))
//!     .filter(PropertyRef::of::<Person>("p", "age").gte(18))
//!     .returning(Return::new(["p"]));
//!
//! let session = Session::new(executor);
//! let adults: Vec<Person> = session.fetch_all(&query)?;
//! ```

pub mod backend;
pub mod builder;
pub mod config;
pub mod db;
pub mod decode;
pub mod error;
pub mod schema;
pub mod value;

#[cfg(test)]
mod test_utils;

// Re-export commonly used items
pub use backend::{ExecutionError, Executor, MemoryExecutor};
pub use builder::clauses::{
    Call, Clause, Create, Delete, Match, Merge, Return, Set, Subquery, SubqueryKind, Unwind,
    VectorSearch, Where, With,
};
pub use builder::{
    Bindings, CompileContext, CompiledQuery, EdgeDirection, EdgePattern, Expr, NodePattern,
    OrderBy, Params, PathPattern, Pattern, Predicate, Property, PropertyRef, Query,
    QueryCompiler, Render, ReturnItem, compile,
};
pub use config::{CompilerConfig, ConfigFile};
pub use db::Session;
pub use decode::{
    ResultSet, Row, decode, decode_all, decode_column, decode_one, decode_optional, decode_value,
};
pub use error::{ConfigError, DecodeError, Error, QueryError};
pub use schema::{
    Constraint, GraphModel, ModelKind, ModelSchema, PropertyDef, PropertyKind, encode_record,
};
pub use value::{InternalId, NodeValue, RelValue, Value};
