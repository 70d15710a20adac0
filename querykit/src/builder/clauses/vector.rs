//! Vector similarity search over a vector index.
//!
//! The query vector is emitted inline because the engine's index procedure
//! does not accept array-typed parameters. Only the result count is bound.
//! The clause yields two columns, the matched record under the caller's
//! alias and `distance`, ordered by ascending distance unless an explicit
//! ordering is given.

use crate::builder::expr::{OrderBy, render_order_by};
use crate::builder::helpers::{format_vector, validate_alias, validate_procedure};
use crate::builder::params::Bindings;
use crate::builder::predicate::Predicate;
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;
use crate::schema::{GraphModel, ModelSchema};
use crate::value::{Value, quote_literal};

/// Result column holding the distance to the query vector.
pub const DISTANCE_COLUMN: &str = "distance";

#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearch {
    schema: &'static ModelSchema,
    alias: String,
    property: String,
    vector: Vec<f32>,
    k: u64,
    index: Option<String>,
    filter: Option<Predicate>,
    order_by: Vec<OrderBy>,
    pipelined: bool,
}

impl VectorSearch {
    /// Search the `property` vector column of `M` for the `k` nearest
    /// records.
    pub fn new<M: GraphModel>(
        alias: impl Into<String>,
        property: impl Into<String>,
        vector: Vec<f32>,
        k: u64,
    ) -> Self {
        Self::for_schema(M::schema(), alias, property, vector, k)
    }

    pub fn for_schema(
        schema: &'static ModelSchema,
        alias: impl Into<String>,
        property: impl Into<String>,
        vector: Vec<f32>,
        k: u64,
    ) -> Self {
        Self {
            schema,
            alias: alias.into(),
            property: property.into(),
            vector,
            k,
            index: None,
            filter: None,
            order_by: Vec::new(),
            pipelined: false,
        }
    }

    /// Use a named index instead of the configured default.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    pub fn filter(self, predicate: Predicate) -> Self {
        let filter = match self.filter {
            Some(existing) => existing.and(&predicate),
            None => predicate,
        };
        Self {
            filter: Some(filter),
            ..self
        }
    }

    /// Replace the default ascending-distance ordering.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Project with `WITH` so further clauses can follow.
    pub fn pipelined(mut self) -> Self {
        self.pipelined = true;
        self
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Engine column searched, after the schema's column mapping.
    pub fn column(&self) -> &str {
        self.schema.column_for(&self.property)
    }
}

impl Render for VectorSearch {
    fn keyword(&self) -> &'static str {
        "CALL"
    }

    fn validate(&self) -> Result<(), QueryError> {
        let def = self
            .schema
            .property(&self.property)
            .ok_or_else(|| QueryError::MissingColumnMapping {
                type_name: self.schema.name.to_string(),
                property: self.property.clone(),
            })?;
        let expected = def.dimension().ok_or_else(|| {
            QueryError::failure(
                "vector search",
                format!(
                    "{}.{} is {}, not a vector",
                    self.schema.name,
                    self.property,
                    def.kind.type_name()
                ),
            )
        })?;
        if self.vector.len() != expected {
            return Err(QueryError::DimensionMismatch {
                type_name: self.schema.name.to_string(),
                column: def.column_name().to_string(),
                expected,
                actual: self.vector.len(),
            });
        }
        if self.k == 0 {
            return Err(QueryError::failure(
                "vector search",
                "result count must be at least 1",
            ));
        }
        Ok(())
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        self.validate()?;
        validate_alias("vector search", &self.alias)?;
        let procedure = ctx.config().vector_procedure.clone();
        validate_procedure("vector search", &procedure)?;

        let column = self.column();
        let index = match &self.index {
            Some(name) => name.clone(),
            None => ctx.config().vector_index_for(self.schema.name, column),
        };
        let vector = format_vector("vector search", &self.vector)?;
        let k = i64::try_from(self.k).map_err(|_| {
            QueryError::failure("vector search", format!("result count {} is too large", self.k))
        })?;

        let mut bindings = Bindings::new();
        let k = ctx.bind_anonymous(&mut bindings, Value::Int64(k))?;
        let mut parts = vec![
            format!(
                "CALL {}({}, {}, {}, {})",
                procedure,
                quote_literal(self.schema.name),
                quote_literal(&index),
                vector,
                k
            ),
            format!("WITH node AS {}, {}", self.alias, DISTANCE_COLUMN),
        ];
        if let Some(filter) = &self.filter {
            parts.push(format!("WHERE {}", filter.render_into(ctx, &mut bindings)?));
        }
        let keyword = if self.pipelined { "WITH" } else { "RETURN" };
        parts.push(format!("{} {}, {}", keyword, self.alias, DISTANCE_COLUMN));
        if self.order_by.is_empty() {
            parts.push(format!("ORDER BY {} ASC", DISTANCE_COLUMN));
        } else {
            parts.push(render_order_by(&self.order_by, ctx, &mut bindings)?);
        }
        Ok(Fragment::new(parts.join(" "), bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::expr::Expr;
    use crate::builder::reference::PropertyRef;
    use crate::config::CompilerConfig;
    use crate::test_utils::{Document, Person};
    use rstest::rstest;

    fn render(clause: &VectorSearch) -> Result<Fragment, QueryError> {
        clause.render(&mut CompileContext::default())
    }

    #[rstest]
    fn test_default_rendering() {
        let clause = VectorSearch::new::<Document>("d", "embedding", vec![0.1, 0.2, 0.3], 5);
        let fragment = render(&clause).unwrap();
        assert_eq!(
            fragment.text,
            "CALL QUERY_VECTOR_INDEX('Document', 'Document_embedding_idx', [0.1, 0.2, 0.3], $param1) \
             WITH node AS d, distance RETURN d, distance ORDER BY distance ASC"
        );
        assert_eq!(fragment.bindings.len(), 1);
        assert_eq!(fragment.bindings.get("param1"), Some(&Value::Int64(5)));
    }

    #[rstest]
    fn test_dimension_mismatch() {
        let clause = VectorSearch::new::<Document>("d", "embedding", vec![0.1, 0.2], 5);
        let err = clause.validate().unwrap_err();
        assert_eq!(
            err,
            QueryError::DimensionMismatch {
                type_name: "Document".to_string(),
                column: "embedding".to_string(),
                expected: 3,
                actual: 2,
            }
        );
    }

    #[rstest]
    fn test_unknown_property() {
        let clause = VectorSearch::new::<Document>("d", "missing", vec![0.1, 0.2, 0.3], 5);
        assert!(matches!(
            clause.validate(),
            Err(QueryError::MissingColumnMapping { .. })
        ));
    }

    #[rstest]
    fn test_non_vector_property() {
        let clause = VectorSearch::new::<Person>("p", "name", vec![0.1], 5);
        assert!(matches!(
            clause.validate(),
            Err(QueryError::CompilationFailure { .. })
        ));
    }

    #[rstest]
    fn test_zero_results_rejected() {
        let clause = VectorSearch::new::<Document>("d", "embedding", vec![0.1, 0.2, 0.3], 0);
        assert!(clause.validate().is_err());
    }

    #[rstest]
    fn test_non_finite_element_rejected() {
        let clause = VectorSearch::new::<Document>("d", "embedding", vec![0.1, f32::NAN, 0.3], 1);
        assert!(render(&clause).is_err());
    }

    #[rstest]
    fn test_filter_index_pipelined_and_order() {
        let clause = VectorSearch::new::<Document>("d", "embedding", vec![1.0, 0.0, 0.5], 10)
            .index("docs_by_embedding")
            .filter(PropertyRef::new("d", "title").contains("graph"))
            .order_by(Expr::alias("distance").desc())
            .pipelined();
        let fragment = render(&clause).unwrap();
        assert_eq!(
            fragment.text,
            "CALL QUERY_VECTOR_INDEX('Document', 'docs_by_embedding', [1.0, 0.0, 0.5], $param1) \
             WITH node AS d, distance WHERE d.title CONTAINS $param2 \
             WITH d, distance ORDER BY distance DESC"
        );
        assert_eq!(fragment.bindings.len(), 2);
    }

    #[rstest]
    fn test_configured_index_template() {
        let config = CompilerConfig {
            vector_index_name: "idx_{column}".to_string(),
            ..CompilerConfig::default()
        };
        let clause = VectorSearch::new::<Document>("d", "embedding", vec![0.1, 0.2, 0.3], 2);
        let fragment = clause.render(&mut CompileContext::new(config)).unwrap();
        assert!(fragment.text.contains("'idx_embedding'"));
    }
}
