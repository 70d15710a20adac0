//! Nested sub-queries.
//!
//! The inner clause list is compiled with the same context as the outer
//! statement, so anonymous names stay unique across both, and its bindings
//! fold into the outer fragment under the usual conflict rule.

use crate::builder::compiler::{Query, render_clauses};
use crate::builder::helpers::validate_alias;
use crate::builder::params::Bindings;
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubqueryKind {
    /// `( ... )` yielding one value.
    Scalar,
    /// `[ ... ]` yielding a collection.
    List,
    /// `EXISTS { ... }`
    Exists,
    /// `COUNT { ... }`
    Count,
    /// `CALL { ... }`, executed as an isolated unit.
    Call,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    kind: SubqueryKind,
    query: Query,
    yields: Vec<String>,
}

impl Subquery {
    pub fn new(kind: SubqueryKind, query: Query) -> Self {
        Self {
            kind,
            query,
            yields: Vec::new(),
        }
    }

    pub fn scalar(query: Query) -> Self {
        Self::new(SubqueryKind::Scalar, query)
    }

    pub fn list(query: Query) -> Self {
        Self::new(SubqueryKind::List, query)
    }

    pub fn exists(query: Query) -> Self {
        Self::new(SubqueryKind::Exists, query)
    }

    pub fn count(query: Query) -> Self {
        Self::new(SubqueryKind::Count, query)
    }

    pub fn call(query: Query) -> Self {
        Self::new(SubqueryKind::Call, query)
    }

    /// Variables exported by a call-block.
    pub fn yielding<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.yields.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn kind(&self) -> SubqueryKind {
        self.kind
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Render in expression position, folding inner bindings into
    /// `bindings`.
    pub(crate) fn render_expr(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        if self.query.is_empty() {
            return Err(QueryError::failure("subquery", "inner query has no clauses"));
        }
        if !self.yields.is_empty() && self.kind != SubqueryKind::Call {
            return Err(QueryError::failure(
                "subquery",
                "only call-block sub-queries can yield columns",
            ));
        }
        let inner = render_clauses(ctx, self.query.clauses(), false)?;
        bindings.merge(inner.bindings)?;
        let text = match self.kind {
            SubqueryKind::Scalar => format!("({})", inner.text),
            SubqueryKind::List => format!("[{}]", inner.text),
            SubqueryKind::Exists => format!("EXISTS {{ {} }}", inner.text),
            SubqueryKind::Count => format!("COUNT {{ {} }}", inner.text),
            SubqueryKind::Call => {
                let mut text = format!("CALL {{ {} }}", inner.text);
                if !self.yields.is_empty() {
                    for column in &self.yields {
                        validate_alias("subquery", column)?;
                    }
                    text.push_str(&format!(" YIELD {}", self.yields.join(", ")));
                }
                text
            }
        };
        Ok(text)
    }
}

impl Render for Subquery {
    fn keyword(&self) -> &'static str {
        "CALL"
    }

    fn validate(&self) -> Result<(), QueryError> {
        for clause in self.query.clauses() {
            clause.validate()?;
        }
        Ok(())
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        if self.kind != SubqueryKind::Call {
            return Err(QueryError::failure(
                "subquery",
                "only call-block sub-queries stand alone as clauses",
            ));
        }
        let mut bindings = Bindings::new();
        let text = self.render_expr(ctx, &mut bindings)?;
        Ok(Fragment::new(text, bindings))
    }
}
