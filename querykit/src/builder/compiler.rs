//! Clause sequencing and compilation.
//!
//! A [`Query`] is an ordered list of clauses. Compiling it validates every
//! clause, renders them left to right with one shared [`CompileContext`],
//! then merges their bindings and joins their text with single spaces.
//! Rendering is deterministic: the same query and configuration always
//! produce the same statement and binding map.

use tracing::{debug, trace};

use super::clauses::{
    Call, Clause, Create, Delete, Match, Merge, Return, Set, Subquery, Unwind, VectorSearch,
    Where, With,
};
use super::params::{CompileContext, Params};
use super::pattern::Pattern;
use super::predicate::Predicate;
use super::{Fragment, Render};
use crate::config::CompilerConfig;
use crate::error::QueryError;

/// An ordered, immutable-by-convention list of clauses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_clauses(clauses: impl IntoIterator<Item = Clause>) -> Self {
        Self {
            clauses: clauses.into_iter().collect(),
        }
    }

    /// Append any clause.
    pub fn then(mut self, clause: impl Into<Clause>) -> Self {
        self.clauses.push(clause.into());
        self
    }

    pub fn matching(self, pattern: impl Into<Pattern>) -> Self {
        self.then(Match::new(pattern))
    }

    pub fn optional_matching(self, pattern: impl Into<Pattern>) -> Self {
        self.then(Match::optional(pattern))
    }

    pub fn create(self, create: Create) -> Self {
        self.then(create)
    }

    pub fn merge(self, merge: Merge) -> Self {
        self.then(merge)
    }

    pub fn set(self, set: Set) -> Self {
        self.then(set)
    }

    pub fn delete(self, delete: Delete) -> Self {
        self.then(delete)
    }

    /// Append a stand-alone `WHERE`.
    pub fn filter(self, predicate: Predicate) -> Self {
        self.then(Where::new(predicate))
    }

    pub fn returning(self, projection: Return) -> Self {
        self.then(projection)
    }

    pub fn with(self, projection: With) -> Self {
        self.then(projection)
    }

    pub fn unwind(self, unwind: Unwind) -> Self {
        self.then(unwind)
    }

    pub fn call(self, call: Call) -> Self {
        self.then(call)
    }

    /// Append `inner` as a `CALL { ... }` block.
    pub fn call_subquery(self, inner: Query) -> Self {
        self.then(Subquery::call(inner))
    }

    pub fn vector_search(self, search: VectorSearch) -> Self {
        self.then(search)
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl<C: Into<Clause>> FromIterator<C> for Query {
    fn from_iter<T: IntoIterator<Item = C>>(iter: T) -> Self {
        Self::from_clauses(iter.into_iter().map(Into::into))
    }
}

/// A compiled statement ready for execution.
///
/// Contains the statement text with `$name` placeholders and every value
/// those placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub statement: String,
    pub params: Params,
}

impl CompiledQuery {
    /// Get the number of parameters in this query.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

/// Compiles queries under one configuration.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    config: CompilerConfig,
}

impl QueryCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a query into statement text and its binding map.
    ///
    /// Every call starts a fresh context, so anonymous names restart at 1.
    /// The configuration is validated first, whether it was loaded or built
    /// by hand.
    pub fn compile(&self, query: &Query) -> Result<CompiledQuery, QueryError> {
        self.config
            .validate()
            .map_err(|err| QueryError::failure("config", err.to_string()))?;
        let mut ctx = CompileContext::new(self.config.clone());
        let fragment = render_clauses(&mut ctx, query.clauses(), true)?;
        let compiled = CompiledQuery {
            statement: fragment.text,
            params: fragment.bindings.into_params(),
        };
        debug!(
            clauses = query.len(),
            params = compiled.param_count(),
            statement = %compiled.statement,
            "compiled query"
        );
        Ok(compiled)
    }
}

/// Compile with the default configuration.
pub fn compile(query: &Query) -> Result<CompiledQuery, QueryError> {
    QueryCompiler::default().compile(query)
}

/// Validate then render `clauses` in order, merging their fragments.
///
/// Top-level compilation annotates errors with the failing clause index.
/// Nested sub-queries pass `annotate = false` so the enclosing clause's
/// index is the one reported.
pub(crate) fn render_clauses(
    ctx: &mut CompileContext,
    clauses: &[Clause],
    annotate: bool,
) -> Result<Fragment, QueryError> {
    if clauses.is_empty() {
        return Err(QueryError::failure("query", "query has no clauses"));
    }
    let locate = |index: usize, err: QueryError| {
        if annotate { err.at_clause(index) } else { err }
    };

    for (index, clause) in clauses.iter().enumerate() {
        clause.validate().map_err(|err| locate(index, err))?;
    }

    let mut statement = Fragment::default();
    for (index, clause) in clauses.iter().enumerate() {
        let fragment = clause.render(ctx).map_err(|err| locate(index, err))?;
        trace!(
            index,
            keyword = clause.keyword(),
            bindings = fragment.bindings.len(),
            "rendered clause"
        );
        statement.append(fragment).map_err(|err| locate(index, err))?;
    }
    Ok(statement)
}
