//! Query algebra and compiler.
//!
//! Queries are assembled from small immutable components and compiled into
//! one parameterized statement plus its binding map.
//!
//! # Architecture
//!
//! The builder has four layers:
//!
//! 1. **References and predicates** - [`PropertyRef`] and [`Predicate`]
//!    describe filter expressions over pattern aliases
//! 2. **Patterns** - [`Pattern`] describes the node, edge and path shapes used
//!    by match, create and merge
//! 3. **Clauses** - every [`Clause`] renders itself into a [`Fragment`]
//! 4. **Compilation** - [`QueryCompiler`] renders an ordered clause list and
//!    merges the fragment bindings into a [`CompiledQuery`]
//!
//! # Example
//!
//! ```ignore
//! let query = Query::new()
//!     .matching(NodePattern::of::<Person>("p"))
//!     .filter(PropertyRef::of::<Person>("p", "age").gte(18))
//!     .returning(Return::new(["p"]));
//!
//! let compiled = compile(&query)?;
//! assert_eq!(compiled.statement, "MATCH (p:Person) WHERE p.age >= $param1 RETURN p");
//! ```

pub mod clauses;
pub mod compiler;
pub mod expr;
pub mod helpers;
pub mod params;
pub mod pattern;
pub mod predicate;
pub mod reference;

use crate::error::QueryError;

pub use clauses::{Clause, Render};
pub use compiler::{CompiledQuery, Query, QueryCompiler, compile};
pub use expr::{Aggregate, Direction, Expr, OrderBy, ReturnItem};
pub use params::{BindingRegistry, Bindings, CompileContext, Params};
pub use pattern::{EdgeDirection, EdgePattern, NodePattern, PathPattern, Pattern};
pub use predicate::{CompareOp, ExistsTarget, Operand, Predicate, PredicateNode, StringMatch};
pub use reference::{Property, PropertyRef};

/// Rendered statement text paired with the bindings it introduced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub bindings: Bindings,
}

impl Fragment {
    pub fn new(text: impl Into<String>, bindings: Bindings) -> Self {
        Self {
            text: text.into(),
            bindings,
        }
    }

    /// A fragment with no bindings.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, Bindings::new())
    }

    /// Append another fragment, space separated, merging its bindings.
    pub fn append(&mut self, other: Fragment) -> Result<(), QueryError> {
        if !other.text.is_empty() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(&other.text);
        }
        self.bindings.merge(other.bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use rstest::rstest;

    #[rstest]
    fn test_append_joins_with_space() {
        let mut fragment = Fragment::text("MATCH (p)");
        fragment.append(Fragment::text("RETURN p")).unwrap();
        assert_eq!(fragment.text, "MATCH (p) RETURN p");
    }

    #[rstest]
    fn test_append_empty_text_keeps_bindings() {
        let mut fragment = Fragment::text("MATCH (p)");
        let mut bindings = Bindings::new();
        bindings.bind("x", Value::Int64(1)).unwrap();
        fragment.append(Fragment::new("", bindings)).unwrap();
        assert_eq!(fragment.text, "MATCH (p)");
        assert_eq!(fragment.bindings.len(), 1);
    }

    #[rstest]
    fn test_append_conflict() {
        let mut left = Bindings::new();
        left.bind("x", Value::Int64(1)).unwrap();
        let mut right = Bindings::new();
        right.bind("x", Value::Int64(2)).unwrap();

        let mut fragment = Fragment::new("a", left);
        assert!(fragment.append(Fragment::new("b", right)).is_err());
    }
}
