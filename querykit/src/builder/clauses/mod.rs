//! Clause components.
//!
//! Each clause is a self-contained renderer. Modifiers take the clause by
//! value and return a new one; the compiler consumes the finished clause.

pub mod call;
pub mod create;
pub mod delete;
pub mod filter;
pub mod matching;
pub mod merge;
pub mod projection;
pub mod set;
pub mod subquery;
pub mod unwind;
pub mod vector;

use enum_dispatch::enum_dispatch;

pub use call::Call;
pub use create::Create;
pub use delete::Delete;
pub use filter::Where;
pub use matching::Match;
pub use merge::Merge;
pub use projection::{Return, With};
pub use set::{Assignment, Set, SetOp};
pub use subquery::{Subquery, SubqueryKind};
pub use unwind::Unwind;
pub use vector::VectorSearch;

use super::{CompileContext, Fragment};
use crate::error::QueryError;

/// A component that renders into a statement fragment.
#[enum_dispatch]
pub trait Render {
    /// Clause keyword, used in diagnostics.
    fn keyword(&self) -> &'static str;

    /// Check the component before any text is rendered.
    fn validate(&self) -> Result<(), QueryError> {
        Ok(())
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError>;
}

/// Closed set of clause kinds a query is built from.
#[enum_dispatch(Render)]
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match(Match),
    Create(Create),
    Merge(Merge),
    Set(Set),
    Delete(Delete),
    Where(Where),
    Return(Return),
    With(With),
    Unwind(Unwind),
    Call(Call),
    Subquery(Subquery),
    VectorSearch(VectorSearch),
}
