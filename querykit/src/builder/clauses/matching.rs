//! `MATCH` and `OPTIONAL MATCH`.

use crate::builder::params::Bindings;
use crate::builder::pattern::Pattern;
use crate::builder::predicate::{Predicate, render_where};
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;

/// One match keyword followed by comma-joined patterns.
///
/// Predicates attached to the patterns are hoisted into the clause's own
/// `WHERE`, after every pattern, together with the clause filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    patterns: Vec<Pattern>,
    optional: bool,
    filter: Option<Predicate>,
}

impl Match {
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            patterns: vec![pattern.into()],
            optional: false,
            filter: None,
        }
    }

    pub fn optional(pattern: impl Into<Pattern>) -> Self {
        Self {
            optional: true,
            ..Self::new(pattern)
        }
    }

    pub fn patterns(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        Self {
            patterns: patterns.into_iter().collect(),
            optional: false,
            filter: None,
        }
    }

    /// Add another pattern to the same keyword.
    pub fn and_pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Attach a filter, combined with `AND` with any existing one.
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

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl Render for Match {
    fn keyword(&self) -> &'static str {
        if self.optional {
            "OPTIONAL MATCH"
        } else {
            "MATCH"
        }
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        if self.patterns.is_empty() {
            return Err(QueryError::failure("match", "at least one pattern is required"));
        }
        let mut bindings = Bindings::new();
        let mut texts = Vec::with_capacity(self.patterns.len());
        let mut predicates = Vec::new();
        for pattern in &self.patterns {
            texts.push(pattern.render_into(ctx, &mut bindings)?);
            predicates.extend(pattern.predicates());
        }
        predicates.extend(self.filter.iter().cloned());

        let mut fragment = Fragment::text(format!("{} {}", self.keyword(), texts.join(", ")));
        let filter = render_where(&predicates, ctx, &mut bindings)?;
        fragment.append(Fragment::new(filter, bindings))?;
        Ok(fragment)
    }
}
