//! `CREATE`.

use crate::builder::params::Bindings;
use crate::builder::pattern::{EdgePattern, NodePattern, Pattern};
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;
use crate::schema::{GraphModel, encode_record};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Create {
    patterns: Vec<Pattern>,
}

impl Create {
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            patterns: vec![pattern.into()],
        }
    }

    /// Declarative node creation: `CREATE (alias:Label {props})`.
    pub fn node<K, V>(
        label: impl Into<String>,
        alias: impl Into<String>,
        properties: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let pattern = NodePattern::new(alias)
            .labeled(label)
            .properties(properties.into_iter().map(|(k, v)| (k, v.into())));
        Self::new(pattern)
    }

    /// Create a node whose inline properties are the encoded record.
    pub fn record<M: GraphModel>(alias: impl Into<String>, record: &M) -> Result<Self, QueryError> {
        let properties = encode_record(record)?;
        let pattern = NodePattern::new(alias)
            .labeled(M::schema().name)
            .properties(properties);
        Ok(Self::new(pattern))
    }

    /// Create an edge between two bound endpoints whose inline properties
    /// are the encoded record.
    pub fn edge_record<M: GraphModel>(
        alias: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        record: &M,
    ) -> Result<Self, QueryError> {
        let properties = encode_record(record)?;
        let pattern = EdgePattern::new(from, to)
            .named(alias)
            .labeled(M::schema().name)
            .properties(properties);
        Ok(Self::new(pattern))
    }

    pub fn and_pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    fn check(pattern: &Pattern) -> Result<(), QueryError> {
        match pattern {
            Pattern::Path(_) => Err(QueryError::failure(
                "create",
                "variable-length paths cannot be created",
            )),
            _ if !pattern.predicates().is_empty() => Err(QueryError::failure(
                "create",
                "created patterns cannot carry predicates",
            )),
            Pattern::Edge(edge) if !edge.has_endpoints() => {
                let message = if edge.inline_properties().is_empty() {
                    "edge has no properties and no source or target to create it between"
                } else {
                    "edge requires both a source and a target alias"
                };
                Err(QueryError::failure("create", message))
            }
            _ => Ok(()),
        }
    }
}

impl Render for Create {
    fn keyword(&self) -> &'static str {
        "CREATE"
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        if self.patterns.is_empty() {
            return Err(QueryError::failure("create", "at least one pattern is required"));
        }
        let mut bindings = Bindings::new();
        let mut texts = Vec::with_capacity(self.patterns.len());
        for pattern in &self.patterns {
            Self::check(pattern)?;
            texts.push(pattern.render_into(ctx, &mut bindings)?);
        }
        Ok(Fragment::new(
            format!("CREATE {}", texts.join(", ")),
            bindings,
        ))
    }
}
