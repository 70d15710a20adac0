//! Node, edge and path patterns.
//!
//! Patterns are immutable descriptors shared by match, create and merge.
//! Inline property values bind semantically under `<alias>_<property>`, so
//! two patterns describing the same logical value share one binding.
//! Attached predicates are not rendered inline: the owning clause hoists them
//! into its own `WHERE`, and [`Pattern::render`] appends them when a pattern
//! is rendered stand-alone.

use super::Fragment;
use super::expr::Expr;
use super::helpers::{format_list, format_name, validate_alias};
use super::params::{Bindings, CompileContext};
use super::predicate::{Predicate, render_where};
use crate::error::QueryError;
use crate::schema::{GraphModel, ModelSchema};
use crate::value::Value;

/// Inline `key: value` properties of a pattern.
pub type PatternProperties = Vec<(String, Expr)>;

/// Direction of an edge or path, read from the source endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeDirection {
    #[default]
    Outgoing,
    Incoming,
    Undirected,
}

impl EdgeDirection {
    fn wrap(&self, inner: &str) -> String {
        match self {
            EdgeDirection::Outgoing => format!("-[{}]->", inner),
            EdgeDirection::Incoming => format!("<-[{}]-", inner),
            EdgeDirection::Undirected => format!("-[{}]-", inner),
        }
    }
}

fn and_filter(existing: Option<Predicate>, predicate: Predicate) -> Option<Predicate> {
    Some(match existing {
        Some(existing) => existing.and(&predicate),
        None => predicate,
    })
}

fn render_alias(alias: &str) -> Result<&str, QueryError> {
    if !alias.is_empty() {
        validate_alias("pattern", alias)?;
    }
    Ok(alias)
}

fn render_label(label: Option<&str>) -> Result<String, QueryError> {
    match label {
        Some(label) => Ok(format!(":{}", format_name("pattern", label)?)),
        None => Ok(String::new()),
    }
}

/// Render `{k: $alias_k, ...}`, or an empty string without properties.
fn render_properties(
    alias: &str,
    schema: Option<&'static ModelSchema>,
    properties: &PatternProperties,
    ctx: &mut CompileContext,
    bindings: &mut Bindings,
) -> Result<String, QueryError> {
    if properties.is_empty() {
        return Ok(String::new());
    }
    let mut items = Vec::with_capacity(properties.len());
    for (key, expr) in properties {
        let column = match schema {
            Some(schema) => schema.column_for(key),
            None => key.as_str(),
        };
        let value = match expr {
            Expr::Value(value) if !alias.is_empty() => {
                ctx.bind_semantic(bindings, alias, column, value.clone())?
            }
            other => other.render_into(ctx, bindings)?,
        };
        items.push(format!("{}: {}", format_name("pattern", column)?, value));
    }
    Ok(format!(" {{{}}}", format_list(&items)))
}

/// `(alias:Label {props})`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePattern {
    alias: String,
    label: Option<String>,
    schema: Option<&'static ModelSchema>,
    properties: PatternProperties,
    predicate: Option<Predicate>,
}

impl NodePattern {
    /// A node with an alias and no label. An empty alias renders an
    /// anonymous node.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Self::default()
        }
    }

    /// A node labelled with `M`'s type name whose property keys resolve
    /// through `M`'s mapping table.
    pub fn of<M: GraphModel>(alias: impl Into<String>) -> Self {
        Self::new(alias).schema(M::schema())
    }

    pub fn labeled(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    pub fn schema(self, schema: &'static ModelSchema) -> Self {
        Self {
            label: Some(schema.name.to_string()),
            schema: Some(schema),
            ..self
        }
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn properties<K: Into<String>>(
        mut self,
        properties: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        self.properties.extend(
            properties
                .into_iter()
                .map(|(k, v)| (k.into(), Expr::Value(v))),
        );
        self
    }

    /// Attach a predicate, combined with `AND` with any existing one.
    pub fn filter(self, predicate: Predicate) -> Self {
        Self {
            predicate: and_filter(self.predicate, predicate),
            ..self
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn model_schema(&self) -> Option<&'static ModelSchema> {
        self.schema
    }

    pub fn inline_properties(&self) -> &PatternProperties {
        &self.properties
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        self.predicate.iter().cloned().collect()
    }

    pub(crate) fn render_into(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        let alias = render_alias(&self.alias)?;
        let label = render_label(self.label())?;
        let properties = render_properties(alias, self.schema, &self.properties, ctx, bindings)?;
        Ok(format!("({}{}{})", alias, label, properties))
    }
}

/// `(from)-[alias:Type {props}]->(to)`
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePattern {
    alias: String,
    label: Option<String>,
    schema: Option<&'static ModelSchema>,
    from: NodePattern,
    to: NodePattern,
    direction: EdgeDirection,
    properties: PatternProperties,
    predicate: Option<Predicate>,
}

impl EdgePattern {
    /// An edge between two endpoint aliases.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::between(NodePattern::new(from), NodePattern::new(to))
    }

    /// An edge between two full endpoint patterns.
    pub fn between(from: NodePattern, to: NodePattern) -> Self {
        Self {
            alias: String::new(),
            label: None,
            schema: None,
            from,
            to,
            direction: EdgeDirection::Outgoing,
            properties: Vec::new(),
            predicate: None,
        }
    }

    /// An edge typed by `M` between two endpoint aliases.
    pub fn of<M: GraphModel>(
        alias: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::new(from, to).named(alias).schema(M::schema())
    }

    pub fn named(self, alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..self
        }
    }

    pub fn labeled(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    pub fn schema(self, schema: &'static ModelSchema) -> Self {
        Self {
            label: Some(schema.name.to_string()),
            schema: Some(schema),
            ..self
        }
    }

    pub fn direction(self, direction: EdgeDirection) -> Self {
        Self { direction, ..self }
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn properties<K: Into<String>>(
        mut self,
        properties: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        self.properties.extend(
            properties
                .into_iter()
                .map(|(k, v)| (k.into(), Expr::Value(v))),
        );
        self
    }

    pub fn filter(self, predicate: Predicate) -> Self {
        Self {
            predicate: and_filter(self.predicate, predicate),
            ..self
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn model_schema(&self) -> Option<&'static ModelSchema> {
        self.schema
    }

    pub fn source(&self) -> &NodePattern {
        &self.from
    }

    pub fn target(&self) -> &NodePattern {
        &self.to
    }

    pub fn inline_properties(&self) -> &PatternProperties {
        &self.properties
    }

    /// True when both endpoints name an alias.
    pub fn has_endpoints(&self) -> bool {
        !self.from.alias().is_empty() && !self.to.alias().is_empty()
    }

    /// Endpoint predicates first, then the edge's own.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = self.from.predicates();
        predicates.extend(self.predicate.iter().cloned());
        predicates.extend(self.to.predicates());
        predicates
    }

    pub(crate) fn render_into(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        let from = self.from.render_into(ctx, bindings)?;
        let alias = render_alias(&self.alias)?;
        let label = render_label(self.label())?;
        let properties = render_properties(alias, self.schema, &self.properties, ctx, bindings)?;
        let to = self.to.render_into(ctx, bindings)?;
        let inner = format!("{}{}{}", alias, label, properties);
        Ok(format!("{}{}{}", from, self.direction.wrap(&inner), to))
    }
}

/// `alias = (from)-[:Type*min..max]->(to)`
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    alias: String,
    from: NodePattern,
    to: NodePattern,
    label: Option<String>,
    min_hops: Option<u32>,
    max_hops: Option<u32>,
    direction: EdgeDirection,
}

impl PathPattern {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::between(NodePattern::new(from), NodePattern::new(to))
    }

    pub fn between(from: NodePattern, to: NodePattern) -> Self {
        Self {
            alias: String::new(),
            from,
            to,
            label: None,
            min_hops: None,
            max_hops: None,
            direction: EdgeDirection::Outgoing,
        }
    }

    /// Bind the whole path to an alias.
    pub fn named(self, alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..self
        }
    }

    pub fn labeled(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    /// Restrict the path to edges of `M`'s type.
    pub fn of<M: GraphModel>(self) -> Self {
        self.labeled(M::schema().name)
    }

    pub fn min_hops(self, min: u32) -> Self {
        Self {
            min_hops: Some(min),
            ..self
        }
    }

    pub fn max_hops(self, max: u32) -> Self {
        Self {
            max_hops: Some(max),
            ..self
        }
    }

    pub fn hops(self, min: u32, max: u32) -> Self {
        self.min_hops(min).max_hops(max)
    }

    pub fn direction(self, direction: EdgeDirection) -> Self {
        Self { direction, ..self }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = self.from.predicates();
        predicates.extend(self.to.predicates());
        predicates
    }

    fn hop_range(&self) -> Result<String, QueryError> {
        match (self.min_hops, self.max_hops) {
            (Some(min), Some(max)) if min > max => Err(QueryError::failure(
                "path pattern",
                format!("minimum hops {} exceeds maximum hops {}", min, max),
            )),
            (Some(min), Some(max)) => Ok(format!("*{}..{}", min, max)),
            (Some(min), None) => Ok(format!("*{}..", min)),
            (None, Some(max)) => Ok(format!("*..{}", max)),
            (None, None) => Ok("*".to_string()),
        }
    }

    pub(crate) fn render_into(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        let hops = self.hop_range()?;
        let from = self.from.render_into(ctx, bindings)?;
        let label = render_label(self.label.as_deref())?;
        let to = self.to.render_into(ctx, bindings)?;
        let body = format!(
            "{}{}{}",
            from,
            self.direction.wrap(&format!("{}{}", label, hops)),
            to
        );
        if self.alias.is_empty() {
            Ok(body)
        } else {
            validate_alias("path pattern", &self.alias)?;
            Ok(format!("{} = {}", self.alias, body))
        }
    }
}

/// Any pattern usable by match, create and merge.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Node(NodePattern),
    Edge(EdgePattern),
    Path(PathPattern),
}

impl Pattern {
    /// Alias of the node, edge or path (possibly empty).
    pub fn alias(&self) -> &str {
        match self {
            Pattern::Node(node) => node.alias(),
            Pattern::Edge(edge) => edge.alias(),
            Pattern::Path(path) => path.alias(),
        }
    }

    /// Schema attached to the node or edge, used to resolve property keys.
    pub fn model_schema(&self) -> Option<&'static ModelSchema> {
        match self {
            Pattern::Node(node) => node.model_schema(),
            Pattern::Edge(edge) => edge.model_schema(),
            Pattern::Path(_) => None,
        }
    }

    /// Predicates attached anywhere in the pattern, in render order.
    pub fn predicates(&self) -> Vec<Predicate> {
        match self {
            Pattern::Node(node) => node.predicates(),
            Pattern::Edge(edge) => edge.predicates(),
            Pattern::Path(path) => path.predicates(),
        }
    }

    /// Render the bare pattern text.
    pub fn render_pattern(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        let mut bindings = Bindings::new();
        let text = self.render_into(ctx, &mut bindings)?;
        Ok(Fragment::new(text, bindings))
    }

    /// Render stand-alone as `PREFIX pattern [WHERE predicates]`.
    pub fn render(&self, prefix: &str, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        let mut bindings = Bindings::new();
        let text = self.render_into(ctx, &mut bindings)?;
        let filter = render_where(&self.predicates(), ctx, &mut bindings)?;
        let mut fragment = Fragment::text(format!("{} {}", prefix, text));
        fragment.append(Fragment::new(filter, bindings))?;
        Ok(fragment)
    }

    pub(crate) fn render_into(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        match self {
            Pattern::Node(node) => node.render_into(ctx, bindings),
            Pattern::Edge(edge) => edge.render_into(ctx, bindings),
            Pattern::Path(path) => path.render_into(ctx, bindings),
        }
    }
}

impl From<NodePattern> for Pattern {
    fn from(node: NodePattern) -> Self {
        Pattern::Node(node)
    }
}

impl From<EdgePattern> for Pattern {
    fn from(edge: EdgePattern) -> Self {
        Pattern::Edge(edge)
    }
}

impl From<PathPattern> for Pattern {
    fn from(path: PathPattern) -> Self {
        Pattern::Path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::reference::PropertyRef;
    use crate::test_utils::{Knows, Person};
    use rstest::rstest;

    fn render(pattern: impl Into<Pattern>) -> Fragment {
        pattern
            .into()
            .render_pattern(&mut CompileContext::default())
            .unwrap()
    }

    #[rstest]
    fn test_bare_node() {
        assert_eq!(render(NodePattern::new("p")).text, "(p)");
        assert_eq!(render(NodePattern::new("")).text, "()");
        assert_eq!(render(NodePattern::of::<Person>("p")).text, "(p:Person)");
    }

    #[rstest]
    fn test_node_inline_properties_bind_semantically() {
        let fragment = render(
            NodePattern::new("p")
                .labeled("Person")
                .property("name", "Ada")
                .property("age", 36i32),
        );
        assert_eq!(fragment.text, "(p:Person {name: $p_name, age: $p_age})");
        assert_eq!(fragment.bindings.get("p_name"), Some(&Value::from("Ada")));
        assert_eq!(fragment.bindings.get("p_age"), Some(&Value::Int32(36)));
    }

    #[rstest]
    fn test_node_properties_resolve_columns() {
        let fragment = render(NodePattern::of::<Person>("p").property("email", "a@x.com"));
        assert_eq!(fragment.text, "(p:Person {email_address: $p_email_address})");
        assert_eq!(fragment.bindings.get("p_email_address"), Some(&Value::from("a@x.com")));
        assert!(!fragment.bindings.contains("p_email"));
    }

    #[rstest]
    fn test_anonymous_node_properties_bind_anonymously() {
        let fragment = render(NodePattern::new("").labeled("Person").property("name", "Ada"));
        assert_eq!(fragment.text, "(:Person {name: $param1})");
    }

    #[rstest]
    fn test_property_expressions() {
        let fragment = render(
            NodePattern::new("q").property("name", PropertyRef::new("p", "name")),
        );
        assert_eq!(fragment.text, "(q {name: p.name})");
        assert!(fragment.bindings.is_empty());
    }

    #[rstest]
    #[case(EdgeDirection::Outgoing, "(a)-[k:KNOWS {since: $k_since}]->(b)")]
    #[case(EdgeDirection::Incoming, "(a)<-[k:KNOWS {since: $k_since}]-(b)")]
    #[case(EdgeDirection::Undirected, "(a)-[k:KNOWS {since: $k_since}]-(b)")]
    fn test_edge_directions(#[case] direction: EdgeDirection, #[case] expected: &str) {
        let edge = EdgePattern::of::<Knows>("k", "a", "b")
            .direction(direction)
            .property("since", 2020i64);
        assert_eq!(render(edge).text, expected);
    }

    #[rstest]
    fn test_edge_with_labelled_endpoints() {
        let edge = EdgePattern::between(
            NodePattern::of::<Person>("a"),
            NodePattern::of::<Person>("b").property("name", "Bob"),
        )
        .labeled("KNOWS");
        let fragment = render(edge);
        assert_eq!(fragment.text, "(a:Person)-[:KNOWS]->(b:Person {name: $b_name})");
        assert_eq!(fragment.bindings.len(), 1);
    }

    #[rstest]
    #[case(None, None, "*")]
    #[case(Some(2), None, "*2..")]
    #[case(None, Some(5), "*..5")]
    #[case(Some(1), Some(3), "*1..3")]
    fn test_path_hop_bounds(
        #[case] min: Option<u32>,
        #[case] max: Option<u32>,
        #[case] hops: &str,
    ) {
        let mut path = PathPattern::new("a", "b").labeled("KNOWS").named("route");
        if let Some(min) = min {
            path = path.min_hops(min);
        }
        if let Some(max) = max {
            path = path.max_hops(max);
        }
        assert_eq!(
            render(path).text,
            format!("route = (a)-[:KNOWS{}]->(b)", hops)
        );
    }

    #[rstest]
    fn test_path_min_above_max_fails() {
        let path = Pattern::from(PathPattern::new("a", "b").hops(4, 2));
        let err = path
            .render_pattern(&mut CompileContext::default())
            .unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[rstest]
    fn test_invalid_alias_fails() {
        let pattern = Pattern::from(NodePattern::new("p q"));
        assert!(pattern.render_pattern(&mut CompileContext::default()).is_err());
    }

    #[rstest]
    fn test_standalone_render_appends_predicates() {
        let edge = EdgePattern::between(
            NodePattern::new("a").filter(PropertyRef::new("a", "age").gt(18i64)),
            NodePattern::new("b"),
        )
        .named("k")
        .labeled("KNOWS")
        .filter(PropertyRef::new("k", "since").is_not_null());
        let pattern = Pattern::from(edge);
        assert_eq!(pattern.predicates().len(), 2);

        let pattern = Pattern::from(
            NodePattern::new("p").filter(PropertyRef::new("p", "age").gt(18i64)),
        );
        let fragment = pattern.render("MATCH", &mut CompileContext::default()).unwrap();
        assert_eq!(fragment.text, "MATCH (p) WHERE p.age > $param1");
    }

    #[rstest]
    fn test_pattern_alias() {
        assert_eq!(Pattern::from(NodePattern::new("p")).alias(), "p");
        assert_eq!(
            Pattern::from(EdgePattern::new("a", "b").named("k")).alias(),
            "k"
        );
    }
}
