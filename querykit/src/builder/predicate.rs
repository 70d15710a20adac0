//! Predicate algebra.
//!
//! A [`Predicate`] is a persistent boolean expression tree. Children are
//! shared through `Arc`, so combinators build new trees without copying the
//! subtrees they wrap. Every leaf carrying a runtime value reserves exactly
//! one anonymous binding when rendered.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::clauses::subquery::Subquery;
use super::compiler::Query;
use super::params::{Bindings, CompileContext};
use super::pattern::Pattern;
use super::reference::PropertyRef;
use super::Fragment;
use crate::error::QueryError;
use crate::value::Value;

/// `$name` placeholders inside custom filter text.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([\p{L}_][\p{L}\p{N}_]*)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A runtime value, bound as a parameter.
    Value(Value),
    /// Another reference; introduces no binding.
    Ref(PropertyRef),
    /// An already-named parameter supplied by the caller.
    Parameter(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMatch {
    Contains,
    StartsWith,
    EndsWith,
    Regex,
}

impl StringMatch {
    pub fn operator(&self) -> &'static str {
        match self {
            StringMatch::Contains => "CONTAINS",
            StringMatch::StartsWith => "STARTS WITH",
            StringMatch::EndsWith => "ENDS WITH",
            StringMatch::Regex => "=~",
        }
    }
}

/// Target of an existence check.
#[derive(Debug, Clone, PartialEq)]
pub enum ExistsTarget {
    /// `EXISTS { MATCH pattern [WHERE ...] }`
    Pattern(Pattern),
    /// `EXISTS { inner query }`
    Query(Query),
}

/// One node of a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    Compare {
        lhs: PropertyRef,
        op: CompareOp,
        rhs: Operand,
    },
    And(Predicate, Predicate),
    Or(Predicate, Predicate),
    Not(Predicate),
    IsNull(PropertyRef),
    IsNotNull(PropertyRef),
    In {
        reference: PropertyRef,
        values: Value,
    },
    StringMatch {
        reference: PropertyRef,
        kind: StringMatch,
        value: Value,
    },
    Exists(ExistsTarget),
    Literal(bool),
    /// Caller-written filter text with `$name` placeholders and the values
    /// for every one of them.
    Custom {
        text: String,
        bindings: Bindings,
    },
}

/// Immutable, structurally shared predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate(Arc<PredicateNode>);

impl Predicate {
    pub fn new(node: PredicateNode) -> Self {
        Predicate(Arc::new(node))
    }

    pub fn node(&self) -> &PredicateNode {
        &self.0
    }

    pub fn compare(lhs: PropertyRef, op: CompareOp, rhs: Operand) -> Self {
        Self::new(PredicateNode::Compare { lhs, op, rhs })
    }

    pub fn is_null(reference: PropertyRef) -> Self {
        Self::new(PredicateNode::IsNull(reference))
    }

    pub fn is_not_null(reference: PropertyRef) -> Self {
        Self::new(PredicateNode::IsNotNull(reference))
    }

    pub fn is_in(reference: PropertyRef, values: Value) -> Self {
        Self::new(PredicateNode::In { reference, values })
    }

    pub fn string_match(reference: PropertyRef, kind: StringMatch, value: Value) -> Self {
        Self::new(PredicateNode::StringMatch {
            reference,
            kind,
            value,
        })
    }

    /// Existence of a pattern.
    pub fn exists(pattern: impl Into<Pattern>) -> Self {
        Self::new(PredicateNode::Exists(ExistsTarget::Pattern(pattern.into())))
    }

    /// Existence of at least one row from a sub-query.
    pub fn exists_query(query: Query) -> Self {
        Self::new(PredicateNode::Exists(ExistsTarget::Query(query)))
    }

    pub fn literal(value: bool) -> Self {
        Self::new(PredicateNode::Literal(value))
    }

    pub fn custom(text: impl Into<String>, bindings: Bindings) -> Self {
        Self::new(PredicateNode::Custom {
            text: text.into(),
            bindings,
        })
    }

    pub fn and(&self, other: &Predicate) -> Self {
        Self::new(PredicateNode::And(self.clone(), other.clone()))
    }

    pub fn or(&self, other: &Predicate) -> Self {
        Self::new(PredicateNode::Or(self.clone(), other.clone()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Self {
        Self::new(PredicateNode::Not(self.clone()))
    }

    /// Conjunction of every predicate, or `None` for an empty input.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Self> {
        predicates.into_iter().reduce(|acc, p| acc.and(&p))
    }

    /// Disjunction of every predicate, or `None` for an empty input.
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Option<Self> {
        predicates.into_iter().reduce(|acc, p| acc.or(&p))
    }

    /// Render into a stand-alone fragment.
    pub fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        let mut bindings = Bindings::new();
        let text = self.render_into(ctx, &mut bindings)?;
        Ok(Fragment::new(text, bindings))
    }

    pub(crate) fn render_into(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        match self.node() {
            PredicateNode::Compare { lhs, op, rhs } => {
                let lhs_text = lhs.render()?;
                let rhs_text = match rhs {
                    Operand::Value(Value::Null) => {
                        return Err(QueryError::failure(
                            "predicate",
                            format!(
                                "{} {} NULL never matches; use is_null or is_not_null",
                                lhs,
                                op.symbol()
                            ),
                        ));
                    }
                    Operand::Value(value) => ctx.bind_anonymous(bindings, value.clone())?,
                    Operand::Ref(reference) => reference.render()?,
                    Operand::Parameter(name) => ctx.caller_parameter("predicate", name)?,
                };
                Ok(format!("{} {} {}", lhs_text, op.symbol(), rhs_text))
            }
            PredicateNode::And(left, right) => {
                let left = left.render_into(ctx, bindings)?;
                let right = right.render_into(ctx, bindings)?;
                Ok(format!("({}) AND ({})", left, right))
            }
            PredicateNode::Or(left, right) => {
                let left = left.render_into(ctx, bindings)?;
                let right = right.render_into(ctx, bindings)?;
                Ok(format!("({}) OR ({})", left, right))
            }
            PredicateNode::Not(inner) => {
                let inner = inner.render_into(ctx, bindings)?;
                Ok(format!("NOT ({})", inner))
            }
            PredicateNode::IsNull(reference) => Ok(format!("{} IS NULL", reference.render()?)),
            PredicateNode::IsNotNull(reference) => {
                Ok(format!("{} IS NOT NULL", reference.render()?))
            }
            PredicateNode::In { reference, values } => {
                if !matches!(values, Value::List(_)) {
                    return Err(QueryError::failure(
                        "predicate",
                        format!(
                            "{} IN expects a list, got {}",
                            reference,
                            values.kind_name()
                        ),
                    ));
                }
                let text = reference.render()?;
                let param = ctx.bind_anonymous(bindings, values.clone())?;
                Ok(format!("{} IN {}", text, param))
            }
            PredicateNode::StringMatch {
                reference,
                kind,
                value,
            } => {
                let Value::String(s) = value else {
                    return Err(QueryError::failure(
                        "predicate",
                        format!(
                            "{} {} expects a string, got {}",
                            reference,
                            kind.operator(),
                            value.kind_name()
                        ),
                    ));
                };
                if *kind == StringMatch::Regex {
                    Regex::new(s).map_err(|e| {
                        QueryError::failure("predicate", format!("invalid regex '{}': {}", s, e))
                    })?;
                }
                let text = reference.render()?;
                let param = ctx.bind_anonymous(bindings, value.clone())?;
                Ok(format!("{} {} {}", text, kind.operator(), param))
            }
            PredicateNode::Exists(ExistsTarget::Pattern(pattern)) => {
                let inner = pattern.render("MATCH", ctx)?;
                bindings.merge(inner.bindings)?;
                Ok(format!("EXISTS {{ {} }}", inner.text))
            }
            PredicateNode::Exists(ExistsTarget::Query(query)) => {
                Subquery::exists(query.clone()).render_expr(ctx, bindings)
            }
            PredicateNode::Literal(value) => Ok(if *value { "true" } else { "false" }.to_string()),
            PredicateNode::Custom {
                text,
                bindings: supplied,
            } => {
                if text.trim().is_empty() {
                    return Err(QueryError::failure("predicate", "custom text must not be empty"));
                }
                for (name, _) in supplied.iter() {
                    ctx.caller_parameter("predicate", name)?;
                }
                for capture in PLACEHOLDER.captures_iter(text) {
                    let name = &capture[1];
                    if !supplied.contains(name) {
                        return Err(QueryError::failure(
                            "predicate",
                            format!("custom filter references unbound parameter ${}", name),
                        ));
                    }
                }
                bindings.merge(supplied.clone())?;
                Ok(format!("({})", text))
            }
        }
    }
}

impl From<PredicateNode> for Predicate {
    fn from(node: PredicateNode) -> Self {
        Predicate::new(node)
    }
}

/// Render an optional trailing `WHERE` for a list of predicates, joined
/// with `AND`. Returns an empty string when the list is empty.
pub(crate) fn render_where(
    predicates: &[Predicate],
    ctx: &mut CompileContext,
    bindings: &mut Bindings,
) -> Result<String, QueryError> {
    match Predicate::all(predicates.iter().cloned()) {
        Some(predicate) => Ok(format!("WHERE {}", predicate.render_into(ctx, bindings)?)),
        None => Ok(String::new()),
    }
}
