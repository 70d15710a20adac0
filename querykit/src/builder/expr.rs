//! Operand and projection expressions.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::clauses::subquery::Subquery;
use super::helpers::{format_list, validate_alias, validate_procedure};
use super::params::{Bindings, CompileContext};
use super::reference::PropertyRef;
use crate::error::QueryError;
use crate::value::Value;

/// Aggregate function applied in a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Collect,
}

impl Aggregate {
    pub fn function_name(&self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Collect => "collect",
        }
    }
}

/// An expression usable as a projection item, property value or argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A bare pattern alias.
    Alias(String),
    Property(PropertyRef),
    /// A runtime value, always passed as a binding.
    Value(Value),
    /// An already-named parameter supplied by the caller.
    Parameter(String),
    Function {
        name: String,
        args: Vec<Expr>,
    },
    Aggregate {
        function: Aggregate,
        /// `None` renders `count(*)`.
        arg: Option<Box<Expr>>,
        distinct: bool,
    },
    Subquery(Box<Subquery>),
    /// Caller-owned statement text, emitted unchanged. Must not contain
    /// values derived from untrusted input.
    Raw(String),
}

impl Expr {
    pub fn alias(name: impl Into<String>) -> Self {
        Expr::Alias(name.into())
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Expr::Value(value.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Expr::Parameter(name.into())
    }

    pub fn function(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Expr::Raw(text.into())
    }

    pub fn subquery(subquery: Subquery) -> Self {
        Expr::Subquery(Box::new(subquery))
    }

    fn aggregate(function: Aggregate, arg: impl Into<Expr>) -> Self {
        Expr::Aggregate {
            function,
            arg: Some(Box::new(arg.into())),
            distinct: false,
        }
    }

    pub fn count(arg: impl Into<Expr>) -> Self {
        Self::aggregate(Aggregate::Count, arg)
    }

    /// `count(*)`
    pub fn count_all() -> Self {
        Expr::Aggregate {
            function: Aggregate::Count,
            arg: None,
            distinct: false,
        }
    }

    pub fn sum(arg: impl Into<Expr>) -> Self {
        Self::aggregate(Aggregate::Sum, arg)
    }

    pub fn avg(arg: impl Into<Expr>) -> Self {
        Self::aggregate(Aggregate::Avg, arg)
    }

    pub fn min(arg: impl Into<Expr>) -> Self {
        Self::aggregate(Aggregate::Min, arg)
    }

    pub fn max(arg: impl Into<Expr>) -> Self {
        Self::aggregate(Aggregate::Max, arg)
    }

    pub fn collect(arg: impl Into<Expr>) -> Self {
        Self::aggregate(Aggregate::Collect, arg)
    }

    /// Mark an aggregate as `DISTINCT`. Other expressions are unchanged.
    pub fn distinct(self) -> Self {
        match self {
            Expr::Aggregate { function, arg, .. } => Expr::Aggregate {
                function,
                arg,
                distinct: true,
            },
            other => other,
        }
    }

    /// Project this expression under a result column name.
    pub fn aliased(self, alias: impl Into<String>) -> ReturnItem {
        ReturnItem {
            expr: self,
            alias: Some(alias.into()),
        }
    }

    pub fn asc(self) -> OrderBy {
        OrderBy::asc(self)
    }

    pub fn desc(self) -> OrderBy {
        OrderBy::desc(self)
    }

    pub(crate) fn render_into(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        match self {
            Expr::Alias(alias) => {
                validate_alias("expression", alias)?;
                Ok(alias.clone())
            }
            Expr::Property(reference) => reference.render(),
            Expr::Value(value) => ctx.bind_anonymous(bindings, value.clone()),
            Expr::Parameter(name) => ctx.caller_parameter("expression", name),
            Expr::Function { name, args } => {
                validate_procedure("function", name)?;
                let args = args
                    .iter()
                    .map(|arg| arg.render_into(ctx, bindings))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("{}({})", name, format_list(&args)))
            }
            Expr::Aggregate {
                function,
                arg,
                distinct,
            } => {
                let inner = match arg {
                    Some(arg) => arg.render_into(ctx, bindings)?,
                    None if *function == Aggregate::Count => "*".to_string(),
                    None => {
                        return Err(QueryError::failure(
                            "aggregate",
                            format!("{} requires an argument", function.function_name()),
                        ));
                    }
                };
                let distinct = if *distinct { "DISTINCT " } else { "" };
                Ok(format!("{}({}{})", function.function_name(), distinct, inner))
            }
            Expr::Subquery(subquery) => subquery.render_expr(ctx, bindings),
            Expr::Raw(text) => {
                if text.trim().is_empty() {
                    return Err(QueryError::failure("expression", "raw text must not be empty"));
                }
                Ok(text.clone())
            }
        }
    }
}

impl From<PropertyRef> for Expr {
    fn from(reference: PropertyRef) -> Self {
        Expr::Property(reference)
    }
}

impl From<&PropertyRef> for Expr {
    fn from(reference: &PropertyRef) -> Self {
        Expr::Property(reference.clone())
    }
}

impl From<Subquery> for Expr {
    fn from(subquery: Subquery) -> Self {
        Expr::subquery(subquery)
    }
}

macro_rules! impl_expr_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Expr::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_expr_from_value! {
    Value, bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64,
    String, &str, Uuid, DateTime<Utc>, NaiveDate,
}

/// One item of a `RETURN` or `WITH` projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl ReturnItem {
    pub fn new(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            alias: None,
        }
    }

    pub fn aliased(self, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..self
        }
    }

    pub(crate) fn render_into(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        let text = self.expr.render_into(ctx, bindings)?;
        match &self.alias {
            Some(alias) => {
                validate_alias("projection", alias)?;
                Ok(format!("{} AS {}", text, alias))
            }
            None => Ok(text),
        }
    }
}

/// A bare string is an alias projection.
impl From<&str> for ReturnItem {
    fn from(alias: &str) -> Self {
        ReturnItem::new(Expr::alias(alias))
    }
}

impl From<String> for ReturnItem {
    fn from(alias: String) -> Self {
        ReturnItem::new(Expr::Alias(alias))
    }
}

impl From<PropertyRef> for ReturnItem {
    fn from(reference: PropertyRef) -> Self {
        ReturnItem::new(Expr::Property(reference))
    }
}

impl From<Expr> for ReturnItem {
    fn from(expr: Expr) -> Self {
        ReturnItem::new(expr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One `ORDER BY` key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            direction: Direction::Desc,
        }
    }

    pub(crate) fn render_into(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        let text = self.expr.render_into(ctx, bindings)?;
        let direction = match self.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        Ok(format!("{} {}", text, direction))
    }
}

/// Render an `ORDER BY` list, or an empty string when there are no keys.
pub(crate) fn render_order_by(
    order: &[OrderBy],
    ctx: &mut CompileContext,
    bindings: &mut Bindings,
) -> Result<String, QueryError> {
    if order.is_empty() {
        return Ok(String::new());
    }
    let keys = order
        .iter()
        .map(|key| key.render_into(ctx, bindings))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("ORDER BY {}", format_list(&keys)))
}
