//! `RETURN` and `WITH` projections.
//!
//! Both share one body: items, then the optional `DISTINCT`, `ORDER BY`,
//! `SKIP` and `LIMIT` modifiers in that fixed order. `WITH` additionally
//! carries a trailing `WHERE` over the projected variables.

use crate::builder::expr::{OrderBy, ReturnItem, render_order_by};
use crate::builder::helpers::format_list;
use crate::builder::params::Bindings;
use crate::builder::predicate::Predicate;
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;

#[derive(Debug, Clone, PartialEq, Default)]
struct ProjectionBody {
    items: Vec<ReturnItem>,
    distinct: bool,
    order_by: Vec<OrderBy>,
    skip: Option<u64>,
    limit: Option<u64>,
}

impl ProjectionBody {
    fn new<I: Into<ReturnItem>>(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn render_into(
        &self,
        keyword: &'static str,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        if self.items.is_empty() {
            return Err(QueryError::failure(
                "projection",
                format!("{} requires at least one item", keyword),
            ));
        }
        let items = self
            .items
            .iter()
            .map(|item| item.render_into(ctx, bindings))
            .collect::<Result<Vec<_>, _>>()?;

        let mut parts = vec![keyword.to_string()];
        if self.distinct {
            parts.push("DISTINCT".to_string());
        }
        parts.push(format_list(&items));
        let order = render_order_by(&self.order_by, ctx, bindings)?;
        if !order.is_empty() {
            parts.push(order);
        }
        if let Some(skip) = self.skip {
            parts.push(format!("SKIP {}", skip));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }
        Ok(parts.join(" "))
    }
}

macro_rules! projection_modifiers {
    ($ty:ty) => {
        impl $ty {
            pub fn distinct(mut self) -> Self {
                self.body.distinct = true;
                self
            }

            /// Append an ordering key.
            pub fn order_by(mut self, order: OrderBy) -> Self {
                self.body.order_by.push(order);
                self
            }

            pub fn skip(mut self, skip: u64) -> Self {
                self.body.skip = Some(skip);
                self
            }

            pub fn limit(mut self, limit: u64) -> Self {
                self.body.limit = Some(limit);
                self
            }

            /// Append another projection item.
            pub fn item(mut self, item: impl Into<ReturnItem>) -> Self {
                self.body.items.push(item.into());
                self
            }

            pub fn items(&self) -> &[ReturnItem] {
                &self.body.items
            }
        }
    };
}

/// Terminal projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    body: ProjectionBody,
}

impl Return {
    pub fn new<I: Into<ReturnItem>>(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            body: ProjectionBody::new(items),
        }
    }
}

projection_modifiers!(Return);

impl Render for Return {
    fn keyword(&self) -> &'static str {
        "RETURN"
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        let mut bindings = Bindings::new();
        let text = self.body.render_into("RETURN", ctx, &mut bindings)?;
        Ok(Fragment::new(text, bindings))
    }
}

/// Pipelining projection. Only the projected variables are visible to the
/// clauses that follow.
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    body: ProjectionBody,
    filter: Option<Predicate>,
}

impl With {
    pub fn new<I: Into<ReturnItem>>(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            body: ProjectionBody::new(items),
            filter: None,
        }
    }

    /// Filter on the projected variables, combined with `AND` with any
    /// existing filter.
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
}

projection_modifiers!(With);

impl Render for With {
    fn keyword(&self) -> &'static str {
        "WITH"
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        let mut bindings = Bindings::new();
        let mut text = self.body.render_into("WITH", ctx, &mut bindings)?;
        if let Some(filter) = &self.filter {
            let filter = filter.render_into(ctx, &mut bindings)?;
            text.push_str(&format!(" WHERE {}", filter));
        }
        Ok(Fragment::new(text, bindings))
    }
}
