//! Procedure invocation.

use crate::builder::expr::Expr;
use crate::builder::helpers::{format_list, is_identifier, validate_alias, validate_procedure};
use crate::builder::params::Bindings;
use crate::builder::predicate::Predicate;
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;

/// `CALL proc(args, name := value) [YIELD cols] [WHERE filter]`
///
/// Every runtime argument becomes one binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    procedure: String,
    args: Vec<Expr>,
    options: Vec<(String, Expr)>,
    yields: Vec<String>,
    filter: Option<Predicate>,
}

impl Call {
    pub fn new(procedure: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            args: Vec::new(),
            options: Vec::new(),
            yields: Vec::new(),
            filter: None,
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, arg: impl Into<Expr>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a named option rendered as `name := value`.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.options.push((name.into(), value.into()));
        self
    }

    pub fn yielding<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.yields.extend(columns.into_iter().map(Into::into));
        self
    }

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

    pub fn procedure(&self) -> &str {
        &self.procedure
    }
}

impl Render for Call {
    fn keyword(&self) -> &'static str {
        "CALL"
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        validate_procedure("call", &self.procedure)?;
        let mut bindings = Bindings::new();
        let mut args = self
            .args
            .iter()
            .map(|arg| arg.render_into(ctx, &mut bindings))
            .collect::<Result<Vec<_>, _>>()?;
        for (name, value) in &self.options {
            if !is_identifier(name) {
                return Err(QueryError::failure(
                    "call",
                    format!("'{}' is not a valid option name", name),
                ));
            }
            args.push(format!("{} := {}", name, value.render_into(ctx, &mut bindings)?));
        }

        let mut text = format!("CALL {}({})", self.procedure, format_list(&args));
        if !self.yields.is_empty() {
            for column in &self.yields {
                validate_alias("call", column)?;
            }
            text.push_str(&format!(" YIELD {}", self.yields.join(", ")));
        }
        if let Some(filter) = &self.filter {
            if self.yields.is_empty() {
                return Err(QueryError::failure(
                    "call",
                    "a filter requires a YIELD list to filter on",
                ));
            }
            text.push_str(&format!(" WHERE {}", filter.render_into(ctx, &mut bindings)?));
        }
        Ok(Fragment::new(text, bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::reference::PropertyRef;
    use crate::value::Value;
    use rstest::rstest;

    fn render(clause: &Call) -> Result<Fragment, QueryError> {
        clause.render(&mut CompileContext::default())
    }

    #[rstest]
    fn test_no_arguments() {
        assert_eq!(render(&Call::new("db.labels")).unwrap().text, "CALL db.labels()");
    }

    #[rstest]
    fn test_each_argument_binds() {
        let clause = Call::new("table_info").arg("Person");
        let fragment = render(&clause).unwrap();
        assert_eq!(fragment.text, "CALL table_info($param1)");
        assert_eq!(fragment.bindings.get("param1"), Some(&Value::from("Person")));
    }

    #[rstest]
    fn test_options_yield_and_filter() {
        let clause = Call::new("QUERY_FTS_INDEX")
            .arg("Document")
            .arg("title_idx")
            .arg("graph")
            .option("top", 5i64)
            .yielding(["node", "score"])
            .filter(PropertyRef::new("node", "title").contains("db"));
        let fragment = render(&clause).unwrap();
        assert_eq!(
            fragment.text,
            "CALL QUERY_FTS_INDEX($param1, $param2, $param3, top := $param4) YIELD node, score WHERE node.title CONTAINS $param5"
        );
        assert_eq!(fragment.bindings.len(), 5);
    }

    #[rstest]
    fn test_filter_without_yield_fails() {
        let clause = Call::new("db.labels").filter(Predicate::literal(true));
        assert!(render(&clause).is_err());
    }

    #[rstest]
    #[case(Call::new("drop table"))]
    #[case(Call::new("proc").option("bad name", 1i64))]
    #[case(Call::new("proc").yielding(["a b"]))]
    fn test_invalid_names(#[case] clause: Call) {
        assert!(render(&clause).is_err());
    }
}
