//! `UNWIND`.

use crate::builder::helpers::validate_alias;
use crate::builder::params::Bindings;
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum UnwindSource {
    /// A collection passed as one binding.
    Value(Value),
    /// A parameter the caller binds under its own name.
    Parameter(String),
}

/// Expand a collection into one row per element under `alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct Unwind {
    source: UnwindSource,
    alias: String,
}

impl Unwind {
    pub fn new(values: impl Into<Value>, alias: impl Into<String>) -> Self {
        Self {
            source: UnwindSource::Value(values.into()),
            alias: alias.into(),
        }
    }

    pub fn parameter(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            source: UnwindSource::Parameter(name.into()),
            alias: alias.into(),
        }
    }
}

impl Render for Unwind {
    fn keyword(&self) -> &'static str {
        "UNWIND"
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        validate_alias("unwind", &self.alias)?;
        let mut bindings = Bindings::new();
        let source = match &self.source {
            UnwindSource::Value(value @ Value::List(_)) => {
                ctx.bind_anonymous(&mut bindings, value.clone())?
            }
            UnwindSource::Value(other) => {
                return Err(QueryError::failure(
                    "unwind",
                    format!("expected a list, got {}", other.kind_name()),
                ));
            }
            UnwindSource::Parameter(name) => ctx.caller_parameter("unwind", name)?,
        };
        Ok(Fragment::new(
            format!("UNWIND {} AS {}", source, self.alias),
            bindings,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn render(clause: &Unwind) -> Result<Fragment, QueryError> {
        clause.render(&mut CompileContext::default())
    }

    #[rstest]
    fn test_collection_is_one_binding() {
        let fragment = render(&Unwind::new(vec![1i64, 2, 3], "n")).unwrap();
        assert_eq!(fragment.text, "UNWIND $param1 AS n");
        assert_eq!(fragment.bindings.len(), 1);
        assert_eq!(fragment.bindings.get("param1"), Some(&Value::from(vec![1i64, 2, 3])));
    }

    #[rstest]
    fn test_named_parameter() {
        let fragment = render(&Unwind::parameter("rows", "row")).unwrap();
        assert_eq!(fragment.text, "UNWIND $rows AS row");
        assert!(fragment.bindings.is_empty());
    }

    #[rstest]
    #[case("param2")]
    #[case("not a name")]
    fn test_named_parameter_rejected(#[case] name: &str) {
        assert!(matches!(
            render(&Unwind::parameter(name, "row")),
            Err(QueryError::CompilationFailure { component: "unwind", .. })
        ));
    }

    #[rstest]
    fn test_scalar_rejected() {
        assert!(render(&Unwind::new(5i64, "n")).is_err());
    }

    #[rstest]
    fn test_alias_required() {
        assert!(render(&Unwind::new(vec![1i64], "")).is_err());
    }
}
