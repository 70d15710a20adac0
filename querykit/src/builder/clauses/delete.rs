//! `DELETE` and `DETACH DELETE`.

use crate::builder::helpers::validate_alias;
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    aliases: Vec<String>,
    detach: bool,
}

impl Delete {
    pub fn new<S: Into<String>>(aliases: impl IntoIterator<Item = S>) -> Self {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            detach: false,
        }
    }

    /// Delete nodes together with their relationships.
    pub fn detach<S: Into<String>>(aliases: impl IntoIterator<Item = S>) -> Self {
        Self {
            detach: true,
            ..Self::new(aliases)
        }
    }

    pub fn is_detach(&self) -> bool {
        self.detach
    }
}

impl Render for Delete {
    fn keyword(&self) -> &'static str {
        if self.detach { "DETACH DELETE" } else { "DELETE" }
    }

    fn render(&self, _ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        if self.aliases.is_empty() {
            return Err(QueryError::failure("delete", "at least one alias is required"));
        }
        for alias in &self.aliases {
            validate_alias("delete", alias)?;
        }
        Ok(Fragment::text(format!(
            "{} {}",
            self.keyword(),
            self.aliases.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Delete::new(["p"]), "DELETE p")]
    #[case(Delete::new(["p", "k"]), "DELETE p, k")]
    #[case(Delete::detach(["p"]), "DETACH DELETE p")]
    fn test_delete(#[case] clause: Delete, #[case] expected: &str) {
        let fragment = clause.render(&mut CompileContext::default()).unwrap();
        assert_eq!(fragment.text, expected);
        assert!(fragment.bindings.is_empty());
    }

    #[rstest]
    fn test_delete_requires_alias() {
        let clause = Delete::new(Vec::<String>::new());
        assert!(clause.render(&mut CompileContext::default()).is_err());
    }

    #[rstest]
    fn test_delete_rejects_invalid_alias() {
        let clause = Delete::new(["p; DROP"]);
        assert!(clause.render(&mut CompileContext::default()).is_err());
    }
}
