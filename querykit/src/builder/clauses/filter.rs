//! Stand-alone `WHERE`.

use crate::builder::predicate::Predicate;
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;

/// Filter on the rows produced by the preceding clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    predicate: Predicate,
}

impl Where {
    pub fn new(predicate: Predicate) -> Self {
        Self { predicate }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl From<Predicate> for Where {
    fn from(predicate: Predicate) -> Self {
        Where::new(predicate)
    }
}

impl Render for Where {
    fn keyword(&self) -> &'static str {
        "WHERE"
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        let fragment = self.predicate.render(ctx)?;
        Ok(Fragment::new(format!("WHERE {}", fragment.text), fragment.bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::reference::PropertyRef;
    use crate::value::Value;

    #[test]
    fn test_where_renders_predicate() {
        let clause = Where::new(PropertyRef::new("p", "age").gte(18i64));
        let fragment = clause.render(&mut CompileContext::default()).unwrap();
        assert_eq!(fragment.text, "WHERE p.age >= $param1");
        assert_eq!(fragment.bindings.get("param1"), Some(&Value::Int64(18)));
    }
}
