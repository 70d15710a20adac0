//! `SET` assignments.

use crate::builder::helpers::format_list;
use crate::builder::params::Bindings;
use crate::builder::reference::PropertyRef;
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;
use crate::schema::{GraphModel, encode_record};
use crate::value::Value;

/// Right-hand side of one assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum SetOp {
    /// `target = $p`
    Value(Value),
    /// `target = source`
    Copy(PropertyRef),
    /// `target = target + $p`
    Increment(Value),
    /// `target = target - $p`
    Decrement(Value),
    /// `target = target + $p` with a string operand
    Append(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: PropertyRef,
    pub op: SetOp,
}

impl Assignment {
    pub fn new(target: PropertyRef, op: SetOp) -> Self {
        Self { target, op }
    }

    fn render_into(
        &self,
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        let target = self.target.render()?;
        let rhs = match &self.op {
            SetOp::Value(value) => ctx.bind_anonymous(bindings, value.clone())?,
            SetOp::Copy(source) => source.render()?,
            SetOp::Increment(delta) | SetOp::Decrement(delta) => {
                if !delta.is_numeric() {
                    return Err(QueryError::failure(
                        "set",
                        format!(
                            "{} delta must be numeric, got {}",
                            self.target,
                            delta.kind_name()
                        ),
                    ));
                }
                let op = if matches!(self.op, SetOp::Increment(_)) { "+" } else { "-" };
                let param = ctx.bind_anonymous(bindings, delta.clone())?;
                format!("{} {} {}", target, op, param)
            }
            SetOp::Append(suffix) => {
                if suffix.as_str().is_none() {
                    return Err(QueryError::failure(
                        "set",
                        format!(
                            "{} append expects a string, got {}",
                            self.target,
                            suffix.kind_name()
                        ),
                    ));
                }
                let param = ctx.bind_anonymous(bindings, suffix.clone())?;
                format!("{} + {}", target, param)
            }
        };
        Ok(format!("{} = {}", target, rhs))
    }
}

/// One `SET` keyword followed by comma-joined assignments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Set {
    assignments: Vec<Assignment>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign every encoded property of a record to `alias`.
    pub fn record<M: GraphModel>(alias: &str, record: &M) -> Result<Self, QueryError> {
        let mut set = Self::new();
        for (column, value) in encode_record(record)? {
            set = set.value(PropertyRef::new(alias, column), value);
        }
        Ok(set)
    }

    pub fn assignment(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    pub fn value(self, target: PropertyRef, value: impl Into<Value>) -> Self {
        self.assignment(Assignment::new(target, SetOp::Value(value.into())))
    }

    pub fn copy(self, target: PropertyRef, source: PropertyRef) -> Self {
        self.assignment(Assignment::new(target, SetOp::Copy(source)))
    }

    pub fn increment(self, target: PropertyRef, delta: impl Into<Value>) -> Self {
        self.assignment(Assignment::new(target, SetOp::Increment(delta.into())))
    }

    pub fn decrement(self, target: PropertyRef, delta: impl Into<Value>) -> Self {
        self.assignment(Assignment::new(target, SetOp::Decrement(delta.into())))
    }

    pub fn append(self, target: PropertyRef, suffix: impl Into<Value>) -> Self {
        self.assignment(Assignment::new(target, SetOp::Append(suffix.into())))
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }
}

impl Render for Set {
    fn keyword(&self) -> &'static str {
        "SET"
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        if self.assignments.is_empty() {
            return Err(QueryError::failure("set", "at least one assignment is required"));
        }
        let mut bindings = Bindings::new();
        let items = self
            .assignments
            .iter()
            .map(|a| a.render_into(ctx, &mut bindings))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Fragment::new(format!("SET {}", format_list(&items)), bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_person;
    use rstest::rstest;

    fn render(clause: &Set) -> Result<Fragment, QueryError> {
        clause.render(&mut CompileContext::default())
    }

    fn visits() -> PropertyRef {
        PropertyRef::new("p", "visits")
    }

    #[rstest]
    fn test_literal_and_copy() {
        let clause = Set::new()
            .value(PropertyRef::new("p", "status"), "active")
            .copy(PropertyRef::new("p", "nick"), PropertyRef::new("p", "name"));
        let fragment = render(&clause).unwrap();
        assert_eq!(fragment.text, "SET p.status = $param1, p.nick = p.name");
        assert_eq!(fragment.bindings.len(), 1);
    }

    #[rstest]
    #[case(Set::new().increment(visits(), 1i64), "SET p.visits = p.visits + $param1")]
    #[case(Set::new().decrement(visits(), 2.5f64), "SET p.visits = p.visits - $param1")]
    #[case(Set::new().append(PropertyRef::new("p", "name"), "!"), "SET p.name = p.name + $param1")]
    fn test_read_modify_write(#[case] clause: Set, #[case] expected: &str) {
        let fragment = render(&clause).unwrap();
        assert_eq!(fragment.text, expected);
        assert_eq!(fragment.bindings.len(), 1);
    }

    #[rstest]
    fn test_increment_rejects_non_numeric() {
        let err = render(&Set::new().increment(visits(), "one")).unwrap_err();
        assert!(err.to_string().contains("must be numeric"));
    }

    #[rstest]
    fn test_append_rejects_non_string() {
        assert!(render(&Set::new().append(PropertyRef::new("p", "name"), 1i64)).is_err());
    }

    #[rstest]
    fn test_empty_set_fails() {
        assert!(render(&Set::new()).is_err());
    }

    #[rstest]
    fn test_record_assigns_columns() {
        let fragment = render(&Set::record("p", &sample_person()).unwrap()).unwrap();
        assert!(fragment.text.starts_with("SET p.id = $param1, p.name = $param2"));
        assert!(fragment.text.contains("p.email_address = $param4"));
        assert_eq!(fragment.bindings.len(), 8);
    }
}
