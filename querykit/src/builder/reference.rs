//! Property references.
//!
//! A [`PropertyRef`] names one column on a pattern alias and renders as
//! `alias.column`. References built from a domain type resolve the column
//! through the type's mapping table, so a declared column name always wins
//! over the property name.

use std::fmt;
use std::marker::PhantomData;

use super::expr::Expr;
use super::helpers::{format_name, validate_alias};
use super::predicate::{CompareOp, Operand, Predicate, StringMatch};
use crate::schema::{GraphModel, PropertyDef};
use crate::value::Value;
use crate::error::QueryError;

/// Reference to a column on a pattern alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    alias: String,
    column: String,
}

impl PropertyRef {
    /// Reference a raw column name.
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }

    /// Reference a property of `M`, resolving its column through the
    /// mapping table. Undeclared properties map to their own name.
    pub fn of<M: GraphModel>(alias: impl Into<String>, property: &str) -> Self {
        Self::new(alias, M::schema().column_for(property))
    }

    /// Reference a typed property descriptor.
    pub fn property<M: GraphModel>(alias: impl Into<String>, property: &Property<M>) -> Self {
        Self::new(alias, property.column())
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Render as `alias.column`.
    pub fn render(&self) -> Result<String, QueryError> {
        validate_alias("property reference", &self.alias)?;
        if self.column.is_empty() {
            return Err(QueryError::failure(
                "property reference",
                format!("column on '{}' must not be empty", self.alias),
            ));
        }
        Ok(format!(
            "{}.{}",
            self.alias,
            format_name("property reference", &self.column)?
        ))
    }

    fn compare(&self, op: CompareOp, value: impl Into<Value>) -> Predicate {
        Predicate::compare(self.clone(), op, Operand::Value(value.into()))
    }

    fn compare_ref(&self, op: CompareOp, other: &PropertyRef) -> Predicate {
        Predicate::compare(self.clone(), op, Operand::Ref(other.clone()))
    }

    pub fn eq(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    pub fn lt(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    pub fn lte(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lte, value)
    }

    pub fn gt(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    pub fn gte(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gte, value)
    }

    pub fn eq_ref(&self, other: &PropertyRef) -> Predicate {
        self.compare_ref(CompareOp::Eq, other)
    }

    pub fn ne_ref(&self, other: &PropertyRef) -> Predicate {
        self.compare_ref(CompareOp::Ne, other)
    }

    pub fn lt_ref(&self, other: &PropertyRef) -> Predicate {
        self.compare_ref(CompareOp::Lt, other)
    }

    pub fn gt_ref(&self, other: &PropertyRef) -> Predicate {
        self.compare_ref(CompareOp::Gt, other)
    }

    /// Compare against an already-named parameter.
    pub fn eq_param(&self, name: impl Into<String>) -> Predicate {
        Predicate::compare(self.clone(), CompareOp::Eq, Operand::Parameter(name.into()))
    }

    /// Membership test against one collection binding.
    pub fn is_in(&self, values: impl Into<Value>) -> Predicate {
        Predicate::is_in(self.clone(), values.into())
    }

    pub fn contains(&self, value: impl Into<Value>) -> Predicate {
        Predicate::string_match(self.clone(), StringMatch::Contains, value.into())
    }

    pub fn starts_with(&self, value: impl Into<Value>) -> Predicate {
        Predicate::string_match(self.clone(), StringMatch::StartsWith, value.into())
    }

    pub fn ends_with(&self, value: impl Into<Value>) -> Predicate {
        Predicate::string_match(self.clone(), StringMatch::EndsWith, value.into())
    }

    /// Regular-expression match. The pattern is validated at render time.
    pub fn matches(&self, pattern: impl Into<String>) -> Predicate {
        Predicate::string_match(self.clone(), StringMatch::Regex, Value::String(pattern.into()))
    }

    pub fn is_null(&self) -> Predicate {
        Predicate::is_null(self.clone())
    }

    pub fn is_not_null(&self) -> Predicate {
        Predicate::is_not_null(self.clone())
    }

    /// Use this reference as a projection or operand expression.
    pub fn expr(&self) -> Expr {
        Expr::Property(self.clone())
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.column)
    }
}

/// Typed property descriptor of a domain type.
///
/// Declared once per property as a constant and resolved through
/// `M::schema()` when used:
///
/// ```ignore
/// const EMAIL: Property<Person> = Property::new("email");
/// let reference = EMAIL.on("p");
/// ```
pub struct Property<M> {
    name: &'static str,
    _model: PhantomData<fn() -> M>,
}

impl<M> Property<M> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _model: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<M: GraphModel> Property<M> {
    /// Mapped column, or the property name when none is declared.
    pub fn column(&self) -> &'static str {
        M::schema().column_for(self.name)
    }

    /// Declared definition, if the schema lists this property.
    pub fn definition(&self) -> Option<&'static PropertyDef> {
        M::schema().property(self.name)
    }

    /// Declared definition, failing when the schema does not list it.
    pub fn require(&self) -> Result<&'static PropertyDef, QueryError> {
        self.definition().ok_or_else(|| QueryError::MissingColumnMapping {
            type_name: M::schema().name.to_string(),
            property: self.name.to_string(),
        })
    }

    /// Bind this property to a pattern alias.
    pub fn on(&self, alias: impl Into<String>) -> PropertyRef {
        PropertyRef::property(alias, self)
    }
}

impl<M> Clone for Property<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Property<M> {}

impl<M> fmt::Debug for Property<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Knows, Person};
    use rstest::rstest;

    const EMAIL: Property<Person> = Property::new("email");
    const NAME: Property<Person> = Property::new("name");
    const SINCE: Property<Knows> = Property::new("since");

    #[rstest]
    fn test_render_alias_dot_column() {
        assert_eq!(PropertyRef::new("p", "name").render().unwrap(), "p.name");
    }

    #[rstest]
    fn test_mapping_wins_over_property_name() {
        let reference = PropertyRef::of::<Person>("p", "email");
        assert_eq!(reference.column(), "email_address");
        assert_eq!(reference.render().unwrap(), "p.email_address");
    }

    #[rstest]
    fn test_undeclared_property_falls_back() {
        let reference = PropertyRef::of::<Person>("p", "nickname");
        assert_eq!(reference.render().unwrap(), "p.nickname");
    }

    #[rstest]
    fn test_typed_descriptor() {
        assert_eq!(EMAIL.on("p").render().unwrap(), "p.email_address");
        assert_eq!(NAME.column(), "name");
        assert_eq!(SINCE.on("k").render().unwrap(), "k.since");
    }

    #[rstest]
    fn test_require_missing_property() {
        const MISSING: Property<Person> = Property::new("nickname");
        let err = MISSING.require().unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingColumnMapping {
                type_name: "Person".to_string(),
                property: "nickname".to_string(),
            }
        );
        assert!(EMAIL.require().is_ok());
    }

    #[rstest]
    #[case("", "name")]
    #[case("p", "")]
    #[case("not an alias", "name")]
    fn test_render_rejects_invalid_parts(#[case] alias: &str, #[case] column: &str) {
        let err = PropertyRef::new(alias, column).render().unwrap_err();
        assert!(matches!(err, QueryError::CompilationFailure { .. }));
    }

    #[rstest]
    fn test_quoting_unusual_column() {
        assert_eq!(
            PropertyRef::new("p", "first name").render().unwrap(),
            "p.`first name`"
        );
    }
}
