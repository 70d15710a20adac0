//! Helper utilities for statement rendering.
//!
//! Common functions used across clause renderers to keep identifier checks
//! and list formatting consistent.

use crate::error::QueryError;

/// True when `name` can appear unquoted as an alias, label or column.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Validate a pattern alias.
pub fn validate_alias(component: &'static str, alias: &str) -> Result<(), QueryError> {
    if alias.is_empty() {
        return Err(QueryError::failure(component, "alias must not be empty"));
    }
    if !is_identifier(alias) {
        return Err(QueryError::failure(
            component,
            format!("'{}' is not a valid alias", alias),
        ));
    }
    Ok(())
}

/// Format a label, table or column name, quoting it with backticks when it
/// is not a plain identifier.
pub fn format_name(component: &'static str, name: &str) -> Result<String, QueryError> {
    if name.is_empty() {
        return Err(QueryError::failure(component, "name must not be empty"));
    }
    if is_identifier(name) {
        Ok(name.to_string())
    } else {
        Ok(format!("`{}`", name.replace('`', "``")))
    }
}

/// Validate a procedure name such as `db.labels` or `QUERY_VECTOR_INDEX`.
pub fn validate_procedure(component: &'static str, name: &str) -> Result<(), QueryError> {
    if name.split('.').all(is_identifier) {
        Ok(())
    } else {
        Err(QueryError::failure(
            component,
            format!("'{}' is not a valid procedure name", name),
        ))
    }
}

/// Format a list of rendered items as a comma-separated string.
pub fn format_list(items: &[String]) -> String {
    items.join(", ")
}

/// Format a float vector as an inline list literal.
///
/// Non-finite elements have no literal form and are rejected.
pub fn format_vector(component: &'static str, vector: &[f32]) -> Result<String, QueryError> {
    let mut items = Vec::with_capacity(vector.len());
    for (i, v) in vector.iter().enumerate() {
        if !v.is_finite() {
            return Err(QueryError::failure(
                component,
                format!("vector element {} is not finite ({})", i, v),
            ));
        }
        items.push(format!("{:?}", v));
    }
    Ok(format!("[{}]", items.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("p", true)]
    #[case("_tmp", true)]
    #[case("node2", true)]
    #[case("2node", false)]
    #[case("a-b", false)]
    #[case("", false)]
    fn test_is_identifier(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_identifier(name), expected);
    }

    #[test]
    fn test_validate_alias_rejects_empty() {
        let err = validate_alias("match", "").unwrap_err();
        assert!(err.to_string().contains("alias must not be empty"));
    }

    #[test]
    fn test_format_name_quotes_when_needed() {
        assert_eq!(format_name("match", "Person").unwrap(), "Person");
        assert_eq!(format_name("match", "first name").unwrap(), "`first name`");
        assert_eq!(format_name("match", "a`b").unwrap(), "`a``b`");
    }

    #[test]
    fn test_validate_procedure() {
        assert!(validate_procedure("call", "db.labels").is_ok());
        assert!(validate_procedure("call", "QUERY_VECTOR_INDEX").is_ok());
        assert!(validate_procedure("call", "db..labels").is_err());
        assert!(validate_procedure("call", "drop table").is_err());
    }

    #[test]
    fn test_format_list() {
        let items = vec!["p".to_string(), "q.name".to_string()];
        assert_eq!(format_list(&items), "p, q.name");
    }

    #[test]
    fn test_format_vector() {
        assert_eq!(format_vector("vector", &[0.5, 1.0, -2.25]).unwrap(), "[0.5, 1.0, -2.25]");
        assert!(format_vector("vector", &[0.5, f32::NAN]).is_err());
    }
}
