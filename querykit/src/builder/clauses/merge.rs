//! `MERGE` with `ON CREATE SET` and `ON MATCH SET` branches.

use crate::builder::helpers::{format_list, format_name, validate_alias};
use crate::builder::params::Bindings;
use crate::builder::pattern::{NodePattern, Pattern};
use crate::builder::{CompileContext, Fragment, Render};
use crate::error::QueryError;
use crate::schema::{GraphModel, ModelSchema, encode_record};
use crate::value::Value;

/// Upsert of one pattern.
///
/// The three property sets render as independent segments. Match
/// properties become inline pattern properties with semantic bindings;
/// on-create and on-match properties become `alias.column = $param`
/// assignments with anonymous bindings. Empty sets render nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pattern: Pattern,
    match_on: Vec<(String, Value)>,
    on_create: Vec<(String, Value)>,
    on_match: Vec<(String, Value)>,
}

impl Merge {
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            pattern: pattern.into(),
            match_on: Vec::new(),
            on_create: Vec::new(),
            on_match: Vec::new(),
        }
    }

    /// Merge a node of `label` bound to `alias`.
    pub fn node(label: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(NodePattern::new(alias).labeled(label))
    }

    /// Merge a node of `M`, resolving property keys through its mapping.
    pub fn of<M: GraphModel>(alias: impl Into<String>) -> Self {
        Self::new(NodePattern::of::<M>(alias))
    }

    /// Upsert a record keyed on `keys`, or on the primary key when `keys` is
    /// empty. Every other encoded property is set on both create and match.
    pub fn record<M: GraphModel>(
        alias: impl Into<String>,
        record: &M,
        keys: &[&str],
    ) -> Result<Self, QueryError> {
        let schema = M::schema();
        let key_columns = key_columns(schema, keys)?;
        let mut merge = Self::new(NodePattern::new(alias).labeled(schema.name));
        for (column, value) in encode_record(record)? {
            if key_columns.iter().any(|key| *key == column) {
                merge.match_on.push((column, value));
            } else {
                merge.on_create.push((column.clone(), value.clone()));
                merge.on_match.push((column, value));
            }
        }
        if let Some(missing) = key_columns
            .iter()
            .find(|key| !merge.match_on.iter().any(|(column, _)| column.as_str() == **key))
        {
            return Err(QueryError::failure(
                "merge",
                format!("{} key '{}' has no value to match on", schema.name, missing),
            ));
        }
        Ok(merge)
    }

    pub fn match_on(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.match_on.push((key.into(), value.into()));
        self
    }

    pub fn on_create(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.on_create.push((key.into(), value.into()));
        self
    }

    pub fn on_match(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.on_match.push((key.into(), value.into()));
        self
    }

    fn match_pattern(&self) -> Result<Pattern, QueryError> {
        let properties = self.match_on.iter().cloned();
        match &self.pattern {
            Pattern::Node(node) => Ok(Pattern::Node(node.clone().properties(properties))),
            Pattern::Edge(edge) => Ok(Pattern::Edge(edge.clone().properties(properties))),
            Pattern::Path(_) => Err(QueryError::failure(
                "merge",
                "variable-length paths cannot be merged",
            )),
        }
    }

    fn render_assignments(
        &self,
        keyword: &str,
        assignments: &[(String, Value)],
        ctx: &mut CompileContext,
        bindings: &mut Bindings,
    ) -> Result<String, QueryError> {
        if assignments.is_empty() {
            return Ok(String::new());
        }
        let alias = self.pattern.alias();
        validate_alias("merge", alias).map_err(|_| {
            QueryError::failure(
                "merge",
                format!("{} requires the merged pattern to have an alias", keyword),
            )
        })?;
        let schema: Option<&'static ModelSchema> = self.pattern.model_schema();
        let mut items = Vec::with_capacity(assignments.len());
        for (key, value) in assignments {
            let column = match schema {
                Some(schema) => schema.column_for(key),
                None => key.as_str(),
            };
            let param = ctx.bind_anonymous(bindings, value.clone())?;
            items.push(format!(
                "{}.{} = {}",
                alias,
                format_name("merge", column)?,
                param
            ));
        }
        Ok(format!("{} {}", keyword, format_list(&items)))
    }
}

fn key_columns(schema: &'static ModelSchema, keys: &[&str]) -> Result<Vec<&'static str>, QueryError> {
    if keys.is_empty() {
        return schema
            .primary_key()
            .map(|def| vec![def.column_name()])
            .ok_or_else(|| {
                QueryError::failure(
                    "merge",
                    format!("{} declares no primary key and no merge keys were given", schema.name),
                )
            });
    }
    keys.iter()
        .map(|key| {
            schema
                .property(key)
                .map(|def| def.column_name())
                .ok_or_else(|| QueryError::MissingColumnMapping {
                    type_name: schema.name.to_string(),
                    property: key.to_string(),
                })
        })
        .collect()
}

impl Render for Merge {
    fn keyword(&self) -> &'static str {
        "MERGE"
    }

    fn render(&self, ctx: &mut CompileContext) -> Result<Fragment, QueryError> {
        if !self.pattern.predicates().is_empty() {
            return Err(QueryError::failure(
                "merge",
                "merged patterns cannot carry predicates",
            ));
        }
        let mut bindings = Bindings::new();
        let pattern = self.match_pattern()?.render_into(ctx, &mut bindings)?;
        let on_create = self.render_assignments("ON CREATE SET", &self.on_create, ctx, &mut bindings)?;
        let on_match = self.render_assignments("ON MATCH SET", &self.on_match, ctx, &mut bindings)?;

        let mut fragment = Fragment::text(format!("MERGE {}", pattern));
        fragment.append(Fragment::text(on_create))?;
        fragment.append(Fragment::new(on_match, bindings))?;
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::pattern::EdgePattern;
    use crate::test_utils::{Document, Person, sample_person};
    use rstest::rstest;

    fn render(clause: &Merge) -> Result<Fragment, QueryError> {
        clause.render(&mut CompileContext::default())
    }

    #[rstest]
    fn test_on_create_only_omits_on_match() {
        let clause = Merge::node("Person", "p")
            .match_on("email", "a@x.com")
            .on_create("status", "active");
        let fragment = render(&clause).unwrap();
        assert_eq!(
            fragment.text,
            "MERGE (p:Person {email: $p_email}) ON CREATE SET p.status = $param1"
        );
        assert!(!fragment.text.contains("ON MATCH"));
        assert_eq!(fragment.bindings.len(), 2);
    }

    #[rstest]
    fn test_on_match_only_omits_on_create() {
        let clause = Merge::node("Person", "p")
            .match_on("email", "a@x.com")
            .on_match("visits", 2i64);
        let fragment = render(&clause).unwrap();
        assert_eq!(
            fragment.text,
            "MERGE (p:Person {email: $p_email}) ON MATCH SET p.visits = $param1"
        );
        assert!(!fragment.text.contains("ON CREATE"));
    }

    #[rstest]
    fn test_both_branches_same_key() {
        let clause = Merge::node("Person", "p")
            .match_on("email", "a@x.com")
            .on_create("status", "new")
            .on_match("status", "seen");
        let fragment = render(&clause).unwrap();
        assert_eq!(
            fragment.text,
            "MERGE (p:Person {email: $p_email}) ON CREATE SET p.status = $param1 ON MATCH SET p.status = $param2"
        );
        assert_eq!(fragment.bindings.len(), 3);
    }

    #[rstest]
    fn test_bare_merge() {
        let fragment = render(&Merge::node("Person", "p")).unwrap();
        assert_eq!(fragment.text, "MERGE (p:Person)");
    }

    #[rstest]
    fn test_columns_resolve_through_schema() {
        let clause = Merge::of::<Person>("p")
            .match_on("email", "a@x.com")
            .on_create("email", "a@x.com");
        let fragment = render(&clause).unwrap();
        assert_eq!(
            fragment.text,
            "MERGE (p:Person {email_address: $p_email_address}) ON CREATE SET p.email_address = $param1"
        );
    }

    #[rstest]
    fn test_edge_merge() {
        let clause = Merge::new(EdgePattern::new("a", "b").named("k").labeled("KNOWS"))
            .on_create("since", 2020i64);
        assert_eq!(
            render(&clause).unwrap().text,
            "MERGE (a)-[k:KNOWS]->(b) ON CREATE SET k.since = $param1"
        );
    }

    #[rstest]
    fn test_assignments_require_alias() {
        let clause = Merge::node("Person", "").on_create("status", "active");
        assert!(render(&clause).is_err());
    }

    #[rstest]
    fn test_record_upsert_on_primary_key() {
        let person = sample_person();
        let clause = Merge::record("p", &person, &[]).unwrap();
        let fragment = render(&clause).unwrap();
        assert!(fragment.text.starts_with("MERGE (p:Person {id: $p_id}) ON CREATE SET p.name = $param1"));
        assert!(fragment.text.contains("ON MATCH SET p.name = $param8"));
        assert_eq!(fragment.bindings.get("p_id"), Some(&Value::Uuid(person.id)));
        assert_eq!(fragment.bindings.len(), 15);
    }

    #[rstest]
    fn test_record_upsert_on_mapped_key() {
        let clause = Merge::record("p", &sample_person(), &["email"]).unwrap();
        let fragment = render(&clause).unwrap();
        assert!(fragment.text.starts_with("MERGE (p:Person {email_address: $p_email_address})"));
    }

    #[rstest]
    fn test_record_unknown_key() {
        let err = Merge::record("p", &sample_person(), &["nickname"]).unwrap_err();
        assert!(matches!(err, QueryError::MissingColumnMapping { .. }));
    }

    #[rstest]
    fn test_record_key_without_value() {
        let person = Person {
            email: None,
            ..sample_person()
        };
        assert!(Merge::record("p", &person, &["email"]).is_err());
    }

    #[rstest]
    fn test_record_primary_key_of_document() {
        let doc = Document {
            id: "d1".to_string(),
            title: "Intro".to_string(),
            embedding: vec![0.1, 0.2, 0.3],
        };
        let fragment = render(&Merge::record("d", &doc, &[]).unwrap()).unwrap();
        assert!(fragment.text.starts_with("MERGE (d:Document {id: $d_id})"));
    }
}
