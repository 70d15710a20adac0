//! Parameter binding registry.
//!
//! Two pieces cooperate here:
//!
//! - [`Bindings`] is the name → value table carried by every rendered
//!   fragment. Merging two tables succeeds when shared names carry equal
//!   values and fails with a conflict otherwise.
//! - [`BindingRegistry`] hands out parameter names during one compilation.
//!   Anonymous names come from a counter owned by the registry; semantic
//!   names are derived from an alias and a column so that independent
//!   fragments describing the same logical value agree on the name.
//!
//! The registry lives inside the [`CompileContext`] of a single compilation,
//! so concurrent compilations never share a counter.

use std::collections::BTreeMap;

use tracing::trace;

use super::helpers::is_identifier;
use crate::config::CompilerConfig;
use crate::error::QueryError;
use crate::value::Value;

/// Type alias for the name → value table handed to the execution service.
pub type Params = BTreeMap<String, Value>;

/// Parameter bindings introduced by a fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    params: Params,
}

impl Bindings {
    pub fn new() -> Self {
        Self {
            params: BTreeMap::new(),
        }
    }

    /// Bind `name` to `value`.
    ///
    /// Re-binding a name to an equal value is a no-op; binding it to a
    /// different value is a conflict.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) -> Result<(), QueryError> {
        let name = name.into();
        match self.params.get(&name) {
            Some(existing) if *existing == value => Ok(()),
            Some(existing) => Err(QueryError::CompilationConflict {
                clause: None,
                name,
                existing: existing.clone(),
                incoming: value,
            }),
            None => {
                self.params.insert(name, value);
                Ok(())
            }
        }
    }

    /// Fold another table into this one under the same rule as [`bind`].
    ///
    /// [`bind`]: Bindings::bind
    pub fn merge(&mut self, other: Bindings) -> Result<(), QueryError> {
        for (name, value) in other.params {
            self.bind(name, value)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.params.iter()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}

impl From<Params> for Bindings {
    fn from(params: Params) -> Self {
        Self { params }
    }
}

/// Source of parameter names for one compilation.
#[derive(Debug, Clone)]
pub struct BindingRegistry {
    prefix: String,
    next: u64,
}

impl BindingRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Reserve a parameter name.
    ///
    /// With an `(alias, column)` hint the name is `<alias>_<column>`, or an
    /// escaped form when that would be ambiguous, identical every time the
    /// same hint is given. Without a hint the name
    /// is `<prefix><n>` from a counter that only ever increases, so two
    /// anonymous names never collide.
    pub fn reserve(&mut self, hint: Option<(&str, &str)>) -> String {
        match hint {
            Some((alias, property)) => semantic_name(alias, property),
            None => {
                let name = format!("{}{}", self.prefix, self.next);
                self.next += 1;
                name
            }
        }
    }

    /// Whether `name` has the shape of an anonymous name from this registry.
    pub fn is_generated(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    }

    /// Number of anonymous names handed out so far.
    pub fn anonymous_count(&self) -> u64 {
        self.next - 1
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new(CompilerConfig::default().parameter_prefix)
    }
}

/// Semantic parameter name for `(alias, property)`.
///
/// Plain pairs render as `<alias>_<property>`. Any other pair (an alias
/// containing `_` or characters outside identifiers) falls back to
/// `_<n>_<alias>_<property>`, where both parts are escaped and `n` is the
/// escaped alias length. Plain names never start with `_`, so distinct
/// pairs always get distinct names.
fn semantic_name(alias: &str, property: &str) -> String {
    let plain_alias = !alias.is_empty() && alias.chars().all(char::is_alphanumeric);
    let plain_property =
        !property.is_empty() && property.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain_alias && plain_property {
        return format!("{}_{}", alias, property);
    }
    let alias = escape_part(alias);
    format!(
        "_{}_{}_{}",
        alias.chars().count(),
        alias,
        escape_part(property)
    )
}

/// `_` becomes `__` and any non-identifier character becomes `_x` plus six
/// hex digits of its code point.
fn escape_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '_' => escaped.push_str("__"),
            c if c.is_alphanumeric() => escaped.push(c),
            c => escaped.push_str(&format!("_x{:06x}", u32::from(c))),
        }
    }
    escaped
}

/// State threaded through every render call of one compilation.
#[derive(Debug, Clone)]
pub struct CompileContext {
    registry: BindingRegistry,
    config: CompilerConfig,
}

impl CompileContext {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            registry: BindingRegistry::new(config.parameter_prefix.clone()),
            config,
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    /// Check a caller-owned parameter name and return its `$name`
    /// placeholder.
    ///
    /// Names shaped like generated anonymous names are rejected, since the
    /// caller's value would then clash with a value the compiler binds.
    pub fn caller_parameter(
        &self,
        component: &'static str,
        name: &str,
    ) -> Result<String, QueryError> {
        if !is_identifier(name) {
            return Err(QueryError::failure(
                component,
                format!("'{}' is not a valid parameter name", name),
            ));
        }
        if self.registry.is_generated(name) {
            return Err(QueryError::failure(
                component,
                format!(
                    "'{}' is reserved for generated parameters (prefix '{}')",
                    name, self.config.parameter_prefix
                ),
            ));
        }
        Ok(placeholder(name))
    }

    /// Bind a value under a fresh anonymous name and return its `$name`
    /// placeholder.
    pub fn bind_anonymous(
        &mut self,
        bindings: &mut Bindings,
        value: Value,
    ) -> Result<String, QueryError> {
        let name = self.registry.reserve(None);
        bindings.bind(name.clone(), value)?;
        Ok(placeholder(&name))
    }

    /// Bind a value under the semantic name for `(alias, column)` and
    /// return its `$name` placeholder.
    pub fn bind_semantic(
        &mut self,
        bindings: &mut Bindings,
        alias: &str,
        column: &str,
        value: Value,
    ) -> Result<String, QueryError> {
        let name = self.registry.reserve(Some((alias, column)));
        if bindings.contains(&name) {
            trace!(parameter = %name, "reusing semantic binding");
        }
        bindings.bind(name.clone(), value)?;
        Ok(placeholder(&name))
    }
}

impl Default for CompileContext {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

/// `$name` placeholder text for a parameter name.
pub fn placeholder(name: &str) -> String {
    format!("${}", name)
}
