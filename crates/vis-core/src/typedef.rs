//! Visualization type definitions.
//!
//! A type definition tweaks the shared categories (for example a pie needs at
//! least one segment) and may carry event listeners supplied by the host.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{CoreError, CoreResult, JsonMap};

/// Event handler attached to a visualization type.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Partial per-category settings a type may override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(
        default,
        alias = "configDefaults",
        skip_serializing_if = "Option::is_none"
    )]
    pub config_defaults: Option<JsonMap>,
}

#[derive(Clone, Deserialize)]
pub struct TypeDef {
    pub name: String,
    /// Overrides keyed by category name.
    #[serde(default)]
    pub config: BTreeMap<String, CategoryOverrides>,
    #[serde(skip)]
    listeners: BTreeMap<String, Listener>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: BTreeMap::new(),
            listeners: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, category: impl Into<String>, overrides: CategoryOverrides) -> Self {
        self.config.insert(category.into(), overrides);
        self
    }

    pub fn with_listener(
        mut self,
        event: impl Into<String>,
        handler: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Self {
        self.listeners.insert(event.into(), Arc::new(handler));
        self
    }

    pub fn overrides(&self, category: &str) -> Option<&CategoryOverrides> {
        self.config.get(category)
    }

    pub fn listener(&self, event: &str) -> Option<&Listener> {
        self.listeners.get(event)
    }

    pub fn listener_names(&self) -> impl Iterator<Item = &str> {
        self.listeners.keys().map(String::as_str)
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TypeTable {
    #[serde(default)]
    default_type: Option<String>,
    types: Vec<TypeDef>,
}

/// Immutable table of visualization types.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Vec<Arc<TypeDef>>,
    default_type: String,
}

impl TypeRegistry {
    pub const DEFAULT_TYPE: &'static str = "histogram";

    /// Build a registry; `default_type` must name one of `types`.
    pub fn new(types: Vec<TypeDef>, default_type: impl Into<String>) -> CoreResult<Self> {
        let default_type = default_type.into();
        let mut seen: Vec<Arc<TypeDef>> = Vec::with_capacity(types.len());
        for def in types {
            if seen.iter().any(|t| t.name == def.name) {
                return Err(CoreError::DuplicateType { name: def.name });
            }
            seen.push(Arc::new(def));
        }

        if !seen.iter().any(|t| t.name == default_type) {
            return Err(CoreError::UnknownType { name: default_type });
        }

        Ok(Self {
            types: seen,
            default_type,
        })
    }

    pub fn standard() -> Self {
        let line = TypeDef::new("line").with_override(
            "segment",
            CategoryOverrides {
                min: Some(1),
                config_defaults: None,
            },
        );

        let mut pie_defaults = JsonMap::new();
        pie_defaults.insert("agg".to_string(), json!("terms"));
        let pie = TypeDef::new("pie").with_override(
            "segment",
            CategoryOverrides {
                min: Some(1),
                config_defaults: Some(pie_defaults),
            },
        );

        Self {
            types: vec![
                Arc::new(TypeDef::new(Self::DEFAULT_TYPE)),
                Arc::new(line),
                Arc::new(pie),
            ],
            default_type: Self::DEFAULT_TYPE.to_string(),
        }
    }

    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        let table: TypeTable = serde_yaml::from_str(content)?;
        Self::from_table(table)
    }

    pub fn from_json_str(content: &str) -> CoreResult<Self> {
        let table: TypeTable = serde_json::from_str(content)?;
        Self::from_table(table)
    }

    fn from_table(table: TypeTable) -> CoreResult<Self> {
        let default_type = match table.default_type {
            Some(name) => name,
            None => table
                .types
                .first()
                .map(|t| t.name.clone())
                .ok_or_else(|| CoreError::Config("type table is empty".to_string()))?,
        };
        Self::new(table.types, default_type)
    }

    pub fn by_name(&self, name: &str) -> CoreResult<&Arc<TypeDef>> {
        self.types
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| CoreError::UnknownType {
                name: name.to_string(),
            })
    }

    pub fn default_type(&self) -> &str {
        &self.default_type
    }

    pub fn all(&self) -> &[Arc<TypeDef>] {
        &self.types
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn standard_types() {
        let registry = TypeRegistry::standard();
        assert_eq!(registry.default_type(), "histogram");
        assert!(registry.by_name("histogram").is_ok());
        let pie = registry.by_name("pie").unwrap();
        assert_eq!(pie.overrides("segment").and_then(|o| o.min), Some(1));
        assert!(pie.overrides("metric").is_none());
    }

    #[test]
    fn unknown_type() {
        let registry = TypeRegistry::standard();
        let err = registry.by_name("radar").unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownType {
                name: "radar".into()
            }
        );
    }

    #[test]
    fn default_type_must_exist() {
        let err = TypeRegistry::new(vec![TypeDef::new("line")], "histogram").unwrap_err();
        assert!(matches!(err, CoreError::UnknownType { .. }));
    }

    #[test]
    fn duplicate_types_rejected() {
        let err =
            TypeRegistry::new(vec![TypeDef::new("line"), TypeDef::new("line")], "line").unwrap_err();
        assert!(matches!(err, CoreError::DuplicateType { .. }));
    }

    #[test]
    fn listeners_are_callable() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let def = TypeDef::new("histogram").with_listener("click", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let handler = def.listener("click").unwrap();
        handler(&json!({"x": 1}));
        handler(&Value::Null);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(def.listener("hover").is_none());
        assert_eq!(def.listener_names().collect::<Vec<_>>(), vec!["click"]);
    }

    #[test]
    fn yaml_table() {
        let yaml = r#"
default_type: area
types:
  - name: area
    config:
      segment:
        min: 1
  - name: table
"#;
        let registry = TypeRegistry::from_yaml_str(yaml).unwrap();
        assert_eq!(registry.default_type(), "area");
        let area = registry.by_name("area").unwrap();
        assert_eq!(area.overrides("segment").and_then(|o| o.min), Some(1));
        assert!(registry.by_name("table").unwrap().config.is_empty());
    }

    #[test]
    fn json_table_defaults_to_first_type() {
        let registry = TypeRegistry::from_json_str(r#"{"types":[{"name":"bar"}]}"#).unwrap();
        assert_eq!(registry.default_type(), "bar");
    }
}
