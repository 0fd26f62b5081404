//! Aggregation config categories and their registry.
//!
//! A category is a class of aggregation configs (metric, segment, ...) with
//! its own minimum count and default config shape. The registry is built
//! once and never mutated; it fixes two orders:
//! - registration order, used when reading and writing persisted state
//! - fetch order, used when filling minimums and nesting the DSL tree

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::typedef::CategoryOverrides;
use crate::{CoreError, CoreResult, JsonMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub min: usize,
    #[serde(default, alias = "configDefaults")]
    pub config_defaults: JsonMap,
    /// Fetch priority; lower values nest closer to the root.
    #[serde(default)]
    pub order: i32,
}

impl Category {
    pub fn new(name: impl Into<String>, min: usize, order: i32) -> Self {
        Self {
            name: name.into(),
            min,
            config_defaults: JsonMap::new(),
            order,
        }
    }

    pub fn with_defaults(mut self, defaults: JsonMap) -> Self {
        self.config_defaults = defaults;
        self
    }

    /// Apply a type definition's overrides on top of this category.
    ///
    /// `min` is replaced; defaults are shallow-merged, override keys winning.
    pub fn with_overrides(&self, overrides: Option<&CategoryOverrides>) -> EffectiveCategory {
        let mut effective = EffectiveCategory {
            name: self.name.clone(),
            min: self.min,
            config_defaults: self.config_defaults.clone(),
        };

        if let Some(overrides) = overrides {
            if let Some(min) = overrides.min {
                effective.min = min;
            }
            if let Some(defaults) = &overrides.config_defaults {
                for (key, value) in defaults {
                    effective.config_defaults.insert(key.clone(), value.clone());
                }
            }
        }

        effective
    }
}

/// A category as seen by one visualization type.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveCategory {
    pub name: String,
    pub min: usize,
    pub config_defaults: JsonMap,
}

#[derive(Debug, Deserialize)]
struct CategoryTable {
    categories: Vec<Category>,
}

/// Immutable table of categories.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    /// Indices into `categories`, sorted by `order` (stable).
    fetch_order: Vec<usize>,
}

impl CategoryRegistry {
    pub fn new(categories: Vec<Category>) -> CoreResult<Self> {
        for (i, category) in categories.iter().enumerate() {
            if categories[..i].iter().any(|c| c.name == category.name) {
                return Err(CoreError::DuplicateCategory {
                    name: category.name.clone(),
                });
            }
        }

        let mut fetch_order: Vec<usize> = (0..categories.len()).collect();
        fetch_order.sort_by_key(|&i| categories[i].order);

        Ok(Self {
            categories,
            fetch_order,
        })
    }

    /// The built-in table used when no other table is supplied.
    pub fn standard() -> Self {
        let categories = vec![
            Category::new("segment", 0, 2).with_defaults(agg_defaults("date_histogram")),
            Category::new("metric", 1, 4).with_defaults(agg_defaults("count")),
            Category::new("group", 0, 3).with_defaults(agg_defaults("terms")),
            Category::new("split", 0, 1).with_defaults(agg_defaults("terms")),
        ];

        let fetch_order = vec![3, 0, 2, 1];
        Self {
            categories,
            fetch_order,
        }
    }

    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        let table: CategoryTable = serde_yaml::from_str(content)?;
        Self::new(table.categories)
    }

    pub fn from_json_str(content: &str) -> CoreResult<Self> {
        let table: CategoryTable = serde_json::from_str(content)?;
        Self::new(table.categories)
    }

    pub fn by_name(&self, name: &str) -> CoreResult<&Category> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CoreError::UnknownCategory {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    /// Categories in registration order.
    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    /// Categories in the order they are filled and nested.
    pub fn fetch_order(&self) -> Vec<&Category> {
        self.fetch_order
            .iter()
            .map(|&i| &self.categories[i])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn agg_defaults(agg: &str) -> JsonMap {
    let mut defaults = JsonMap::new();
    defaults.insert("agg".to_string(), json!(agg));
    defaults.insert("aggParams".to_string(), json!({}));
    defaults
}
