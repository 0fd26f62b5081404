//! Visualization state: per-category config lists and their persisted form.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use vis_core::{ConfigId, CoreError, EffectiveCategory, JsonMap, TypeDef, VisRegistry};

use crate::{AggregationConfig, AggregationTree, StateError, StateResult};

/// Flat persisted state: category name to the records of its configs.
pub type SerializedState = IndexMap<String, Vec<JsonMap>>;

/// Configs of one category, with the type-adjusted minimum and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryState {
    name: String,
    min: usize,
    config_defaults: JsonMap,
    configs: Vec<AggregationConfig>,
}

impl CategoryState {
    fn new(category: EffectiveCategory) -> Self {
        Self {
            name: category.name,
            min: category.min,
            config_defaults: category.config_defaults,
            configs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn config_defaults(&self) -> &JsonMap {
        &self.config_defaults
    }

    pub fn configs(&self) -> &[AggregationConfig] {
        &self.configs
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

/// Where a visualization's data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelatedSource {
    SavedSearch(String),
    IndexPattern(String),
    Unscoped,
}

/// The editable state of one visualization.
///
/// Every category always holds at least its minimum number of configs once
/// a public method returns.
#[derive(Debug, Clone)]
pub struct VisualizationState {
    pub title: String,
    pub description: String,
    pub related_search_id: Option<String>,
    pub related_index_pattern_id: Option<String>,
    type_name: String,
    type_def: Arc<TypeDef>,
    registry: VisRegistry,
    /// Keyed by category name, in registration order.
    categories: IndexMap<String, CategoryState>,
}

impl VisualizationState {
    /// Fresh state for `type_name`, filled to the category minimums.
    pub fn create(
        registry: VisRegistry,
        type_name: &str,
        related_search_id: Option<String>,
        related_index_pattern_id: Option<String>,
    ) -> StateResult<Self> {
        let type_def = registry.type_def(type_name)?;
        let categories = Self::init_categories(&registry, &type_def);

        let mut state = Self {
            title: String::new(),
            description: String::new(),
            related_search_id,
            related_index_pattern_id,
            type_name: type_name.to_string(),
            type_def,
            registry,
            categories,
        };
        state.fill_to_minimum();
        Ok(state)
    }

    fn init_categories(registry: &VisRegistry, type_def: &TypeDef) -> IndexMap<String, CategoryState> {
        registry
            .effective_categories(type_def)
            .into_iter()
            .map(|c| (c.name.clone(), CategoryState::new(c)))
            .collect()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn type_def(&self) -> &TypeDef {
        &self.type_def
    }

    pub fn registry(&self) -> &VisRegistry {
        &self.registry
    }

    /// Switch visualization type, keeping the current configs.
    ///
    /// Category minimums and defaults are re-derived from the new type and
    /// the existing state is re-applied on top of them.
    pub fn set_type(&mut self, type_name: &str) -> StateResult<()> {
        if type_name == self.type_name {
            return Ok(());
        }

        let type_def = self.registry.type_def(type_name)?;
        let snapshot = self.get_state();

        tracing::debug!(from = %self.type_name, to = %type_name, "switching visualization type");
        self.categories = Self::init_categories(&self.registry, &type_def);
        self.type_def = type_def;
        self.type_name = type_name.to_string();
        self.set_state(&snapshot);
        Ok(())
    }

    /// Parse a persisted `stateJSON` blob.
    pub fn parse_state(serialized: &str) -> StateResult<SerializedState> {
        serde_json::from_str(serialized)
            .map_err(|e| StateError::MalformedPersistedState(e.to_string()))
    }

    /// Apply a persisted `stateJSON` blob.
    ///
    /// A blob that does not parse is treated as an empty state, leaving every
    /// category at its defaults.
    pub fn load_from(&mut self, serialized: &str) {
        let state = match Self::parse_state(serialized) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(type_name = %self.type_name, error = %err, "falling back to default state");
                SerializedState::new()
            }
        };
        self.set_state(&state);
    }

    /// Replace every category's configs with those described by `state`.
    ///
    /// Unknown categories are ignored and missing ones end up empty before the
    /// minimum fill.
    pub fn set_state(&mut self, state: &SerializedState) {
        for name in state.keys() {
            if !self.categories.contains_key(name) {
                tracing::debug!(category = %name, "ignoring unknown category in state");
            }
        }

        let names: Vec<String> = self.categories.keys().cloned().collect();
        for name in names {
            if let Some(category) = self.categories.get_mut(&name) {
                category.configs.clear();
            }

            let Some(records) = state.get(&name) else {
                continue;
            };
            for record in records {
                match self.add_config(&name) {
                    Ok(config) => config.apply_record(record),
                    Err(err) => tracing::debug!(category = %name, error = %err, "skipping record"),
                }
            }
        }

        self.fill_to_minimum();
    }

    /// The persisted form: every category, including empty ones, in
    /// registration order.
    pub fn get_state(&self) -> SerializedState {
        self.categories
            .iter()
            .map(|(name, category)| {
                let records = category.configs.iter().map(AggregationConfig::to_record).collect();
                (name.clone(), records)
            })
            .collect()
    }

    /// `get_state` encoded as the `stateJSON` string.
    pub fn to_state_json(&self) -> StateResult<String> {
        Ok(serde_json::to_string(&self.get_state())?)
    }

    /// Append a config seeded from the category defaults.
    pub fn add_config(&mut self, category_name: &str) -> StateResult<&mut AggregationConfig> {
        let category = self
            .categories
            .get_mut(category_name)
            .ok_or_else(|| CoreError::UnknownCategory {
                name: category_name.to_string(),
            })?;

        let id = ConfigId::allocate()?;

        let config = AggregationConfig::from_defaults(id, &category.name, &category.config_defaults);
        category.configs.push(config);
        let last = category.configs.len() - 1;
        Ok(&mut category.configs[last])
    }

    /// Remove the config with identity `id` from whichever category holds it.
    ///
    /// `None` is a no-op. If the removal leaves a category below its minimum,
    /// a default config is appended so the minimum still holds on return.
    pub fn remove_config(&mut self, id: Option<ConfigId>) -> Option<AggregationConfig> {
        let id = id?;

        let mut removed = None;
        for category in self.categories.values_mut() {
            if let Some(pos) = category.configs.iter().position(|c| c.id() == id) {
                removed = Some(category.configs.remove(pos));
                break;
            }
        }

        if removed.is_some() {
            self.fill_to_minimum();
        }
        removed
    }

    /// Append default configs, in fetch order, until every minimum is met.
    pub fn fill_to_minimum(&mut self) {
        let registry = self.registry.clone();
        for category in registry.categories().fetch_order() {
            let (len, min) = match self.categories.get(&category.name) {
                Some(state) => (state.len(), state.min),
                None => continue,
            };

            for _ in len..min {
                if let Err(err) = self.add_config(&category.name) {
                    tracing::debug!(category = %category.name, error = %err, "fill skipped");
                    break;
                }
            }
            if len < min {
                tracing::debug!(category = %category.name, added = min - len, "filled to minimum");
            }
        }
    }

    /// Every config, grouped by category in fetch order, insertion order within.
    pub fn configs(&self) -> Vec<&AggregationConfig> {
        self.registry
            .categories()
            .fetch_order()
            .into_iter()
            .filter_map(|c| self.categories.get(&c.name))
            .flat_map(|c| c.configs.iter())
            .collect()
    }

    pub fn config_count(&self) -> usize {
        self.categories.values().map(CategoryState::len).sum()
    }

    pub fn config(&self, id: ConfigId) -> Option<&AggregationConfig> {
        self.categories
            .values()
            .flat_map(|c| c.configs.iter())
            .find(|c| c.id() == id)
    }

    pub fn config_mut(&mut self, id: ConfigId) -> Option<&mut AggregationConfig> {
        self.categories
            .values_mut()
            .flat_map(|c| c.configs.iter_mut())
            .find(|c| c.id() == id)
    }

    pub fn category(&self, name: &str) -> Option<&CategoryState> {
        self.categories.get(name)
    }

    /// Categories in registration order.
    pub fn categories(&self) -> impl Iterator<Item = &CategoryState> {
        self.categories.values()
    }

    pub fn build_aggregation_tree(&self) -> AggregationTree {
        AggregationTree::from_configs(self.configs())
    }

    /// The data source this visualization reads from.
    ///
    /// A saved search wins over an index pattern; empty ids count as absent.
    pub fn related_source(&self) -> RelatedSource {
        let non_empty = |id: &Option<String>| id.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

        if let Some(id) = non_empty(&self.related_search_id) {
            RelatedSource::SavedSearch(id)
        } else if let Some(id) = non_empty(&self.related_index_pattern_id) {
            RelatedSource::IndexPattern(id)
        } else {
            RelatedSource::Unscoped
        }
    }

    /// Dispatch `event` to the type definition's listener.
    ///
    /// Returns false when the type has no listener for it.
    pub fn emit(&self, event: &str, payload: &Value) -> bool {
        match self.type_def.listener(event) {
            Some(listener) => {
                listener(payload);
                true
            }
            None => false,
        }
    }
}
