//! The immutable tables a visualization is built against.

use std::sync::Arc;

use crate::{CategoryRegistry, CoreResult, EffectiveCategory, TypeDef, TypeRegistry};

/// Category and type tables bundled together.
///
/// Built once at startup and shared (cheaply cloned) by every visualization;
/// tests swap in their own tables.
#[derive(Debug, Clone)]
pub struct VisRegistry {
    categories: Arc<CategoryRegistry>,
    types: Arc<TypeRegistry>,
}

impl VisRegistry {
    pub fn new(categories: CategoryRegistry, types: TypeRegistry) -> Self {
        Self {
            categories: Arc::new(categories),
            types: Arc::new(types),
        }
    }

    pub fn standard() -> Self {
        Self::new(CategoryRegistry::standard(), TypeRegistry::standard())
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn type_def(&self, name: &str) -> CoreResult<Arc<TypeDef>> {
        self.types.by_name(name).cloned()
    }

    /// Every category in registration order, as seen by `type_def`.
    pub fn effective_categories(&self, type_def: &TypeDef) -> Vec<EffectiveCategory> {
        self.categories
            .all()
            .iter()
            .map(|c| c.with_overrides(type_def.overrides(&c.name)))
            .collect()
    }
}

impl Default for VisRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_categories_follow_type() {
        let registry = VisRegistry::standard();
        let pie = registry.type_def("pie").unwrap();
        let effective = registry.effective_categories(&pie);
        let segment = effective.iter().find(|c| c.name == "segment").unwrap();
        assert_eq!(segment.min, 1);
        assert_eq!(segment.config_defaults["agg"], "terms");

        let histogram = registry.type_def("histogram").unwrap();
        let effective = registry.effective_categories(&histogram);
        let segment = effective.iter().find(|c| c.name == "segment").unwrap();
        assert_eq!(segment.min, 0);
        assert_eq!(segment.config_defaults["agg"], "date_histogram");
    }
}
