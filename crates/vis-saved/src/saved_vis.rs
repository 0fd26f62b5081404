//! The saved visualization: state + record + data-source resolution.

use std::fmt;

use vis_response::Row;
use vis_state::{AggregationTree, RelatedSource, VisualizationState};

use crate::services::VisServices;
use crate::{SavedSearch, SavedVisError, SavedVisOptions, SavedVisRecord, SavedVisResult, SearchSource};

/// A visualization being edited, loaded from or destined for a store.
///
/// Owned by one editing session. Mutations go through `state_mut`; the only
/// suspension points are `resolve_source`, `fetch` and the store calls.
pub struct SavedVis {
    id: Option<String>,
    state: VisualizationState,
    saved_search: Option<SavedSearch>,
    services: VisServices,
}

impl fmt::Debug for SavedVis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedVis")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("saved_search", &self.saved_search)
            .finish()
    }
}

impl SavedVis {
    /// A new, unsaved visualization.
    pub fn create(services: VisServices, options: SavedVisOptions) -> SavedVisResult<Self> {
        let type_name = match options.type_name {
            Some(name) => name,
            None => services.registry.types().default_type().to_string(),
        };
        let state = VisualizationState::create(
            services.registry.clone(),
            &type_name,
            options.saved_search_id,
            options.index_pattern,
        )?;

        Ok(Self {
            id: options.id,
            state,
            saved_search: None,
            services,
        })
    }

    /// Load the record stored under `id`.
    pub async fn load(services: VisServices, id: &str) -> SavedVisResult<Self> {
        let record = services.store.load(id).await?;
        tracing::info!(id, type_name = ?record.type_name, "loaded visualization");
        Self::from_record(services, Some(id.to_string()), record)
    }

    /// Rebuild a visualization from its persisted record.
    ///
    /// A record without a type gets the registry's default type. An unknown
    /// type is an error; a malformed `stateJSON` is not, it leaves the
    /// categories at their defaults.
    pub fn from_record(
        services: VisServices,
        id: Option<String>,
        record: SavedVisRecord,
    ) -> SavedVisResult<Self> {
        let type_name = match record.type_name {
            Some(name) => name,
            None => services.registry.types().default_type().to_string(),
        };
        let mut state = VisualizationState::create(
            services.registry.clone(),
            &type_name,
            record.saved_search_id,
            record.index_pattern,
        )?;
        state.title = record.title;
        state.description = record.description;

        if let Some(json) = record.state_json.as_deref().filter(|s| !s.is_empty()) {
            state.load_from(json);
        }

        Ok(Self {
            id,
            state,
            saved_search: None,
            services,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn state(&self) -> &VisualizationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut VisualizationState {
        &mut self.state
    }

    /// The related search from the last `resolve_source`.
    pub fn saved_search(&self) -> Option<&SavedSearch> {
        self.saved_search.as_ref()
    }

    pub fn to_record(&self) -> SavedVisResult<SavedVisRecord> {
        Ok(SavedVisRecord {
            title: self.state.title.clone(),
            type_name: Some(self.state.type_name().to_string()),
            state_json: Some(self.state.to_state_json()?),
            description: self.state.description.clone(),
            saved_search_id: self.state.related_search_id.clone(),
            index_pattern: self.state.related_index_pattern_id.clone(),
        })
    }

    /// Persist the current state; the store assigns an id on first save.
    pub async fn save(&mut self) -> SavedVisResult<String> {
        let record = self.to_record()?;
        let id = self.services.store.save(self.id.as_deref(), &record).await?;
        tracing::info!(id = %id, title = %record.title, "saved visualization");
        self.id = Some(id.clone());
        Ok(id)
    }

    /// Resolve the search this visualization reads from.
    ///
    /// A saved search is loaded as is; an index pattern is wrapped in an empty
    /// search scoped to it; otherwise an unscoped empty search is used.
    /// Loader failures propagate unchanged.
    pub async fn resolve_source(&mut self) -> SavedVisResult<&SavedSearch> {
        let parent = match self.state.related_source() {
            RelatedSource::SavedSearch(id) => self.services.saved_searches.get(&id).await?,
            RelatedSource::IndexPattern(id) => {
                let pattern = self.services.index_patterns.get(&id).await?;
                SavedSearch::synthetic(Some(pattern))
            }
            RelatedSource::Unscoped => SavedSearch::synthetic(None),
        };

        tracing::debug!(
            saved_search = ?parent.id,
            index = ?parent.search_source.effective_index().map(|p| &p.title),
            "resolved related source"
        );
        let resolved = self.saved_search.insert(parent);
        Ok(&*resolved)
    }

    /// The aggregation query for the current state, inheriting the resolved source.
    pub fn search_source(&self) -> SavedVisResult<SearchSource> {
        self.search_source_for(&self.state.build_aggregation_tree())
    }

    fn search_source_for(&self, tree: &AggregationTree) -> SavedVisResult<SearchSource> {
        let parent = self.saved_search.as_ref().ok_or(SavedVisError::Unresolved)?;
        Ok(SearchSource::new()
            .inherits(parent.search_source.clone())
            .size(0)
            .aggs(tree.to_dsl()))
    }

    /// Resolve the source, run the aggregation query and flatten the response.
    pub async fn fetch(&mut self) -> SavedVisResult<Vec<Row>> {
        self.resolve_source().await?;

        let tree = self.state.build_aggregation_tree();
        let source = self.search_source_for(&tree)?;
        let response = self.services.engine.execute(&source).await?;

        let rows = vis_response::flatten(&response, &tree)?;
        tracing::debug!(depth = tree.depth(), rows = rows.len(), "fetched visualization data");
        Ok(rows)
    }
}
