//! Collaborators a saved visualization needs from its host.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use vis_core::VisRegistry;

use crate::{IndexPattern, SavedSearch, SavedVisRecord, SavedVisResult, SearchSource};

#[async_trait]
pub trait SavedSearchLoader: Send + Sync {
    async fn get(&self, id: &str) -> SavedVisResult<SavedSearch>;
}

#[async_trait]
pub trait IndexPatternLoader: Send + Sync {
    async fn get(&self, id: &str) -> SavedVisResult<IndexPattern>;
}

/// Executes an aggregation query and returns the raw nested response.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn execute(&self, source: &SearchSource) -> SavedVisResult<Value>;
}

/// Loads and stores saved-visualization records.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn load(&self, id: &str) -> SavedVisResult<SavedVisRecord>;

    /// Store `record`, assigning a fresh id when `id` is `None`; returns the id.
    async fn save(&self, id: Option<&str>, record: &SavedVisRecord) -> SavedVisResult<String>;
}

/// Everything a `SavedVis` talks to, shared between sessions.
#[derive(Clone)]
pub struct VisServices {
    pub registry: VisRegistry,
    pub store: Arc<dyn PersistenceStore>,
    pub saved_searches: Arc<dyn SavedSearchLoader>,
    pub index_patterns: Arc<dyn IndexPatternLoader>,
    pub engine: Arc<dyn QueryEngine>,
}

impl VisServices {
    pub fn new(
        registry: VisRegistry,
        store: Arc<dyn PersistenceStore>,
        saved_searches: Arc<dyn SavedSearchLoader>,
        index_patterns: Arc<dyn IndexPatternLoader>,
        engine: Arc<dyn QueryEngine>,
    ) -> Self {
        Self {
            registry,
            store,
            saved_searches,
            index_patterns,
            engine,
        }
    }
}
