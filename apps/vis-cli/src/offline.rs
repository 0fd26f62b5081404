//! Collaborators usable without a running search cluster.

use async_trait::async_trait;
use serde_json::Value;
use vis_saved::{
    IndexPattern, IndexPatternLoader, QueryEngine, SavedSearch, SavedSearchLoader, SavedVisError,
    SavedVisResult, SearchSource,
};

/// Treats every index pattern id as its own title.
pub struct NamedIndexPatterns;

#[async_trait]
impl IndexPatternLoader for NamedIndexPatterns {
    async fn get(&self, id: &str) -> SavedVisResult<IndexPattern> {
        Ok(IndexPattern::named(id))
    }
}

/// Saved searches live in the cluster, so offline they never resolve.
pub struct NoSavedSearches;

#[async_trait]
impl SavedSearchLoader for NoSavedSearches {
    async fn get(&self, id: &str) -> SavedVisResult<SavedSearch> {
        Err(SavedVisError::Resolution {
            message: format!("saved search '{id}' cannot be resolved offline"),
        })
    }
}

/// Answers every query with a response captured earlier.
pub struct RecordedResponse {
    response: Option<Value>,
}

impl RecordedResponse {
    pub fn new(response: Option<Value>) -> Self {
        Self { response }
    }
}

#[async_trait]
impl QueryEngine for RecordedResponse {
    async fn execute(&self, source: &SearchSource) -> SavedVisResult<Value> {
        tracing::debug!(request = %source.to_request(), "answering from recorded response");
        self.response.clone().ok_or_else(|| SavedVisError::Query {
            message: "no recorded response was supplied".to_string(),
        })
    }
}
