//! Persisted form of a saved visualization.

use serde::{Deserialize, Serialize};

/// The stored document. Field names match the persisted mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedVisRecord {
    #[serde(default)]
    pub title: String,
    /// Absent in sparse records; resolved to the registry's default type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// `VisualizationState::get_state` encoded as JSON.
    #[serde(default, rename = "stateJSON")]
    pub state_json: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_search_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_pattern: Option<String>,
}

/// Options for a visualization that has not been saved yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedVisOptions {
    pub id: Option<String>,
    /// Falls back to the registry's default type.
    pub type_name: Option<String>,
    pub saved_search_id: Option<String>,
    pub index_pattern: Option<String>,
}

impl SavedVisOptions {
    pub fn with_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }
}
