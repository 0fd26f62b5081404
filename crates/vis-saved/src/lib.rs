//! vis-saved: the saved-visualization object and its collaborators.
//!
//! A `SavedVis` pairs a `VisualizationState` with the persisted record it was
//! loaded from, resolves the data source it reads from, and runs the
//! aggregation query through an external engine.

pub mod record;
pub mod saved_vis;
pub mod services;
pub mod source;
pub mod store;

pub use record::{SavedVisOptions, SavedVisRecord};
pub use saved_vis::SavedVis;
pub use services::{IndexPatternLoader, PersistenceStore, QueryEngine, SavedSearchLoader, VisServices};
pub use source::{IndexPattern, SavedSearch, SearchSource};
pub use store::{JsonFileStore, MemoryStore};

use vis_core::CoreError;
use vis_response::FlattenError;
use vis_state::StateError;

pub type SavedVisResult<T> = Result<T, SavedVisError>;

#[derive(thiserror::Error, Debug)]
pub enum SavedVisError {
    #[error("Registry error: {0}")]
    Core(#[from] CoreError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Flatten error: {0}")]
    Flatten(#[from] FlattenError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid saved object id: {0}")]
    InvalidId(String),

    #[error("Failed to resolve related source: {message}")]
    Resolution { message: String },

    #[error("Query execution failed: {message}")]
    Query { message: String },

    #[error("Related source has not been resolved")]
    Unresolved,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
