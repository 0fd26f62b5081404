//! vis-state: the editable aggregation state of one visualization.
//!
//! Provides:
//! - `AggregationConfig`, one configured aggregation within a category
//! - `VisualizationState`, the per-category config lists with their
//!   minimums, persisted-state codec and ordering rules
//! - `AggregationTree`, the nested aggregation request derived from the state
//!
//! # Example
//!
//! ```
//! use vis_core::VisRegistry;
//! use vis_state::VisualizationState;
//!
//! let mut vis = VisualizationState::create(VisRegistry::standard(), "histogram", None, None).unwrap();
//! vis.add_config("segment").unwrap();
//!
//! let tree = vis.build_aggregation_tree();
//! assert_eq!(tree.depth(), 2);
//! assert_eq!(tree.nodes()[0].key, "_agg_0");
//! ```

pub mod config;
pub mod dsl;
pub mod state;

pub use config::{AGG_KEY, AGG_PARAMS_KEY, AggregationConfig};
pub use dsl::{AGG_KEY_PREFIX, AggNode, AggregationTree, agg_key};
pub use state::{CategoryState, RelatedSource, SerializedState, VisualizationState};

use vis_core::CoreError;

pub type StateResult<T> = Result<T, StateError>;

#[derive(thiserror::Error, Debug)]
pub enum StateError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Malformed persisted state: {0}")]
    MalformedPersistedState(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
