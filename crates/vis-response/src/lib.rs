//! vis-response: turn a nested aggregation response into chart rows.

pub mod flatten;
pub mod row;

pub use flatten::flatten;
pub use row::{Dimension, Metric, Row};

pub type FlattenResult<T> = Result<T, FlattenError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FlattenError {
    /// The response has no node for the aggregation expected at this depth,
    /// so it was not produced by the tree it is being read against.
    #[error("Response shape mismatch: missing {key} at depth {depth}")]
    ShapeMismatch { key: String, depth: usize },

    #[error("Response node for {key} is not an object")]
    NotAnObject { key: String },
}
