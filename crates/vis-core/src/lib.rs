//! vis-core: static tables shared by every visualization.
//!
//! Contains:
//! - category (aggregation categories, defaults, minimums, fetch order)
//! - typedef (visualization type definitions and their category overrides)
//! - registry (the immutable bundle handed to each visualization)
//! - ids (reference identity for aggregation configs)
//! - error (shared error types)

pub mod category;
pub mod error;
pub mod ids;
pub mod registry;
pub mod typedef;

// Re-exports: nice ergonomics for downstream crates
pub use category::{Category, CategoryRegistry, EffectiveCategory};
pub use error::{CoreError, CoreResult};
pub use ids::ConfigId;
pub use registry::VisRegistry;
pub use typedef::{CategoryOverrides, Listener, TypeDef, TypeRegistry};

/// Key prefix marking transient, UI-only fields on a config.
pub const RESERVED_PREFIX: &str = "$$";

/// Returns true when `key` names a transient field that must never be persisted.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Shallow JSON object used for config defaults and parameters.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
