//! Nested aggregation request built from a visualization's configs.
//!
//! The tree is a chain, not a fan-out: node `k` is keyed `_agg_<k>` and
//! node `k + 1` sits under node `k`'s `aggs`. Depth equals the number of
//! configs. It is derived on demand and never persisted.

use serde_json::{Value, json};
use vis_core::{ConfigId, JsonMap};

use crate::AggregationConfig;

pub const AGG_KEY_PREFIX: &str = "_agg_";

/// Key of the node at `depth`.
pub fn agg_key(depth: usize) -> String {
    format!("{AGG_KEY_PREFIX}{depth}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggNode {
    pub key: String,
    pub agg: String,
    pub params: JsonMap,
    /// Config this node was built from.
    pub config: ConfigId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationTree {
    nodes: Vec<AggNode>,
}

impl AggregationTree {
    /// Number the configs in the order given and chain them.
    pub fn from_configs<'a>(configs: impl IntoIterator<Item = &'a AggregationConfig>) -> Self {
        let nodes = configs
            .into_iter()
            .enumerate()
            .map(|(i, config)| AggNode {
                key: agg_key(i),
                agg: config.agg.clone(),
                params: config.agg_params.clone(),
                config: config.id(),
            })
            .collect();
        Self { nodes }
    }

    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[AggNode] {
        &self.nodes
    }

    pub fn node(&self, depth: usize) -> Option<&AggNode> {
        self.nodes.get(depth)
    }

    /// The root `aggs` mapping; an empty object when there are no nodes.
    pub fn to_dsl(&self) -> Value {
        // Build inside-out so each node can take ownership of its child.
        let mut child: Option<Value> = None;
        for node in self.nodes.iter().rev() {
            let mut body = JsonMap::new();
            body.insert(node.agg.clone(), Value::Object(node.params.clone()));
            if let Some(inner) = child.take() {
                body.insert("aggs".to_string(), inner);
            }

            let mut aggs = JsonMap::new();
            aggs.insert(node.key.clone(), Value::Object(body));
            child = Some(Value::Object(aggs));
        }
        child.unwrap_or_else(|| Value::Object(JsonMap::new()))
    }

    /// Request body for a hits-free aggregation query.
    pub fn to_request_body(&self) -> Value {
        json!({
            "size": 0,
            "aggs": self.to_dsl(),
        })
    }
}
