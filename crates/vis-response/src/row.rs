use serde::Serialize;
use serde_json::Value;

/// One bucket key along a row's path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    /// Tree key of the aggregation that produced the bucket (`_agg_<k>`).
    pub agg_key: String,
    pub agg: String,
    pub key: Value,
    pub label: String,
}

/// One metric value along a row's path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub agg_key: String,
    pub agg: String,
    pub value: Value,
}

/// A flattened response row: the ancestor bucket keys plus metric values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    /// Document count of the deepest bucket on the path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_count: Option<u64>,
}

impl Row {
    pub fn dimension(&self, agg_key: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.agg_key == agg_key)
    }

    pub fn metric(&self, agg_key: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.agg_key == agg_key)
    }
}
