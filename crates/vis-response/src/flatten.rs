//! Walk a response in lock-step with the aggregation tree that produced it.

use serde_json::{Map, Value};
use vis_state::{AGG_KEY_PREFIX, AggNode, AggregationTree};

use crate::{Dimension, FlattenError, FlattenResult, Metric, Row};

/// Flatten `response` into one row per complete bucket path.
///
/// `response` may be the full search response or just its `aggregations`
/// object. Each level of the walk expects the `_agg_<k>` node the tree put
/// there:
/// - nodes with `buckets` fan out, one dimension per bucket
/// - any other node is a metric; its value is recorded and the walk continues
///   inside it
///
/// Paths that end in an empty bucket list produce no rows. An empty tree
/// yields a single row carrying the total hit count.
pub fn flatten(response: &Value, tree: &AggregationTree) -> FlattenResult<Vec<Row>> {
    if tree.is_empty() {
        let row = Row {
            doc_count: total_hits(response),
            ..Row::default()
        };
        return Ok(vec![row]);
    }

    let root = match response.get("aggregations") {
        Some(aggs) if aggs.is_object() => aggs,
        _ => response,
    };

    let mut rows = Vec::new();
    walk(root, tree, 0, Row::default(), &mut rows)?;
    tracing::debug!(depth = tree.depth(), rows = rows.len(), "flattened response");
    Ok(rows)
}

fn walk(
    node: &Value,
    tree: &AggregationTree,
    depth: usize,
    row: Row,
    rows: &mut Vec<Row>,
) -> FlattenResult<()> {
    let Some(agg) = tree.node(depth) else {
        rows.push(row);
        return Ok(());
    };

    let child = node
        .as_object()
        .and_then(|obj| obj.get(&agg.key))
        .ok_or_else(|| FlattenError::ShapeMismatch {
            key: agg.key.clone(),
            depth,
        })?;
    let child_obj = child.as_object().ok_or_else(|| FlattenError::NotAnObject {
        key: agg.key.clone(),
    })?;

    match child_obj.get("buckets") {
        Some(Value::Array(buckets)) => {
            for bucket in buckets {
                let key = bucket.get("key").cloned().unwrap_or(Value::Null);
                visit_bucket(bucket, key, agg, tree, depth, &row, rows)?;
            }
        }
        Some(Value::Object(keyed)) => {
            for (name, bucket) in keyed {
                visit_bucket(bucket, Value::String(name.clone()), agg, tree, depth, &row, rows)?;
            }
        }
        Some(_) => {
            return Err(FlattenError::NotAnObject {
                key: format!("{}.buckets", agg.key),
            });
        }
        None => {
            let mut row = row;
            row.metrics.push(Metric {
                agg_key: agg.key.clone(),
                agg: agg.agg.clone(),
                value: metric_value(child_obj),
            });
            walk(child, tree, depth + 1, row, rows)?;
        }
    }

    Ok(())
}

fn visit_bucket(
    bucket: &Value,
    key: Value,
    agg: &AggNode,
    tree: &AggregationTree,
    depth: usize,
    parent: &Row,
    rows: &mut Vec<Row>,
) -> FlattenResult<()> {
    let obj = bucket.as_object().ok_or_else(|| FlattenError::NotAnObject {
        key: agg.key.clone(),
    })?;

    let label = match obj.get("key_as_string") {
        Some(Value::String(s)) => s.clone(),
        _ => label_for(&key),
    };

    let mut row = parent.clone();
    row.dimensions.push(Dimension {
        agg_key: agg.key.clone(),
        agg: agg.agg.clone(),
        key,
        label,
    });
    if let Some(count) = obj.get("doc_count").and_then(Value::as_u64) {
        row.doc_count = Some(count);
    }

    walk(bucket, tree, depth + 1, row, rows)
}

/// `value` when the metric has one, otherwise every non-aggregation field
/// (multi-value metrics such as stats or percentiles).
fn metric_value(obj: &Map<String, Value>) -> Value {
    if let Some(value) = obj.get("value") {
        return value.clone();
    }
    let fields: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| !k.starts_with(AGG_KEY_PREFIX))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(fields)
}

fn label_for(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `hits.total` as either a number or `{ "value": n }`.
fn total_hits(response: &Value) -> Option<u64> {
    let total = response.get("hits")?.get("total")?;
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn labels() {
        assert_eq!(label_for(&json!("GET")), "GET");
        assert_eq!(label_for(&json!(200)), "200");
        assert_eq!(label_for(&Value::Null), "");
    }

    #[test]
    fn metric_value_prefers_value() {
        let single = json!({"value": 4.5});
        assert_eq!(metric_value(single.as_object().unwrap()), json!(4.5));

        let stats = json!({"min": 1, "max": 9, "_agg_3": {"buckets": []}});
        assert_eq!(
            metric_value(stats.as_object().unwrap()),
            json!({"min": 1, "max": 9})
        );
    }

    #[test]
    fn total_hits_forms() {
        assert_eq!(total_hits(&json!({"hits": {"total": 12}})), Some(12));
        assert_eq!(
            total_hits(&json!({"hits": {"total": {"value": 7, "relation": "eq"}}})),
            Some(7)
        );
        assert_eq!(total_hits(&json!({})), None);
    }
}
