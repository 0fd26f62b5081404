//! Flattening canned responses against trees built from real state.

use serde_json::json;
use vis_core::VisRegistry;
use vis_response::{FlattenError, flatten};
use vis_state::{AggregationTree, VisualizationState};

/// split (terms) -> segment (date_histogram) -> metric (avg) in the standard table.
fn three_level_tree() -> AggregationTree {
    let mut vis = VisualizationState::create(VisRegistry::standard(), "histogram", None, None).unwrap();
    let metric = vis.configs()[0].id();
    vis.config_mut(metric).unwrap().agg = "avg".into();
    vis.add_config("segment").unwrap();
    vis.add_config("split").unwrap();
    vis.build_aggregation_tree()
}

#[test]
fn rows_per_leaf_bucket_path() {
    let tree = three_level_tree();
    let aggs: Vec<&str> = tree.nodes().iter().map(|n| n.agg.as_str()).collect();
    assert_eq!(aggs, vec!["terms", "date_histogram", "avg"]);

    let response = json!({
        "hits": {"total": 30},
        "aggregations": {
            "_agg_0": {"buckets": [
                {"key": "web-1", "doc_count": 20, "_agg_1": {"buckets": [
                    {"key": 1000, "key_as_string": "t0", "doc_count": 12, "_agg_2": {"value": 3.5}},
                    {"key": 2000, "key_as_string": "t1", "doc_count": 8, "_agg_2": {"value": 1.0}}
                ]}},
                {"key": "web-2", "doc_count": 10, "_agg_1": {"buckets": [
                    {"key": 1000, "key_as_string": "t0", "doc_count": 10, "_agg_2": {"value": null}}
                ]}}
            ]}
        }
    });

    let rows = flatten(&response, &tree).unwrap();
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].dimensions.len(), 2);
    assert_eq!(rows[0].dimensions[0].label, "web-1");
    assert_eq!(rows[0].dimensions[1].label, "t0");
    assert_eq!(rows[0].dimensions[1].key, json!(1000));
    assert_eq!(rows[0].metric("_agg_2").unwrap().value, json!(3.5));
    assert_eq!(rows[0].doc_count, Some(12));

    assert_eq!(rows[1].dimension("_agg_1").unwrap().label, "t1");
    assert_eq!(rows[2].dimension("_agg_0").unwrap().key, json!("web-2"));
    assert_eq!(rows[2].metric("_agg_2").unwrap().value, json!(null));
}

#[test]
fn metric_before_bucket_descends_into_metric_node() {
    // Fetch order of a metric-first table nests the bucket inside the metric.
    use vis_core::{Category, CategoryRegistry, TypeDef, TypeRegistry};

    let categories = CategoryRegistry::new(vec![
        Category::new("metric", 1, 0)
            .with_defaults(json!({"agg": "count"}).as_object().cloned().unwrap()),
        Category::new("bucket", 0, 1)
            .with_defaults(json!({"agg": "terms"}).as_object().cloned().unwrap()),
    ])
    .unwrap();
    let types = TypeRegistry::new(vec![TypeDef::new("histogram")], "histogram").unwrap();
    let mut vis =
        VisualizationState::create(VisRegistry::new(categories, types), "histogram", None, None).unwrap();
    vis.add_config("bucket").unwrap();
    let tree = vis.build_aggregation_tree();

    let response = json!({
        "_agg_0": {"value": 42, "_agg_1": {"buckets": [
            {"key": "a", "doc_count": 40},
            {"key": "b", "doc_count": 2}
        ]}}
    });
    let rows = flatten(&response, &tree).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].metrics[0].value, json!(42));
    assert_eq!(rows[1].dimensions[0].label, "b");
    assert_eq!(rows[1].doc_count, Some(2));
}

#[test]
fn keyed_buckets_use_their_names() {
    let tree = three_level_tree();
    let response = json!({"aggregations": {"_agg_0": {"buckets": {
        "errors": {"doc_count": 3, "_agg_1": {"buckets": [
            {"key": 1, "doc_count": 3, "_agg_2": {"value": 9}}
        ]}}
    }}}});

    let rows = flatten(&response, &tree).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dimensions[0].key, json!("errors"));
    assert_eq!(rows[0].dimensions[1].label, "1");
}

#[test]
fn empty_buckets_produce_no_rows() {
    let tree = three_level_tree();
    let response = json!({"aggregations": {"_agg_0": {"buckets": []}}});
    assert!(flatten(&response, &tree).unwrap().is_empty());
}

#[test]
fn missing_node_is_shape_mismatch() {
    let tree = three_level_tree();
    let response = json!({"aggregations": {"_agg_0": {"buckets": [
        {"key": "web-1", "doc_count": 1, "_agg_7": {"buckets": []}}
    ]}}});

    let err = flatten(&response, &tree).unwrap_err();
    assert_eq!(
        err,
        FlattenError::ShapeMismatch {
            key: "_agg_1".into(),
            depth: 1
        }
    );

    let err = flatten(&json!({"aggregations": {}}), &tree).unwrap_err();
    assert!(matches!(err, FlattenError::ShapeMismatch { depth: 0, .. }));
}

#[test]
fn non_object_node_is_rejected() {
    let tree = three_level_tree();
    let err = flatten(&json!({"_agg_0": 5}), &tree).unwrap_err();
    assert_eq!(err, FlattenError::NotAnObject { key: "_agg_0".into() });
}

#[test]
fn empty_tree_reports_total_hits() {
    let rows = flatten(&json!({"hits": {"total": 99}}), &AggregationTree::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].dimensions.is_empty());
    assert_eq!(rows[0].doc_count, Some(99));
}
