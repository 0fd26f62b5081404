//! Integration tests for vis-core tables.

use proptest::prelude::*;
use vis_core::{Category, CategoryRegistry, TypeRegistry, VisRegistry};

#[test]
fn yaml_tables_build_a_registry() {
    let categories = CategoryRegistry::from_yaml_str(
        r#"
categories:
  - name: metric
    min: 1
    order: 0
    config_defaults:
      agg: count
      aggParams: {}
  - name: bucket
    min: 0
    order: 1
    config_defaults:
      agg: terms
      aggParams:
        size: 5
"#,
    )
    .unwrap();
    let types = TypeRegistry::from_yaml_str(
        r#"
types:
  - name: histogram
  - name: donut
    config:
      bucket:
        min: 1
"#,
    )
    .unwrap();

    let registry = VisRegistry::new(categories, types);
    assert_eq!(registry.types().default_type(), "histogram");

    let donut = registry.type_def("donut").unwrap();
    let effective = registry.effective_categories(&donut);
    assert_eq!(effective.len(), 2);
    assert_eq!(effective[0].name, "metric");
    assert_eq!(effective[1].min, 1);
    assert_eq!(effective[1].config_defaults["aggParams"]["size"], 5);
}

#[test]
fn malformed_table_is_a_config_error() {
    let err = CategoryRegistry::from_yaml_str("categories: [").unwrap_err();
    assert!(err.to_string().contains("Invalid registry table"));
}

proptest! {
    #[test]
    fn fetch_order_is_sorted_permutation(orders in prop::collection::vec(-5_i32..5, 0..8)) {
        let categories: Vec<Category> = orders
            .iter()
            .enumerate()
            .map(|(i, &order)| Category::new(format!("c{i}"), 0, order))
            .collect();
        let registry = CategoryRegistry::new(categories).unwrap();

        let fetched = registry.fetch_order();
        prop_assert_eq!(fetched.len(), registry.len());
        for pair in fetched.windows(2) {
            prop_assert!(pair[0].order <= pair[1].order);
        }
        for category in registry.all() {
            prop_assert!(fetched.iter().any(|c| c.name == category.name));
        }
    }
}
