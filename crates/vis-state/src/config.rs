//! A single configured aggregation.

use serde_json::Value;
use vis_core::{ConfigId, JsonMap, is_reserved_key};

/// Persisted key holding the aggregation type.
pub const AGG_KEY: &str = "agg";
/// Persisted key holding the aggregation parameters.
pub const AGG_PARAMS_KEY: &str = "aggParams";

/// One aggregation entry (type + parameters) owned by a category.
///
/// Anything beyond `agg`/`aggParams` lives in `fields`. Keys there that start
/// with `$$` are UI bookkeeping and are dropped from `to_record`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationConfig {
    id: ConfigId,
    category: String,
    pub agg: String,
    pub agg_params: JsonMap,
    pub fields: JsonMap,
}

impl AggregationConfig {
    /// Seed a config from a copy of the category defaults.
    pub(crate) fn from_defaults(id: ConfigId, category: &str, defaults: &JsonMap) -> Self {
        let mut config = Self {
            id,
            category: category.to_string(),
            agg: String::new(),
            agg_params: JsonMap::new(),
            fields: JsonMap::new(),
        };
        config.apply_record(defaults);
        config
    }

    pub fn id(&self) -> ConfigId {
        self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Overlay persisted fields onto this config (shallow, last write wins).
    ///
    /// Reserved keys are ignored; a non-string `agg` or non-object
    /// `aggParams` leaves the current value in place.
    pub fn apply_record(&mut self, record: &JsonMap) {
        for (key, value) in record {
            if is_reserved_key(key) {
                continue;
            }
            match key.as_str() {
                AGG_KEY => match value {
                    Value::String(agg) => self.agg = agg.clone(),
                    other => tracing::debug!(config = %self.id, value = %other, "ignoring non-string agg"),
                },
                AGG_PARAMS_KEY => match value {
                    Value::Object(params) => self.agg_params = params.clone(),
                    other => {
                        tracing::debug!(config = %self.id, value = %other, "ignoring non-object aggParams")
                    }
                },
                _ => {
                    self.fields.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// The persisted form of this config.
    ///
    /// `agg` is always written, even when empty, so re-applying the record
    /// over category defaults reproduces this config.
    pub fn to_record(&self) -> JsonMap {
        let mut record = JsonMap::new();
        record.insert(AGG_KEY.to_string(), Value::String(self.agg.clone()));
        record.insert(
            AGG_PARAMS_KEY.to_string(),
            Value::Object(self.agg_params.clone()),
        );
        for (key, value) in &self.fields {
            if !is_reserved_key(key) {
                record.insert(key.clone(), value.clone());
            }
        }
        record
    }

    /// Set a field, including transient `$$` ones.
    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_id() -> ConfigId {
        ConfigId::allocate().unwrap()
    }

    fn map(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn seeded_from_defaults() {
        let defaults = map(json!({"agg": "terms", "aggParams": {"size": 5}, "label": "Rows"}));
        let id = new_id();
        let config = AggregationConfig::from_defaults(id, "group", &defaults);
        assert_eq!(config.id(), id);
        assert_eq!(config.category(), "group");
        assert_eq!(config.agg, "terms");
        assert_eq!(config.agg_params["size"], 5);
        assert_eq!(config.field("label"), Some(&json!("Rows")));
    }

    #[test]
    fn params_are_copied_not_shared() {
        let defaults = map(json!({"agg": "terms", "aggParams": {"size": 5}}));
        let mut a = AggregationConfig::from_defaults(new_id(), "group", &defaults);
        let b = AggregationConfig::from_defaults(new_id(), "group", &defaults);
        a.agg_params.insert("size".into(), json!(50));
        assert_eq!(b.agg_params["size"], 5);
        assert_eq!(defaults["aggParams"]["size"], 5);
    }

    #[test]
    fn reserved_fields_never_serialize() {
        let mut config =
            AggregationConfig::from_defaults(new_id(), "metric", &JsonMap::new());
        config.agg = "avg".into();
        config.set_field("$$hashKey", json!("004"));
        config.set_field("field", json!("bytes"));

        let record = config.to_record();
        assert_eq!(record["agg"], "avg");
        assert_eq!(record["field"], "bytes");
        assert!(!record.contains_key("$$hashKey"));
    }

    #[test]
    fn reserved_fields_are_not_accepted_from_records() {
        let mut config =
            AggregationConfig::from_defaults(new_id(), "metric", &JsonMap::new());
        config.apply_record(&map(json!({"$$hashKey": "x", "agg": "sum"})));
        assert_eq!(config.agg, "sum");
        assert!(config.field("$$hashKey").is_none());
    }

    #[test]
    fn malformed_agg_fields_keep_previous_values() {
        let defaults = map(json!({"agg": "count", "aggParams": {}}));
        let mut config = AggregationConfig::from_defaults(new_id(), "metric", &defaults);
        config.apply_record(&map(json!({"agg": 7, "aggParams": "nope"})));
        assert_eq!(config.agg, "count");
        assert!(config.agg_params.is_empty());
    }

    #[test]
    fn empty_agg_is_kept_in_record() {
        let config = AggregationConfig::from_defaults(new_id(), "segment", &JsonMap::new());
        let record = config.to_record();
        assert_eq!(record["agg"], "");
        assert_eq!(record["aggParams"], json!({}));
    }

    #[test]
    fn empty_agg_survives_reapplying_over_defaults() {
        let defaults = map(json!({"agg": "date_histogram", "aggParams": {}}));
        let mut config = AggregationConfig::from_defaults(new_id(), "segment", &defaults);
        config.agg = String::new();

        let mut reloaded = AggregationConfig::from_defaults(new_id(), "segment", &defaults);
        reloaded.apply_record(&config.to_record());
        assert_eq!(reloaded.agg, "");
    }
}
