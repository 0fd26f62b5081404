//! Search sources: what a visualization's aggregation query runs against.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPattern {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_field: Option<String>,
}

impl IndexPattern {
    /// A pattern whose title is its id.
    pub fn named(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            time_field: None,
        }
    }
}

/// A query definition that may inherit index and query from a parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSource {
    index: Option<IndexPattern>,
    query: Option<Value>,
    size: Option<u64>,
    aggs: Option<Value>,
    parent: Option<Box<SearchSource>>,
}

impl SearchSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(mut self, index: IndexPattern) -> Self {
        self.index = Some(index);
        self
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn aggs(mut self, aggs: Value) -> Self {
        self.aggs = Some(aggs);
        self
    }

    pub fn inherits(mut self, parent: SearchSource) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn parent(&self) -> Option<&SearchSource> {
        self.parent.as_deref()
    }

    /// Walk up the parent chain until `pick` yields a value.
    fn inherited<'a, T>(&'a self, pick: impl Fn(&'a SearchSource) -> Option<&'a T>) -> Option<&'a T> {
        let mut current = Some(self);
        while let Some(source) = current {
            if let Some(value) = pick(source) {
                return Some(value);
            }
            current = source.parent.as_deref();
        }
        None
    }

    pub fn effective_index(&self) -> Option<&IndexPattern> {
        self.inherited(|s| s.index.as_ref())
    }

    pub fn effective_query(&self) -> Option<&Value> {
        self.inherited(|s| s.query.as_ref())
    }

    pub fn effective_size(&self) -> Option<u64> {
        self.inherited(|s| s.size.as_ref()).copied()
    }

    pub fn effective_aggs(&self) -> Option<&Value> {
        self.inherited(|s| s.aggs.as_ref())
    }

    /// The flattened request: `{ "index": ..., "body": { ... } }`.
    pub fn to_request(&self) -> Value {
        let mut body = serde_json::Map::new();
        if let Some(size) = self.effective_size() {
            body.insert("size".to_string(), json!(size));
        }
        if let Some(query) = self.effective_query() {
            body.insert("query".to_string(), query.clone());
        }
        if let Some(aggs) = self.effective_aggs() {
            body.insert("aggs".to_string(), aggs.clone());
        }

        json!({
            "index": self.effective_index().map(|p| p.title.clone()),
            "body": Value::Object(body),
        })
    }
}

/// A stored search a visualization may build on.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSearch {
    /// `None` for the synthetic search standing in when nothing is saved.
    pub id: Option<String>,
    pub title: String,
    pub search_source: SearchSource,
}

impl SavedSearch {
    pub fn new(id: impl Into<String>, title: impl Into<String>, search_source: SearchSource) -> Self {
        Self {
            id: Some(id.into()),
            title: title.into(),
            search_source,
        }
    }

    /// An empty search, optionally scoped to an index pattern.
    pub fn synthetic(index: Option<IndexPattern>) -> Self {
        let search_source = match index {
            Some(pattern) => SearchSource::new().index(pattern),
            None => SearchSource::new(),
        };
        Self {
            id: None,
            title: String::new(),
            search_source,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.id.is_none()
    }
}
