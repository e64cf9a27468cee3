//! Backend response decoding and normalization
//!
//! The backend's JSON is loosely shaped: `hits.total` arrives either as a
//! bare number or as `{ "value": n }`, `hits` and `aggregations` may be
//! absent entirely, and bucket counts are spelled `doc_count` or `count`
//! depending on the aggregation. Everything optional is decoded defensively
//! and normalized into one uniform [`QueryResult`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw backend response, decoded as-is off the wire
#[derive(Debug, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub hits: Option<RawHits>,

    #[serde(default)]
    pub aggregations: Option<serde_json::Map<String, Value>>,

    /// Backend-side elapsed time in milliseconds
    #[serde(default)]
    pub took: u64,

    #[serde(default)]
    pub timed_out: bool,
}

#[derive(Debug, Deserialize)]
pub struct RawHits {
    #[serde(default)]
    pub total: Option<TotalHits>,

    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// `hits.total` dual shape: bare integer on older backends, `{value}` on newer
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(n) => *n,
            TotalHits::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_source", default)]
    pub source: Value,
}

/// One (key, count) pair from a terms or histogram aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub key: String,
    pub count: u64,
}

/// The uniform result shape returned by every gateway operation
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub total: u64,
    pub items: Vec<Value>,
    pub aggregations: BTreeMap<String, Vec<BucketCount>>,
    pub took_ms: u64,
    pub timed_out: bool,
}

/// Normalize a raw backend response
///
/// A missing `hits` section means an empty result, not an error.
pub fn normalize(raw: RawResponse) -> QueryResult {
    let (total, items) = match raw.hits {
        Some(hits) => (
            hits.total.map(|t| t.value()).unwrap_or(0),
            hits.hits.into_iter().map(|h| h.source).collect(),
        ),
        None => (0, Vec::new()),
    };

    let mut aggregations = BTreeMap::new();
    if let Some(aggs) = raw.aggregations {
        for (name, agg) in aggs {
            aggregations.insert(name, extract_buckets(&agg));
        }
    }

    QueryResult {
        total,
        items,
        aggregations,
        took_ms: raw.took,
        timed_out: raw.timed_out,
    }
}

/// Pull (key, count) pairs out of one aggregation body, preserving order
fn extract_buckets(agg: &Value) -> Vec<BucketCount> {
    let buckets = match agg.get("buckets").and_then(Value::as_array) {
        Some(buckets) => buckets,
        None => return Vec::new(),
    };

    buckets
        .iter()
        .map(|bucket| {
            // Histograms carry a numeric key plus key_as_string; prefer the
            // human-readable form when present
            let key = bucket
                .get("key_as_string")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| stringify_key(bucket.get("key")));
            let count = bucket
                .get("doc_count")
                .or_else(|| bucket.get("count"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            BucketCount { key, count }
        })
        .collect()
}

fn stringify_key(key: Option<&Value>) -> String {
    match key {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
