//! Query translation
//!
//! Pure, deterministic mapping from request parameters to the backend's
//! nested boolean/aggregation search DSL. No I/O; "now" is always passed in
//! so translation is reproducible.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Relative time tokens the translator understands
pub const RELATIVE_TOKENS: &[&str] = &["1h", "6h", "12h", "24h", "3d", "7d", "30d"];

/// Time window for a query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeRange {
    /// Explicit window
    Absolute {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    /// "now minus a fixed duration" token, e.g. "24h"
    Relative(String),
}

/// A time range with both bounds made explicit (either may be open)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ResolvedRange {
    pub const UNBOUNDED: ResolvedRange = ResolvedRange {
        from: None,
        to: None,
    };

    pub fn is_bounded(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Elapsed span, known only when both bounds are present
    pub fn span(&self) -> Option<Duration> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some(to - from),
            _ => None,
        }
    }
}

impl TimeRange {
    /// Resolve to explicit bounds, anchored to `now` for relative tokens
    ///
    /// Unrecognized tokens resolve to an unbounded range instead of failing,
    /// so a client older than the backend's token set keeps working. The
    /// degradation is logged.
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedRange {
        match self {
            TimeRange::Absolute { from, to } => ResolvedRange {
                from: Some(*from),
                to: Some(*to),
            },
            TimeRange::Relative(token) => match relative_duration(token) {
                Some(duration) => ResolvedRange {
                    from: Some(now - duration),
                    to: Some(now),
                },
                None => {
                    tracing::warn!(token = %token, "unrecognized relative time token, querying unbounded");
                    ResolvedRange::UNBOUNDED
                }
            },
        }
    }
}

fn relative_duration(token: &str) -> Option<Duration> {
    match token {
        "1h" => Some(Duration::hours(1)),
        "6h" => Some(Duration::hours(6)),
        "12h" => Some(Duration::hours(12)),
        "24h" => Some(Duration::hours(24)),
        "3d" => Some(Duration::days(3)),
        "7d" => Some(Duration::days(7)),
        "30d" => Some(Duration::days(30)),
        _ => None,
    }
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(format!(
                "unknown severity '{}' (expected trace|debug|info|warn|error|fatal)",
                other
            )),
        }
    }
}

/// Sort direction by timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Free-text search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query (non-empty)
    pub query: String,

    #[serde(default)]
    pub time_range: Option<TimeRange>,

    /// Optional log-type filter (the backend's `type` field)
    #[serde(default)]
    pub log_type: Option<String>,

    #[serde(default)]
    pub severity: Option<Severity>,

    /// Result-count limit, 1-1000
    #[serde(default = "default_search_limit")]
    pub limit: u32,

    #[serde(default)]
    pub sort: SortOrder,
}

/// Backend-native query-language request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredQueryRequest {
    /// Query-language string, placed verbatim into the payload (non-empty)
    pub query: String,

    #[serde(default)]
    pub time_range: Option<TimeRange>,

    #[serde(default = "default_structured_limit")]
    pub limit: u32,

    #[serde(default)]
    pub sort: SortOrder,
}

/// Aggregate-statistics request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsRequest {
    #[serde(default)]
    pub time_range: Option<TimeRange>,

    /// Field names, one terms aggregation each, in caller order
    #[serde(default)]
    pub group_by: Vec<String>,
}

pub fn default_search_limit() -> u32 {
    50
}

pub fn default_structured_limit() -> u32 {
    100
}

/// Build the search payload
///
/// Severity and log-type are appended as conjunctions on the query text
/// itself rather than as separate filter clauses, so nothing a later step
/// adds to `filter` can be clobbered.
pub fn build_search_payload(request: &SearchRequest, now: DateTime<Utc>) -> Value {
    let mut text = request.query.clone();
    if let Some(severity) = &request.severity {
        text.push_str(&format!(" AND level:{}", severity.as_str()));
    }
    if let Some(log_type) = &request.log_type {
        text.push_str(&format!(" AND type:{}", log_type));
    }

    let clause = json!({ "query_string": { "query": text } });
    let resolved = request.time_range.as_ref().map(|r| r.resolve(now));

    json!({
        "query": wrap_with_range(clause, resolved),
        "size": request.limit,
        "sort": [{ "@timestamp": { "order": request.sort.as_str() } }],
    })
}

/// Build the structured-query payload (query string passed through verbatim)
pub fn build_structured_payload(request: &StructuredQueryRequest, now: DateTime<Utc>) -> Value {
    let clause = json!({ "query_string": { "query": request.query } });
    let resolved = request.time_range.as_ref().map(|r| r.resolve(now));

    json!({
        "query": wrap_with_range(clause, resolved),
        "size": request.limit,
        "sort": [{ "@timestamp": { "order": request.sort.as_str() } }],
    })
}

/// Build the statistics payload
///
/// No document hits are requested (`size: 0`); the answer lives entirely in
/// the aggregations: a timeline histogram (most recent bucket first), one
/// terms aggregation per grouping field, and always one on severity level.
pub fn build_statistics_payload(request: &StatisticsRequest, now: DateTime<Utc>) -> Value {
    let resolved = request.time_range.as_ref().map(|r| r.resolve(now));
    let interval = histogram_interval(resolved.as_ref().and_then(ResolvedRange::span));

    let mut aggs = Map::new();
    aggs.insert(
        "timeline".to_string(),
        json!({
            "date_histogram": {
                "field": "@timestamp",
                "fixed_interval": interval,
                "order": { "_key": "desc" },
            }
        }),
    );
    for field in &request.group_by {
        aggs.insert(
            format!("by_{}", field),
            json!({
                "terms": {
                    "field": format!("{}.keyword", field),
                    "size": 20,
                    "order": { "_count": "desc" },
                }
            }),
        );
    }
    // Severity breakdown is always included, last so it wins over a
    // caller-supplied "level" grouping
    aggs.insert(
        "by_level".to_string(),
        json!({
            "terms": {
                "field": "level",
                "size": 10,
                "order": { "_count": "desc" },
            }
        }),
    );

    let mut payload = Map::new();
    payload.insert("size".to_string(), json!(0));
    if let Some(resolved) = resolved {
        if resolved.is_bounded() {
            payload.insert(
                "query".to_string(),
                json!({ "bool": { "filter": [range_clause(&resolved)] } }),
            );
        }
    }
    payload.insert("aggs".to_string(), Value::Object(aggs));

    Value::Object(payload)
}

/// Pick the histogram bucket width from the elapsed span
pub fn histogram_interval(span: Option<Duration>) -> &'static str {
    let span = match span {
        Some(span) => span,
        None => return "1h",
    };
    let hours_6 = Duration::hours(6);
    let hours_24 = Duration::hours(24);
    let hours_72 = Duration::hours(72);
    let hours_168 = Duration::hours(168);

    if span <= hours_6 {
        "30m"
    } else if span <= hours_24 {
        "1h"
    } else if span <= hours_72 {
        "3h"
    } else if span <= hours_168 {
        "6h"
    } else {
        "1d"
    }
}

/// Wrap a query clause in `bool { must, filter: [range] }` when the range
/// carries at least one bound; pass the clause through untouched otherwise
fn wrap_with_range(clause: Value, resolved: Option<ResolvedRange>) -> Value {
    match resolved {
        Some(resolved) if resolved.is_bounded() => json!({
            "bool": {
                "must": [clause],
                "filter": [range_clause(&resolved)],
            }
        }),
        _ => clause,
    }
}

fn range_clause(resolved: &ResolvedRange) -> Value {
    let mut bounds = Map::new();
    if let Some(from) = resolved.from {
        bounds.insert(
            "gte".to_string(),
            json!(from.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
    if let Some(to) = resolved.to {
        bounds.insert(
            "lte".to_string(),
            json!(to.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
    json!({ "range": { "@timestamp": Value::Object(bounds) } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_tokens_resolve_to_nominal_durations() {
        let expected = [
            ("1h", Duration::hours(1)),
            ("6h", Duration::hours(6)),
            ("12h", Duration::hours(12)),
            ("24h", Duration::hours(24)),
            ("3d", Duration::days(3)),
            ("7d", Duration::days(7)),
            ("30d", Duration::days(30)),
        ];
        for (token, duration) in expected {
            let resolved = TimeRange::Relative(token.to_string()).resolve(now());
            let (from, to) = (resolved.from.unwrap(), resolved.to.unwrap());
            assert!(from <= to, "{}: from must not exceed to", token);
            assert_eq!(to - from, duration, "{}: wrong span", token);
            assert_eq!(to, now());
        }
    }

    #[test]
    fn test_unrecognized_token_resolves_unbounded() {
        let resolved = TimeRange::Relative("90m".to_string()).resolve(now());
        assert!(!resolved.is_bounded());
        assert_eq!(resolved.span(), None);
    }

    #[test]
    fn test_histogram_interval_boundaries() {
        let cases = [
            (Duration::hours(6), "30m"),
            (Duration::hours(6) + Duration::seconds(1), "1h"),
            (Duration::hours(24), "1h"),
            (Duration::hours(72), "3h"),
            (Duration::hours(168), "6h"),
            (Duration::hours(168) + Duration::seconds(1), "1d"),
        ];
        for (span, expected) in cases {
            assert_eq!(
                histogram_interval(Some(span)),
                expected,
                "span {} hours",
                span.num_hours()
            );
        }
        assert_eq!(histogram_interval(None), "1h");
    }

    #[test]
    fn test_search_payload_with_severity_and_range() {
        let request = SearchRequest {
            query: "timeout".to_string(),
            time_range: Some(TimeRange::Relative("1h".to_string())),
            log_type: None,
            severity: Some(Severity::Error),
            limit: default_search_limit(),
            sort: SortOrder::default(),
        };
        let payload = build_search_payload(&request, now());

        let text = payload["query"]["bool"]["must"][0]["query_string"]["query"]
            .as_str()
            .unwrap();
        assert_eq!(text, "timeout AND level:error");

        let range = &payload["query"]["bool"]["filter"][0]["range"]["@timestamp"];
        assert_eq!(range["gte"], "2024-05-17T11:00:00.000Z");
        assert_eq!(range["lte"], "2024-05-17T12:00:00.000Z");

        assert_eq!(payload["size"], 50);
        assert_eq!(payload["sort"][0]["@timestamp"]["order"], "desc");
    }

    #[test]
    fn test_search_payload_without_range_is_bare_clause() {
        let request = SearchRequest {
            query: "connection refused".to_string(),
            time_range: None,
            log_type: Some("nginx".to_string()),
            severity: None,
            limit: 10,
            sort: SortOrder::Asc,
        };
        let payload = build_search_payload(&request, now());

        assert!(payload["query"].get("bool").is_none());
        assert_eq!(
            payload["query"]["query_string"]["query"],
            "connection refused AND type:nginx"
        );
        assert_eq!(payload["sort"][0]["@timestamp"]["order"], "asc");
    }

    #[test]
    fn test_structured_payload_is_verbatim() {
        let request = StructuredQueryRequest {
            query: "level:error AND service:checkout".to_string(),
            time_range: None,
            limit: default_structured_limit(),
            sort: SortOrder::default(),
        };
        let payload = build_structured_payload(&request, now());

        assert_eq!(
            payload["query"]["query_string"]["query"],
            "level:error AND service:checkout"
        );
        assert_eq!(payload["size"], 100);
    }

    #[test]
    fn test_statistics_payload_shape() {
        let request = StatisticsRequest {
            time_range: Some(TimeRange::Relative("24h".to_string())),
            group_by: vec!["service".to_string()],
        };
        let payload = build_statistics_payload(&request, now());

        assert_eq!(payload["size"], 0);

        let timeline = &payload["aggs"]["timeline"]["date_histogram"];
        assert_eq!(timeline["fixed_interval"], "1h");
        assert_eq!(timeline["order"]["_key"], "desc");

        let by_service = &payload["aggs"]["by_service"]["terms"];
        assert_eq!(by_service["field"], "service.keyword");
        assert_eq!(by_service["size"], 20);
        assert_eq!(by_service["order"]["_count"], "desc");

        let by_level = &payload["aggs"]["by_level"]["terms"];
        assert_eq!(by_level["field"], "level");
        assert_eq!(by_level["size"], 10);

        let range = &payload["query"]["bool"]["filter"][0]["range"]["@timestamp"];
        assert_eq!(range["gte"], "2024-05-16T12:00:00.000Z");
    }

    #[test]
    fn test_statistics_payload_without_range_has_no_query() {
        let request = StatisticsRequest {
            time_range: None,
            group_by: vec![],
        };
        let payload = build_statistics_payload(&request, now());

        assert!(payload.get("query").is_none());
        assert_eq!(
            payload["aggs"]["timeline"]["date_histogram"]["fixed_interval"],
            "1h"
        );
        assert!(payload["aggs"].get("by_level").is_some());
    }

    #[test]
    fn test_partial_range_clause() {
        let resolved = ResolvedRange {
            from: Some(now()),
            to: None,
        };
        let clause = range_clause(&resolved);
        assert_eq!(
            clause["range"]["@timestamp"]["gte"],
            "2024-05-17T12:00:00.000Z"
        );
        assert!(clause["range"]["@timestamp"].get("lte").is_none());
    }
}
