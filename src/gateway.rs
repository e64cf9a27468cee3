//! Gateway façade
//!
//! Composes translator, executor and normalizer into the three public
//! operations. Each call is self-contained: the only shared state is the
//! immutable configuration and the HTTP client's connection pool, so calls
//! may run concurrently without coordination.

use chrono::Utc;
use reqwest::Client;

use crate::config::{validate_config, GatewayConfig};
use crate::error::GatewayError;
use crate::executor;
use crate::query::{
    build_search_payload, build_statistics_payload, build_structured_payload, SearchRequest,
    StatisticsRequest, StructuredQueryRequest, TimeRange,
};
use crate::response::{normalize, QueryResult};

const SEARCH_PATH: &str = "/v1/search";

pub struct Gateway {
    client: Client,
    config: GatewayConfig,
    search_url: String,
}

impl Gateway {
    /// Build a gateway from a finished configuration
    ///
    /// Configuration problems surface here, before any operation runs.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        validate_config(&config).map_err(|e| GatewayError::Config(e.to_string()))?;
        let base_url = config
            .resolved_base_url()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        let client = Client::new();

        Ok(Self {
            client,
            config,
            search_url: format!("{}{}", base_url, SEARCH_PATH),
        })
    }

    /// Free-text search
    pub async fn search(&self, request: &SearchRequest) -> Result<QueryResult, GatewayError> {
        validate_query_text(&request.query, "query")?;
        validate_limit(request.limit)?;
        validate_time_range(request.time_range.as_ref())?;

        let payload = build_search_payload(request, Utc::now());
        let raw = executor::execute(
            &self.client,
            &self.config,
            &self.search_url,
            "search",
            &payload,
        )
        .await?;
        Ok(normalize(raw))
    }

    /// Backend query-language search
    pub async fn structured_query(
        &self,
        request: &StructuredQueryRequest,
    ) -> Result<QueryResult, GatewayError> {
        validate_query_text(&request.query, "query")?;
        validate_limit(request.limit)?;
        validate_time_range(request.time_range.as_ref())?;

        let payload = build_structured_payload(request, Utc::now());
        let raw = executor::execute(
            &self.client,
            &self.config,
            &self.search_url,
            "structured_query",
            &payload,
        )
        .await?;
        Ok(normalize(raw))
    }

    /// Aggregate statistics (histogram + terms breakdowns)
    pub async fn statistics(
        &self,
        request: &StatisticsRequest,
    ) -> Result<QueryResult, GatewayError> {
        validate_time_range(request.time_range.as_ref())?;
        for field in &request.group_by {
            if field.trim().is_empty() {
                return Err(GatewayError::Validation(
                    "group_by fields must not be empty".to_string(),
                ));
            }
        }

        let payload = build_statistics_payload(request, Utc::now());
        let raw = executor::execute(
            &self.client,
            &self.config,
            &self.search_url,
            "statistics",
            &payload,
        )
        .await?;
        Ok(normalize(raw))
    }
}

// Caller-input checks run before any network call is attempted.

fn validate_query_text(text: &str, field: &str) -> Result<(), GatewayError> {
    if text.trim().is_empty() {
        return Err(GatewayError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn validate_limit(limit: u32) -> Result<(), GatewayError> {
    if !(1..=1000).contains(&limit) {
        return Err(GatewayError::Validation(format!(
            "limit must be between 1 and 1000, got {}",
            limit
        )));
    }
    Ok(())
}

fn validate_time_range(range: Option<&TimeRange>) -> Result<(), GatewayError> {
    if let Some(TimeRange::Absolute { from, to }) = range {
        if from > to {
            return Err(GatewayError::Validation(format!(
                "time range is inverted: {} > {}",
                from, to
            )));
        }
    }
    Ok(())
}
