//! Request execution with bounded, delayed retries
//!
//! One logical call turns into at most `max_attempts` HTTP sends. All three
//! gateway operations are read-only, so retrying after any failure is safe.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::{classify_status, is_retryable, GatewayError};
use crate::response::RawResponse;

/// Fixed client identifier sent with every request
pub const USER_AGENT: &str = concat!("logzio-gateway/", env!("CARGO_PKG_VERSION"));

/// Backoff delays never exceed this, whatever the attempt number
const MAX_BACKOFF_MS: u64 = 30_000;

/// Deliver one logical call to the backend, retrying transient failures
///
/// The retry decision is delegated entirely to [`is_retryable`]; the delay is
/// the backend's suggested Retry-After when it sent one, else exponential
/// backoff from `base_delay_ms`, capped at 30 s. The loop is strictly
/// sequential - no parallel speculative attempts.
pub async fn execute(
    client: &Client,
    config: &GatewayConfig,
    url: &str,
    operation: &str,
    payload: &Value,
) -> Result<RawResponse, GatewayError> {
    let mut attempt: u32 = 1;
    loop {
        tracing::debug!(operation, attempt, "sending backend request");

        let error = match send_once(client, config, url, payload).await {
            Ok(raw) => return Ok(raw),
            Err(error) => error,
        };

        if attempt >= config.max_attempts || !is_retryable(&error) {
            tracing::debug!(operation, attempt, error = %error, "giving up");
            return Err(error);
        }

        let delay_ms = match &error {
            GatewayError::RateLimited {
                retry_after_ms: Some(ms),
                ..
            } => *ms,
            _ => backoff_delay_ms(config.base_delay_ms, attempt),
        };

        tracing::warn!(
            operation,
            attempt,
            delay_ms,
            error = %error,
            "retryable backend failure, backing off"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}

/// One HTTP send: attach headers, check status, decode the body
async fn send_once(
    client: &Client,
    config: &GatewayConfig,
    url: &str,
    payload: &Value,
) -> Result<RawResponse, GatewayError> {
    let response = client
        .post(url)
        .header("X-API-TOKEN", &config.api_token)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .header("User-Agent", USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .json(payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let retry_after_secs = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(classify_status(status, body, retry_after_secs));
    }

    // Decode failures are final: a shape mismatch will not fix itself on retry
    let body = response.text().await?;
    let raw: RawResponse = serde_json::from_str(&body)?;
    Ok(raw)
}

/// Exponential backoff: base * 2^(attempt-1), capped
fn backoff_delay_ms(base_delay_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64 << (attempt.saturating_sub(1)).min(31);
    base_delay_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Instant;

    fn test_config(base_url: &str, max_attempts: u32, base_delay_ms: u64) -> GatewayConfig {
        GatewayConfig {
            api_token: "test-token".to_string(),
            region: "us".to_string(),
            base_url: Some(base_url.to_string()),
            timeout_seconds: 5,
            max_attempts,
            base_delay_ms,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay_ms(1000, 1), 1000);
        assert_eq!(backoff_delay_ms(1000, 2), 2000);
        assert_eq!(backoff_delay_ms(1000, 3), 4000);
        assert_eq!(backoff_delay_ms(1000, 6), 30_000);
        assert_eq!(backoff_delay_ms(1000, 40), 30_000);
    }

    #[tokio::test]
    async fn test_success_decodes_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/search")
                    .header("x-api-token", "test-token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "took": 5,
                        "timed_out": false,
                        "hits": { "total": { "value": 1 }, "hits": [{ "_source": { "message": "hi" } }] },
                    }));
            })
            .await;

        let config = test_config(&server.base_url(), 3, 10);
        let client = Client::new();
        let url = format!("{}/v1/search", server.base_url());
        let raw = execute(&client, &config, &url, "search", &json!({}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(raw.hits.unwrap().total.unwrap().value(), 1);
    }

    #[tokio::test]
    async fn test_persistent_503_uses_exactly_max_attempts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/search");
                then.status(503).body("upstream down");
            })
            .await;

        let config = test_config(&server.base_url(), 3, 10);
        let client = Client::new();
        let url = format!("{}/v1/search", server.base_url());
        let error = execute(&client, &config, &url, "search", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(mock.hits_async().await, 3);
        match error {
            GatewayError::BackendUnavailable { status, .. } => assert_eq!(status, 503),
            other => panic!("expected BackendUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_after_header_overrides_backoff() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/search");
                then.status(429)
                    .header("Retry-After", "2")
                    .body("rate limited");
            })
            .await;

        // Exponential default would be 10 ms; Retry-After forces 2 s
        let config = test_config(&server.base_url(), 2, 10);
        let client = Client::new();
        let url = format!("{}/v1/search", server.base_url());

        let started = Instant::now();
        let error = execute(&client, &config, &url, "search", &json!({}))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(mock.hits_async().await, 2);
        assert!(
            elapsed >= Duration::from_millis(2000),
            "waited only {:?}",
            elapsed
        );
        match error {
            GatewayError::RateLimited { retry_after_ms, .. } => {
                assert_eq!(retry_after_ms, Some(2000))
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_400_fails_on_first_attempt() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/search");
                then.status(400).body("bad query");
            })
            .await;

        let config = test_config(&server.base_url(), 3, 10);
        let client = Client::new();
        let url = format!("{}/v1/search", server.base_url());
        let error = execute(&client, &config, &url, "search", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(mock.hits_async().await, 1);
        match error {
            GatewayError::BadRequest { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad query");
            }
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_401_is_final_and_names_regions() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/search");
                then.status(401).body("invalid token");
            })
            .await;

        let config = test_config(&server.base_url(), 3, 10);
        let client = Client::new();
        let url = format!("{}/v1/search", server.base_url());
        let error = execute(&client, &config, &url, "search", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(mock.hits_async().await, 1);
        match error {
            GatewayError::Unauthorized(msg) => {
                assert!(msg.contains("region"));
                assert!(msg.contains("invalid token"));
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/search");
                then.status(200).body("this is not json");
            })
            .await;

        let config = test_config(&server.base_url(), 3, 10);
        let client = Client::new();
        let url = format!("{}/v1/search", server.base_url());
        let error = execute(&client, &config, &url, "search", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(mock.hits_async().await, 1);
        match error {
            GatewayError::Unknown(msg) => assert!(msg.contains("decode")),
            other => panic!("expected Unknown, got {:?}", other),
        }
    }
}
