use serde::{Deserialize, Serialize};

/// Region codes the hosted backend operates in
///
/// The API token is scoped to one region; sending it to another region's
/// endpoint yields a 401, which is why the auth error message lists these.
pub const VALID_REGIONS: &[&str] = &["us", "au", "ca", "eu", "nl", "uk", "wa"];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// API token attached to every request as X-API-TOKEN
    pub api_token: String,

    /// Account region, used to derive the base URL
    #[serde(default = "default_region")]
    pub region: String,

    /// Explicit base URL override (takes precedence over the region table)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Upper bound on attempts per logical call (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff between retries
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_region() -> String {
    "us".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl GatewayConfig {
    /// Resolve the search endpoint base URL from the override or region
    pub fn resolved_base_url(&self) -> anyhow::Result<String> {
        if let Some(url) = &self.base_url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        region_base_url(&self.region).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown region '{}' (valid regions: {})",
                self.region,
                VALID_REGIONS.join(", ")
            )
        })
    }
}

/// Map a region code to its API base URL
///
/// The primary region has no suffix; all others are `api-<region>`.
pub fn region_base_url(region: &str) -> Option<String> {
    if !VALID_REGIONS.contains(&region) {
        return None;
    }
    if region == "us" {
        Some("https://api.logz.io".to_string())
    } else {
        Some(format!("https://api-{}.logz.io", region))
    }
}

/// Load configuration from `config.{toml,yaml,json}` overlaid with
/// `LOGZIO_GATEWAY__*` environment variables
pub fn load_config() -> anyhow::Result<GatewayConfig> {
    let config = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("LOGZIO_GATEWAY").separator("__"))
        .build()?;

    let cfg: GatewayConfig = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &GatewayConfig) -> anyhow::Result<()> {
    if cfg.api_token.trim().is_empty() {
        anyhow::bail!("api_token must not be empty");
    }

    // Resolves the region table; fails on unknown regions without override
    cfg.resolved_base_url()?;

    if let Some(url) = &cfg.base_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("base_url must be an http(s) URL, got '{}'", url);
        }
    }

    if cfg.max_attempts == 0 {
        anyhow::bail!("max_attempts must be at least 1");
    }

    if cfg.timeout_seconds == 0 {
        anyhow::bail!("timeout_seconds must be at least 1");
    }

    Ok(())
}
