use anyhow::Result;

use logzio_gateway::config::load_config;
use logzio_gateway::gateway::Gateway;
use logzio_gateway::query::{SearchRequest, Severity};

use crate::cli::Commands;
use crate::commands::{parse_time_range, print_result};

/// Execute the search command
pub async fn execute(
    query: String,
    time_range: Option<String>,
    level: Option<Severity>,
    log_type: Option<String>,
    limit: u32,
    asc: bool,
) -> Result<()> {
    let cfg = load_config()?;
    let gateway = Gateway::new(cfg)?;

    let request = SearchRequest {
        query,
        time_range: time_range.as_deref().map(parse_time_range).transpose()?,
        log_type,
        severity: level,
        limit,
        sort: Commands::sort_order(asc),
    };

    let result = gateway.search(&request).await?;
    print_result(&result)
}
