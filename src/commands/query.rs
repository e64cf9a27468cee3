use anyhow::Result;

use logzio_gateway::config::load_config;
use logzio_gateway::gateway::Gateway;
use logzio_gateway::query::StructuredQueryRequest;

use crate::cli::Commands;
use crate::commands::{parse_time_range, print_result};

/// Execute the structured-query command
pub async fn execute(
    query: String,
    time_range: Option<String>,
    limit: u32,
    asc: bool,
) -> Result<()> {
    let cfg = load_config()?;
    let gateway = Gateway::new(cfg)?;

    let request = StructuredQueryRequest {
        query,
        time_range: time_range.as_deref().map(parse_time_range).transpose()?,
        limit,
        sort: Commands::sort_order(asc),
    };

    let result = gateway.structured_query(&request).await?;
    print_result(&result)
}
