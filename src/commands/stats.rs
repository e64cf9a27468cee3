use anyhow::Result;
use colored::Colorize;

use logzio_gateway::config::load_config;
use logzio_gateway::gateway::Gateway;
use logzio_gateway::query::StatisticsRequest;

use crate::commands::parse_time_range;

/// Execute the stats command
pub async fn execute(time_range: Option<String>, group_by: Vec<String>) -> Result<()> {
    let cfg = load_config()?;
    let gateway = Gateway::new(cfg)?;

    let request = StatisticsRequest {
        time_range: time_range.as_deref().map(parse_time_range).transpose()?,
        group_by,
    };

    let result = gateway.statistics(&request).await?;

    println!("{}", format!("✓ {} matching documents", result.total).green());
    for (name, buckets) in &result.aggregations {
        println!();
        println!("{}", name.bold());
        for bucket in buckets {
            println!("  {:>8}  {}", bucket.count, bucket.key);
        }
    }
    Ok(())
}
