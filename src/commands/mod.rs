pub mod config;
pub mod query;
pub mod search;
pub mod stats;

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;

use logzio_gateway::query::TimeRange;
use logzio_gateway::response::QueryResult;

/// Parse a CLI time-range argument
///
/// Either a relative token ("24h") or an explicit "from..to" pair of
/// RFC 3339 instants. Relative tokens are passed through untouched; the
/// gateway resolves them at translation time.
pub fn parse_time_range(arg: &str) -> Result<TimeRange> {
    if let Some((from, to)) = arg.split_once("..") {
        let from: DateTime<Utc> = from
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid 'from' instant '{}': {}", from, e))?;
        let to: DateTime<Utc> = to
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid 'to' instant '{}': {}", to, e))?;
        return Ok(TimeRange::Absolute { from, to });
    }
    Ok(TimeRange::Relative(arg.to_string()))
}

/// Print a normalized result: colored summary line, then pretty JSON
pub fn print_result(result: &QueryResult) -> Result<()> {
    let summary = format!("✓ {} hits in {} ms", result.total, result.took_ms);
    println!("{}", summary.green());
    if result.timed_out {
        println!("{}", "⚠ backend reported a partial (timed out) result".yellow());
    }
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
