use clap::{Parser, Subcommand};

use logzio_gateway::query::{Severity, SortOrder};

#[derive(Parser, Debug)]
#[command(name = "logzio-gateway", version, about = "Resilient log-query gateway")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Free-text search
    Search {
        /// Free-text query
        query: String,

        /// Time window: a relative token (1h, 6h, 12h, 24h, 3d, 7d, 30d)
        /// or an explicit "from..to" RFC 3339 pair
        #[arg(short, long)]
        time_range: Option<String>,

        /// Severity filter
        #[arg(short, long)]
        level: Option<Severity>,

        /// Log-type filter
        #[arg(long)]
        log_type: Option<String>,

        /// Result-count limit (1-1000)
        #[arg(long, default_value = "50")]
        limit: u32,

        /// Sort ascending by timestamp instead of descending
        #[arg(long)]
        asc: bool,
    },

    /// Search with the backend's native query language
    Query {
        /// Query-language string, passed through verbatim
        query: String,

        #[arg(short, long)]
        time_range: Option<String>,

        #[arg(long, default_value = "100")]
        limit: u32,

        #[arg(long)]
        asc: bool,
    },

    /// Aggregate statistics (timeline histogram + per-field breakdowns)
    Stats {
        #[arg(short, long)]
        time_range: Option<String>,

        /// Field to group by; repeatable
        #[arg(short, long = "group-by")]
        group_by: Vec<String>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display current configuration (with the token masked)
    Show,

    /// Validate configuration
    Validate,
}

impl Commands {
    pub fn sort_order(asc: bool) -> SortOrder {
        if asc {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}
