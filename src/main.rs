use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use logzio_gateway::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    init_tracing();

    match args.command {
        cli::Commands::Search {
            query,
            time_range,
            level,
            log_type,
            limit,
            asc,
        } => {
            commands::search::execute(query, time_range, level, log_type, limit, asc).await?;
        }
        cli::Commands::Query {
            query,
            time_range,
            limit,
            asc,
        } => {
            commands::query::execute(query, time_range, limit, asc).await?;
        }
        cli::Commands::Stats {
            time_range,
            group_by,
        } => {
            commands::stats::execute(time_range, group_by).await?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show()?,
            cli::ConfigCommands::Validate => commands::config::validate()?,
        },
        cli::Commands::Version => {
            println!("logzio-gateway v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
