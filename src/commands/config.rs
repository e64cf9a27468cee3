use anyhow::Result;
use colored::Colorize;

use logzio_gateway::config::load_config;

/// Display current configuration with the API token masked
pub fn show() -> Result<()> {
    let cfg = load_config()?;

    println!("{}", "Configuration:".bold());
    println!("  {}: {}", "Token".cyan(), mask_token(&cfg.api_token));
    println!("  {}: {}", "Region".cyan(), cfg.region);
    println!("  {}: {}", "Base URL".cyan(), cfg.resolved_base_url()?);
    println!("  {}: {}s", "Timeout".cyan(), cfg.timeout_seconds);
    println!("  {}: {}", "Max attempts".cyan(), cfg.max_attempts);
    println!("  {}: {}ms", "Base retry delay".cyan(), cfg.base_delay_ms);

    Ok(())
}

/// Validate configuration without issuing any request
pub fn validate() -> Result<()> {
    println!("{}", "Validating configuration...".yellow());

    let cfg = load_config()?;

    println!("{}", "✓ Configuration is valid".green());
    println!("  endpoint: {}/v1/search", cfg.resolved_base_url()?);
    Ok(())
}

fn mask_token(token: &str) -> String {
    if token.len() <= 4 {
        return "****".to_string();
    }
    format!("{}****", &token[..4])
}
