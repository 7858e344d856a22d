use clap::Parser;
use ocm_mcp::config::{Cli, OcmConfig, TransportMode};
use ocm_mcp::constants::settings;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let offline_token = std::env::var(settings::OFFLINE_TOKEN).ok();
    let config = match OcmConfig::from_cli(cli, offline_token) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            eprintln!("ocm-mcp: {}", err);
            std::process::exit(2);
        }
    };

    let result = match config.mode() {
        TransportMode::SingleTenant => ocm_mcp::mcp::server::run_stdio(config).await,
        TransportMode::MultiTenant => ocm_mcp::mcp::http::run_http(config).await,
    };
    if let Err(err) = result {
        eprintln!("ocm-mcp: {}", err);
        std::process::exit(1);
    }
}
