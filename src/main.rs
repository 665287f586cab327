mod auth;
mod cli;
mod config;
mod error;
mod output;
mod providers;
mod resources;
mod server;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting GitLab MCP Server");
    cli.execute().await?;

    Ok(())
}
