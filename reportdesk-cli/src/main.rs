use anyhow::Result;
use clap::Parser;
use colored::*;

use reportdesk::cli::{Cli, run};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .format_timestamp(None)
        .init();

    if let Err(err) = execute(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    log::debug!("Running {:?}", cli.command);
    run(cli).await
}
