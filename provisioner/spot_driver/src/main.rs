//# spot_driver/src/main.rs
mod api_client;
mod cli;
mod config;
mod error;

use clap::Parser;
use log::error;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", cli.config.display(), e);
            std::process::exit(2);
        }
    };

    if let Err(e) = cli::init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(2);
    }

    if let Err(e) = cli::run(cli.command, config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
