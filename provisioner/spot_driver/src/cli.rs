// File: provisioner/spot_driver/src/cli.rs

use clap::{Parser, Subcommand};
use log::info;
use spot_engine::{
    BidPrice, CreditSpecification, Instance, LaunchSpecification, SpotInstanceManager,
};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api_client::HttpCloudClient;
use crate::config::{Config, LoggingConfig};
use crate::error::{DriverError, Result};

pub const PROVISIONING_LOG_TARGET: &str = "spot_driver::provisioning";

#[derive(Debug, Parser)]
#[command(name = "spot_driver", version, about = "Provision spot instances through a provider gateway")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "SPOT_DRIVER_CONFIG", default_value = "spot_driver.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Request a spot instance and wait until it is running
    Create {
        /// JSON file holding the launch specification
        #[arg(long)]
        launch_spec: PathBuf,

        /// Maximum price per hour; overrides `spot.bid_price`
        #[arg(long)]
        bid_price: Option<String>,

        /// Desired burst-credit mode; overrides `spot.credit_specification`
        #[arg(long)]
        credit_specification: Option<String>,
    },
}

// Logging is configured here once for the whole process
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(config.level.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    if let Some(file) = &config.file {
        let file = OpenOptions::new().create(true).append(true).open(file)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| DriverError::ConfigError(format!("Failed to initialise logging: {}", e)))
}

pub async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Create {
            launch_spec,
            bid_price,
            credit_specification,
        } => {
            let instance = create(&config, &launch_spec, bid_price, credit_specification).await?;
            println!("{}", serde_json::to_string_pretty(&instance)?);
            Ok(())
        }
    }
}

async fn create(
    config: &Config,
    launch_spec_path: &Path,
    bid_price: Option<String>,
    credit_specification: Option<String>,
) -> Result<Instance> {
    let launch_specification = read_launch_specification(launch_spec_path)?;
    let bid_price = resolve_bid_price(bid_price, config)?;
    let credit_specification = credit_specification
        .or_else(|| config.spot.credit_specification.clone())
        .map(CreditSpecification::new);

    let client = Arc::new(HttpCloudClient::new(&config.provider)?);
    let manager = SpotInstanceManager::with_log_target(
        client,
        config.poll_policy(),
        PROVISIONING_LOG_TARGET,
    );

    info!(
        "Creating spot instance of type {} from image {} at bid {}",
        launch_specification.instance_type, launch_specification.image_id, bid_price
    );
    let instance = manager
        .create(&launch_specification, &bid_price, credit_specification.as_ref())
        .await?;

    Ok(instance)
}

pub fn read_launch_specification(path: &Path) -> Result<LaunchSpecification> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn resolve_bid_price(from_cli: Option<String>, config: &Config) -> Result<BidPrice> {
    let raw = from_cli
        .or_else(|| config.spot.bid_price.clone())
        .ok_or_else(|| {
            DriverError::InvalidInput("No bid price given on the command line or in spot.bid_price".to_string())
        })?;

    raw.parse::<BidPrice>()
        .map_err(|e| DriverError::InvalidInput(e.to_string()))
}
