// File: provisioner/spot_driver/src/config.rs

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use spot_engine::{BidPrice, PollPolicy};
use url::Url;
use crate::error::{Result, DriverError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub region: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub attempts: u32,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotConfig {
    pub bid_price: Option<String>,
    pub credit_specification: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub polling: PollingConfig,
    pub spot: SpotConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            provider: ProviderConfig {
                endpoint: "http://127.0.0.1:8080".to_string(),
                region: "us-east-1".to_string(),
                timeout_ms: 10000,
            },
            polling: PollingConfig {
                attempts: policy.attempts,
                interval_secs: policy.interval.as_secs(),
            },
            spot: SpotConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If the file doesn't exist, return the default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;

        Self::parse(&contents)
    }

    // Missing sections and keys fall back to the defaults
    pub fn parse(contents: &str) -> Result<Self> {
        let config: toml::Value = toml::from_str(contents)
            .map_err(|e| DriverError::ConfigError(format!("Failed to parse config: {}", e)))?;
        let defaults = Self::default();
        let empty = toml::Value::Table(Default::default());

        let section = |name: &str| config.get(name).unwrap_or(&empty);
        let string = |table: &toml::Value, key: &str| {
            table.get(key).and_then(|v| v.as_str()).map(str::to_string)
        };
        let integer = |table: &toml::Value, key: &str| table.get(key).and_then(|v| v.as_integer());

        let provider = section("provider");
        let provider_config = ProviderConfig {
            endpoint: string(provider, "endpoint").unwrap_or(defaults.provider.endpoint),
            region: string(provider, "region").unwrap_or(defaults.provider.region),
            timeout_ms: non_negative(integer(provider, "timeout_ms"), "provider.timeout_ms")?
                .unwrap_or(defaults.provider.timeout_ms),
        };

        let polling = section("polling");
        let polling_config = PollingConfig {
            attempts: match non_negative(integer(polling, "attempts"), "polling.attempts")? {
                Some(n) => u32::try_from(n).map_err(|_| {
                    DriverError::ConfigError(format!("polling.attempts is too large: {}", n))
                })?,
                None => defaults.polling.attempts,
            },
            interval_secs: non_negative(integer(polling, "interval_secs"), "polling.interval_secs")?
                .unwrap_or(defaults.polling.interval_secs),
        };

        let spot = section("spot");
        let spot_config = SpotConfig {
            bid_price: string(spot, "bid_price"),
            credit_specification: string(spot, "credit_specification"),
        };

        let logging = section("logging");
        let logging_config = LoggingConfig {
            level: string(logging, "level").unwrap_or(defaults.logging.level),
            file: string(logging, "file"),
        };

        let config = Self {
            provider: provider_config,
            polling: polling_config,
            spot: spot_config,
            logging: logging_config,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.provider.endpoint).map_err(|e| {
            DriverError::ConfigError(format!("Invalid provider endpoint {:?}: {}", self.provider.endpoint, e))
        })?;

        if self.polling.attempts == 0 {
            return Err(DriverError::ConfigError("polling.attempts must be at least 1".to_string()));
        }

        if let Some(bid_price) = &self.spot.bid_price {
            bid_price
                .parse::<BidPrice>()
                .map_err(|e| DriverError::ConfigError(e.to_string()))?;
        }

        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            attempts: self.polling.attempts,
            interval: Duration::from_secs(self.polling.interval_secs),
        }
    }
}

fn non_negative(value: Option<i64>, key: &str) -> Result<Option<u64>> {
    match value {
        Some(n) if n < 0 => Err(DriverError::ConfigError(format!("{} must not be negative", key))),
        Some(n) => Ok(Some(n as u64)),
        None => Ok(None),
    }
}
