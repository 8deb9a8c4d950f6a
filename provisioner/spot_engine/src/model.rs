use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

// Bid price, kept as the decimal string the provider expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BidPrice(String);

impl BidPrice {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BidPrice {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.splitn(2, '.');
        let whole = parts.next().unwrap_or_default();
        let fraction = parts.next();

        let digits_only = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        let valid = match fraction {
            Some(frac) => {
                (!whole.is_empty() || !frac.is_empty())
                    && digits_only(whole)
                    && digits_only(frac)
            }
            None => !whole.is_empty() && digits_only(whole),
        };

        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ModelError::InvalidBidPrice(s.to_string()))
        }
    }
}

impl fmt::Display for BidPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Launch specification handed to the provider as-is.
// Fields this crate does not look at travel in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchSpecification {
    pub image_id: String,
    pub instance_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LaunchSpecification {
    /// Spot requests reject security groups given by name; presence alone counts.
    pub fn has_security_groups_by_name(&self) -> bool {
        self.security_groups.is_some()
    }
}

// Body of a spot request submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotRequestSpec {
    pub spot_price: BidPrice,
    pub instance_count: u32,
    pub launch_specification: LaunchSpecification,
}

impl SpotRequestSpec {
    pub fn new(launch_specification: LaunchSpecification, bid_price: BidPrice) -> Self {
        Self {
            spot_price: bid_price,
            instance_count: 1,
            launch_specification,
        }
    }
}

/// Ids of the spot request(s) created by one submission.
///
/// Not `Clone`: the poller owns the handle and cancellation consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct SpotRequestHandle {
    request_ids: Vec<String>,
}

impl SpotRequestHandle {
    pub fn new(request_ids: Vec<String>) -> Self {
        Self { request_ids }
    }

    pub fn request_ids(&self) -> &[String] {
        &self.request_ids
    }
}

impl fmt::Display for SpotRequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.request_ids.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotRequestState {
    Open,
    Active,
    Failed,
    Cancelled,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotRequestStatus {
    pub request_id: String,
    pub state: SpotRequestState,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
}

impl SpotRequestStatus {
    pub const PRICE_TOO_LOW: &'static str = "price-too-low";

    pub fn is_price_too_low(&self) -> bool {
        self.state == SpotRequestState::Open
            && self.status_code.as_deref() == Some(Self::PRICE_TOO_LOW)
    }
}

impl fmt::Display for SpotRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request {} is {:?}", self.request_id, self.state)?;
        if let Some(code) = &self.status_code {
            write!(f, " (code: {}", code)?;
            if let Some(message) = &self.status_message {
                write!(f, ", message: {}", message)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

// Burst-credit mode of an instance ("standard", "unlimited", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditSpecification(String);

impl CreditSpecification {
    pub fn new(cpu_credits: impl Into<String>) -> Self {
        Self(cpu_credits.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CreditSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsuccessfulInstance {
    pub instance_id: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

// Per-instance outcome of a credit specification update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditSpecificationUpdate {
    #[serde(default)]
    pub successful: Vec<String>,
    #[serde(default)]
    pub unsuccessful: Vec<UnsuccessfulInstance>,
}

// A provisioned instance; ownership passes to the caller of `create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub instance_id: String,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub launch_time: Option<DateTime<Utc>>,
}

impl Instance {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            instance_type: None,
            state: None,
            private_ip: None,
            launch_time: None,
        }
    }
}
