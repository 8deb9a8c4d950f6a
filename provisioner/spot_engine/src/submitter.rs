use log::{debug, error};
use std::sync::Arc;

use crate::client::CloudClient;
use crate::error::{FailureKind, Result, VmCreationFailed};
use crate::model::{BidPrice, LaunchSpecification, SpotRequestHandle, SpotRequestSpec};
use crate::redact::redacted_json;

pub(crate) const REDACTED_PATHS: &[&str] = &["launch_specification.user_data"];

// Sends the one spot request a `create` call is allowed to make
pub struct SpotRequestSubmitter {
    client: Arc<dyn CloudClient>,
    log_target: &'static str,
}

impl SpotRequestSubmitter {
    pub fn new(client: Arc<dyn CloudClient>, log_target: &'static str) -> Self {
        Self { client, log_target }
    }

    pub async fn submit(
        &self,
        launch_specification: &LaunchSpecification,
        bid_price: &BidPrice,
    ) -> Result<SpotRequestHandle> {
        if launch_specification.has_security_groups_by_name() {
            let message = "Cannot use security group names when creating spot instances";
            error!(target: self.log_target, "{}", message);
            return Err(VmCreationFailed::new(FailureKind::SecurityGroupsByName, message));
        }

        let spec = SpotRequestSpec::new(launch_specification.clone(), bid_price.clone());
        debug!(
            target: self.log_target,
            "Requesting spot instance with: {}",
            redacted_json(&spec, REDACTED_PATHS)
        );

        let request_ids = match self.client.request_spot_instances(&spec).await {
            Ok(ids) => ids,
            Err(e) => {
                let message = format!("Failed to get spot instance request: {}", e);
                error!(target: self.log_target, "{}", message);
                return Err(VmCreationFailed::new(FailureKind::Submission, message));
            }
        };

        if request_ids.is_empty() {
            let message = "Spot instance request returned no request ids";
            error!(target: self.log_target, "{}", message);
            return Err(VmCreationFailed::new(FailureKind::Submission, message));
        }

        debug!(target: self.log_target, "Got spot instance requests: {:?}", request_ids);
        Ok(SpotRequestHandle::new(request_ids))
    }
}
