use log::info;
use std::sync::Arc;

use crate::client::CloudClient;
use crate::credit::CreditSpecificationReconciler;
use crate::error::Result;
use crate::model::{BidPrice, CreditSpecification, Instance, LaunchSpecification};
use crate::poller::{FulfillmentPoller, PollPolicy};
use crate::submitter::SpotRequestSubmitter;

pub const DEFAULT_LOG_TARGET: &str = "spot_engine";

/// Creates spot instances.
///
/// Holds no per-request state: every `create` call owns its own request
/// handle, so one manager can serve concurrent calls from separate tasks.
pub struct SpotInstanceManager {
    submitter: SpotRequestSubmitter,
    poller: FulfillmentPoller,
    reconciler: CreditSpecificationReconciler,
    log_target: &'static str,
}

impl SpotInstanceManager {
    pub fn new(client: Arc<dyn CloudClient>, policy: PollPolicy) -> Self {
        Self::build(client, policy, DEFAULT_LOG_TARGET)
    }

    /// Same as `new`, logging under `log_target` instead of the default.
    pub fn with_log_target(
        client: Arc<dyn CloudClient>,
        policy: PollPolicy,
        log_target: &'static str,
    ) -> Self {
        Self::build(client, policy, log_target)
    }

    fn build(client: Arc<dyn CloudClient>, policy: PollPolicy, log_target: &'static str) -> Self {
        Self {
            submitter: SpotRequestSubmitter::new(client.clone(), log_target),
            poller: FulfillmentPoller::new(client.clone(), policy, log_target),
            reconciler: CreditSpecificationReconciler::new(client, log_target),
            log_target,
        }
    }

    // Submit, wait for fulfillment, then reconcile the credit specification.
    // Blocks the calling task for up to the full polling budget.
    pub async fn create(
        &self,
        launch_specification: &LaunchSpecification,
        bid_price: &BidPrice,
        credit_specification: Option<&CreditSpecification>,
    ) -> Result<Instance> {
        let handle = self.submitter.submit(launch_specification, bid_price).await?;
        let instance = self.poller.await_fulfillment(handle).await?;
        info!(
            target: self.log_target,
            "Spot instance {} is running", instance.instance_id
        );

        if let Some(desired) = credit_specification.filter(|c| !c.is_empty()) {
            self.reconciler.reconcile(&instance.instance_id, desired).await?;
        }

        Ok(instance)
    }
}
