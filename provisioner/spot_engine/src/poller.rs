use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::cancellation::SpotRequestCanceller;
use crate::client::CloudClient;
use crate::error::{FailureKind, Result, VmCreationFailed};
use crate::model::{Instance, SpotRequestHandle, SpotRequestState, SpotRequestStatus};

pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Fixed-count, fixed-interval polling budget.
///
/// The defaults split a 300 second wait into 10 attempts 30 seconds apart.
/// The first attempt is immediate; the interval separates consecutive attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_POLL_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollPolicy {
    pub fn total_wait(&self) -> Duration {
        self.interval * self.attempts
    }
}

// What one poll attempt learned about the request
enum Observation {
    Pending,
    Retry(String),
    Fulfilled(String),
    Failed(FailureKind, String),
}

pub struct FulfillmentPoller {
    client: Arc<dyn CloudClient>,
    canceller: SpotRequestCanceller,
    policy: PollPolicy,
    log_target: &'static str,
}

impl FulfillmentPoller {
    pub fn new(client: Arc<dyn CloudClient>, policy: PollPolicy, log_target: &'static str) -> Self {
        Self {
            canceller: SpotRequestCanceller::new(client.clone(), log_target),
            client,
            policy,
            log_target,
        }
    }

    /// Poll until the request is fulfilled or fails. Every failure cancels
    /// the request before the error is returned; success never does.
    pub async fn await_fulfillment(&self, handle: SpotRequestHandle) -> Result<Instance> {
        for attempt in 1..=self.policy.attempts {
            if attempt > 1 {
                sleep(self.policy.interval).await;
            }

            match self.observe(&handle).await {
                Observation::Pending => {
                    debug!(
                        target: self.log_target,
                        "Spot request {} still pending (attempt {}/{})",
                        handle,
                        attempt,
                        self.policy.attempts
                    );
                }
                Observation::Retry(reason) => {
                    warn!(
                        target: self.log_target,
                        "Retrying after expected error (attempt {}/{}): {}",
                        attempt,
                        self.policy.attempts,
                        reason
                    );
                }
                Observation::Fulfilled(instance_id) => {
                    return match self.client.resolve_instance(&instance_id).await {
                        Ok(instance) => Ok(instance),
                        Err(e) => {
                            let message =
                                format!("Failed to look up fulfilled instance {}: {}", instance_id, e);
                            Err(self.fail_and_cancel(handle, FailureKind::StatusLookup, message).await)
                        }
                    };
                }
                Observation::Failed(kind, message) => {
                    return Err(self.fail_and_cancel(handle, kind, message).await);
                }
            }
        }

        let message = format!(
            "Timed out after {:?} waiting for spot request {} to be fulfilled.",
            self.policy.total_wait(),
            handle
        );
        Err(self.fail_and_cancel(handle, FailureKind::TimedOut, message).await)
    }

    async fn observe(&self, handle: &SpotRequestHandle) -> Observation {
        let statuses = match self
            .client
            .describe_spot_instance_requests(handle.request_ids())
            .await
        {
            Ok(statuses) => statuses,
            Err(e) if e.is_transient() => return Observation::Retry(e.to_string()),
            Err(e) => {
                return Observation::Failed(
                    FailureKind::StatusLookup,
                    format!("Failed to describe spot request {}: {}", handle, e),
                )
            }
        };

        match statuses.into_iter().next() {
            Some(status) => self.interpret(status),
            None => Observation::Retry(format!("no status returned for spot request {}", handle)),
        }
    }

    fn interpret(&self, status: SpotRequestStatus) -> Observation {
        match status.state {
            SpotRequestState::Failed => Observation::Failed(
                FailureKind::RequestFailed,
                format!("VM spot instance creation failed: {}", status),
            ),
            SpotRequestState::Open if status.is_price_too_low() => Observation::Failed(
                FailureKind::PriceTooLow,
                format!(
                    "Cannot create VM spot instance because bid price is too low: {}",
                    status
                ),
            ),
            SpotRequestState::Open => Observation::Pending,
            SpotRequestState::Cancelled | SpotRequestState::Closed => Observation::Failed(
                FailureKind::RequestClosed,
                format!("Spot request ended before fulfillment: {}", status),
            ),
            SpotRequestState::Active => match status.instance_id {
                Some(instance_id) => {
                    info!(
                        target: self.log_target,
                        "Spot request instances fulfilled: {}", status.request_id
                    );
                    Observation::Fulfilled(instance_id)
                }
                None => Observation::Pending,
            },
        }
    }

    async fn fail_and_cancel(
        &self,
        handle: SpotRequestHandle,
        kind: FailureKind,
        message: String,
    ) -> VmCreationFailed {
        debug_assert!(kind.cancels_request(), "{} failures do not cancel", kind);
        warn!(target: self.log_target, "{}", message);
        self.canceller.cancel(handle).await;
        VmCreationFailed::new(kind, message)
    }
}
