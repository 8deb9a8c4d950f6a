use log::{debug, error, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::client::CloudClient;
use crate::error::{FailureKind, Result, VmCreationFailed};
use crate::model::{CreditSpecification, UnsuccessfulInstance};

// Brings an instance's credit specification in line with the desired one.
// Failures here never cancel the spot request: the instance is already running.
pub struct CreditSpecificationReconciler {
    client: Arc<dyn CloudClient>,
    log_target: &'static str,
}

impl CreditSpecificationReconciler {
    pub fn new(client: Arc<dyn CloudClient>, log_target: &'static str) -> Self {
        Self { client, log_target }
    }

    pub async fn reconcile(&self, instance_id: &str, desired: &CreditSpecification) -> Result<()> {
        let current = self
            .client
            .describe_instance_credit_specification(instance_id)
            .await
            .map_err(|e| {
                credit_failure(format!(
                    "Failed to read credit specification of instance {}: {}",
                    instance_id, e
                ))
            })?;

        if &current == desired {
            debug!(
                target: self.log_target,
                "Instance {} already has credit specification {}", instance_id, desired
            );
            return Ok(());
        }

        // Single attempt; the token is never reused.
        let client_token = Uuid::new_v4().to_string();
        info!(
            target: self.log_target,
            "Updating credit specification of instance {} from {} to {}",
            instance_id,
            current,
            desired
        );

        let update = self
            .client
            .modify_instance_credit_specification(instance_id, desired, &client_token)
            .await
            .map_err(|e| {
                credit_failure(format!(
                    "Failed to update credit specification of instance {}: {}",
                    instance_id, e
                ))
            })?;

        if !update.unsuccessful.is_empty() {
            let message = format!(
                "Failed to set credit specification {} on instance(s): {}",
                desired,
                describe_unsuccessful(&update.unsuccessful)
            );
            error!(target: self.log_target, "{}", message);
            return Err(VmCreationFailed::new(FailureKind::CreditSpecification, message));
        }

        Ok(())
    }
}

fn credit_failure(message: String) -> VmCreationFailed {
    VmCreationFailed::new(FailureKind::CreditSpecification, message)
}

fn describe_unsuccessful(instances: &[UnsuccessfulInstance]) -> String {
    instances
        .iter()
        .map(|i| {
            format!(
                "{} ({}: {})",
                i.instance_id,
                i.error_code.as_deref().unwrap_or("unknown"),
                i.error_message.as_deref().unwrap_or("no message")
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
