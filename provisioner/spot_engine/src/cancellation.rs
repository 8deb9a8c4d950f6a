use log::{info, warn};
use std::sync::Arc;

use crate::client::CloudClient;
use crate::model::SpotRequestHandle;

// Best-effort cancellation of an abandoned spot request.
// Consumes the handle, so each request is cancelled at most once.
pub struct SpotRequestCanceller {
    client: Arc<dyn CloudClient>,
    log_target: &'static str,
}

impl SpotRequestCanceller {
    pub fn new(client: Arc<dyn CloudClient>, log_target: &'static str) -> Self {
        Self { client, log_target }
    }

    pub async fn cancel(&self, handle: SpotRequestHandle) {
        match self
            .client
            .cancel_spot_instance_requests(handle.request_ids())
            .await
        {
            Ok(cancelled) => {
                info!(
                    target: self.log_target,
                    "Spot cancel request returned: {:?}", cancelled
                );
            }
            Err(e) => {
                warn!(
                    target: self.log_target,
                    "Failed to cancel spot requests {}: {}", handle, e
                );
            }
        }
    }
}
