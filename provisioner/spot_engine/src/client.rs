use async_trait::async_trait;

use crate::error::ProviderError;
use crate::model::{
    CreditSpecification, CreditSpecificationUpdate, Instance, SpotRequestSpec, SpotRequestStatus,
};

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// The cloud provider API consumed by spot provisioning.
///
/// Implementations issue exactly one provider call per method and never
/// retry; retry policy belongs to the fulfillment poller.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Create a spot request and return the ids of the request(s) it produced.
    async fn request_spot_instances(&self, spec: &SpotRequestSpec) -> ProviderResult<Vec<String>>;

    async fn describe_spot_instance_requests(
        &self,
        request_ids: &[String],
    ) -> ProviderResult<Vec<SpotRequestStatus>>;

    /// Returns the ids the provider acknowledged as cancelled.
    async fn cancel_spot_instance_requests(&self, request_ids: &[String]) -> ProviderResult<Vec<String>>;

    async fn describe_instance_credit_specification(
        &self,
        instance_id: &str,
    ) -> ProviderResult<CreditSpecification>;

    async fn modify_instance_credit_specification(
        &self,
        instance_id: &str,
        credit_specification: &CreditSpecification,
        client_token: &str,
    ) -> ProviderResult<CreditSpecificationUpdate>;

    async fn resolve_instance(&self, instance_id: &str) -> ProviderResult<Instance>;
}
