use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use spot_engine::{
    CloudClient, CreditSpecification, CreditSpecificationUpdate, Instance, ProviderError,
    ProviderResult, SpotRequestSpec, SpotRequestStatus,
};
use std::time::Duration;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{DriverError, Result};


// Error code the gateway uses while a new spot request is not yet visible
pub const REQUEST_NOT_FOUND_CODE: &str = "InvalidSpotInstanceRequestID.NotFound";
pub const REGION_HEADER: &str = "X-Provider-Region";

// Provider error body
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RequestIds {
    request_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DescribeResponse {
    requests: Vec<SpotRequestStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CancelResponse {
    cancelled: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CreditSpecificationBody {
    cpu_credits: CreditSpecification,
}

#[derive(Debug, Clone, Serialize)]
struct CreditSpecificationChange<'a> {
    cpu_credits: &'a CreditSpecification,
    client_token: &'a str,
}

// Cloud provider client speaking JSON to a provider gateway.
// One HTTP request per operation; retries are the poller's business.
#[derive(Debug, Clone)]
pub struct HttpCloudClient {
    base_url: Url,
    region: String,
    client: Client,
}

impl HttpCloudClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut endpoint = config.endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let base_url = Url::parse(&endpoint)
            .map_err(|e| DriverError::ConfigError(format!("Invalid provider endpoint: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| DriverError::HttpClientError(e.to_string()))?;

        Ok(Self {
            base_url,
            region: config.region.clone(),
            client,
        })
    }

    fn url(&self, path: &str) -> ProviderResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::Transport(format!("Invalid request path {}: {}", path, e)))
    }

    // Send one request and decode the JSON response
    async fn call<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ProviderResult<T> {
        let url = self.url(path)?;
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header(REGION_HEADER, &self.region);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Provider request to {} failed: {}", path, e);
            ProviderError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()));
        }

        let error_text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!("Could not read {} error body from {}: {}", status, path, e);
                String::new()
            }
        };
        Err(provider_error(status, &error_text))
    }
}

// Map a non-2xx gateway response onto the provider error kinds
fn provider_error(status: StatusCode, error_text: &str) -> ProviderError {
    match serde_json::from_str::<ErrorBody>(error_text) {
        Ok(body) if body.code == REQUEST_NOT_FOUND_CODE => ProviderError::RequestNotFound(body.message),
        Ok(body) => ProviderError::Api {
            code: body.code,
            message: body.message,
        },
        Err(_) => ProviderError::Api {
            code: status.as_u16().to_string(),
            message: error_text.to_string(),
        },
    }
}

#[async_trait]
impl CloudClient for HttpCloudClient {
    async fn request_spot_instances(&self, spec: &SpotRequestSpec) -> ProviderResult<Vec<String>> {
        let response: RequestIds = self.call(Method::POST, "spot-requests", Some(spec)).await?;
        Ok(response.request_ids)
    }

    async fn describe_spot_instance_requests(
        &self,
        request_ids: &[String],
    ) -> ProviderResult<Vec<SpotRequestStatus>> {
        let body = RequestIds {
            request_ids: request_ids.to_vec(),
        };
        let response: DescribeResponse = self
            .call(Method::POST, "spot-requests/describe", Some(&body))
            .await?;
        Ok(response.requests)
    }

    async fn cancel_spot_instance_requests(&self, request_ids: &[String]) -> ProviderResult<Vec<String>> {
        let body = RequestIds {
            request_ids: request_ids.to_vec(),
        };
        let response: CancelResponse = self
            .call(Method::POST, "spot-requests/cancel", Some(&body))
            .await?;
        Ok(response.cancelled)
    }

    async fn describe_instance_credit_specification(
        &self,
        instance_id: &str,
    ) -> ProviderResult<CreditSpecification> {
        let response: CreditSpecificationBody = self
            .call(
                Method::GET,
                &format!("instances/{}/credit-specification", instance_id),
                None::<&()>,
            )
            .await?;
        Ok(response.cpu_credits)
    }

    async fn modify_instance_credit_specification(
        &self,
        instance_id: &str,
        credit_specification: &CreditSpecification,
        client_token: &str,
    ) -> ProviderResult<CreditSpecificationUpdate> {
        let body = CreditSpecificationChange {
            cpu_credits: credit_specification,
            client_token,
        };
        self.call(
            Method::PUT,
            &format!("instances/{}/credit-specification", instance_id),
            Some(&body),
        )
        .await
    }

    async fn resolve_instance(&self, instance_id: &str) -> ProviderResult<Instance> {
        self.call(Method::GET, &format!("instances/{}", instance_id), None::<&()>)
            .await
    }
}
