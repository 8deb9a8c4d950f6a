// File: provisioner/spot_engine/src/lib.rs

pub mod cancellation;
pub mod client;
pub mod credit;
pub mod error;
pub mod manager;
pub mod model;
pub mod poller;
pub mod redact;
pub mod submitter;

pub use client::{CloudClient, ProviderResult};
pub use error::{FailureKind, ModelError, ProviderError, Result, VmCreationFailed};
pub use manager::SpotInstanceManager;
pub use model::{
    BidPrice, CreditSpecification, CreditSpecificationUpdate, Instance, LaunchSpecification,
    SpotRequestHandle, SpotRequestSpec, SpotRequestState, SpotRequestStatus, UnsuccessfulInstance,
};
pub use poller::PollPolicy;
