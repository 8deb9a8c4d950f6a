use std::fmt;
use thiserror::Error;

// Errors reported by a cloud provider client.
// The variant is the error-kind tag the poller inspects; only
// `RequestNotFound` is ever retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Spot request not found: {0}")]
    RequestNotFound(String),

    #[error("Provider API error: {code} - {message}")]
    Api { code: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// True for the eventual-consistency lookup error that clears up on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::RequestNotFound(_))
    }
}

// Model construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid bid price: {0:?}")]
    InvalidBidPrice(String),
}

// Which step of spot provisioning went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SecurityGroupsByName,
    Submission,
    RequestFailed,
    PriceTooLow,
    RequestClosed,
    StatusLookup,
    TimedOut,
    CreditSpecification,
}

impl FailureKind {
    /// Whether this failure happens while a spot request is outstanding,
    /// in which case the request is cancelled before the error is raised.
    pub fn cancels_request(&self) -> bool {
        !matches!(
            self,
            FailureKind::SecurityGroupsByName
                | FailureKind::Submission
                | FailureKind::CreditSpecification
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::SecurityGroupsByName => "security-groups-by-name",
            FailureKind::Submission => "submission",
            FailureKind::RequestFailed => "request-failed",
            FailureKind::PriceTooLow => "price-too-low",
            FailureKind::RequestClosed => "request-closed",
            FailureKind::StatusLookup => "status-lookup",
            FailureKind::TimedOut => "timed-out",
            FailureKind::CreditSpecification => "credit-specification",
        };
        f.write_str(name)
    }
}

// The single error surfaced to callers of `create`
#[derive(Error, Debug, Clone, PartialEq)]
#[error("VM creation failed ({kind}): {message}")]
pub struct VmCreationFailed {
    pub kind: FailureKind,
    pub message: String,
    pub retryable: bool,
}

impl VmCreationFailed {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
        }
    }
}

pub type Result<T> = std::result::Result<T, VmCreationFailed>;
