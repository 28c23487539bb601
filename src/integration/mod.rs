//! # Integration Entry Points
//!
//! Resolves the configured mapping project to a target record type and runs
//! either the create flow or the transform flow, packaging the outcome as an
//! [`IntegrationResponse`].
//!
//! * `service` - the entry points and flow sequencing
//! * `request` - incoming payload validation
//! * `tables` - record type codes, lookup columns and restricted statuses

pub mod request;
pub mod service;
pub mod tables;

pub use request::IntegrationRequest;
pub use service::{FlowStage, IntegrationService};

use serde::{Deserialize, Serialize};

use crate::store::RecordId;

/// Error code carried by every failure payload
pub const APP_ERROR: &str = "APP_ERROR";

/// Body of a failure payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Failure payload, `{"error": {"code": "APP_ERROR", "message": ...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: ErrorBody,
}

/// Outcome of an entry point: the submitted record id, or an error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntegrationResponse {
    Created(RecordId),
    Failed(ErrorPayload),
}

impl IntegrationResponse {
    /// Create a successful response
    pub fn success(id: RecordId) -> Self {
        IntegrationResponse::Created(id)
    }

    /// Create a failed response
    pub fn failure(message: impl Into<String>) -> Self {
        IntegrationResponse::Failed(ErrorPayload {
            error: ErrorBody {
                code: APP_ERROR.to_string(),
                message: message.into(),
            },
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, IntegrationResponse::Created(_))
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            IntegrationResponse::Created(id) => Some(id),
            IntegrationResponse::Failed(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            IntegrationResponse::Created(_) => None,
            IntegrationResponse::Failed(payload) => Some(&payload.error.message),
        }
    }
}
