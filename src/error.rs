//! Engine errors
//!
//! Every failure the dispatch engine can surface. Callers match on the
//! variant to tell configuration mistakes (unsupported operation, missing
//! fields) apart from runtime failures (remote errors, paging).

use crate::resource::{Operation, ResourceType};
use serde_json::Value;

/// Errors produced while building, validating or executing an operation
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Missing required fields for {resource} {operation}: {}", .fields.join(", "))]
    MissingRequiredFields {
        resource: ResourceType,
        operation: Operation,
        fields: Vec<String>,
    },

    #[error("Operation '{operation}' is not supported for resource '{resource}'")]
    UnsupportedOperation {
        resource: ResourceType,
        operation: Operation,
    },

    #[error("{}", remote_message(.status, .message))]
    RemoteCallFailure { status: Option<u16>, message: String },

    #[error("Pagination for {resource} cannot determine termination: {reason}")]
    PaginationExhaustion {
        resource: ResourceType,
        reason: String,
    },

    #[error("Unknown {kind} tag: {value}")]
    UnknownTag { kind: &'static str, value: String },

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

fn remote_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("Remote call failed ({}): {}", status, message),
        None => format!("Remote call failed: {}", message),
    }
}

impl DispatchError {
    /// Stable tag for the error kind, used in error marker records
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::MissingRequiredFields { .. } => "missing_required_fields",
            DispatchError::UnsupportedOperation { .. } => "unsupported_operation",
            DispatchError::RemoteCallFailure { .. } => "remote_call_failure",
            DispatchError::PaginationExhaustion { .. } => "pagination_exhaustion",
            DispatchError::UnknownTag { .. } => "unknown_tag",
            DispatchError::InvalidFieldValue { .. } => "invalid_field_value",
        }
    }

    pub(crate) fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        DispatchError::InvalidFieldValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        DispatchError::RemoteCallFailure {
            status: None,
            message: err.to_string(),
        }
    }
}

/// A batch aborted on one record; records produced before it are kept
#[derive(Debug, thiserror::Error)]
#[error("Record {record_index} failed: {source}")]
pub struct BatchFailure {
    pub record_index: usize,
    pub completed: Vec<Value>,
    #[source]
    pub source: DispatchError,
}
