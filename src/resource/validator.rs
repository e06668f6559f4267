//! Operation Validator
//!
//! Reports every required field that is absent, null or an empty string.

use super::builder::{is_empty_value, RequestParameters};
use super::json_path::has_path;
use super::registry::{required_fields, FieldLocation};
use super::types::{Operation, ResourceType};
use serde::{Deserialize, Serialize};

/// Which operations get their required fields enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationPolicy {
    /// Only `create` is checked; other operations rely on the host form
    CreateOnly,
    /// Every operation is checked against its schema entry
    #[default]
    Uniform,
}

impl ValidationPolicy {
    pub fn applies_to(self, operation: Operation) -> bool {
        match self {
            ValidationPolicy::CreateOnly => operation == Operation::Create,
            ValidationPolicy::Uniform => true,
        }
    }
}

/// Names of all missing required fields, in schema order. Empty means valid.
pub fn validate(
    resource: ResourceType,
    operation: Operation,
    params: &RequestParameters,
) -> Vec<String> {
    required_fields(resource, operation)
        .into_iter()
        .filter(|field| {
            let present = match field.location {
                FieldLocation::Composite => has_path(&params.additional_fields, field.target()),
                _ => params.get(&field.name).is_some_and(|v| !is_empty_value(v)),
            };
            !present
        })
        .map(|field| field.name)
        .collect()
}
