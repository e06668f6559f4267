//! Resource Registry - Load operation schemas from JSON
//!
//! This module loads every (resource, operation) entry from embedded JSON
//! files and provides lookup functions for the builder, validator and
//! dispatcher.

use super::types::{Operation, ResourceType};
use crate::api::http::HttpMethod;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/master_data.json"),
    include_str!("../resources/bookkeeping.json"),
    include_str!("../resources/sales.json"),
    include_str!("../resources/events.json"),
];

/// Shape of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    #[default]
    Scalar,
    NestedObject,
    List,
}

/// Where a field ends up in the outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLocation {
    /// Substituted into a `{name}` placeholder of the path template
    Path,
    Query,
    #[default]
    Body,
    /// Merged into `additionalFields` by a composite builder
    Composite,
}

/// Conversion applied to raw input before it is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldEncoding {
    #[default]
    Plain,
    Integer,
    Number,
    Boolean,
    /// Calendar date or timestamp, normalized to RFC 3339 with milliseconds
    Date,
    /// `"customer"` becomes `{"customer": {}}`
    KeyedObject,
}

/// Field definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub location: FieldLocation,
    /// Remote name or dot path; defaults to `name`
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    pub encoding: FieldEncoding,
    #[serde(default)]
    pub default: Option<Value>,
}

impl FieldDescriptor {
    pub fn target(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.name)
    }
}

/// How a response body is turned into records
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseShape {
    #[default]
    Single,
    List {
        /// Dot path to the items array; empty means the body is the array
        #[serde(default)]
        items_path: String,
    },
    Binary,
}

/// Paging scheme a list endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStyle {
    #[default]
    None,
    Page,
    Cursor,
}

/// Dispatch entry for one (resource, operation) pair
#[derive(Debug, Clone, Deserialize)]
pub struct OperationDef {
    pub method: HttpMethod,
    /// Path relative to the API version root, with `{field}` placeholders
    pub path: String,
    /// Query pairs sent on every request
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub response: ResponseShape,
    #[serde(default)]
    pub pagination: PaginationStyle,
    #[serde(default)]
    pub sort_param: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl OperationDef {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    #[serde(default)]
    pub operations: BTreeMap<Operation, OperationDef>,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: BTreeMap<ResourceType, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig::default();

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        for (resource, def) in &final_config.resources {
            for (operation, op_def) in &def.operations {
                let mut seen = HashSet::new();
                for field in &op_def.fields {
                    if !seen.insert(field.name.as_str()) {
                        panic!(
                            "Duplicate field '{}' in schema for {} {}",
                            field.name, resource, operation
                        );
                    }
                }
            }
        }

        final_config
    })
}

/// Get a resource definition
pub fn get_resource(resource: ResourceType) -> Option<&'static ResourceDef> {
    get_registry().resources.get(&resource)
}

/// Get the dispatch entry for a (resource, operation) pair
pub fn operation_def(resource: ResourceType, operation: Operation) -> Option<&'static OperationDef> {
    get_resource(resource)?.operations.get(&operation)
}

/// All field descriptors for a pair, in schema order (empty when unknown)
pub fn schema(resource: ResourceType, operation: Operation) -> &'static [FieldDescriptor] {
    operation_def(resource, operation)
        .map(|def| def.fields.as_slice())
        .unwrap_or(&[])
}

/// Required field descriptors for a pair (empty when unknown)
pub fn required_fields(resource: ResourceType, operation: Operation) -> Vec<FieldDescriptor> {
    schema(resource, operation)
        .iter()
        .filter(|f| f.required)
        .cloned()
        .collect()
}

/// Operations a resource exposes
pub fn supported_operations(resource: ResourceType) -> Vec<Operation> {
    get_resource(resource)
        .map(|def| def.operations.keys().copied().collect())
        .unwrap_or_default()
}
