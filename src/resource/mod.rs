//! Resource abstraction layer
//!
//! This module provides a data-driven approach to dispatching lexoffice
//! operations. Every supported (resource, operation) pair is an entry in
//! JSON files loaded at compile time, so new endpoints are added without
//! code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches operation definitions from embedded JSON
//! - [`builder`] - Turns raw input records into a normalized parameter bag
//! - [`composite`] - Assembles nested settings objects into `additionalFields`
//! - [`validator`] - Reports missing required fields
//! - [`dispatch`] - Shapes the request and performs the remote call
//! - [`fetcher`] - Reconciles ReturnAll, cursor and page/offset listings
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `master_data.json` - contacts, articles, profile and lookup lists
//! - `bookkeeping.json` - vouchers, payments, files, recurring templates
//! - `sales.json` - invoices, quotations and the other sales vouchers
//! - `events.json` - event subscriptions
//!
//! # Example
//!
//! ```ignore
//! use lexoffice_dispatch::input::JsonInput;
//! use lexoffice_dispatch::resource::{build, Dispatcher, Operation, ResourceType};
//!
//! async fn all_contacts(dispatcher: &Dispatcher) -> anyhow::Result<Vec<serde_json::Value>> {
//!     let input = JsonInput::from_value(serde_json::json!({"returnAll": true})).unwrap();
//!     let params = build(ResourceType::Contact, Operation::GetAll, &input, 0)?;
//!     Ok(dispatcher.execute(&params).await?.records)
//! }
//! ```

pub mod builder;
pub mod composite;
pub mod dispatch;
mod fetcher;
mod json_path;
pub mod registry;
mod types;
pub mod validator;

pub use builder::{build, RequestParameters, DEFAULT_LIMIT, MAX_PAGE_SIZE};
pub use dispatch::{shape_request, Dispatcher, ResultSequence};
pub use fetcher::{PageCursor, PageMode, PagingLimits, MAX_PAGES, RETURN_ALL_PAGE_SIZE};
pub use registry::{get_registry, operation_def, required_fields, schema, supported_operations};
pub use types::{Operation, ResourceType, SortOption};
pub use validator::{validate, ValidationPolicy};
