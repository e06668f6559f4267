//! lexoffice-dispatch
//!
//! Operation dispatch and pagination engine for the lexoffice accounting
//! API. A caller names a resource and an operation, supplies raw input
//! records, and gets back an ordered sequence of JSON records.

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod input;
pub mod resource;

pub use api::client::LexofficeClient;
pub use api::credentials::Credentials;
pub use batch::{BatchOptions, BatchRunner};
pub use config::Config;
pub use error::{BatchFailure, DispatchError};
pub use input::{InputSource, JsonInput};
pub use resource::{Dispatcher, Operation, RequestParameters, ResourceType, ResultSequence};
