//! lexoffice API interaction module
//!
//! Everything the engine needs to talk to the remote API: credentials, the
//! HTTP transport seam, and the client that turns remote failures into
//! typed errors.
//!
//! # Module Structure
//!
//! - [`credentials`] - API key and base URL handed to the transport
//! - [`http`] - Request/response types, the [`http::HttpTransport`] trait and its reqwest implementation
//! - [`client`] - Client used by the dispatcher for one remote call at a time
//!
//! # Example
//!
//! ```ignore
//! use lexoffice_dispatch::api::{client::LexofficeClient, credentials::Credentials};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = LexofficeClient::with_reqwest(Credentials::new("key", "https://api.lexoffice.io"))?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod credentials;
pub mod http;
