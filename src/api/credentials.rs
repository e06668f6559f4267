//! API credentials

use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Default public API host
pub const DEFAULT_RESOURCE_URL: &str = "https://api.lexoffice.io";

/// API version prefix every resource path lives under
const API_VERSION: &str = "v1";

/// Credentials supplied by the host. Never cached or modified by the engine.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub api_key: String,
    pub resource_url: String,
}

impl Credentials {
    pub fn new(api_key: &str, resource_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            resource_url: resource_url.to_string(),
        }
    }

    /// Absolute URL for a resource path, e.g. `contacts/123`
    pub fn endpoint(&self, path: &str) -> Result<Url, DispatchError> {
        let base = self.resource_url.trim_end_matches('/');
        let raw = format!("{}/{}/{}", base, API_VERSION, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| {
            DispatchError::invalid_field("resourceUrl", format!("invalid URL '{}': {}", raw, e))
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("resource_url", &self.resource_url)
            .finish()
    }
}
