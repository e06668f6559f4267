//! lexoffice Client
//!
//! Combines credentials with an HTTP transport and turns non-success
//! responses into [`DispatchError::RemoteCallFailure`].

use super::credentials::Credentials;
use super::http::{sanitize_for_log, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::error::DispatchError;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

/// Main lexoffice client
#[derive(Clone)]
pub struct LexofficeClient {
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
}

impl LexofficeClient {
    pub fn new(credentials: Credentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    /// Create a client using the reqwest transport
    pub fn with_reqwest(credentials: Credentials) -> Result<Self> {
        Ok(Self::new(credentials, Arc::new(ReqwestTransport::new()?)))
    }

    /// Perform exactly one remote call
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DispatchError> {
        let response = self.transport.send(&self.credentials, request).await?;

        if !response.is_success() {
            let body = response.text();
            // only a sanitized, truncated body reaches the log
            tracing::error!(
                "API error: {} {} -> {} - {}",
                request.method,
                request.path,
                response.status,
                sanitize_for_log(&body)
            );
            return Err(DispatchError::RemoteCallFailure {
                status: Some(response.status),
                message: remote_error_message(&body),
            });
        }

        Ok(response)
    }
}

/// Pull the remote's own error message out of an error body.
///
/// The API answers with `{"message": ...}` or with an `IssueList` of
/// validation problems; anything else is passed through as text.
fn remote_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    if let Some(message) = value.get("message").and_then(|v| v.as_str()) {
        return message.to_string();
    }

    if let Some(issues) = value.get("IssueList").and_then(|v| v.as_array()) {
        let parts: Vec<String> = issues
            .iter()
            .map(|issue| {
                let key = issue.get("i18nKey").and_then(|v| v.as_str()).unwrap_or("-");
                match issue.get("source").and_then(|v| v.as_str()) {
                    Some(source) => format!("{}: {}", source, key),
                    None => key.to_string(),
                }
            })
            .collect();
        if !parts.is_empty() {
            return parts.join("; ");
        }
    }

    body.trim().to_string()
}
