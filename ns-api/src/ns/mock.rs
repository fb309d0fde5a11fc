//! Mock transport for testing without API access.
//!
//! Serves canned XML bodies keyed by endpoint path and records every
//! request it receives.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use reqwest::Method;

use super::error::NsApiError;
use super::transport::Transport;

/// A request received by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub params: Vec<(String, String)>,
}

/// Transport that answers from canned response bodies.
///
/// Responses are keyed by the last path segment of the request URL
/// (e.g., `ns-api-avt`). Requests for unknown endpoints fail with a 404
/// [`NsApiError::Api`].
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: HashMap<String, String>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Create a mock with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load responses from a directory.
    ///
    /// Expects files named `{endpoint}.xml` (e.g., `ns-api-avt.xml`).
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, NsApiError> {
        let data_dir = data_dir.as_ref();
        let load_error =
            |message: String| NsApiError::NotConfigured(format!("mock responses: {message}"));

        let entries = std::fs::read_dir(data_dir)
            .map_err(|e| load_error(format!("failed to read {}: {e}", data_dir.display())))?;

        let mut responses = HashMap::new();
        for entry in entries {
            let path = entry
                .map_err(|e| load_error(format!("failed to read directory entry: {e}")))?
                .path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("xml") {
                continue;
            }

            let endpoint = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| load_error(format!("invalid filename: {}", path.display())))?
                .to_string();
            let body = std::fs::read_to_string(&path)
                .map_err(|e| load_error(format!("failed to read {}: {e}", path.display())))?;

            responses.insert(endpoint, body);
        }

        if responses.is_empty() {
            return Err(load_error(format!(
                "no response files found in {}",
                data_dir.display()
            )));
        }

        Ok(Self {
            responses,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Add or replace the response for an endpoint.
    pub fn with_response(mut self, endpoint: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(endpoint.into(), body.into());
        self
    }

    /// Endpoints with a canned response, sorted.
    pub fn endpoints(&self) -> Vec<&str> {
        let mut endpoints: Vec<&str> = self.responses.keys().map(String::as_str).collect();
        endpoints.sort_unstable();
        endpoints
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Transport for MockTransport {
    fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        params: &[(&str, &str)],
    ) -> Result<String, NsApiError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedRequest {
                method,
                url: url.to_string(),
                body: body.map(str::to_string),
                params: params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });

        let endpoint = url.rsplit('/').next().unwrap_or(url);
        self.responses
            .get(endpoint)
            .cloned()
            .ok_or_else(|| NsApiError::Api {
                status: 404,
                message: format!(
                    "no mock response for {endpoint}. Available: {:?}",
                    self.endpoints()
                ),
            })
    }
}
