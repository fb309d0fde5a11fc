//! HTTP transport for the NS API.
//!
//! All network access goes through [`Transport`] so that the decoding
//! layer can be driven by canned responses in tests.

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use super::client::NsApiConfig;
use super::error::NsApiError;

/// Performs one request and returns the raw response body.
pub trait Transport {
    /// Issue a request against `url`.
    ///
    /// `params` are sent as the query string. Fails with
    /// [`NsApiError::Api`] (or [`NsApiError::Unauthorized`]) on a
    /// non-success status and [`NsApiError::Http`] when no response
    /// arrives.
    fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        params: &[(&str, &str)],
    ) -> Result<String, NsApiError>;
}

/// Blocking reqwest transport with HTTP Basic authentication.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    username: String,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport from the client configuration.
    pub fn new(config: &NsApiConfig) -> Result<Self, NsApiError> {
        let mut headers = HeaderMap::new();
        let xml = HeaderValue::from_static("application/xml");
        headers.insert(ACCEPT, xml.clone());
        headers.insert(CONTENT_TYPE, xml);

        let mut builder = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            username: config.username.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        params: &[(&str, &str)],
    ) -> Result<String, NsApiError> {
        debug!(%method, url, ?params, "NS API request");

        let mut request = self
            .http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.api_key));
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send()?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            debug!(%status, url, "NS API rejected credentials");
            return Err(NsApiError::Unauthorized);
        }

        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            debug!(%status, url, "NS API request failed");
            return Err(NsApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_creation() {
        let config = NsApiConfig::new("user@example.com", "secret");
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[test]
    fn transport_with_timeout() {
        let config = NsApiConfig::new("user@example.com", "secret")
            .with_timeout(std::time::Duration::from_secs(5));
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[test]
    fn connection_failure_is_http_error() {
        // Nothing listens on port 9 (discard) on loopback in test environments
        let config = NsApiConfig::new("user", "key")
            .with_timeout(std::time::Duration::from_secs(2));
        let transport = HttpTransport::new(&config).unwrap();

        let err = transport
            .request(Method::GET, "http://127.0.0.1:9/ns-api-avt", None, &[])
            .unwrap_err();
        assert!(matches!(err, NsApiError::Http(_)));
        assert_eq!(err.status(), None);
    }
}
