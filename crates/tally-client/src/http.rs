//! # Retail Platform HTTP Session
//!
//! A thin wrapper over a shared `reqwest::Client` with the bearer token
//! and content type installed once as default headers, mirroring a
//! long-lived authenticated session. Endpoint-specific logic lives in
//! `search` and `webhooks`; this module only knows how to issue requests
//! and turn responses into typed results.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::config::RetailConfig;
use crate::error::{ClientError, ClientResult};

/// Authenticated HTTP client for the retail platform API.
#[derive(Debug, Clone)]
pub struct RetailClient {
    http: Client,
    api_base: String,
}

impl RetailClient {
    /// Builds a client from configuration.
    pub fn new(config: &RetailConfig) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", config.api_token);
        let mut auth_value = HeaderValue::from_str(&bearer)
            .map_err(|_| ClientError::InvalidConfig("API token is not header-safe".into()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(RetailClient {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL for an API endpoint path.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base, endpoint.trim_start_matches('/'))
    }

    /// Issues a GET with query parameters, returning the raw response.
    ///
    /// Used by the search pagination, which needs to see 429s and the
    /// `Retry-After` header rather than have them folded into an error.
    pub(crate) async fn get_raw<Q: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        query: &Q,
    ) -> ClientResult<Response> {
        let url = self.endpoint_url(endpoint);
        self.http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| ClientError::Request { url, source })
    }

    /// GET a JSON document.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> ClientResult<T> {
        let url = self.endpoint_url(endpoint);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Request { url, source })?;
        Self::decode_response(response).await
    }

    /// POST a JSON body and decode the JSON reply.
    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.endpoint_url(endpoint);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Request { url, source })?;
        Self::decode_response(response).await
    }

    /// PUT a JSON body and decode the JSON reply.
    pub(crate) async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.endpoint_url(endpoint);
        let response = self
            .http
            .put(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Request { url, source })?;
        Self::decode_response(response).await
    }

    /// DELETE, expecting no meaningful body.
    pub(crate) async fn delete(&self, endpoint: &str) -> ClientResult<()> {
        let url = self.endpoint_url(endpoint);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|source| ClientError::Request { url, source })?;
        Self::check_status(&response)?;
        Ok(())
    }

    fn check_status(response: &Response) -> ClientResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }

    async fn decode_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        Self::check_status(&response)?;
        let url = response.url().to_string();
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode {
                url,
                message: e.to_string(),
            })
    }
}

/// Exposed so the pagination module can special-case rate limiting.
pub(crate) const RATE_LIMITED: StatusCode = StatusCode::TOO_MANY_REQUESTS;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        let config = RetailConfig::new("https://acme.retail.example/api/2.0/", "t");
        let client = RetailClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint_url("search"),
            "https://acme.retail.example/api/2.0/search"
        );
        assert_eq!(
            client.endpoint_url("/webhooks/abc"),
            "https://acme.retail.example/api/2.0/webhooks/abc"
        );
    }

    #[test]
    fn test_rejects_header_unsafe_token() {
        let config = RetailConfig::new("https://acme.retail.example/api/2.0", "bad\ntoken");
        assert!(matches!(
            RetailClient::new(&config),
            Err(ClientError::InvalidConfig(_))
        ));
    }
}
