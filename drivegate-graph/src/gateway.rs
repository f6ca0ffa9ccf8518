use std::sync::Arc;

use bytes::Bytes;
use reqwest::header;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::auth::TokenProvider;
use crate::error::GraphError;

/// Verb-oriented wrapper around the remote resource API.
///
/// Endpoints are relative to the configured base URL; percent-encoding of
/// path segments is the caller's responsibility. Failures are never retried:
/// a non-success status is logged and surfaced as [`GraphError::Api`] with
/// the raw response body.
#[derive(Clone)]
pub struct Gateway {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl Gateway {
    pub fn new(http: Client, base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GraphError> {
        let token = self.tokens.bearer_token().await?;
        let resp = self
            .http
            .get(self.url(endpoint))
            .bearer_auth(token)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!(method = "GET", endpoint, response = %body, "Graph API request failed");
            return Err(GraphError::Api { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn post<In, Out>(&self, endpoint: &str, data: &In) -> Result<Out, GraphError>
    where
        In: Serialize,
        Out: DeserializeOwned,
    {
        let payload = serde_json::to_string(data)?;
        let token = self.tokens.bearer_token().await?;
        let resp = self
            .http
            .post(self.url(endpoint))
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload.clone())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!(method = "POST", endpoint, request = %payload, response = %body, "Graph API request failed");
            return Err(GraphError::Api { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn put<In, Out>(&self, endpoint: &str, data: &In) -> Result<Out, GraphError>
    where
        In: Serialize,
        Out: DeserializeOwned,
    {
        let payload = serde_json::to_string(data)?;
        let token = self.tokens.bearer_token().await?;
        let resp = self
            .http
            .put(self.url(endpoint))
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload.clone())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!(method = "PUT", endpoint, request = %payload, response = %body, "Graph API request failed");
            return Err(GraphError::Api { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn patch<In, Out>(&self, endpoint: &str, data: &In) -> Result<Out, GraphError>
    where
        In: Serialize,
        Out: DeserializeOwned,
    {
        let payload = serde_json::to_string(data)?;
        let token = self.tokens.bearer_token().await?;
        let resp = self
            .http
            .patch(self.url(endpoint))
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload.clone())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!(method = "PATCH", endpoint, request = %payload, response = %body, "Graph API request failed");
            return Err(GraphError::Api { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn delete(&self, endpoint: &str) -> Result<(), GraphError> {
        let token = self.tokens.bearer_token().await?;
        let resp = self
            .http
            .delete(self.url(endpoint))
            .bearer_auth(token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            error!(method = "DELETE", endpoint, response = %body, "Graph API request failed");
            return Err(GraphError::Api { status, body });
        }
        Ok(())
    }

    /// Raw byte upload via PUT with `Content-Type: application/octet-stream`.
    pub async fn upload<Out: DeserializeOwned>(
        &self,
        endpoint: &str,
        data: Bytes,
    ) -> Result<Out, GraphError> {
        let request_bytes = data.len();
        let token = self.tokens.bearer_token().await?;
        let resp = self
            .http
            .put(self.url(endpoint))
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!(method = "PUT", endpoint, request_bytes, response = %body, "Graph API request failed");
            return Err(GraphError::Api { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
