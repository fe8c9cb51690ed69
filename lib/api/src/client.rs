//! Remote resolver
//!
//! Resolves addresses by calling `GET /streets/search` on a running server.
//! A 404 carrying the service's "no team" envelope means the address has no
//! team; any other failure is an error, so callers can tell "no team" apart
//! from "service unavailable" or a misconfigured base URL.

use crate::rest::{ApiResponse, NO_TEAM_FOUND};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use teamroute_core::resolver::DEFAULT_LOOKUP_TIMEOUT;
use teamroute_core::{AddressQuery, Error, Resolution, Result, TeamResolver};
use tracing::debug;

/// [`TeamResolver`] backed by the address service's HTTP API
pub struct HttpTeamResolver {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpTeamResolver {
    /// Create a resolver for the server at `base_url` (e.g. "http://localhost:8083")
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_LOOKUP_TIMEOUT)
    }

    /// Create a resolver whose requests give up after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Upstream(format!("Address service request failed: {}", e))
        }
    }
}

/// A search that ran and matched nothing, as opposed to a 404 from a wrong route
fn is_no_team(body: &ApiResponse<serde_json::Value>) -> bool {
    !body.success && body.error.as_deref() == Some(NO_TEAM_FOUND)
}

#[async_trait]
impl TeamResolver for HttpTeamResolver {
    async fn resolve_address(&self, query: &AddressQuery) -> Result<Option<Resolution>> {
        let url = format!("{}/streets/search", self.base_url);
        let number = query.house_number.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("street", query.street_name.as_str()),
                ("number", number.as_str()),
                ("city", query.city.as_str()),
                ("state", query.state.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        debug!(%url, %status, "address service responded");

        if status == StatusCode::NOT_FOUND {
            let body = response.json::<ApiResponse<serde_json::Value>>().await.ok();
            if body.as_ref().is_some_and(is_no_team) {
                return Ok(None);
            }
            return Err(Error::Upstream(format!(
                "Address service returned 404 for {}",
                url
            )));
        }

        if !status.is_success() {
            let message = response
                .json::<ApiResponse<serde_json::Value>>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| status.to_string());

            return Err(match status {
                StatusCode::BAD_REQUEST => Error::InvalidInput(message),
                StatusCode::GATEWAY_TIMEOUT => Error::Timeout(self.timeout),
                _ => Error::Upstream(format!("Address service returned {}: {}", status, message)),
            });
        }

        let body: ApiResponse<Resolution> = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Invalid response from address service: {}", e)))?;

        match body.data {
            Some(resolution) if body.success => Ok(Some(resolution)),
            _ => Err(Error::Upstream(
                body.error
                    .unwrap_or_else(|| "Address service returned no data".to_string()),
            )),
        }
    }
}
