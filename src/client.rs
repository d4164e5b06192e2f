//! HTTP client for the Câmara dos Deputados open-data API.
//!
//! The upstream is public and unauthenticated. Every response uses the
//! standard envelope `{ "dados": <payload>, "links": [...] }`.
//! See: <https://dadosabertos.camara.leg.br/swagger/api.html>

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{JaburuError, Result};

/// Default base URL for the open-data API.
pub const DEFAULT_BASE_URL: &str = "https://dadosabertos.camara.leg.br/api/v2";

/// Default upstream request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One pagination link from the response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// Client for the Câmara dos Deputados API.
///
/// Thin wrapper over reqwest: builds the URL, forwards query parameters,
/// enforces the fixed timeout, and maps failures onto the crate's error
/// taxonomy. Resilience (cache, rate limit, breaker) lives in the
/// pipeline, not here.
#[derive(Clone)]
pub struct CamaraClient {
    http: Client,
    base_url: String,
}

impl CamaraClient {
    /// Create a client against the production API.
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// GET an endpoint, returning the decoded response envelope.
    ///
    /// `endpoint` is the path below the base URL (e.g. `/deputados`).
    /// The envelope must carry a `dados` field; a 2xx body without one is
    /// a [`JaburuError::Envelope`] failure, not a degraded success.
    pub async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request = self.http.get(&url).header("Accept", "application/json");
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(e, endpoint))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JaburuError::Api {
                status: status.as_u16(),
                endpoint: endpoint.to_owned(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| classify_body_error(e, endpoint))?;

        if body.get("dados").is_none() {
            return Err(JaburuError::Envelope {
                endpoint: endpoint.to_owned(),
                reason: "missing `dados` field".to_owned(),
            });
        }

        Ok(body)
    }
}

/// Map a send-phase reqwest error onto the taxonomy.
fn classify_transport_error(err: reqwest::Error, endpoint: &str) -> JaburuError {
    if err.is_timeout() {
        JaburuError::Timeout {
            endpoint: endpoint.to_owned(),
        }
    } else {
        JaburuError::Http(err.to_string())
    }
}

/// Map a body-phase reqwest error (read or decode) onto the taxonomy.
fn classify_body_error(err: reqwest::Error, endpoint: &str) -> JaburuError {
    if err.is_timeout() {
        JaburuError::Timeout {
            endpoint: endpoint.to_owned(),
        }
    } else if err.is_decode() {
        JaburuError::Envelope {
            endpoint: endpoint.to_owned(),
            reason: err.to_string(),
        }
    } else {
        JaburuError::Http(err.to_string())
    }
}

/// Parse the envelope's `links` array, if present.
///
/// A present-but-malformed array is an envelope failure: pagination
/// callers depend on it.
pub(crate) fn parse_links(envelope: &Value, endpoint: &str) -> Result<Vec<Link>> {
    match envelope.get("links") {
        None => Ok(Vec::new()),
        Some(links) => {
            serde_json::from_value(links.clone()).map_err(|e| JaburuError::Envelope {
                endpoint: endpoint.to_owned(),
                reason: format!("malformed `links` array: {e}"),
            })
        }
    }
}
