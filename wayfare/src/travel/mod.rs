//! Flight and hotel search, proxied to the Amadeus self-service API.
//!
//! Every call needs a client-credentials access token. Tokens are cached in a single-entry
//! [`moka`] cache that expires each token `token_refresh_margin` before the provider does, so a
//! request never goes out with a token about to lapse. Concurrent misses share one fetch.
//!
//! Provider failures become [`Error::Upstream`]: 4xx statuses pass through to the caller,
//! anything else surfaces as 502.

pub mod flights;
pub mod hotels;

use axum::http::StatusCode;
use moka::{Expiry, future::Cache};
use serde::Deserialize;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, instrument};
use url::Url;

use crate::{config::TravelConfig, errors::Error};

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    valid_for: Duration,
}

struct TokenExpiry;

impl Expiry<(), CachedToken> for TokenExpiry {
    fn expire_after_create(&self, _key: &(), value: &CachedToken, _created_at: Instant) -> Option<Duration> {
        Some(value.valid_for)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ProviderErrors {
    #[serde(default)]
    errors: Vec<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    detail: Option<String>,
}

/// Join the provider's `errors[]` into one readable message: `title (code): detail; ...`
fn describe_provider_errors(body: &str) -> Option<String> {
    let parsed: ProviderErrors = serde_json::from_str(body).ok()?;
    let parts: Vec<String> = parsed
        .errors
        .iter()
        .map(|e| {
            let mut part = e.title.clone().unwrap_or_else(|| "Error".to_string());
            if let Some(code) = &e.code {
                let code = code.as_str().map(str::to_string).unwrap_or_else(|| code.to_string());
                part.push_str(&format!(" ({code})"));
            }
            if let Some(detail) = &e.detail {
                part.push_str(&format!(": {detail}"));
            }
            part
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}

fn upstream_error(status: reqwest::StatusCode, body: &str) -> Error {
    let message = describe_provider_errors(body).unwrap_or_else(|| format!("Travel provider returned {status}"));
    let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    Error::Upstream { status, message }
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::Upstream {
        status: StatusCode::BAD_GATEWAY,
        message: format!("Travel provider request failed: {e}"),
    }
}

pub struct TravelClient {
    http: reqwest::Client,
    base_url: Url,
    client_id: String,
    client_secret: String,
    refresh_margin: Duration,
    request_timeout: Duration,
    tokens: Cache<(), CachedToken>,
}

impl TravelClient {
    /// Returns `None` when travel search is disabled or credentials are missing.
    pub fn from_config(config: &TravelConfig, http: reqwest::Client) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        Some(Self {
            http,
            base_url: config.base_url.clone(),
            client_id: config.client_id.clone()?,
            client_secret: config.client_secret.clone()?,
            refresh_margin: config.token_refresh_margin,
            request_timeout: config.request_timeout,
            tokens: Cache::builder().max_capacity(1).expire_after(TokenExpiry).build(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(|e| Error::Internal {
            operation: format!("build travel provider URL for {path}: {e}"),
        })
    }

    #[instrument(skip(self), err)]
    async fn fetch_token(&self) -> Result<CachedToken, Error> {
        let response = self
            .http
            .post(self.url("/v1/security/oauth2/token")?)
            .timeout(self.request_timeout)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Our credentials being refused is our problem, not the caller's
            return Err(Error::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: describe_provider_errors(&body).unwrap_or_else(|| format!("Travel provider token request returned {status}")),
            });
        }

        let token: TokenResponse = response.json().await.map_err(transport_error)?;
        let valid_for = Duration::from_secs(token.expires_in).saturating_sub(self.refresh_margin);
        debug!(expires_in = token.expires_in, valid_for = ?valid_for, "Fetched travel provider token");

        Ok(CachedToken {
            access_token: token.access_token,
            valid_for,
        })
    }

    /// A provider access token, fetched on first use and whenever the cached one lapses
    async fn access_token(&self) -> Result<String, Error> {
        let token = self
            .tokens
            .try_get_with((), self.fetch_token())
            .await
            .map_err(|e: Arc<Error>| {
                Arc::try_unwrap(e).unwrap_or_else(|shared| Error::Upstream {
                    status: StatusCode::BAD_GATEWAY,
                    message: shared.user_message(),
                })
            })?;
        Ok(token.access_token)
    }

    /// GET a provider endpoint with query parameters and return its JSON body
    #[instrument(skip(self, params), err)]
    pub async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<serde_json::Value, Error> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(self.url(path)?)
            .bearer_auth(token)
            .query(params)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                // Token revoked early; the next call fetches a fresh one
                self.tokens.invalidate(&()).await;
            }
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status, &body));
        }

        response.json().await.map_err(transport_error)
    }
}
