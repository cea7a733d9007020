//! Google OAuth 2.0 authorization-code login.
//!
//! The flow:
//!
//! 1. `GET /authentication/google` stores an [`OAuthFlow`] under a random `state` and redirects
//!    the browser to Google.
//! 2. Google redirects back to the callback with `code` and `state`. The code is exchanged for
//!    an access token ([`GoogleClient::exchange_code`]), which fetches the profile
//!    ([`GoogleClient::fetch_user`]).
//! 3. The callback mints a one-time login code and redirects the client to the web frontend or
//!    to the mobile app's redirect URI. The client trades the code for a session at
//!    `POST /authentication/token-exchange`. Session tokens never appear in a URL.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;
use utoipa::ToSchema;

use crate::{config::GoogleAuthConfig, errors::Error};

/// Where the login was started from, which decides where the callback sends the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Web,
    Mobile,
}

/// State kept between the redirect to Google and the callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthFlow {
    pub platform: Platform,
    pub redirect_uri: Option<String>,
}

impl Default for OAuthFlow {
    fn default() -> Self {
        Self {
            platform: Platform::Web,
            redirect_uri: None,
        }
    }
}

/// Profile returned by Google's userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// A mobile redirect must start with one of the configured prefixes.
pub fn check_mobile_redirect(redirect_uri: &str, allowed: &[String]) -> Result<(), Error> {
    if allowed.iter().any(|prefix| redirect_uri.starts_with(prefix.as_str())) {
        Ok(())
    } else {
        Err(Error::BadRequest {
            message: "Invalid redirect_uri for mobile login".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: Url,
    authorize_url: Url,
    token_url: Url,
    userinfo_url: Url,
}

impl GoogleClient {
    /// Returns `None` when Google login is disabled or not fully configured.
    pub fn from_config(config: &GoogleAuthConfig, http: reqwest::Client) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        Some(Self {
            http,
            client_id: config.client_id.clone()?,
            client_secret: config.client_secret.clone()?,
            callback_url: config.callback_url.clone(),
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            userinfo_url: config.userinfo_url.clone(),
        })
    }

    /// The URL to send the browser to, carrying `state`
    pub fn authorize_url(&self, state: &str) -> Url {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.callback_url.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", "openid profile email")
            .append_pair("state", state);
        url
    }

    /// Trade an authorization code for an access token
    #[instrument(skip_all, err)]
    pub async fn exchange_code(&self, code: &str) -> Result<String, Error> {
        let response = self
            .http
            .post(self.token_url.clone())
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: format!("Google token exchange failed ({status}): {body}"),
            });
        }

        let token: TokenResponse = response.json().await.map_err(transport_error)?;
        Ok(token.access_token)
    }

    #[instrument(skip_all, err)]
    pub async fn fetch_user(&self, access_token: &str) -> Result<GoogleUser, Error> {
        let response = self
            .http
            .get(self.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: format!("Google userinfo request failed ({status})"),
            });
        }

        response.json().await.map_err(transport_error)
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::Upstream {
        status: StatusCode::BAD_GATEWAY,
        message: format!("Google request failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http() -> reqwest::Client {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        reqwest::Client::new()
    }

    fn client_for(server: &MockServer) -> GoogleClient {
        let config = GoogleAuthConfig {
            enabled: true,
            client_id: Some("client-123".to_string()),
            client_secret: Some("shh".to_string()),
            token_url: format!("{}/token", server.uri()).parse().unwrap(),
            userinfo_url: format!("{}/userinfo", server.uri()).parse().unwrap(),
            ..Default::default()
        };
        GoogleClient::from_config(&config, http()).unwrap()
    }

    #[test]
    fn test_disabled_or_unconfigured_gives_none() {
        let config = GoogleAuthConfig::default();
        assert!(GoogleClient::from_config(&config, http()).is_none());

        let config = GoogleAuthConfig {
            enabled: true,
            client_id: Some("id".to_string()),
            ..Default::default()
        };
        assert!(GoogleClient::from_config(&config, http()).is_none());
    }

    #[tokio::test]
    async fn test_authorize_url_params() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let url = client.authorize_url("state-abc");

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["scope"], "openid profile email");
        assert_eq!(pairs["state"], "state-abc");
        assert_eq!(pairs["redirect_uri"], "http://localhost:3000/authentication/google/callback");
    }

    #[test]
    fn test_mobile_redirect_prefixes() {
        let allowed = vec!["wayfare://".to_string(), "exp://".to_string()];
        assert!(check_mobile_redirect("wayfare://auth", &allowed).is_ok());
        assert!(check_mobile_redirect("https://evil.example.com", &allowed).is_err());
        assert!(check_mobile_redirect("wayfare://auth", &[]).is_err());
    }

    #[tokio::test]
    async fn test_code_exchange_and_userinfo() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "google-access",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer google-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "1234",
                "email": "wanderer@gmail.com",
                "name": "Wanderer",
                "picture": "https://lh3.googleusercontent.com/a/pic"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let token = client.exchange_code("the-code").await.unwrap();
        assert_eq!(token, "google-access");

        let user = client.fetch_user(&token).await.unwrap();
        assert_eq!(user.email, "wanderer@gmail.com");
        assert_eq!(user.name.as_deref(), Some("Wanderer"));
    }

    #[tokio::test]
    async fn test_rejected_code_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "invalid_grant"})))
            .mount(&server)
            .await;

        let result = client_for(&server).exchange_code("stale").await;
        assert!(matches!(result, Err(Error::Upstream { status, .. }) if status == StatusCode::BAD_GATEWAY));
    }
}
