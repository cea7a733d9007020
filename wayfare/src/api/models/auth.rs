//! Request and response bodies for `/authentication/*`.
//!
//! Successful logins return the session token in the body and set it as a cookie, so browser
//! clients can rely on the cookie while mobile clients send `Authorization: Bearer`.

use super::{
    agencies::{AgencyResponse, CurrentAgency},
    users::{CurrentUser, UserResponse},
    validation,
};
use crate::auth::google::Platform;
use crate::config::PasswordConfig;
use crate::errors::Result;
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self, passwords: &PasswordConfig) -> Result<()> {
        validation::email(&self.email)?;
        validation::min_chars("Name", &self.name, 2)?;
        crate::auth::password::check_length(&self.password, passwords.min_length, passwords.max_length)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenExchangeRequest {
    /// One-time code from the OAuth redirect
    pub code: String,
}

/// Query parameters for `GET /authentication/google`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GoogleLoginQuery {
    #[serde(default)]
    pub platform: Platform,
    /// Where a mobile client wants the login code delivered
    pub redirect_uri: Option<String>,
}

/// Query parameters Google sends to the callback
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by Google when the user declines consent
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgencyAuthResponse {
    pub agency: AgencyResponse,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// A JSON body sent with a `Set-Cookie` header.
#[derive(Debug)]
pub struct WithSessionCookie<T> {
    pub status: StatusCode,
    pub body: T,
    pub cookie: String,
}

impl<T> WithSessionCookie<T> {
    pub fn ok(body: T, cookie: String) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            cookie,
        }
    }

    pub fn created(body: T, cookie: String) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
            cookie,
        }
    }
}

impl<T: Serialize> IntoResponse for WithSessionCookie<T> {
    fn into_response(self) -> Response {
        (self.status, [(header::SET_COOKIE, self.cookie)], Json(self.body)).into_response()
    }
}

pub type LoginResponse = WithSessionCookie<AuthResponse>;
pub type AgencyLoginResponse = WithSessionCookie<AgencyAuthResponse>;
pub type LogoutResponse = WithSessionCookie<AuthSuccessResponse>;

/// Either kind of authenticated account, for endpoints both may call (tour management,
/// booking status).
#[derive(Debug, Clone)]
pub enum Principal {
    User(CurrentUser),
    Agency(CurrentAgency),
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        matches!(self, Principal::User(user) if user.is_admin)
    }
}
