use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
};
use tracing::{info, warn};
use url::Url;

use crate::{
    AppState,
    api::models::{
        auth::{
            AuthResponse, AuthSuccessResponse, GoogleCallbackQuery, GoogleLoginQuery, LoginRequest, LoginResponse, LogoutResponse,
            RegisterRequest, TokenExchangeRequest, WithSessionCookie,
        },
        users::{CurrentUser, UserResponse},
        validation::normalize_email,
    },
    auth::{
        google::{self, GoogleClient, OAuthFlow, Platform},
        password,
        session::{self, SessionClaims},
    },
    config::Config,
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    errors::Error,
    types::UserId,
};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

/// Mint a session for `user` and wrap it as a body plus cookie.
fn user_session(user: UserDBResponse, config: &Config, status: StatusCode) -> Result<LoginResponse, Error> {
    let current_user = CurrentUser::from(&user);
    let token = session::create_session_token(&SessionClaims::for_user(&current_user, config), config)?;
    let cookie = session::create_session_cookie(&token, config);

    Ok(WithSessionCookie {
        status,
        body: AuthResponse {
            user: UserResponse::from(user),
            access_token: token,
        },
        cookie,
    })
}

fn google_client(state: &AppState) -> Result<&GoogleClient, Error> {
    state.google.as_deref().ok_or_else(|| Error::Unavailable {
        message: "Google login is not enabled".to_string(),
    })
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "User already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<LoginResponse, Error> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }
    if !state.config.auth.native.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    request.validate(&state.config.auth.native.password)?;
    let password_hash = password::hash_password(request.password, &state.config.auth.native.password).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let created_user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: normalize_email(&request.email),
            name: request.name.trim().to_string(),
            password_hash: Some(password_hash),
            image: None,
            auth_source: "native".to_string(),
            is_admin: false,
        })
        .await?;

    info!(user_id = %created_user.id, "User registered");
    user_session(created_user, &state.config, StatusCode::CREATED)
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_user_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(invalid_credentials)?;

    // Accounts created through Google have no password
    let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;
    if !password::verify_password(request.password, hash).await? {
        return Err(invalid_credentials());
    }

    user_session(user, &state.config, StatusCode::OK)
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    Ok(WithSessionCookie::ok(
        AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        session::clear_session_cookie(&state.config),
    ))
}

/// Start a Google login
#[utoipa::path(
    get,
    path = "/authentication/google",
    tag = "authentication",
    params(GoogleLoginQuery),
    responses(
        (status = 303, description = "Redirect to Google's consent screen"),
        (status = 400, description = "Mobile redirect_uri not allowed"),
        (status = 503, description = "Google login is not enabled"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn google_login(State(state): State<AppState>, Query(query): Query<GoogleLoginQuery>) -> Result<Redirect, Error> {
    let client = google_client(&state)?;

    let redirect_uri = match query.platform {
        Platform::Mobile => {
            let uri = query.redirect_uri.ok_or_else(|| Error::BadRequest {
                message: "redirect_uri is required for mobile login".to_string(),
            })?;
            google::check_mobile_redirect(&uri, &state.config.auth.google.allowed_mobile_redirects)?;
            Some(uri)
        }
        Platform::Web => None,
    };

    let flow_id = password::generate_token();
    state
        .flows
        .insert(
            flow_id.clone(),
            OAuthFlow {
                platform: query.platform,
                redirect_uri,
            },
        )
        .map_err(|e| Error::Unavailable {
            message: format!("Too many logins in progress, try again shortly ({e})"),
        })?;

    Ok(Redirect::to(client.authorize_url(&flow_id).as_str()))
}

/// Where the client goes once the login code is minted
fn success_redirect(config: &Config, flow: &OAuthFlow, code: &str) -> Result<Url, Error> {
    let mut target = match (flow.platform, flow.redirect_uri.as_deref()) {
        (Platform::Mobile, Some(uri)) => Url::parse(uri).map_err(|e| Error::BadRequest {
            message: format!("Invalid redirect_uri: {e}"),
        })?,
        _ => frontend_url(config, "auth-success")?,
    };
    target.query_pairs_mut().append_pair("code", code);
    Ok(target)
}

fn frontend_url(config: &Config, page: &str) -> Result<Url, Error> {
    let base = config.frontend_url.trim_end_matches('/');
    Url::parse(&format!("{base}/{page}")).map_err(|e| Error::Internal {
        operation: format!("build frontend redirect: {e}"),
    })
}

async fn complete_google_login(state: &AppState, query: &GoogleCallbackQuery) -> Result<UserId, Error> {
    if let Some(reason) = &query.error {
        return Err(Error::BadRequest {
            message: format!("Google login was cancelled: {reason}"),
        });
    }
    let code = query.code.as_deref().ok_or_else(|| Error::BadRequest {
        message: "Missing authorization code".to_string(),
    })?;

    let client = google_client(state)?;
    let access_token = client.exchange_code(code).await?;
    let profile = client.fetch_user(&access_token).await?;

    let email = normalize_email(&profile.email);
    let name = profile
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .find_or_create_oauth_user(&email, &name, profile.picture.as_deref())
        .await?;

    info!(user_id = %user.id, "Google login completed");
    Ok(user.id)
}

/// Google redirects here after consent
#[utoipa::path(
    get,
    path = "/authentication/google/callback",
    tag = "authentication",
    params(GoogleCallbackQuery),
    responses(
        (status = 303, description = "Redirect to the client with a one-time login code, or to the frontend error page"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn google_callback(State(state): State<AppState>, Query(query): Query<GoogleCallbackQuery>) -> Result<Redirect, Error> {
    // An unknown or expired state still completes the login, on the web
    let flow = query.state.as_ref().and_then(|id| state.flows.take(id)).unwrap_or_default();

    let outcome = match complete_google_login(&state, &query).await {
        Ok(user_id) => {
            let code = password::generate_token();
            state
                .login_codes
                .insert(code.clone(), user_id)
                .map_err(|e| Error::Unavailable {
                    message: format!("Too many logins in progress, try again shortly ({e})"),
                })
                .and_then(|_| success_redirect(&state.config, &flow, &code))
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(target) => Ok(Redirect::to(target.as_str())),
        Err(e) => {
            warn!("Google login failed: {e}");
            let mut target = frontend_url(&state.config, "auth-error")?;
            target.query_pairs_mut().append_pair("message", &e.user_message());
            Ok(Redirect::to(target.as_str()))
        }
    }
}

/// Trade a one-time login code for a session
#[utoipa::path(
    post,
    path = "/authentication/token-exchange",
    request_body = TokenExchangeRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid or expired code"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn token_exchange(State(state): State<AppState>, Json(request): Json<TokenExchangeRequest>) -> Result<LoginResponse, Error> {
    let invalid = || Error::Unauthenticated {
        message: Some("Invalid or expired code".to_string()),
    };

    let user_id = state.login_codes.take(&request.code).ok_or_else(invalid)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(user_id).await?.ok_or_else(invalid)?;

    user_session(user, &state.config, StatusCode::OK)
}
