use crate::{
    AppState,
    api::models::{agencies::CurrentAgency, auth::Principal, users::CurrentUser},
    auth::session::{self, PrincipalKind, SessionClaims},
    config::Config,
    errors::{Error, Result},
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use tracing::{debug, instrument, trace};

/// Extract claims from the JWT session cookie if present and valid
/// Returns:
/// - None: No session cookie present, or every matching cookie failed verification
/// - Some(Ok(claims)): Valid JWT found and verified
/// - Some(Err(error)): Cookie header present but unreadable
#[instrument(skip(parts, config))]
fn try_cookie_auth(parts: &Parts, config: &Config) -> Option<Result<SessionClaims>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.native.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=')
            && name == cookie_name
        {
            match session::verify_session_token(value, config) {
                Ok(claims) => return Some(Ok(claims)),
                // Expired tokens are expected; fall through to other credentials
                Err(_) => continue,
            }
        }
    }
    None
}

/// Extract claims from an `Authorization: Bearer <jwt>` header
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(claims)): Valid JWT found and verified
/// - Some(Err(error)): Bearer token present but invalid
#[instrument(skip(parts, config))]
fn try_bearer_auth(parts: &Parts, config: &Config) -> Option<Result<SessionClaims>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    let token = auth_str.strip_prefix("Bearer ")?;
    Some(session::verify_session_token(token.trim(), config))
}

/// Authenticate a request from its session cookie or bearer token, in that order.
fn authenticate(parts: &Parts, config: &Config) -> Result<SessionClaims> {
    let mut attempted = false;

    match try_cookie_auth(parts, config) {
        Some(Ok(claims)) => {
            debug!("Found cookie session for {}", claims.sub);
            return Ok(claims);
        }
        Some(Err(e)) => {
            trace!("Cookie authentication failed: {:?}", e);
            attempted = true;
        }
        None => trace!("No session cookie"),
    }

    match try_bearer_auth(parts, config) {
        Some(Ok(claims)) => {
            debug!("Found bearer session for {}", claims.sub);
            return Ok(claims);
        }
        Some(Err(e)) => {
            trace!("Bearer authentication failed: {:?}", e);
            attempted = true;
        }
        None => trace!("No bearer token"),
    }

    if attempted {
        trace!("Credentials were present but none verified");
    }
    Err(Error::Unauthenticated { message: None })
}

fn user_from_claims(claims: SessionClaims) -> Result<CurrentUser> {
    match claims.kind {
        PrincipalKind::User => Ok(CurrentUser {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            is_admin: claims.is_admin,
        }),
        PrincipalKind::Agency => Err(Error::Unauthenticated {
            message: Some("This endpoint requires a user account".to_string()),
        }),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        user_from_claims(authenticate(parts, &state.config)?)
    }
}

/// For endpoints that are public but personalise the response for a signed-in user.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        Ok(authenticate(parts, &state.config).ok().and_then(|claims| user_from_claims(claims).ok()))
    }
}

impl FromRequestParts<AppState> for CurrentAgency {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims = authenticate(parts, &state.config)?;
        match claims.kind {
            PrincipalKind::Agency => Ok(CurrentAgency {
                id: claims.sub,
                email: claims.email,
                name: claims.name,
            }),
            PrincipalKind::User => Err(Error::Unauthenticated {
                message: Some("This endpoint requires an agency account".to_string()),
            }),
        }
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims = authenticate(parts, &state.config)?;
        Ok(match claims.kind {
            PrincipalKind::User => Principal::User(user_from_claims(claims)?),
            PrincipalKind::Agency => Principal::Agency(CurrentAgency {
                id: claims.sub,
                email: claims.email,
                name: claims.name,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_state;
    use axum::http::StatusCode;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn parts_with(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();
        request.into_parts().0
    }

    fn user_token(state: &AppState, is_admin: bool) -> (CurrentUser, String) {
        let user = CurrentUser {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            name: "Someone".to_string(),
            is_admin,
        };
        let token = session::create_session_token(&SessionClaims::for_user(&user, &state.config), &state.config).unwrap();
        (user, token)
    }

    #[sqlx::test]
    async fn test_cookie_and_bearer_both_work(pool: PgPool) {
        let state = create_test_state(pool);
        let (user, token) = user_token(&state, true);

        let cookie = format!("other=1; {}={token}", state.config.auth.native.session.cookie_name);
        let mut parts = parts_with("cookie", &cookie);
        let from_cookie = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(from_cookie.id, user.id);
        assert!(from_cookie.is_admin);

        let mut parts = parts_with("authorization", &format!("Bearer {token}"));
        let from_bearer = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(from_bearer.id, user.id);
    }

    #[sqlx::test]
    async fn test_agency_token_rejected_for_user_endpoints(pool: PgPool) {
        let state = create_test_state(pool);
        let agency = CurrentAgency {
            id: Uuid::new_v4(),
            email: "ops@tours.example.com".to_string(),
            name: "Tours".to_string(),
        };
        let token = session::create_session_token(&SessionClaims::for_agency(&agency, &state.config), &state.config).unwrap();

        let mut parts = parts_with("authorization", &format!("Bearer {token}"));
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let mut parts = parts_with("authorization", &format!("Bearer {token}"));
        let found = CurrentAgency::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(found.id, agency.id);

        let mut parts = parts_with("authorization", &format!("Bearer {token}"));
        let principal = Principal::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(matches!(principal, Principal::Agency(ref a) if a.id == agency.id));
        assert!(!principal.is_admin());
    }

    #[sqlx::test]
    async fn test_user_token_rejected_for_agency_endpoints(pool: PgPool) {
        let state = create_test_state(pool);
        let (_, token) = user_token(&state, false);

        let mut parts = parts_with("authorization", &format!("Bearer {token}"));
        let err = CurrentAgency::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_missing_or_bad_credentials(pool: PgPool) {
        let state = create_test_state(pool);

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let optional = <CurrentUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(optional.is_none());

        let mut parts = parts_with("authorization", "Bearer not-a-jwt");
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
