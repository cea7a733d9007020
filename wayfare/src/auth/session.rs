//! JWT session token creation and verification.
//!
//! Users and agencies share one token format. The `kind` claim says which table `sub` refers
//! to, so a user token can never be replayed against agency endpoints or the other way round.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::models::{agencies::CurrentAgency, users::CurrentUser},
    config::Config,
    errors::Error,
};

/// Which kind of account a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Agency,
}

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,           // User or agency ID
    pub email: String,       // Account email
    pub name: String,        // Display name
    pub kind: PrincipalKind, // Which account table `sub` refers to
    pub is_admin: bool,      // Admin flag, always false for agencies
    pub exp: i64,            // Expiration time
    pub iat: i64,            // Issued at
}

impl SessionClaims {
    fn new(sub: Uuid, email: &str, name: &str, kind: PrincipalKind, is_admin: bool, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.security.jwt_expiry;

        Self {
            sub,
            email: email.to_string(),
            name: name.to_string(),
            kind,
            is_admin,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn for_user(user: &CurrentUser, config: &Config) -> Self {
        Self::new(user.id, &user.email, &user.name, PrincipalKind::User, user.is_admin, config)
    }

    pub fn for_agency(agency: &CurrentAgency, config: &Config) -> Self {
        Self::new(agency.id, &agency.email, &agency.name, PrincipalKind::Agency, false, config)
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })
}

/// Sign session claims into a JWT
pub fn create_session_token(claims: &SessionClaims, config: &Config) -> Result<String, Error> {
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    encode(&Header::default(), claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a JWT session token
pub fn verify_session_token(token: &str, config: &Config) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    Ok(token_data.claims)
}

/// `Set-Cookie` value carrying a session token
pub fn create_session_cookie(token: &str, config: &Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = session_config.timeout.as_secs();
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, secure, session_config.cookie_same_site, max_age
    )
}

/// `Set-Cookie` value that expires the session cookie
pub fn clear_session_cookie(config: &Config) -> String {
    let session_config = &config.auth.native.session;
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}=; Path=/; HttpOnly{}; SameSite={}; Max-Age=0",
        session_config.cookie_name, secure, session_config.cookie_same_site
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, SecurityConfig};
    use std::time::Duration;

    fn create_test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            auth: AuthConfig {
                security: SecurityConfig {
                    jwt_expiry: Duration::from_secs(3600),
                    cors: crate::config::CorsConfig::default(),
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn create_test_user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "traveller@example.com".to_string(),
            name: "Test Traveller".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn test_create_and_verify_user_token() {
        let config = create_test_config();
        let user = create_test_user();

        let token = create_session_token(&SessionClaims::for_user(&user, &config), &config).unwrap();
        let claims = verify_session_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.kind, PrincipalKind::User);
        assert!(!claims.is_admin);
    }

    #[test]
    fn test_agency_tokens_never_admin() {
        let config = create_test_config();
        let agency = CurrentAgency {
            id: Uuid::new_v4(),
            email: "tours@example.com".to_string(),
            name: "Island Tours".to_string(),
        };

        let token = create_session_token(&SessionClaims::for_agency(&agency, &config), &config).unwrap();
        let claims = verify_session_token(&token, &config).unwrap();
        assert_eq!(claims.kind, PrincipalKind::Agency);
        assert!(!claims.is_admin);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = create_test_config();
        let token = create_session_token(&SessionClaims::for_user(&create_test_user(), &config), &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let result = verify_session_token(&token, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_expired_token() {
        let config = create_test_config();
        let mut claims = SessionClaims::for_user(&create_test_user(), &config);
        claims.exp = (Utc::now() - chrono::Duration::seconds(3600)).timestamp();

        let key = EncodingKey::from_secret(b"test-secret-key-for-jwt");
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let result = verify_session_token(&token, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_malformed_token() {
        let config = create_test_config();
        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let result = verify_session_token(token, &config);
            assert!(
                matches!(result.unwrap_err(), Error::Unauthenticated { .. }),
                "Expected Unauthenticated error for token: {token}"
            );
        }
    }

    #[test]
    fn test_cookie_secure_flag_follows_config() {
        let mut config = create_test_config();
        config.auth.native.session.cookie_secure = true;
        let cookie = create_session_cookie("abc", &config);
        assert!(cookie.starts_with("wayfare_session=abc; Path=/; HttpOnly; Secure;"));

        config.auth.native.session.cookie_secure = false;
        let cookie = create_session_cookie("abc", &config);
        assert!(!cookie.contains("Secure"));
        assert!(clear_session_cookie(&config).contains("Max-Age=0"));
    }
}
