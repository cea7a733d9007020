//! Authentication and authorization.
//!
//! # Principals
//!
//! There are two kinds of account, users and agencies, kept in separate tables. Both log in
//! with email and password and receive the same kind of JWT session; the token's `kind` claim
//! decides which extractor accepts it:
//!
//! - [`crate::api::models::users::CurrentUser`]: user endpoints; rejects agency tokens with 401
//! - [`crate::api::models::agencies::CurrentAgency`]: agency endpoints; rejects user tokens
//!
//! The token is read from the session cookie first, then from `Authorization: Bearer`.
//!
//! # Google login
//!
//! Users may also sign in with Google (see [`google`]). The short-lived state that flow needs
//! lives in two [`expiring::ExpiringStore`]s on the application state.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for the authenticated principal
//! - [`expiring`]: Bounded TTL store for OAuth state and login codes
//! - [`google`]: Google OAuth client
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Ownership and admin checks
//! - [`session`]: JWT sessions and cookies
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use wayfare::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> Result<String, Error> {
//!     Ok(format!("Hello, {}!", current_user.name))
//! }
//! ```

pub mod current_user;
pub mod expiring;
pub mod google;
pub mod password;
pub mod permissions;
pub mod session;
