//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Registration, login, logout, Google login and token exchange
//! - [`users`]: User CRUD operations and profile management
//! - [`agencies`]: Agency registration, login and public profiles
//! - [`locations`]: Locations and favourite locations
//! - [`events`]: Events and saved events
//! - [`blogs`]: Blogs, saved blogs, comments and replies
//! - [`votes`]: Up/down voting on blogs, comments and replies
//! - [`trips`]: Trips and trip participants
//! - [`tours`]: Tour listings, plus each tour's bookings, reviews and rating
//! - [`bookings`]: Tour bookings behind the capacity guard
//! - [`reviews`]: Tour reviews
//! - [`dashboard`]: Admin statistics
//! - [`travel`]: Flight and hotel search passthrough
//!
//! # Authentication
//!
//! Handlers take [`crate::api::models::users::CurrentUser`],
//! [`crate::api::models::agencies::CurrentAgency`] or [`crate::api::models::auth::Principal`]
//! as an extractor argument; see [`crate::auth::current_user`].
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the right HTTP status code.
//! Repositories report a missing row as a bare [`DbError::NotFound`]; handlers name the
//! resource with [`NotFoundExt::or_not_found`] so clients see which lookup failed, or use
//! [`NotFoundExt::or_missing`] where a route reports a fixed message instead.

pub mod agencies;
pub mod auth;
pub mod blogs;
pub mod bookings;
pub mod dashboard;
pub mod events;
pub mod locations;
pub mod reviews;
pub mod tours;
pub mod travel;
pub mod trips;
pub mod users;
pub mod votes;

use crate::db::errors::DbError;
use crate::errors::Error;
use std::fmt::Display;

pub(crate) fn not_found(resource: &str, id: impl Display) -> Error {
    Error::NotFound {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}

pub(crate) fn missing(message: impl Into<String>) -> Error {
    Error::Missing { message: message.into() }
}

/// Name the resource behind a repository's `NotFound`.
pub(crate) trait NotFoundExt<T>: Sized {
    fn or_else_missing(self, err: impl FnOnce() -> Error) -> Result<T, Error>;

    fn or_not_found(self, resource: &str, id: impl Display) -> Result<T, Error> {
        self.or_else_missing(|| not_found(resource, id))
    }

    fn or_missing(self, message: impl Into<String>) -> Result<T, Error> {
        self.or_else_missing(|| missing(message))
    }
}

impl<T> NotFoundExt<T> for Result<T, DbError> {
    fn or_else_missing(self, err: impl FnOnce() -> Error) -> Result<T, Error> {
        self.map_err(|e| match e {
            DbError::NotFound => err(),
            other => Error::Database(other),
        })
    }
}

impl<T> NotFoundExt<T> for Option<T> {
    fn or_else_missing(self, err: impl FnOnce() -> Error) -> Result<T, Error> {
        self.ok_or_else(err)
    }
}
