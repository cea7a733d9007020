//! HTTP API layer: route handlers and their request/response models.
//!
//! - [`handlers`]: Axum handlers, grouped by resource
//! - [`models`]: Wire types, validated at the boundary and converted to and from
//!   [`crate::db::models`]

pub mod handlers;
pub mod models;
