//! Database record models matching table schemas.
//!
//! Each module holds the request structs a repository accepts and the record structs it
//! returns. Records derive `sqlx::FromRow` and are converted into API models by `From`
//! impls in [`crate::api::models`], so storage and wire formats can move independently.
//!
//! - [`users`], [`agencies`]: the two kinds of account
//! - [`locations`], [`events`], [`trips`]: places and happenings
//! - [`blogs`], [`votes`]: user content, discussion and voting
//! - [`tours`], [`bookings`], [`reviews`]: the tour marketplace
//! - [`dashboard`]: aggregate rows for admin reporting

pub mod agencies;
pub mod blogs;
pub mod bookings;
pub mod dashboard;
pub mod events;
pub mod locations;
pub mod reviews;
pub mod tours;
pub mod trips;
pub mod users;
pub mod votes;
