//! API request and response data models.
//!
//! These structs define the public wire format. They are distinct from the database models in
//! [`crate::db::models`] so storage and API can evolve independently; `From` impls convert
//! between the two.
//!
//! Request types carry a `validate()` method that handlers call before any database work.
//! Shared field checks live in [`validation`].
//!
//! # Model Categories
//!
//! - [`auth`], [`users`], [`agencies`]: accounts and sessions
//! - [`locations`], [`events`], [`trips`]: places and plans
//! - [`blogs`], [`votes`]: user writing, comments, replies and voting
//! - [`tours`], [`bookings`], [`reviews`]: the tour marketplace
//! - [`dashboard`]: admin statistics
//! - [`pagination`]: `skip`/`limit` paging shared by list endpoints

pub mod agencies;
pub mod auth;
pub mod blogs;
pub mod bookings;
pub mod dashboard;
pub mod events;
pub mod locations;
pub mod pagination;
pub mod reviews;
pub mod tours;
pub mod trips;
pub mod users;
pub mod validation;
pub mod votes;
