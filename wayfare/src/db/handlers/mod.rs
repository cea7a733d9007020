//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed `PgConnection` (or a transaction, which derefs to one),
//! binds parameters, and returns the records from [`crate::db::models`]. Entities with plain
//! CRUD semantics implement the [`Repository`] trait; the rest expose inherent methods shaped
//! around their own rules.
//!
//! # Available Repositories
//!
//! - [`Users`], [`Agencies`]: the two kinds of account
//! - [`Locations`]: locations and per-user favourites
//! - [`Events`]: events, their location links and saves
//! - [`Blogs`], [`Comments`], [`Replies`]: posts and discussion threads
//! - [`Votes`]: up/down vote toggling on any of the above
//! - [`Trips`]: trips and their participants
//! - [`Tours`], [`Bookings`], [`Reviews`]: the tour marketplace, including the capacity guard
//! - [`Dashboard`]: read-only aggregates
//!
//! # Common Pattern
//!
//! ```ignore
//! use wayfare::db::handlers::{Locations, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Locations::new(&mut conn);
//!     let locations = repo.list(&LocationFilter::new(0, 10)).await?;
//!     Ok(())
//! }
//! ```

pub mod agencies;
pub mod blogs;
pub mod bookings;
pub mod comments;
pub mod dashboard;
pub mod events;
pub mod locations;
pub mod repository;
pub mod reviews;
pub mod tours;
pub mod trips;
pub mod users;
pub mod votes;

pub use agencies::Agencies;
pub use blogs::Blogs;
pub use bookings::Bookings;
pub use comments::{Comments, Replies};
pub use dashboard::Dashboard;
pub use events::Events;
pub use locations::Locations;
pub use repository::Repository;
pub use reviews::Reviews;
pub use tours::Tours;
pub use trips::Trips;
pub use users::Users;
pub use votes::Votes;
