//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - business rules & queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Transactions
//!
//! Repositories borrow a `PgConnection`, so the caller decides whether work runs in a
//! transaction. Anything that reads then writes based on what it read (capacity checks,
//! vote toggles, replacing link sets) must be given a transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let booking = Bookings::new(&mut tx).create(&request).await?;
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are applied on startup through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
