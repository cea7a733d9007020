//! Common type definitions shared across the API and database layers.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases so signatures say what they hold:
//!
//! - [`UserId`], [`AgencyId`]: the two kinds of account
//! - [`LocationId`], [`EventId`], [`TripId`]: places and happenings
//! - [`BlogId`], [`CommentId`], [`ReplyId`]: user generated content
//! - [`TourId`], [`BookingId`], [`ReviewId`]: the tour marketplace
//!
//! # Operations
//!
//! [`Operation`] names the action a caller attempted. It is carried by
//! [`crate::errors::Error::Forbidden`] so that permission failures read naturally
//! ("Insufficient permissions to Update booking").

use serde::Deserialize;
use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type AgencyId = Uuid;
pub type LocationId = Uuid;
pub type EventId = Uuid;
pub type TripId = Uuid;
pub type BlogId = Uuid;
pub type CommentId = Uuid;
pub type ReplyId = Uuid;
pub type TourId = Uuid;
pub type BookingId = Uuid;
pub type ReviewId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Common types for path parameters
#[derive(Debug, Clone, Deserialize)]
pub enum CurrentKeyword {
    #[serde(rename = "current")]
    Current,
}

/// Allows routes like /users/current and /users/{user_id} to hit the same handler.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserIdOrCurrent {
    Current(CurrentKeyword),
    Id(UserId),
}

impl UserIdOrCurrent {
    /// Resolve `current` against the caller's own id.
    pub fn resolve(&self, current: UserId) -> UserId {
        match self {
            UserIdOrCurrent::Current(_) => current,
            UserIdOrCurrent::Id(id) => *id,
        }
    }
}

/// Actions that can be attempted against a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "Create"),
            Operation::Read => write!(f, "Read"),
            Operation::Update => write!(f, "Update"),
            Operation::Delete => write!(f, "Delete"),
        }
    }
}
