//! Database models for events, their linked locations, and saves.

use crate::types::{EventId, LocationId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One location an event takes place at, with optional per-location dates
#[derive(Debug, Clone)]
pub struct EventLocationLink {
    pub location_id: LocationId,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EventCreateDBRequest {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub image: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub locations: Vec<EventLocationLink>,
}

/// `locations`, when present, replaces the whole set of links
#[derive(Debug, Clone, Default)]
pub struct EventUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub locations: Option<Vec<EventLocationLink>>,
}

/// Event row
#[derive(Debug, Clone, FromRow)]
pub struct EventRecord {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub image: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A linked location joined with its summary fields
#[derive(Debug, Clone, FromRow)]
pub struct EventLocationDBResponse {
    pub event_id: EventId,
    pub location_id: LocationId,
    pub name: String,
    pub province: String,
    pub category: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

/// An event together with the locations it is linked to
#[derive(Debug, Clone)]
pub struct EventDBResponse {
    pub event: EventRecord,
    pub locations: Vec<EventLocationDBResponse>,
}

/// Save state of an event for one user
#[derive(Debug, Clone, Copy, FromRow)]
pub struct SaveStatus {
    pub is_saved: bool,
    pub count: i64,
}
