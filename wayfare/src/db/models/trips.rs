//! Database models for trips and their participants.

use crate::types::{LocationId, TripId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct TripCreateDBRequest {
    pub title: String,
    pub description: Option<String>,
    pub location_id: Option<LocationId>,
    pub created_by: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct TripUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location_id: Option<LocationId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Trip row joined with its location name and participant count
#[derive(Debug, Clone, FromRow)]
pub struct TripDBResponse {
    pub id: TripId,
    pub title: String,
    pub description: Option<String>,
    pub location_id: Option<LocationId>,
    pub location_name: Option<String>,
    pub created_by: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub participant_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TripParticipantDBResponse {
    pub trip_id: TripId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub joined_at: DateTime<Utc>,
}
