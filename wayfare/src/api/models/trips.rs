//! API request/response models for trips.

use super::{pagination::Pagination, validation};
use crate::db::models::trips::{TripCreateDBRequest, TripDBResponse, TripParticipantDBResponse, TripUpdateDBRequest};
use crate::errors::Result;
use crate::types::{LocationId, TripId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TripCreate {
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TripCreate {
    pub fn validate(&self) -> Result<()> {
        validation::min_chars("Title", &self.title, 3)?;
        validation::ordered(&self.start_date, &self.end_date)
    }

    pub fn into_db(self, created_by: UserId) -> TripCreateDBRequest {
        TripCreateDBRequest {
            title: self.title.trim().to_string(),
            description: self.description,
            location_id: self.location_id,
            created_by,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TripUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TripUpdate {
    pub fn validate(&self, current_start: NaiveDate, current_end: NaiveDate) -> Result<()> {
        if let Some(title) = &self.title {
            validation::min_chars("Title", title, 3)?;
        }
        validation::ordered(&self.start_date.unwrap_or(current_start), &self.end_date.unwrap_or(current_end))
    }
}

impl From<TripUpdate> for TripUpdateDBRequest {
    fn from(api: TripUpdate) -> Self {
        Self {
            title: api.title.map(|t| t.trim().to_string()),
            description: api.description,
            location_id: api.location_id,
            start_date: api.start_date,
            end_date: api.end_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TripResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TripId,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
    pub location_name: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub created_by: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub participant_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TripDBResponse> for TripResponse {
    fn from(db: TripDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            location_id: db.location_id,
            location_name: db.location_name,
            created_by: db.created_by,
            start_date: db.start_date,
            end_date: db.end_date,
            participant_count: db.participant_count,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl From<TripParticipantDBResponse> for ParticipantResponse {
    fn from(db: TripParticipantDBResponse) -> Self {
        Self {
            user_id: db.user_id,
            name: db.name,
            email: db.email,
            image: db.image,
            joined_at: db.joined_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddParticipantRequest {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListTripsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
    /// Trips starting on or after this date
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    /// Trips ending on or before this date
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}
