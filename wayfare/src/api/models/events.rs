//! API request/response models for events.

use super::{pagination::Pagination, validation};
use crate::db::models::events::{
    EventCreateDBRequest, EventDBResponse, EventLocationDBResponse, EventLocationLink, EventUpdateDBRequest, SaveStatus,
};
use crate::errors::Result;
use crate::types::{EventId, LocationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// A location an event takes place at, optionally with its own dates
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventLocationInput {
    #[schema(value_type = String, format = "uuid")]
    pub location_id: LocationId,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

fn check_links(links: &[EventLocationInput]) -> Result<()> {
    for link in links {
        if let (Some(start), Some(end)) = (&link.start_date, &link.end_date) {
            validation::ordered(start, end)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventCreate {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub image: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub locations: Vec<EventLocationInput>,
}

impl EventCreate {
    pub fn validate(&self) -> Result<()> {
        validation::min_chars("Name", &self.name, 2)?;
        validation::min_chars("Description", &self.description, 1)?;
        validation::ordered(&self.start_date, &self.end_date)?;
        check_links(&self.locations)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Replaces the full set of linked locations when present
    pub locations: Option<Vec<EventLocationInput>>,
}

impl EventUpdate {
    /// `current` is the stored event, so a lone new start or end date is checked against the other.
    pub fn validate(&self, current_start: DateTime<Utc>, current_end: DateTime<Utc>) -> Result<()> {
        if let Some(name) = &self.name {
            validation::min_chars("Name", name, 2)?;
        }
        let start = self.start_date.unwrap_or(current_start);
        let end = self.end_date.unwrap_or(current_end);
        validation::ordered(&start, &end)?;
        if let Some(links) = &self.locations {
            check_links(links)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventLocationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub location_id: LocationId,
    pub name: String,
    pub province: String,
    pub category: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub image: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub locations: Vec<EventLocationResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct SaveStatusResponse {
    pub is_saved: bool,
    pub count: i64,
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListEventsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    /// Case-insensitive substring match on name
    pub search: Option<String>,
    pub category: Option<String>,
    /// Province of any linked location
    pub province: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
    /// With `month`, only events overlapping that calendar month
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub year: Option<i32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(minimum = 1, maximum = 12)]
    pub month: Option<u32>,
}

impl ListEventsQuery {
    /// The `(year, month)` window, if both halves were given.
    pub fn month_window(&self) -> Result<Option<(i32, u32)>> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => {
                validation::in_range("Month", month, 1, 12)?;
                Ok(Some((year, month)))
            }
            (None, None) => Ok(None),
            _ => Err(validation::bad_request("year and month must be given together")),
        }
    }
}

impl From<EventLocationInput> for EventLocationLink {
    fn from(api: EventLocationInput) -> Self {
        Self {
            location_id: api.location_id,
            start_date: api.start_date,
            end_date: api.end_date,
            description: api.description,
        }
    }
}

impl From<EventCreate> for EventCreateDBRequest {
    fn from(api: EventCreate) -> Self {
        Self {
            name: api.name.trim().to_string(),
            description: api.description,
            category: api.category,
            image: api.image,
            start_date: api.start_date,
            end_date: api.end_date,
            locations: api.locations.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<EventUpdate> for EventUpdateDBRequest {
    fn from(api: EventUpdate) -> Self {
        Self {
            name: api.name.map(|n| n.trim().to_string()),
            description: api.description,
            category: api.category,
            image: api.image,
            start_date: api.start_date,
            end_date: api.end_date,
            locations: api.locations.map(|links| links.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<EventLocationDBResponse> for EventLocationResponse {
    fn from(db: EventLocationDBResponse) -> Self {
        Self {
            location_id: db.location_id,
            name: db.name,
            province: db.province,
            category: db.category,
            start_date: db.start_date,
            end_date: db.end_date,
            description: db.description,
        }
    }
}

impl From<EventDBResponse> for EventResponse {
    fn from(db: EventDBResponse) -> Self {
        let event = db.event;
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            category: event.category,
            image: event.image,
            start_date: event.start_date,
            end_date: event.end_date,
            locations: db.locations.into_iter().map(Into::into).collect(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

impl From<SaveStatus> for SaveStatusResponse {
    fn from(db: SaveStatus) -> Self {
        Self {
            is_saved: db.is_saved,
            count: db.count,
        }
    }
}
