//! API request/response models for tours.

use super::{agencies::AgencySummary, pagination::Pagination, validation};
use crate::db::models::tours::{TourCreateDBRequest, TourDBResponse, TourUpdateDBRequest};
use crate::errors::Result;
use crate::types::{AgencyId, LocationId, TourId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TourCreate {
    pub title: String,
    pub description: String,
    #[schema(value_type = String, example = "149.99")]
    pub price: Decimal,
    pub duration_days: i32,
    pub max_capacity: i32,
    pub images: Vec<String>,
    pub itinerary: String,
    pub includes: Option<String>,
    pub excludes: Option<String>,
    pub start_dates: Vec<NaiveDate>,
    pub category: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
}

fn check_price(price: Decimal) -> Result<()> {
    if price.is_sign_negative() {
        return Err(validation::bad_request("Price must not be negative"));
    }
    Ok(())
}

fn check_duration(days: i32) -> Result<()> {
    if days < 1 {
        return Err(validation::bad_request("Duration must be at least 1 day"));
    }
    Ok(())
}

impl TourCreate {
    pub fn validate(&self) -> Result<()> {
        validation::min_chars("Title", &self.title, 3)?;
        validation::min_chars("Description", &self.description, 1)?;
        validation::min_chars("Itinerary", &self.itinerary, 1)?;
        check_price(self.price)?;
        check_duration(self.duration_days)?;
        if self.max_capacity < 1 {
            return Err(validation::bad_request("Max capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn into_db(self, agency_id: AgencyId) -> TourCreateDBRequest {
        TourCreateDBRequest {
            agency_id,
            location_id: self.location_id,
            title: self.title.trim().to_string(),
            description: self.description,
            price: self.price,
            duration_days: self.duration_days,
            max_capacity: self.max_capacity,
            images: self.images,
            itinerary: self.itinerary,
            includes: self.includes,
            excludes: self.excludes,
            start_dates: self.start_dates,
            category: self.category,
            province: self.province,
            district: self.district,
        }
    }
}

/// Tour edits. The capacity ceiling is fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TourUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub duration_days: Option<i32>,
    pub images: Option<Vec<String>>,
    pub itinerary: Option<String>,
    pub includes: Option<String>,
    pub excludes: Option<String>,
    pub start_dates: Option<Vec<NaiveDate>>,
    pub category: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
    /// Always rejected when present
    #[serde(default, skip_serializing)]
    #[schema(read_only)]
    pub max_capacity: Option<i32>,
}

impl TourUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.max_capacity.is_some() {
            return Err(validation::bad_request("Max capacity cannot be changed after a tour is created"));
        }
        if let Some(title) = &self.title {
            validation::min_chars("Title", title, 3)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(days) = self.duration_days {
            check_duration(days)?;
        }
        Ok(())
    }
}

impl From<TourUpdate> for TourUpdateDBRequest {
    fn from(api: TourUpdate) -> Self {
        Self {
            location_id: api.location_id,
            title: api.title.map(|t| t.trim().to_string()),
            description: api.description,
            price: api.price,
            duration_days: api.duration_days,
            images: api.images,
            itinerary: api.itinerary,
            includes: api.includes,
            excludes: api.excludes,
            start_dates: api.start_dates,
            category: api.category,
            province: api.province,
            district: api.district,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TourResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TourId,
    pub agency: AgencySummary,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
    pub title: String,
    pub description: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub duration_days: i32,
    pub max_capacity: i32,
    pub images: Vec<String>,
    pub itinerary: String,
    pub includes: Option<String>,
    pub excludes: Option<String>,
    pub start_dates: Vec<NaiveDate>,
    pub category: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TourDBResponse> for TourResponse {
    fn from(db: TourDBResponse) -> Self {
        Self {
            id: db.id,
            agency: AgencySummary {
                id: db.agency_id,
                name: db.agency_name,
                logo: db.agency_logo,
                verified: db.agency_verified,
            },
            location_id: db.location_id,
            title: db.title,
            description: db.description,
            price: db.price,
            duration_days: db.duration_days,
            max_capacity: db.max_capacity,
            images: db.images,
            itinerary: db.itinerary,
            includes: db.includes,
            excludes: db.excludes,
            start_dates: db.start_dates,
            category: db.category,
            province: db.province,
            district: db.district,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListToursQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    pub category: Option<String>,
    pub province: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
    /// Case-insensitive substring match on title or description
    pub search: Option<String>,
}
