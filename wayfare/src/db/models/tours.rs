//! Database models for tours.

use crate::types::{AgencyId, LocationId, TourId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct TourCreateDBRequest {
    pub agency_id: AgencyId,
    pub location_id: Option<LocationId>,
    pub title: String,
    pub description: String,
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
}

/// There is no `max_capacity` here: a tour's capacity is fixed once created.
#[derive(Debug, Clone, Default)]
pub struct TourUpdateDBRequest {
    pub location_id: Option<LocationId>,
    pub title: Option<String>,
    pub description: Option<String>,
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
}

/// Tour row joined with its agency summary
#[derive(Debug, Clone, FromRow)]
pub struct TourDBResponse {
    pub id: TourId,
    pub agency_id: AgencyId,
    pub agency_name: String,
    pub agency_logo: Option<String>,
    pub agency_verified: bool,
    pub location_id: Option<LocationId>,
    pub title: String,
    pub description: String,
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
