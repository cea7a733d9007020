//! Aggregate rows for the admin dashboard.

use crate::types::LocationId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_tours: i64,
    pub total_bookings: i64,
    pub total_locations: i64,
    pub total_blogs: i64,
    pub total_revenue: Decimal,
    pub pending_bookings: i64,
    pub confirmed_bookings: i64,
    pub active_agencies: i64,
}

/// One month's value; months with no rows are absent
#[derive(Debug, Clone, FromRow)]
pub struct MonthlyValue {
    pub month: i32,
    pub value: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct LocationEngagement {
    pub location_id: LocationId,
    pub name: String,
    pub province: String,
    pub category: String,
    pub favorites: i64,
    pub trips: i64,
    pub tours: i64,
    pub total_engagement: i64,
}

/// Kind of entry in the recent activity feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    UserRegistration,
    TourBooking,
    BlogPost,
    TourCreation,
}

#[derive(Debug, Clone)]
pub struct Activity {
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}
