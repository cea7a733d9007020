//! Database models for tour reviews.

use crate::types::{ReviewId, TourId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ReviewCreateDBRequest {
    pub tour_id: TourId,
    pub user_id: UserId,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewUpdateDBRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// Review row joined with the reviewer and tour title
#[derive(Debug, Clone, FromRow)]
pub struct ReviewDBResponse {
    pub id: ReviewId,
    pub tour_id: TourId,
    pub tour_title: String,
    pub user_id: UserId,
    pub user_name: String,
    pub user_image: Option<String>,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Average rating of a tour; `average_rating` is 0 when there are no reviews
#[derive(Debug, Clone, Copy, FromRow)]
pub struct TourRatingDBResponse {
    pub average_rating: f64,
    pub total_reviews: i64,
}
