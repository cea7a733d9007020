//! API request/response models for tour reviews.

use super::{users::UserSummary, validation};
use crate::db::models::reviews::{ReviewDBResponse, ReviewUpdateDBRequest, TourRatingDBResponse};
use crate::errors::Result;
use crate::types::{ReviewId, TourId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewCreate {
    #[schema(value_type = String, format = "uuid")]
    pub tour_id: TourId,
    #[schema(minimum = 1, maximum = 5)]
    pub rating: i32,
    pub comment: String,
}

impl ReviewCreate {
    pub fn validate(&self) -> Result<()> {
        validation::in_range("Rating", self.rating, 1, 5)?;
        validation::min_chars("Comment", &self.comment, 1)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReviewUpdate {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl ReviewUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(rating) = self.rating {
            validation::in_range("Rating", rating, 1, 5)?;
        }
        if let Some(comment) = &self.comment {
            validation::min_chars("Comment", comment, 1)?;
        }
        Ok(())
    }
}

impl From<ReviewUpdate> for ReviewUpdateDBRequest {
    fn from(api: ReviewUpdate) -> Self {
        Self {
            rating: api.rating,
            comment: api.comment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReviewId,
    #[schema(value_type = String, format = "uuid")]
    pub tour_id: TourId,
    pub tour_title: String,
    pub user: UserSummary,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReviewDBResponse> for ReviewResponse {
    fn from(db: ReviewDBResponse) -> Self {
        Self {
            id: db.id,
            tour_id: db.tour_id,
            tour_title: db.tour_title,
            user: UserSummary {
                id: db.user_id,
                name: db.user_name,
                image: db.user_image,
            },
            rating: db.rating,
            comment: db.comment,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct TourRatingResponse {
    /// Mean rating rounded to one decimal place; 0 when there are no reviews
    pub average_rating: f64,
    pub total_reviews: i64,
}

impl From<TourRatingDBResponse> for TourRatingResponse {
    fn from(db: TourRatingDBResponse) -> Self {
        Self {
            average_rating: (db.average_rating * 10.0).round() / 10.0,
            total_reviews: db.total_reviews,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let review = |rating| ReviewCreate {
            tour_id: uuid::Uuid::new_v4(),
            rating,
            comment: "Great guide".to_string(),
        };
        assert!(review(1).validate().is_ok());
        assert!(review(5).validate().is_ok());
        assert!(review(0).validate().is_err());
        assert!(review(6).validate().is_err());
    }

    #[test]
    fn test_average_is_rounded() {
        let rating = TourRatingResponse::from(TourRatingDBResponse {
            average_rating: 13.0 / 3.0,
            total_reviews: 3,
        });
        assert_eq!(rating.average_rating, 4.3);
    }
}
