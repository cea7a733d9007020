//! API request/response models for tour bookings.

use super::validation;
use crate::db::models::bookings::{BookingDBResponse, BookingStatus, BookingUpdateDBRequest};
use crate::errors::Result;
use crate::types::{BookingId, TourId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn check_participants(participants: i32) -> Result<()> {
    if participants < 1 {
        return Err(validation::bad_request("Participants must be at least 1"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingCreate {
    #[schema(value_type = String, format = "uuid")]
    pub tour_id: TourId,
    pub booking_date: NaiveDate,
    pub participants: i32,
    pub notes: Option<String>,
}

impl BookingCreate {
    pub fn validate(&self) -> Result<()> {
        check_participants(self.participants)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BookingUpdate {
    pub booking_date: Option<NaiveDate>,
    pub participants: Option<i32>,
    pub notes: Option<String>,
}

impl BookingUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(participants) = self.participants {
            check_participants(participants)?;
        }
        Ok(())
    }
}

impl From<BookingUpdate> for BookingUpdateDBRequest {
    fn from(api: BookingUpdate) -> Self {
        Self {
            booking_date: api.booking_date,
            participants: api.participants,
            notes: api.notes,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingTourSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: TourId,
    pub title: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingUserSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BookingId,
    pub tour: BookingTourSummary,
    pub user: BookingUserSummary,
    pub booking_date: NaiveDate,
    pub participants: i32,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingDBResponse> for BookingResponse {
    fn from(db: BookingDBResponse) -> Self {
        Self {
            id: db.id,
            tour: BookingTourSummary {
                id: db.tour_id,
                title: db.tour_title,
                images: db.tour_images,
            },
            user: BookingUserSummary {
                id: db.user_id,
                name: db.user_name,
                email: db.user_email,
            },
            booking_date: db.booking_date,
            participants: db.participants,
            total_price: db.total_price,
            status: db.status,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
