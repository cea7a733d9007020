//! Database models for tour bookings.

use crate::types::{AgencyId, BookingId, TourId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

/// Booking lifecycle state.
///
/// ```text
/// PENDING ──► CONFIRMED ──► COMPLETED
///    │            │
///    └─────┬──────┘
///          ▼
///      CANCELLED
/// ```
///
/// `CANCELLED` and `COMPLETED` are terminal. Only non-cancelled bookings count towards
/// a tour's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Check a status change against the lifecycle, returning the client-facing reason
    /// when it is not allowed.
    pub fn transition_to(self, next: BookingStatus) -> Result<BookingStatus, String> {
        use BookingStatus::*;
        match (self, next) {
            (Cancelled, _) => Err("Cannot update a cancelled booking".to_string()),
            (Completed, _) => Err("Cannot update a completed booking".to_string()),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending, Cancelled) | (Confirmed, Cancelled) => Ok(next),
            (from, to) if from == to => Err(format!("Booking is already {from}")),
            (from, to) => Err(format!("Cannot change booking status from {from} to {to}")),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "PENDING"),
            BookingStatus::Confirmed => write!(f, "CONFIRMED"),
            BookingStatus::Cancelled => write!(f, "CANCELLED"),
            BookingStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// A request to hold seats on a tour for one day
#[derive(Debug, Clone)]
pub struct BookingCreateDBRequest {
    pub tour_id: TourId,
    pub user_id: UserId,
    pub booking_date: NaiveDate,
    pub participants: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingUpdateDBRequest {
    pub booking_date: Option<NaiveDate>,
    pub participants: Option<i32>,
    pub notes: Option<String>,
}

/// Booking row joined with a summary of the tour it is for
#[derive(Debug, Clone, FromRow)]
pub struct BookingDBResponse {
    pub id: BookingId,
    pub tour_id: TourId,
    pub tour_title: String,
    pub tour_images: Vec<String>,
    pub agency_id: AgencyId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub booking_date: NaiveDate,
    pub participants: i32,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::BookingStatus::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert_eq!(Pending.transition_to(Confirmed), Ok(Confirmed));
        assert_eq!(Confirmed.transition_to(Completed), Ok(Completed));
        assert_eq!(Pending.transition_to(Cancelled), Ok(Cancelled));
        assert_eq!(Confirmed.transition_to(Cancelled), Ok(Cancelled));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in [Pending, Confirmed, Cancelled, Completed] {
            assert_eq!(Cancelled.transition_to(next), Err("Cannot update a cancelled booking".to_string()));
            assert_eq!(Completed.transition_to(next), Err("Cannot update a completed booking".to_string()));
        }
        assert!(Cancelled.is_terminal());
        assert!(Completed.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn test_skipping_or_reversing_rejected() {
        assert_eq!(
            Pending.transition_to(Completed),
            Err("Cannot change booking status from PENDING to COMPLETED".to_string())
        );
        assert_eq!(
            Confirmed.transition_to(Pending),
            Err("Cannot change booking status from CONFIRMED to PENDING".to_string())
        );
        assert_eq!(Confirmed.transition_to(Confirmed), Err("Booking is already CONFIRMED".to_string()));
    }
}
