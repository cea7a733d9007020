//! Database repository for tour bookings, including the per-date capacity guard.
//!
//! A tour admits at most `max_capacity` participants on any one day, summed over its
//! non-cancelled bookings. [`Bookings::reserve`] takes a row lock on the tour before summing,
//! so every write that goes through it must happen in the same transaction: two reservations
//! for the same tour then run one after the other and cannot jointly overbook.
//!
//! Lock order is booking row, then tour row. Creation only ever takes the tour lock.

use crate::db::{
    errors::{DbError, Result},
    models::bookings::{BookingCreateDBRequest, BookingDBResponse, BookingStatus, BookingUpdateDBRequest},
};
use crate::types::{BookingId, TourId, UserId, abbrev_uuid};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::instrument;

const BOOKING_SELECT: &str = r#"
    SELECT
        b.id, b.tour_id, t.title AS tour_title, t.images AS tour_images, t.agency_id,
        b.user_id, u.name AS user_name, u.email AS user_email,
        b.booking_date, b.participants, b.total_price, b.status, b.notes, b.created_at, b.updated_at
    FROM tour_bookings b
    JOIN tours t ON t.id = b.tour_id
    JOIN users u ON u.id = b.user_id
"#;

/// Whether `requested` more participants fit alongside `committed` ones.
pub fn admits(committed: i64, requested: i64, capacity: i64) -> bool {
    committed + requested <= capacity
}

/// Price `participants` seats, or `None` when the total would not fit `total_price`'s
/// NUMERIC(12, 2) column.
pub fn total_price(unit_price: Decimal, participants: i32) -> Option<Decimal> {
    let max = Decimal::new(999_999_999_999, 2);
    unit_price
        .checked_mul(Decimal::from(participants))
        .filter(|total| *total <= max)
}

/// Result of a capacity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The seats fit; carries the tour's unit price for pricing the booking
    Admitted { unit_price: Decimal },
    OverCapacity { committed: i64, capacity: i64 },
}

/// A write that went through the capacity guard
#[derive(Debug, Clone)]
pub enum Reservation<T> {
    Accepted(T),
    OverCapacity { committed: i64, capacity: i64 },
    /// The seats fit but their total price is beyond what a booking can record
    PriceTooHigh,
}

pub struct Bookings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Bookings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Lock the tour and decide whether `participants` more seats fit on `date`, ignoring
    /// `excluding`'s own contribution. Fails with `NotFound` if the tour does not exist.
    #[instrument(skip(self), fields(tour_id = %abbrev_uuid(&tour_id), %date, participants), err)]
    pub async fn reserve(
        &mut self,
        tour_id: TourId,
        date: NaiveDate,
        participants: i32,
        excluding: Option<BookingId>,
    ) -> Result<Admission> {
        let (unit_price, capacity): (Decimal, i32) = sqlx::query_as("SELECT price, max_capacity FROM tours WHERE id = $1 FOR UPDATE")
            .bind(tour_id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        let committed: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(participants), 0)::BIGINT
            FROM tour_bookings
            WHERE tour_id = $1
              AND booking_date = $2
              AND status <> 'CANCELLED'
              AND id IS DISTINCT FROM $3
            "#,
        )
        .bind(tour_id)
        .bind(date)
        .bind(excluding)
        .fetch_one(&mut *self.db)
        .await?;

        let capacity = i64::from(capacity);
        if admits(committed, i64::from(participants), capacity) {
            Ok(Admission::Admitted { unit_price })
        } else {
            tracing::debug!(committed, capacity, "reservation rejected");
            Ok(Admission::OverCapacity { committed, capacity })
        }
    }

    /// Create a PENDING booking if the tour has room. Must run inside a transaction.
    #[instrument(skip(self, request), fields(tour_id = %abbrev_uuid(&request.tour_id), user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &BookingCreateDBRequest) -> Result<Reservation<BookingDBResponse>> {
        let unit_price = match self
            .reserve(request.tour_id, request.booking_date, request.participants, None)
            .await?
        {
            Admission::Admitted { unit_price } => unit_price,
            Admission::OverCapacity { committed, capacity } => return Ok(Reservation::OverCapacity { committed, capacity }),
        };
        let Some(total) = total_price(unit_price, request.participants) else {
            return Ok(Reservation::PriceTooHigh);
        };

        let id: BookingId = sqlx::query_scalar(
            r#"
            INSERT INTO tour_bookings (tour_id, user_id, booking_date, participants, total_price, status, notes)
            VALUES ($1, $2, $3, $4, $5, 'PENDING', $6)
            RETURNING id
            "#,
        )
        .bind(request.tour_id)
        .bind(request.user_id)
        .bind(request.booking_date)
        .bind(request.participants)
        .bind(total)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        let booking = self.get_by_id(id).await?.ok_or(DbError::NotFound)?;
        Ok(Reservation::Accepted(booking))
    }

    #[instrument(skip(self), fields(booking_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: BookingId) -> Result<Option<BookingDBResponse>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.id = $1");
        let booking = sqlx::query_as::<_, BookingDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(booking)
    }

    /// Read a booking and lock its row until the surrounding transaction ends
    #[instrument(skip(self), fields(booking_id = %abbrev_uuid(&id)), err)]
    pub async fn get_for_update(&mut self, id: BookingId) -> Result<Option<BookingDBResponse>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.id = $1 FOR UPDATE OF b");
        let booking = sqlx::query_as::<_, BookingDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(booking)
    }

    /// A user's bookings, newest first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<BookingDBResponse>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.user_id = $1 ORDER BY b.created_at DESC, b.id");
        let bookings = sqlx::query_as::<_, BookingDBResponse>(&sql)
            .bind(user_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(bookings)
    }

    /// All bookings for a tour, by travel date
    #[instrument(skip(self), fields(tour_id = %abbrev_uuid(&tour_id)), err)]
    pub async fn list_for_tour(&mut self, tour_id: TourId) -> Result<Vec<BookingDBResponse>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.tour_id = $1 ORDER BY b.booking_date ASC, b.created_at ASC");
        let bookings = sqlx::query_as::<_, BookingDBResponse>(&sql)
            .bind(tour_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(bookings)
    }

    /// Apply a change to a booking previously read with [`Self::get_for_update`] in the same
    /// transaction. Capacity is re-checked, minus this booking's own seats, only when the
    /// participant count grows or the date moves. The total price is always recomputed.
    #[instrument(skip(self, current, request), fields(booking_id = %abbrev_uuid(&current.id)), err)]
    pub async fn update(
        &mut self,
        current: &BookingDBResponse,
        request: &BookingUpdateDBRequest,
    ) -> Result<Reservation<BookingDBResponse>> {
        let participants = request.participants.unwrap_or(current.participants);
        let booking_date = request.booking_date.unwrap_or(current.booking_date);
        let needs_check = participants > current.participants || booking_date != current.booking_date;

        let unit_price = if needs_check {
            match self
                .reserve(current.tour_id, booking_date, participants, Some(current.id))
                .await?
            {
                Admission::Admitted { unit_price } => unit_price,
                Admission::OverCapacity { committed, capacity } => {
                    return Ok(Reservation::OverCapacity { committed, capacity });
                }
            }
        } else {
            sqlx::query_scalar("SELECT price FROM tours WHERE id = $1")
                .bind(current.tour_id)
                .fetch_one(&mut *self.db)
                .await?
        };
        let Some(total) = total_price(unit_price, participants) else {
            return Ok(Reservation::PriceTooHigh);
        };

        sqlx::query(
            r#"
            UPDATE tour_bookings SET
                booking_date = $2,
                participants = $3,
                total_price = $4,
                notes = COALESCE($5, notes),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(current.id)
        .bind(booking_date)
        .bind(participants)
        .bind(total)
        .bind(&request.notes)
        .execute(&mut *self.db)
        .await?;

        let booking = self.get_by_id(current.id).await?.ok_or(DbError::NotFound)?;
        Ok(Reservation::Accepted(booking))
    }

    /// Persist a status already validated against the booking lifecycle
    #[instrument(skip(self), fields(booking_id = %abbrev_uuid(&id), %status), err)]
    pub async fn set_status(&mut self, id: BookingId, status: BookingStatus) -> Result<BookingDBResponse> {
        let result = sqlx::query("UPDATE tour_bookings SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}
