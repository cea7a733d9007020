//! Booking endpoints. Every write that can change a tour's committed seats runs in a
//! transaction so the capacity guard in [`Bookings`] holds its tour lock until commit.

use crate::api::handlers::NotFoundExt;
use crate::api::models::{
    auth::Principal,
    bookings::{BookingCreate, BookingResponse, BookingStatusUpdate, BookingUpdate},
    users::CurrentUser,
};
use crate::auth::permissions;
use crate::db::handlers::{Bookings, bookings::Reservation};
use crate::db::models::bookings::{BookingCreateDBRequest, BookingDBResponse, BookingStatus};
use crate::errors::{Error, Result};
use crate::types::{BookingId, Operation};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

fn can_view(principal: &Principal, booking: &BookingDBResponse) -> bool {
    match principal {
        Principal::User(user) => user.is_admin || user.id == booking.user_id,
        Principal::Agency(agency) => agency.id == booking.agency_id,
    }
}

fn invalid_transition(message: String) -> Error {
    Error::BadRequest { message }
}

fn price_too_high() -> Error {
    Error::BadRequest {
        message: "Total price exceeds the maximum amount for a single booking".to_string(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "bookings",
    summary = "Book a tour",
    description = "Holds seats on a tour for one date. The booking starts PENDING and is priced at the tour's current price.",
    request_body = BookingCreate,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Invalid request or tour at capacity"),
        (status = 404, description = "Tour not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn create_booking(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<BookingCreate>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    create.validate()?;
    let request = BookingCreateDBRequest {
        tour_id: create.tour_id,
        user_id: current_user.id,
        booking_date: create.booking_date,
        participants: create.participants,
        notes: create.notes,
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let outcome = Bookings::new(&mut tx).create(&request).await.or_not_found("Tour", request.tour_id)?;
    let booking = match outcome {
        Reservation::Accepted(booking) => booking,
        Reservation::OverCapacity { .. } => {
            return Err(Error::BadRequest {
                message: "This tour is at max capacity for the selected date".to_string(),
            });
        }
        Reservation::PriceTooHigh => return Err(price_too_high()),
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(booking_id = %booking.id, tour_id = %booking.tour_id, participants = booking.participants, "booking created");
    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "bookings",
    summary = "List my bookings",
    responses(
        (status = 200, description = "The caller's bookings, newest first", body = Vec<BookingResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_bookings(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<BookingResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let bookings = Bookings::new(&mut conn).list_for_user(current_user.id).await?;

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{booking_id}",
    tag = "bookings",
    summary = "Get booking",
    params(("booking_id" = uuid::Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = BookingResponse),
        (status = 403, description = "Not the booker, the tour's agency or an admin"),
        (status = 404, description = "Booking not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<BookingId>,
    principal: Principal,
) -> Result<Json<BookingResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let booking = Bookings::new(&mut conn).get_by_id(booking_id).await?.or_not_found("Booking", booking_id)?;

    if !can_view(&principal, &booking) {
        return Err(Error::Forbidden {
            action: Operation::Read,
            resource: "booking".to_string(),
        });
    }

    Ok(Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{booking_id}",
    tag = "bookings",
    summary = "Update booking",
    description = "Change the date, party size or notes. Growing the party or moving the date re-checks capacity; the price is recomputed.",
    request_body = BookingUpdate,
    params(("booking_id" = uuid::Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking updated", body = BookingResponse),
        (status = 400, description = "Invalid request, finished booking, or tour at capacity"),
        (status = 403, description = "Not the booker"),
        (status = 404, description = "Booking not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<BookingId>,
    current_user: CurrentUser,
    Json(update): Json<BookingUpdate>,
) -> Result<Json<BookingResponse>> {
    update.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let booking = {
        let mut repo = Bookings::new(&mut tx);
        let current = repo.get_for_update(booking_id).await?.or_not_found("Booking", booking_id)?;
        permissions::require_owner(&current_user, current.user_id, Operation::Update, "booking")?;
        if current.status.is_terminal() {
            return Err(invalid_transition(format!(
                "Cannot update a {} booking",
                current.status.to_string().to_lowercase()
            )));
        }

        match repo.update(&current, &update.into()).await? {
            Reservation::Accepted(booking) => booking,
            Reservation::OverCapacity { .. } => {
                return Err(Error::BadRequest {
                    message: "Cannot increase participants as it exceeds tour capacity".to_string(),
                });
            }
            Reservation::PriceTooHigh => return Err(price_too_high()),
        }
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{booking_id}",
    tag = "bookings",
    summary = "Cancel booking",
    description = "Marks the booking CANCELLED, releasing its seats. The record is kept.",
    params(("booking_id" = uuid::Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 400, description = "Booking already cancelled or completed"),
        (status = 403, description = "Not the booker or an admin"),
        (status = 404, description = "Booking not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<BookingId>,
    current_user: CurrentUser,
) -> Result<Json<BookingResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let booking = {
        let mut repo = Bookings::new(&mut tx);
        let current = repo.get_for_update(booking_id).await?.or_not_found("Booking", booking_id)?;
        permissions::require_owner_or_admin(&current_user, current.user_id, Operation::Delete, "booking")?;
        let next = current.status.transition_to(BookingStatus::Cancelled).map_err(invalid_transition)?;
        repo.set_status(booking_id, next).await?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(booking_id = %booking.id, "booking cancelled");
    Ok(Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{booking_id}/status",
    tag = "bookings",
    summary = "Update booking status",
    description = "Used by the tour's agency to confirm, complete or cancel a booking.",
    request_body = BookingStatusUpdate,
    params(("booking_id" = uuid::Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Status changed", body = BookingResponse),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Not the tour's agency or an admin"),
        (status = 404, description = "Booking not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(booking_id): Path<BookingId>,
    principal: Principal,
    Json(update): Json<BookingStatusUpdate>,
) -> Result<Json<BookingResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let booking = {
        let mut repo = Bookings::new(&mut tx);
        let current = repo.get_for_update(booking_id).await?.or_not_found("Booking", booking_id)?;
        permissions::require_agency_or_admin(&principal, current.agency_id, Operation::Update, "booking")?;
        let next = current.status.transition_to(update.status).map_err(invalid_transition)?;
        repo.set_status(booking_id, next).await?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(BookingResponse::from(booking)))
}
