use crate::api::handlers::{NotFoundExt, not_found};
use crate::api::models::{
    agencies::CurrentAgency,
    auth::Principal,
    bookings::BookingResponse,
    pagination::PaginatedResponse,
    reviews::{ReviewResponse, TourRatingResponse},
    tours::{ListToursQuery, TourCreate, TourResponse, TourUpdate},
};
use crate::auth::permissions;
use crate::db::handlers::{Bookings, Repository, Reviews, Tours, tours::TourFilter};
use crate::errors::{Error, Result};
use crate::types::{Operation, TourId};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/v1/tours",
    tag = "tours",
    summary = "List tours",
    params(ListToursQuery),
    responses(
        (status = 200, description = "Paginated tours, newest first", body = PaginatedResponse<TourResponse>),
        (status = 400, description = "Invalid filter"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tours(State(state): State<AppState>, Query(query): Query<ListToursQuery>) -> Result<Json<PaginatedResponse<TourResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = TourFilter {
        location_id: query.location_id,
        category: query.category,
        province: query.province,
        min_price: query.min_price,
        max_price: query.max_price,
        search: query.search.filter(|s| !s.trim().is_empty()),
        ..TourFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Tours::new(&mut conn);
    let tours = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        tours.into_iter().map(TourResponse::from).collect(),
        total,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/tours",
    tag = "tours",
    summary = "Create tour",
    description = "Agencies publish tours under their own account.",
    request_body = TourCreate,
    responses(
        (status = 201, description = "Tour created", body = TourResponse),
        (status = 400, description = "Invalid request or unknown location"),
        (status = 401, description = "Not signed in as an agency"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(agency_id = %agency.id))]
pub async fn create_tour(
    State(state): State<AppState>,
    agency: CurrentAgency,
    Json(create): Json<TourCreate>,
) -> Result<(StatusCode, Json<TourResponse>)> {
    create.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let tour = Tours::new(&mut conn).create(&create.into_db(agency.id)).await?;

    Ok((StatusCode::CREATED, Json(TourResponse::from(tour))))
}

#[utoipa::path(
    get,
    path = "/api/v1/tours/{tour_id}",
    tag = "tours",
    summary = "Get tour",
    params(("tour_id" = uuid::Uuid, Path, description = "Tour ID")),
    responses(
        (status = 200, description = "Tour details", body = TourResponse),
        (status = 404, description = "Tour not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_tour(State(state): State<AppState>, Path(tour_id): Path<TourId>) -> Result<Json<TourResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let tour = Tours::new(&mut conn).get_by_id(tour_id).await?.or_not_found("Tour", tour_id)?;

    Ok(Json(TourResponse::from(tour)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/tours/{tour_id}",
    tag = "tours",
    summary = "Update tour",
    description = "The owning agency or an admin may edit a tour. `max_capacity` is fixed once created.",
    request_body = TourUpdate,
    params(("tour_id" = uuid::Uuid, Path, description = "Tour ID")),
    responses(
        (status = 200, description = "Tour updated", body = TourResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Not the owning agency"),
        (status = 404, description = "Tour not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<TourId>,
    principal: Principal,
    Json(update): Json<TourUpdate>,
) -> Result<Json<TourResponse>> {
    update.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Tours::new(&mut conn);
    let owner = repo.owner_of(tour_id).await?.or_not_found("Tour", tour_id)?;
    permissions::require_agency_or_admin(&principal, owner, Operation::Update, "tour")?;

    let tour = repo.update(tour_id, &update.into()).await.or_not_found("Tour", tour_id)?;

    Ok(Json(TourResponse::from(tour)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tours/{tour_id}",
    tag = "tours",
    summary = "Delete tour",
    params(("tour_id" = uuid::Uuid, Path, description = "Tour ID")),
    responses(
        (status = 204, description = "Tour deleted"),
        (status = 400, description = "Tour has bookings"),
        (status = 403, description = "Not the owning agency"),
        (status = 404, description = "Tour not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_tour(State(state): State<AppState>, Path(tour_id): Path<TourId>, principal: Principal) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Tours::new(&mut conn);
    let owner = repo.owner_of(tour_id).await?.or_not_found("Tour", tour_id)?;
    permissions::require_agency_or_admin(&principal, owner, Operation::Delete, "tour")?;

    if repo.has_bookings(tour_id).await? {
        return Err(Error::BadRequest {
            message: "Cannot delete a tour that has bookings".to_string(),
        });
    }

    if repo.delete(tour_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Tour", tour_id))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/tours/{tour_id}/bookings",
    tag = "tours",
    summary = "List tour bookings",
    params(("tour_id" = uuid::Uuid, Path, description = "Tour ID")),
    responses(
        (status = 200, description = "Bookings by travel date", body = Vec<BookingResponse>),
        (status = 403, description = "Not the owning agency"),
        (status = 404, description = "Tour not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_tour_bookings(
    State(state): State<AppState>,
    Path(tour_id): Path<TourId>,
    principal: Principal,
) -> Result<Json<Vec<BookingResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let owner = Tours::new(&mut conn).owner_of(tour_id).await?.or_not_found("Tour", tour_id)?;
    permissions::require_agency_or_admin(&principal, owner, Operation::Read, "tour bookings")?;

    let bookings = Bookings::new(&mut conn).list_for_tour(tour_id).await?;

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/tours/{tour_id}/reviews",
    tag = "tours",
    summary = "List tour reviews",
    params(("tour_id" = uuid::Uuid, Path, description = "Tour ID")),
    responses(
        (status = 200, description = "Reviews, newest first", body = Vec<ReviewResponse>),
        (status = 404, description = "Tour not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tour_reviews(State(state): State<AppState>, Path(tour_id): Path<TourId>) -> Result<Json<Vec<ReviewResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Tours::new(&mut conn).owner_of(tour_id).await?.or_not_found("Tour", tour_id)?;

    let reviews = Reviews::new(&mut conn).list_for_tour(tour_id).await?;

    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/tours/{tour_id}/rating",
    tag = "tours",
    summary = "Tour rating",
    params(("tour_id" = uuid::Uuid, Path, description = "Tour ID")),
    responses(
        (status = 200, description = "Average rating and review count", body = TourRatingResponse),
        (status = 404, description = "Tour not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn tour_rating(State(state): State<AppState>, Path(tour_id): Path<TourId>) -> Result<Json<TourRatingResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Tours::new(&mut conn).owner_of(tour_id).await?.or_not_found("Tour", tour_id)?;

    let rating = Reviews::new(&mut conn).rating(tour_id).await?;

    Ok(Json(TourRatingResponse::from(rating)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        agency_token, create_test_admin_user, create_test_agency, create_test_app, create_test_location, create_test_tour, create_test_user,
        user_token,
    };
    use serde_json::json;
    use sqlx::PgPool;

    fn tour_body(title: &str, price: &str) -> serde_json::Value {
        json!({
            "title": title,
            "description": "Guided tour with transport and meals",
            "price": price,
            "duration_days": 2,
            "max_capacity": 8,
            "images": [],
            "itinerary": "Day 1: arrive. Day 2: explore.",
            "start_dates": ["2026-06-01"],
            "category": "Adventure",
            "province": "Central"
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_agency_creates_tour(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let agency = create_test_agency(&pool).await;
        let user = create_test_user(&pool).await;

        let response = server
            .post("/api/v1/tours")
            .authorization_bearer(agency_token(&agency))
            .json(&tour_body("Ella rock hike", "120.00"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let tour: TourResponse = response.json();
        assert_eq!(tour.agency.id, agency.id);
        assert_eq!(tour.max_capacity, 8);

        // A user session is not an agency session
        server
            .post("/api/v1/tours")
            .authorization_bearer(user_token(&user))
            .json(&tour_body("Impostor tour", "10.00"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let mut bad = tour_body("Nowhere tour", "10.00");
        bad["location_id"] = json!(uuid::Uuid::new_v4());
        server
            .post("/api/v1/tours")
            .authorization_bearer(agency_token(&agency))
            .json(&bad)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let agency = create_test_agency(&pool).await;
        let kandy = create_test_location(&pool, "Kandy", "Central").await;
        let token = agency_token(&agency);

        server.post("/api/v1/tours").authorization_bearer(token.clone()).json(&tour_body("Budget loop", "50.00")).await;
        let mut located = tour_body("Temple of the Tooth", "300.00");
        located["location_id"] = json!(kandy.id);
        server.post("/api/v1/tours").authorization_bearer(token.clone()).json(&located).await;

        let page: PaginatedResponse<TourResponse> = server.get("/api/v1/tours").add_query_param("min_price", "100").await.json();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.data[0].title, "Temple of the Tooth");

        let page: PaginatedResponse<TourResponse> = server.get("/api/v1/tours").add_query_param("search", "LOOP").await.json();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.data[0].title, "Budget loop");

        let page: PaginatedResponse<TourResponse> = server.get("/api/v1/tours").add_query_param("location_id", kandy.id).await.json();
        assert_eq!(page.total_count, 1);

        server
            .get("/api/v1/tours")
            .add_query_param("min_price", "cheap")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_permissions_and_capacity_locked(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let owner = create_test_agency(&pool).await;
        let rival = create_test_agency(&pool).await;
        let admin = create_test_admin_user(&pool).await;
        let tour = create_test_tour(&pool, owner.id, 10).await;
        let path = format!("/api/v1/tours/{}", tour.id);

        server
            .patch(&path)
            .authorization_bearer(agency_token(&rival))
            .json(&json!({"title": "Hijacked"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .patch(&path)
            .authorization_bearer(agency_token(&owner))
            .json(&json!({"max_capacity": 50}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let updated: TourResponse = server
            .patch(&path)
            .authorization_bearer(agency_token(&owner))
            .json(&json!({"title": "Renamed tour"}))
            .await
            .json();
        assert_eq!(updated.title, "Renamed tour");
        assert_eq!(updated.max_capacity, 10);

        let by_admin: TourResponse = server
            .patch(&path)
            .authorization_bearer(user_token(&admin))
            .json(&json!({"duration_days": 4}))
            .await
            .json();
        assert_eq!(by_admin.duration_days, 4);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_blocked_by_bookings(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let agency = create_test_agency(&pool).await;
        let user = create_test_user(&pool).await;
        let booked = create_test_tour(&pool, agency.id, 10).await;
        let empty = create_test_tour(&pool, agency.id, 10).await;

        server
            .post("/api/v1/bookings")
            .authorization_bearer(user_token(&user))
            .json(&json!({"tour_id": booked.id, "booking_date": "2026-06-01", "participants": 2}))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .delete(&format!("/api/v1/tours/{}", booked.id))
            .authorization_bearer(agency_token(&agency))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .delete(&format!("/api/v1/tours/{}", empty.id))
            .authorization_bearer(agency_token(&agency))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server.get(&format!("/api/v1/tours/{}", empty.id)).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tour_bookings_visible_to_owner_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let agency = create_test_agency(&pool).await;
        let rival = create_test_agency(&pool).await;
        let user = create_test_user(&pool).await;
        let tour = create_test_tour(&pool, agency.id, 10).await;
        server
            .post("/api/v1/bookings")
            .authorization_bearer(user_token(&user))
            .json(&json!({"tour_id": tour.id, "booking_date": "2026-06-01", "participants": 3}))
            .await;

        let path = format!("/api/v1/tours/{}/bookings", tour.id);
        let bookings: Vec<BookingResponse> = server.get(&path).authorization_bearer(agency_token(&agency)).await.json();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].participants, 3);

        server.get(&path).authorization_bearer(agency_token(&rival)).await.assert_status(StatusCode::FORBIDDEN);
        server.get(&path).authorization_bearer(user_token(&user)).await.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_rating_of_unreviewed_tour(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let agency = create_test_agency(&pool).await;
        let tour = create_test_tour(&pool, agency.id, 10).await;

        let rating: TourRatingResponse = server.get(&format!("/api/v1/tours/{}/rating", tour.id)).await.json();
        assert_eq!(rating.total_reviews, 0);
        assert_eq!(rating.average_rating, 0.0);

        server
            .get(&format!("/api/v1/tours/{}/rating", uuid::Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
