use crate::api::handlers::{NotFoundExt, not_found};
use crate::api::models::{
    pagination::PaginatedResponse,
    trips::{AddParticipantRequest, ListTripsQuery, ParticipantResponse, TripCreate, TripResponse, TripUpdate},
    users::CurrentUser,
};
use crate::auth::permissions;
use crate::db::errors::DbError;
use crate::db::handlers::{Repository, Trips, trips::TripFilter};
use crate::errors::{Error, Result};
use crate::types::{Operation, TripId, UserId};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/v1/trips",
    tag = "trips",
    summary = "List trips",
    params(ListTripsQuery),
    responses(
        (status = 200, description = "Paginated trips, soonest first", body = PaginatedResponse<TripResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_trips(State(state): State<AppState>, Query(query): Query<ListTripsQuery>) -> Result<Json<PaginatedResponse<TripResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = TripFilter {
        location_id: query.location_id,
        start_from: query.start_date,
        end_until: query.end_date,
        ..TripFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Trips::new(&mut conn);
    let trips = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        trips.into_iter().map(TripResponse::from).collect(),
        total,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/trips",
    tag = "trips",
    summary = "Create trip",
    request_body = TripCreate,
    responses(
        (status = 201, description = "Trip created with the caller as first participant", body = TripResponse),
        (status = 400, description = "Invalid request"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_trip(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<TripCreate>,
) -> Result<(StatusCode, Json<TripResponse>)> {
    create.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let trip = Trips::new(&mut tx).create(&create.into_db(current_user.id)).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(TripResponse::from(trip))))
}

#[utoipa::path(
    get,
    path = "/api/v1/trips/{trip_id}",
    tag = "trips",
    summary = "Get trip",
    params(("trip_id" = uuid::Uuid, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Trip details", body = TripResponse),
        (status = 404, description = "Trip not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_trip(State(state): State<AppState>, Path(trip_id): Path<TripId>) -> Result<Json<TripResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let trip = Trips::new(&mut conn).get_by_id(trip_id).await?.or_not_found("Trip", trip_id)?;

    Ok(Json(TripResponse::from(trip)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/trips/{trip_id}",
    tag = "trips",
    summary = "Update trip",
    request_body = TripUpdate,
    params(("trip_id" = uuid::Uuid, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Trip updated", body = TripResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Not the creator or an admin"),
        (status = 404, description = "Trip not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
    current_user: CurrentUser,
    Json(update): Json<TripUpdate>,
) -> Result<Json<TripResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Trips::new(&mut conn);
    let current = repo.get_by_id(trip_id).await?.or_not_found("Trip", trip_id)?;
    permissions::require_owner_or_admin(&current_user, current.created_by, Operation::Update, "trip")?;
    update.validate(current.start_date, current.end_date)?;

    let trip = repo.update(trip_id, &update.into()).await.or_not_found("Trip", trip_id)?;

    Ok(Json(TripResponse::from(trip)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/trips/{trip_id}",
    tag = "trips",
    summary = "Delete trip",
    params(("trip_id" = uuid::Uuid, Path, description = "Trip ID")),
    responses(
        (status = 204, description = "Trip deleted"),
        (status = 403, description = "Not the creator or an admin"),
        (status = 404, description = "Trip not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_trip(State(state): State<AppState>, Path(trip_id): Path<TripId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Trips::new(&mut conn);
    let creator = repo.creator_of(trip_id).await?.or_not_found("Trip", trip_id)?;
    permissions::require_owner_or_admin(&current_user, creator, Operation::Delete, "trip")?;

    if repo.delete(trip_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Trip", trip_id))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/trips/{trip_id}/participants",
    tag = "trips",
    summary = "List participants",
    params(("trip_id" = uuid::Uuid, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Participants in join order", body = Vec<ParticipantResponse>),
        (status = 404, description = "Trip not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_participants(State(state): State<AppState>, Path(trip_id): Path<TripId>) -> Result<Json<Vec<ParticipantResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Trips::new(&mut conn);
    repo.creator_of(trip_id).await?.or_not_found("Trip", trip_id)?;
    let participants = repo.list_participants(trip_id).await?;

    Ok(Json(participants.into_iter().map(ParticipantResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/trips/{trip_id}/participants",
    tag = "trips",
    summary = "Add participant",
    request_body = AddParticipantRequest,
    params(("trip_id" = uuid::Uuid, Path, description = "Trip ID")),
    responses(
        (status = 201, description = "Participant added", body = ParticipantResponse),
        (status = 403, description = "Only the creator may add other users"),
        (status = 404, description = "Trip or user not found"),
        (status = 409, description = "Already a participant"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn add_participant(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
    current_user: CurrentUser,
    Json(request): Json<AddParticipantRequest>,
) -> Result<(StatusCode, Json<ParticipantResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Trips::new(&mut conn);
    let creator = repo.creator_of(trip_id).await?.or_not_found("Trip", trip_id)?;
    if request.user_id != current_user.id {
        permissions::require_owner(&current_user, creator, Operation::Update, "trip")?;
    }

    let participant = match repo.add_participant(trip_id, request.user_id).await {
        Ok(participant) => participant,
        Err(DbError::ForeignKeyViolation { .. }) => return Err(not_found("User", request.user_id)),
        Err(e) => return Err(e.into()),
    };

    Ok((StatusCode::CREATED, Json(ParticipantResponse::from(participant))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/trips/{trip_id}/participants/{user_id}",
    tag = "trips",
    summary = "Remove participant",
    params(
        ("trip_id" = uuid::Uuid, Path, description = "Trip ID"),
        ("user_id" = uuid::Uuid, Path, description = "User ID"),
    ),
    responses(
        (status = 204, description = "Participant removed"),
        (status = 403, description = "Only the creator may remove other users"),
        (status = 404, description = "Trip or participant not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn remove_participant(
    State(state): State<AppState>,
    Path((trip_id, user_id)): Path<(TripId, UserId)>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Trips::new(&mut conn);
    let creator = repo.creator_of(trip_id).await?.or_not_found("Trip", trip_id)?;
    if user_id != current_user.id {
        permissions::require_owner(&current_user, creator, Operation::Update, "trip")?;
    }

    repo.remove_participant(trip_id, user_id)
        .await
        .or_missing(format!("Participant with user ID {user_id} not found in trip {trip_id}"))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_admin_user, create_test_app, create_test_location, create_test_user, user_token};
    use serde_json::json;
    use sqlx::PgPool;

    async fn create_trip_via_api(server: &axum_test::TestServer, token: &str, title: &str, start: &str, end: &str) -> TripResponse {
        let response = server
            .post("/api/v1/trips")
            .authorization_bearer(token)
            .json(&json!({"title": title, "start_date": start, "end_date": end}))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_creator_is_first_participant(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let creator = create_test_user(&pool).await;
        let trip = create_trip_via_api(&server, &user_token(&creator), "Hill country loop", "2026-12-01", "2026-12-05").await;
        assert_eq!(trip.participant_count, 1);
        assert_eq!(trip.created_by, creator.id);

        let participants: Vec<ParticipantResponse> = server.get(&format!("/api/v1/trips/{}/participants", trip.id)).await.json();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].user_id, creator.id);

        let mine: Vec<TripResponse> = server
            .get("/api/v1/users/current/trips")
            .authorization_bearer(user_token(&creator))
            .await
            .json();
        assert_eq!(mine.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_end_before_start_rejected(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let creator = create_test_user(&pool).await;

        let response = server
            .post("/api/v1/trips")
            .authorization_bearer(user_token(&creator))
            .json(&json!({"title": "Backwards", "start_date": "2026-12-05", "end_date": "2026-12-01"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let creator = create_test_user(&pool).await;
        let token = user_token(&creator);
        let galle = create_test_location(&pool, "Galle", "Southern").await;

        create_trip_via_api(&server, &token, "Early", "2026-01-01", "2026-01-03").await;
        create_trip_via_api(&server, &token, "Late", "2026-09-01", "2026-09-03").await;
        server
            .post("/api/v1/trips")
            .authorization_bearer(token.clone())
            .json(&json!({"title": "Fort walk", "location_id": galle.id, "start_date": "2026-05-01", "end_date": "2026-05-02"}))
            .await
            .assert_status(StatusCode::CREATED);

        let page: PaginatedResponse<TripResponse> = server.get("/api/v1/trips").add_query_param("start_date", "2026-04-01").await.json();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.data[0].title, "Fort walk");

        let page: PaginatedResponse<TripResponse> = server.get("/api/v1/trips").add_query_param("location_id", galle.id).await.json();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.data[0].location_name.as_deref(), Some("Galle"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete_rules(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let creator = create_test_user(&pool).await;
        let stranger = create_test_user(&pool).await;
        let admin = create_test_admin_user(&pool).await;
        let trip = create_trip_via_api(&server, &user_token(&creator), "Yala safari", "2026-07-01", "2026-07-02").await;
        let path = format!("/api/v1/trips/{}", trip.id);

        server
            .patch(&path)
            .authorization_bearer(user_token(&stranger))
            .json(&json!({"title": "Mine now"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // A lone end date is checked against the stored start date
        server
            .patch(&path)
            .authorization_bearer(user_token(&creator))
            .json(&json!({"end_date": "2026-06-30"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let updated: TripResponse = server
            .patch(&path)
            .authorization_bearer(user_token(&creator))
            .json(&json!({"end_date": "2026-07-04"}))
            .await
            .json();
        assert_eq!(updated.end_date.to_string(), "2026-07-04");

        server.delete(&path).authorization_bearer(user_token(&admin)).await.assert_status(StatusCode::NO_CONTENT);
        server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_participant_rules(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let creator = create_test_user(&pool).await;
        let joiner = create_test_user(&pool).await;
        let friend = create_test_user(&pool).await;
        let trip = create_trip_via_api(&server, &user_token(&creator), "Knuckles hike", "2026-03-01", "2026-03-02").await;
        let path = format!("/api/v1/trips/{}/participants", trip.id);

        // Anyone may join themselves
        server
            .post(&path)
            .authorization_bearer(user_token(&joiner))
            .json(&json!({"user_id": joiner.id}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(&path)
            .authorization_bearer(user_token(&joiner))
            .json(&json!({"user_id": joiner.id}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let error: serde_json::Value = response.json();
        assert_eq!(error["message"], "User is already a participant in this trip");

        // Only the creator adds other people
        server
            .post(&path)
            .authorization_bearer(user_token(&joiner))
            .json(&json!({"user_id": friend.id}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .post(&path)
            .authorization_bearer(user_token(&creator))
            .json(&json!({"user_id": friend.id}))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&path)
            .authorization_bearer(user_token(&creator))
            .json(&json!({"user_id": uuid::Uuid::new_v4()}))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .delete(&format!("{path}/{}", friend.id))
            .authorization_bearer(user_token(&joiner))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .delete(&format!("{path}/{}", joiner.id))
            .authorization_bearer(user_token(&joiner))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let response = server
            .delete(&format!("{path}/{}", joiner.id))
            .authorization_bearer(user_token(&creator))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(
            response.text(),
            format!("Participant with user ID {} not found in trip {}", joiner.id, trip.id)
        );
    }
}
