use crate::api::handlers::{NotFoundExt, not_found};
use crate::api::models::{
    events::{EventCreate, EventResponse, EventUpdate, ListEventsQuery, SaveStatusResponse},
    pagination::PaginatedResponse,
    users::CurrentUser,
};
use crate::auth::permissions;
use crate::db::handlers::{Events, Repository, events::EventFilter};
use crate::errors::{Error, Result};
use crate::types::{EventId, Operation};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "events",
    summary = "List events",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "Paginated events, soonest first", body = PaginatedResponse<EventResponse>),
        (status = 400, description = "Invalid month filter"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<PaginatedResponse<EventResponse>>> {
    let month = query.month_window()?;
    let (skip, limit) = query.pagination.params();
    let filter = EventFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        category: query.category,
        province: query.province,
        location_id: query.location_id,
        month,
        ..EventFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Events::new(&mut conn);
    let events = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        events.into_iter().map(EventResponse::from).collect(),
        total,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "events",
    summary = "Create event",
    request_body = EventCreate,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid request or unknown location"),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_event(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<EventCreate>,
) -> Result<(StatusCode, Json<EventResponse>)> {
    permissions::require_admin(&current_user, Operation::Create, "event")?;
    create.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let event = Events::new(&mut tx).create(&create.into()).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}",
    tag = "events",
    summary = "Get event",
    params(("event_id" = uuid::Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_event(State(state): State<AppState>, Path(event_id): Path<EventId>) -> Result<Json<EventResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let event = Events::new(&mut conn).get_by_id(event_id).await?.or_not_found("Event", event_id)?;

    Ok(Json(EventResponse::from(event)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/events/{event_id}",
    tag = "events",
    summary = "Update event",
    request_body = EventUpdate,
    params(("event_id" = uuid::Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Event not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    current_user: CurrentUser,
    Json(update): Json<EventUpdate>,
) -> Result<Json<EventResponse>> {
    permissions::require_admin(&current_user, Operation::Update, "event")?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let event = {
        let mut repo = Events::new(&mut tx);
        let current = repo.get_by_id(event_id).await?.or_not_found("Event", event_id)?;
        update.validate(current.event.start_date, current.event.end_date)?;
        repo.update(event_id, &update.into()).await.or_not_found("Event", event_id)?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(EventResponse::from(event)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{event_id}",
    tag = "events",
    summary = "Delete event",
    params(("event_id" = uuid::Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Event not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    permissions::require_admin(&current_user, Operation::Delete, "event")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Events::new(&mut conn).delete(event_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Event", event_id))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/events/saved",
    tag = "events",
    summary = "List saved events",
    responses(
        (status = 200, description = "The caller's saved events, most recently saved first", body = Vec<EventResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_saved_events(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<EventResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let events = Events::new(&mut conn).list_saved(current_user.id).await?;

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/save",
    tag = "events",
    summary = "Save event",
    params(("event_id" = uuid::Uuid, Path, description = "Event ID")),
    responses(
        (status = 201, description = "Event saved", body = SaveStatusResponse),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event already saved"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn save_event(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    current_user: CurrentUser,
) -> Result<(StatusCode, Json<SaveStatusResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Events::new(&mut conn);
    repo.save(current_user.id, event_id).await.or_not_found("Event", event_id)?;
    let status = repo.save_status(current_user.id, event_id).await?;

    Ok((StatusCode::CREATED, Json(SaveStatusResponse::from(status))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{event_id}/save",
    tag = "events",
    summary = "Unsave event",
    params(("event_id" = uuid::Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event unsaved"),
        (status = 404, description = "Saved event not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn unsave_event(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Events::new(&mut conn)
        .unsave(current_user.id, event_id)
        .await
        .or_missing("Saved event not found")?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/save-status",
    tag = "events",
    summary = "Save status",
    params(("event_id" = uuid::Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Whether the caller saved the event, and how many users did", body = SaveStatusResponse),
        (status = 404, description = "Event not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn event_save_status(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    current_user: CurrentUser,
) -> Result<Json<SaveStatusResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Events::new(&mut conn);
    if !repo.exists(event_id).await? {
        return Err(not_found("Event", event_id));
    }
    let status = repo.save_status(current_user.id, event_id).await?;

    Ok(Json(SaveStatusResponse::from(status)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_admin_user, create_test_app, create_test_location, create_test_user, user_token};
    use serde_json::json;
    use sqlx::PgPool;

    async fn create_event_via_api(server: &axum_test::TestServer, token: &str, body: serde_json::Value) -> EventResponse {
        let response = server.post("/api/v1/events").authorization_bearer(token).json(&body).await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_locations(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let token = user_token(&admin);
        let kandy = create_test_location(&pool, "Kandy", "Central").await;

        let event = create_event_via_api(
            &server,
            &token,
            json!({
                "name": "Esala Perahera",
                "description": "Procession of the sacred tooth",
                "category": "festival",
                "start_date": "2026-08-01T18:00:00Z",
                "end_date": "2026-08-10T23:00:00Z",
                "locations": [{"location_id": kandy.id, "description": "Main procession route"}]
            }),
        )
        .await;
        assert_eq!(event.locations.len(), 1);
        assert_eq!(event.locations[0].name, "Kandy");

        let response = server.get(&format!("/api/v1/events/{}", event.id)).await;
        response.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_rejects_bad_dates_and_unknown_location(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let token = user_token(&admin);

        let response = server
            .post("/api/v1/events")
            .authorization_bearer(token.clone())
            .json(&json!({
                "name": "Backwards",
                "description": "Ends before it starts",
                "start_date": "2026-08-10T00:00:00Z",
                "end_date": "2026-08-01T00:00:00Z"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "End date must be after start date");

        let response = server
            .post("/api/v1/events")
            .authorization_bearer(token)
            .json(&json!({
                "name": "Nowhere",
                "description": "Linked to a location that does not exist",
                "start_date": "2026-08-01T00:00:00Z",
                "end_date": "2026-08-02T00:00:00Z",
                "locations": [{"location_id": uuid::Uuid::new_v4()}]
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_checks_against_stored_dates(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let token = user_token(&admin);
        let event = create_event_via_api(
            &server,
            &token,
            json!({
                "name": "Vesak",
                "description": "Lanterns",
                "start_date": "2026-05-01T00:00:00Z",
                "end_date": "2026-05-03T00:00:00Z"
            }),
        )
        .await;

        server
            .patch(&format!("/api/v1/events/{}", event.id))
            .authorization_bearer(token.clone())
            .json(&json!({"start_date": "2026-06-01T00:00:00Z"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .patch(&format!("/api/v1/events/{}", event.id))
            .authorization_bearer(token)
            .json(&json!({"end_date": "2026-05-05T00:00:00Z", "locations": []}))
            .await;
        response.assert_status_ok();
        let updated: EventResponse = response.json();
        assert_eq!(updated.name, "Vesak");
        assert!(updated.locations.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_month_filter(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let token = user_token(&admin);
        for (name, start, end) in [
            ("Spans June", "2026-05-28T00:00:00Z", "2026-06-02T00:00:00Z"),
            ("In July", "2026-07-04T00:00:00Z", "2026-07-05T00:00:00Z"),
        ] {
            create_event_via_api(
                &server,
                &token,
                json!({"name": name, "description": "x", "start_date": start, "end_date": end}),
            )
            .await;
        }

        let response = server
            .get("/api/v1/events")
            .add_query_param("year", "2026")
            .add_query_param("month", "6")
            .await;
        let page: PaginatedResponse<EventResponse> = response.json();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.data[0].name, "Spans June");

        server
            .get("/api/v1/events")
            .add_query_param("month", "6")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_save_flow(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let user = create_test_user(&pool).await;
        let token = user_token(&user);
        let event = create_event_via_api(
            &server,
            &user_token(&admin),
            json!({"name": "Poson", "description": "x", "start_date": "2026-06-10T00:00:00Z", "end_date": "2026-06-11T00:00:00Z"}),
        )
        .await;
        let save_path = format!("/api/v1/events/{}/save", event.id);

        let response = server.post(&save_path).authorization_bearer(token.clone()).await;
        response.assert_status(StatusCode::CREATED);

        let response = server.post(&save_path).authorization_bearer(token.clone()).await;
        response.assert_status(StatusCode::CONFLICT);
        let error: serde_json::Value = response.json();
        assert_eq!(error["message"], "Event already saved");

        let response = server
            .get(&format!("/api/v1/events/{}/save-status", event.id))
            .authorization_bearer(token.clone())
            .await;
        let status: SaveStatusResponse = response.json();
        assert!(status.is_saved);
        assert_eq!(status.count, 1);

        let response = server.get("/api/v1/events/saved").authorization_bearer(token.clone()).await;
        let saved: Vec<EventResponse> = response.json();
        assert_eq!(saved.len(), 1);

        server.delete(&save_path).authorization_bearer(token.clone()).await.assert_status(StatusCode::NO_CONTENT);
        let response = server.delete(&save_path).authorization_bearer(token).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "Saved event not found");
    }
}
