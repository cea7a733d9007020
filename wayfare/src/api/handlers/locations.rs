use crate::api::handlers::{NotFoundExt, not_found};
use crate::api::models::{
    locations::{FavoriteLocationResponse, ListLocationsQuery, LocationCreate, LocationResponse, LocationUpdate},
    pagination::PaginatedResponse,
    users::CurrentUser,
};
use crate::auth::permissions;
use crate::db::handlers::{Locations, Repository, locations::LocationFilter};
use crate::errors::{Error, Result};
use crate::types::{LocationId, Operation};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    tag = "locations",
    summary = "List locations",
    params(ListLocationsQuery),
    responses(
        (status = 200, description = "Paginated locations, newest first", body = PaginatedResponse<LocationResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<ListLocationsQuery>,
) -> Result<Json<PaginatedResponse<LocationResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = LocationFilter {
        category: query.category,
        province: query.province,
        search: query.search.filter(|s| !s.trim().is_empty()),
        ..LocationFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Locations::new(&mut conn);
    let locations = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        locations.into_iter().map(LocationResponse::from).collect(),
        total,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/locations",
    tag = "locations",
    summary = "Create location",
    request_body = LocationCreate,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<LocationCreate>,
) -> Result<(StatusCode, Json<LocationResponse>)> {
    permissions::require_admin(&current_user, Operation::Create, "location")?;
    create.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let location = Locations::new(&mut conn).create(&create.into()).await?;

    Ok((StatusCode::CREATED, Json(LocationResponse::from(location))))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{location_id}",
    tag = "locations",
    summary = "Get location",
    params(("location_id" = uuid::Uuid, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location details", body = LocationResponse),
        (status = 404, description = "Location not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_location(State(state): State<AppState>, Path(location_id): Path<LocationId>) -> Result<Json<LocationResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let location = Locations::new(&mut conn)
        .get_by_id(location_id)
        .await?
        .or_not_found("Location", location_id)?;

    Ok(Json(LocationResponse::from(location)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/locations/{location_id}",
    tag = "locations",
    summary = "Update location",
    request_body = LocationUpdate,
    params(("location_id" = uuid::Uuid, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location updated", body = LocationResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Location not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(location_id): Path<LocationId>,
    current_user: CurrentUser,
    Json(update): Json<LocationUpdate>,
) -> Result<Json<LocationResponse>> {
    permissions::require_admin(&current_user, Operation::Update, "location")?;
    update.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let location = Locations::new(&mut conn)
        .update(location_id, &update.into())
        .await
        .or_not_found("Location", location_id)?;

    Ok(Json(LocationResponse::from(location)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/locations/{location_id}",
    tag = "locations",
    summary = "Delete location",
    params(("location_id" = uuid::Uuid, Path, description = "Location ID")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Location not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(location_id): Path<LocationId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    permissions::require_admin(&current_user, Operation::Delete, "location")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Locations::new(&mut conn).delete(location_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Location", location_id))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/favorites/locations",
    tag = "locations",
    summary = "List favourite locations",
    responses(
        (status = 200, description = "The caller's favourites, newest first", body = Vec<FavoriteLocationResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_favorites(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<FavoriteLocationResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let favorites = Locations::new(&mut conn).list_favorites(current_user.id).await?;

    Ok(Json(favorites.into_iter().map(FavoriteLocationResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/favorites/locations/{location_id}",
    tag = "locations",
    summary = "Add a favourite location",
    params(("location_id" = uuid::Uuid, Path, description = "Location ID")),
    responses(
        (status = 201, description = "Favourite added", body = FavoriteLocationResponse),
        (status = 404, description = "Location not found"),
        (status = 409, description = "Already a favourite"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn add_favorite(
    State(state): State<AppState>,
    Path(location_id): Path<LocationId>,
    current_user: CurrentUser,
) -> Result<(StatusCode, Json<FavoriteLocationResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let favorite = Locations::new(&mut conn)
        .add_favorite(current_user.id, location_id)
        .await
        .or_not_found("Location", location_id)?;

    Ok((StatusCode::CREATED, Json(FavoriteLocationResponse::from(favorite))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/favorites/locations/{location_id}",
    tag = "locations",
    summary = "Remove a favourite location",
    params(("location_id" = uuid::Uuid, Path, description = "Location ID")),
    responses(
        (status = 204, description = "Favourite removed"),
        (status = 404, description = "Favorite not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(location_id): Path<LocationId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Locations::new(&mut conn)
        .remove_favorite(current_user.id, location_id)
        .await
        .or_missing("Favorite not found")?;

    Ok(StatusCode::NO_CONTENT)
}
