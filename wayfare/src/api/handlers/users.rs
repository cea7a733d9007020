use crate::api::handlers::{NotFoundExt, not_found};
use crate::api::models::{
    pagination::PaginatedResponse,
    trips::TripResponse,
    users::{CurrentUser, ListUsersQuery, UserCreate, UserResponse, UserUpdate},
    validation::normalize_email,
};
use crate::auth::{password, permissions};
use crate::db::errors::DbError;
use crate::db::handlers::{Repository, Trips, Users, users::UserFilter};
use crate::db::models::users::{UserCreateDBRequest, UserUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{Operation, UserIdOrCurrent};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Paginated list of users", body = PaginatedResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    current_user: CurrentUser,
) -> Result<Json<PaginatedResponse<UserResponse>>> {
    permissions::require_admin(&current_user, Operation::Read, "users")?;

    let (skip, limit) = query.pagination.params();
    let mut filter = UserFilter::new(skip, limit);
    if let Some(search) = query.search.filter(|s| !s.trim().is_empty()) {
        filter = filter.with_search(search);
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let users = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        users.into_iter().map(UserResponse::from).collect(),
        total,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already registered"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    permissions::require_admin(&current_user, Operation::Create, "users")?;
    create.validate(&state.config.auth.native.password)?;

    let password_hash = password::hash_password(create.password, &state.config.auth.native.password).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: normalize_email(&create.email),
            name: create.name.trim().to_string(),
            password_hash: Some(password_hash),
            image: create.image,
            auth_source: "native".to_string(),
            is_admin: create.is_admin,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    summary = "Get user",
    params(("user_id" = String, Path, description = "User ID, or `current` for the caller")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
) -> Result<Json<UserResponse>> {
    let user_id = user_id.resolve(current_user.id);
    permissions::require_owner_or_admin(&current_user, user_id, Operation::Read, "user")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(user_id).await?.or_not_found("User", user_id)?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    summary = "Update user",
    request_body = UserUpdate,
    params(("user_id" = String, Path, description = "User ID, or `current` for the caller")),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Not your account, or a non-admin changing is_admin"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let user_id = user_id.resolve(current_user.id);
    permissions::require_owner_or_admin(&current_user, user_id, Operation::Update, "user")?;
    if update.is_admin.is_some() {
        permissions::require_admin(&current_user, Operation::Update, "user")?;
    }
    update.validate(&state.config.auth.native.password)?;

    let password_hash = match update.password {
        Some(new_password) => Some(password::hash_password(new_password, &state.config.auth.native.password).await?),
        None => None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .update(
            user_id,
            &UserUpdateDBRequest {
                name: update.name.map(|n| n.trim().to_string()),
                image: update.image,
                password_hash,
                is_admin: update.is_admin,
            },
        )
        .await
        .or_not_found("User", user_id)?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    summary = "Delete user",
    params(("user_id" = String, Path, description = "User ID, or `current` for the caller")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "User has associated records"),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let user_id = user_id.resolve(current_user.id);
    permissions::require_owner_or_admin(&current_user, user_id, Operation::Delete, "user")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    match Users::new(&mut conn).delete(user_id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found("User", user_id)),
        Err(DbError::ForeignKeyViolation { .. }) => Err(Error::BadRequest {
            message: "User has associated records and cannot be deleted".to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/trips",
    tag = "trips",
    summary = "List a user's trips",
    params(("user_id" = String, Path, description = "User ID, or `current` for the caller")),
    responses(
        (status = 200, description = "Trips the user participates in", body = Vec<TripResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_user_trips(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
) -> Result<Json<Vec<TripResponse>>> {
    let user_id = user_id.resolve(current_user.id);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let trips = Trips::new(&mut conn).list_for_user(user_id).await?;

    Ok(Json(trips.into_iter().map(TripResponse::from).collect()))
}
