use crate::api::handlers::{NotFoundExt, missing};
use crate::api::models::{
    reviews::{ReviewCreate, ReviewResponse, ReviewUpdate},
    users::CurrentUser,
};
use crate::auth::permissions;
use crate::db::errors::DbError;
use crate::db::handlers::Reviews;
use crate::db::models::reviews::ReviewCreateDBRequest;
use crate::errors::{Error, Result};
use crate::types::{Operation, ReviewId};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    tag = "reviews",
    summary = "Review a tour",
    request_body = ReviewCreate,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Invalid request or tour already reviewed"),
        (status = 404, description = "Tour not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_review(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<ReviewCreate>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    create.validate()?;
    let request = ReviewCreateDBRequest {
        tour_id: create.tour_id,
        user_id: current_user.id,
        rating: create.rating,
        comment: create.comment.trim().to_string(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let review = match Reviews::new(&mut conn).create(&request).await {
        Ok(review) => review,
        Err(DbError::NotFound) => return Err(missing("Tour not found")),
        Err(DbError::UniqueViolation { .. }) => {
            return Err(Error::BadRequest {
                message: "You have already reviewed this tour".to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

#[utoipa::path(
    get,
    path = "/api/v1/reviews",
    tag = "reviews",
    summary = "List my reviews",
    responses(
        (status = 200, description = "The caller's reviews, newest first", body = Vec<ReviewResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_my_reviews(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<ReviewResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let reviews = Reviews::new(&mut conn).list_for_user(current_user.id).await?;

    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/reviews/{review_id}",
    tag = "reviews",
    summary = "Get review",
    params(("review_id" = uuid::Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review", body = ReviewResponse),
        (status = 404, description = "Review not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_review(State(state): State<AppState>, Path(review_id): Path<ReviewId>) -> Result<Json<ReviewResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let review = Reviews::new(&mut conn).get_by_id(review_id).await?.or_missing("Review not found")?;

    Ok(Json(ReviewResponse::from(review)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/reviews/{review_id}",
    tag = "reviews",
    summary = "Update review",
    request_body = ReviewUpdate,
    params(("review_id" = uuid::Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Not the reviewer"),
        (status = 404, description = "Review not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_review(
    State(state): State<AppState>,
    Path(review_id): Path<ReviewId>,
    current_user: CurrentUser,
    Json(update): Json<ReviewUpdate>,
) -> Result<Json<ReviewResponse>> {
    update.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Reviews::new(&mut conn);
    let current = repo.get_by_id(review_id).await?.or_missing("Review not found")?;
    permissions::require_owner(&current_user, current.user_id, Operation::Update, "review")?;

    let review = repo.update(review_id, &update.into()).await.or_missing("Review not found")?;

    Ok(Json(ReviewResponse::from(review)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{review_id}",
    tag = "reviews",
    summary = "Delete review",
    params(("review_id" = uuid::Uuid, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Not the reviewer or an admin"),
        (status = 404, description = "Review not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_review(State(state): State<AppState>, Path(review_id): Path<ReviewId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Reviews::new(&mut conn);
    let current = repo.get_by_id(review_id).await?.or_missing("Review not found")?;
    permissions::require_owner_or_admin(&current_user, current.user_id, Operation::Delete, "review")?;

    if repo.delete(review_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(missing("Review not found"))
    }
}
