//! Vote endpoints. Blogs, comments and replies share one toggle; each kind gets its own
//! routes so the OpenAPI document lists them separately.

use crate::api::handlers::NotFoundExt;
use crate::api::models::{
    users::CurrentUser,
    votes::{VoteRequest, VoteResponse, VoteStatusResponse},
};
use crate::db::handlers::Votes;
use crate::db::models::votes::VoteTarget;
use crate::errors::{Error, Result};
use crate::types::{BlogId, CommentId, ReplyId};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

async fn cast_vote(state: &AppState, target: VoteTarget, target_id: Uuid, user: &CurrentUser, request: VoteRequest) -> Result<VoteResponse> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let outcome = Votes::new(&mut tx)
        .toggle(target, target_id, user.id, request.vote_type)
        .await
        .or_not_found(target.resource_name(), target_id)?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(VoteResponse::from(outcome))
}

async fn vote_status(state: &AppState, target: VoteTarget, target_id: Uuid, user: Option<&CurrentUser>) -> Result<VoteStatusResponse> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Votes::new(&mut conn);
    if !repo.target_exists(target, target_id).await? {
        return Err(super::not_found(target.resource_name(), target_id));
    }

    let summary = repo.summary(target, target_id).await?;
    let user_vote = match user {
        Some(user) => repo.user_vote(target, target_id, user.id).await?,
        None => None,
    };

    Ok(VoteStatusResponse { summary, user_vote })
}

#[utoipa::path(
    post,
    path = "/api/v1/blogs/{blog_id}/votes",
    tag = "votes",
    summary = "Vote on a blog",
    request_body = VoteRequest,
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Vote toggled", body = VoteResponse),
        (status = 404, description = "Blog not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn vote_blog(
    State(state): State<AppState>,
    Path(blog_id): Path<BlogId>,
    current_user: CurrentUser,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    Ok(Json(cast_vote(&state, VoteTarget::Blog, blog_id, &current_user, request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/blogs/{blog_id}/votes",
    tag = "votes",
    summary = "Blog vote summary",
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Vote counts and the caller's vote, if signed in", body = VoteStatusResponse),
        (status = 404, description = "Blog not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn blog_votes(
    State(state): State<AppState>,
    Path(blog_id): Path<BlogId>,
    current_user: Option<CurrentUser>,
) -> Result<Json<VoteStatusResponse>> {
    Ok(Json(vote_status(&state, VoteTarget::Blog, blog_id, current_user.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{comment_id}/votes",
    tag = "votes",
    summary = "Vote on a comment",
    request_body = VoteRequest,
    params(("comment_id" = uuid::Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Vote toggled", body = VoteResponse),
        (status = 404, description = "Comment not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn vote_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    current_user: CurrentUser,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    Ok(Json(cast_vote(&state, VoteTarget::Comment, comment_id, &current_user, request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/comments/{comment_id}/votes",
    tag = "votes",
    summary = "Comment vote summary",
    params(("comment_id" = uuid::Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Vote counts and the caller's vote, if signed in", body = VoteStatusResponse),
        (status = 404, description = "Comment not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn comment_votes(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    current_user: Option<CurrentUser>,
) -> Result<Json<VoteStatusResponse>> {
    Ok(Json(vote_status(&state, VoteTarget::Comment, comment_id, current_user.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/replies/{reply_id}/votes",
    tag = "votes",
    summary = "Vote on a reply",
    request_body = VoteRequest,
    params(("reply_id" = uuid::Uuid, Path, description = "Reply ID")),
    responses(
        (status = 200, description = "Vote toggled", body = VoteResponse),
        (status = 404, description = "Reply not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn vote_reply(
    State(state): State<AppState>,
    Path(reply_id): Path<ReplyId>,
    current_user: CurrentUser,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    Ok(Json(cast_vote(&state, VoteTarget::Reply, reply_id, &current_user, request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/replies/{reply_id}/votes",
    tag = "votes",
    summary = "Reply vote summary",
    params(("reply_id" = uuid::Uuid, Path, description = "Reply ID")),
    responses(
        (status = 200, description = "Vote counts and the caller's vote, if signed in", body = VoteStatusResponse),
        (status = 404, description = "Reply not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reply_votes(
    State(state): State<AppState>,
    Path(reply_id): Path<ReplyId>,
    current_user: Option<CurrentUser>,
) -> Result<Json<VoteStatusResponse>> {
    Ok(Json(vote_status(&state, VoteTarget::Reply, reply_id, current_user.as_ref()).await?))
}
