use crate::api::handlers::{NotFoundExt, not_found};
use crate::api::models::{
    blogs::{BlogCreate, BlogResponse, BlogUpdate, CommentContent, CommentResponse, ListBlogsQuery, ReplyResponse, SavedBlogResponse},
    events::SaveStatusResponse,
    pagination::PaginatedResponse,
    users::CurrentUser,
};
use crate::auth::permissions;
use crate::db::handlers::{Blogs, Comments, Replies, Repository, blogs::BlogFilter};
use crate::db::models::blogs::{CommentCreateDBRequest, ReplyCreateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{BlogId, CommentId, Operation, ReplyId};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/v1/blogs",
    tag = "blogs",
    summary = "List blogs",
    params(ListBlogsQuery),
    responses(
        (status = 200, description = "Paginated blogs, newest first", body = PaginatedResponse<BlogResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_blogs(State(state): State<AppState>, Query(query): Query<ListBlogsQuery>) -> Result<Json<PaginatedResponse<BlogResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = BlogFilter {
        author_id: query.author_id,
        location_id: query.location_id,
        ..BlogFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Blogs::new(&mut conn);
    let blogs = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        blogs.into_iter().map(BlogResponse::from).collect(),
        total,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/blogs",
    tag = "blogs",
    summary = "Create blog",
    request_body = BlogCreate,
    responses(
        (status = 201, description = "Blog created", body = BlogResponse),
        (status = 400, description = "Invalid request or unknown location"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_blog(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<BlogCreate>,
) -> Result<(StatusCode, Json<BlogResponse>)> {
    create.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let blog = Blogs::new(&mut tx).create(&create.into_db(current_user.id)).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(BlogResponse::from(blog))))
}

#[utoipa::path(
    get,
    path = "/api/v1/blogs/{blog_id}",
    tag = "blogs",
    summary = "Get blog",
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog details", body = BlogResponse),
        (status = 404, description = "Blog not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_blog(State(state): State<AppState>, Path(blog_id): Path<BlogId>) -> Result<Json<BlogResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let blog = Blogs::new(&mut conn).get_by_id(blog_id).await?.or_not_found("Blog", blog_id)?;

    Ok(Json(BlogResponse::from(blog)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/blogs/{blog_id}",
    tag = "blogs",
    summary = "Update blog",
    request_body = BlogUpdate,
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog updated", body = BlogResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Blog not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_blog(
    State(state): State<AppState>,
    Path(blog_id): Path<BlogId>,
    current_user: CurrentUser,
    Json(update): Json<BlogUpdate>,
) -> Result<Json<BlogResponse>> {
    update.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let blog = {
        let mut repo = Blogs::new(&mut tx);
        let author = repo.author_of(blog_id).await?.or_not_found("Blog", blog_id)?;
        permissions::require_owner(&current_user, author, Operation::Update, "blog")?;
        repo.update(blog_id, &update.into()).await.or_not_found("Blog", blog_id)?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(BlogResponse::from(blog)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/blogs/{blog_id}",
    tag = "blogs",
    summary = "Delete blog",
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 204, description = "Blog deleted with its comments, replies and votes"),
        (status = 403, description = "Not the author or an admin"),
        (status = 404, description = "Blog not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_blog(State(state): State<AppState>, Path(blog_id): Path<BlogId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    {
        let mut repo = Blogs::new(&mut tx);
        let author = repo.author_of(blog_id).await?.or_not_found("Blog", blog_id)?;
        permissions::require_owner_or_admin(&current_user, author, Operation::Delete, "blog")?;
        if !repo.delete(blog_id).await? {
            return Err(not_found("Blog", blog_id));
        }
    }
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/blogs/saved",
    tag = "blogs",
    summary = "List saved blogs",
    responses(
        (status = 200, description = "The caller's saved blogs, most recently saved first", body = Vec<SavedBlogResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_saved_blogs(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<SavedBlogResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let saved = Blogs::new(&mut conn).list_saved(current_user.id).await?;

    Ok(Json(saved.into_iter().map(SavedBlogResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/blogs/{blog_id}/save",
    tag = "blogs",
    summary = "Save blog",
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 201, description = "Blog saved", body = SaveStatusResponse),
        (status = 404, description = "Blog not found"),
        (status = 409, description = "Blog already saved"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn save_blog(
    State(state): State<AppState>,
    Path(blog_id): Path<BlogId>,
    current_user: CurrentUser,
) -> Result<(StatusCode, Json<SaveStatusResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Blogs::new(&mut conn);
    repo.save(current_user.id, blog_id).await.or_missing("Blog not found")?;
    let status = repo.save_status(current_user.id, blog_id).await?;

    Ok((StatusCode::CREATED, Json(SaveStatusResponse::from(status))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/blogs/{blog_id}/save",
    tag = "blogs",
    summary = "Unsave blog",
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 204, description = "Blog unsaved"),
        (status = 404, description = "Saved blog not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn unsave_blog(State(state): State<AppState>, Path(blog_id): Path<BlogId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Blogs::new(&mut conn)
        .unsave(current_user.id, blog_id)
        .await
        .or_missing("Saved blog not found")?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/blogs/{blog_id}/save-status",
    tag = "blogs",
    summary = "Save status",
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Whether the caller saved the blog, and how many users did", body = SaveStatusResponse),
        (status = 404, description = "Blog not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn blog_save_status(
    State(state): State<AppState>,
    Path(blog_id): Path<BlogId>,
    current_user: CurrentUser,
) -> Result<Json<SaveStatusResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Blogs::new(&mut conn);
    repo.author_of(blog_id).await?.or_not_found("Blog", blog_id)?;
    let status = repo.save_status(current_user.id, blog_id).await?;

    Ok(Json(SaveStatusResponse::from(status)))
}

#[utoipa::path(
    get,
    path = "/api/v1/blogs/{blog_id}/comments",
    tag = "comments",
    summary = "List comments",
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Comments newest first, each with replies oldest first", body = Vec<CommentResponse>),
        (status = 404, description = "Blog not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_comments(State(state): State<AppState>, Path(blog_id): Path<BlogId>) -> Result<Json<Vec<CommentResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Blogs::new(&mut conn).author_of(blog_id).await?.or_not_found("Blog", blog_id)?;
    let threads = Comments::new(&mut conn).list_for_blog(blog_id).await?;

    Ok(Json(threads.into_iter().map(CommentResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/blogs/{blog_id}/comments",
    tag = "comments",
    summary = "Add comment",
    request_body = CommentContent,
    params(("blog_id" = uuid::Uuid, Path, description = "Blog ID")),
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Invalid content"),
        (status = 404, description = "Blog not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_comment(
    State(state): State<AppState>,
    Path(blog_id): Path<BlogId>,
    current_user: CurrentUser,
    Json(body): Json<CommentContent>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    body.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let comment = Comments::new(&mut conn)
        .create(&CommentCreateDBRequest {
            blog_id,
            user_id: current_user.id,
            content: body.content,
        })
        .await
        .or_not_found("Blog", blog_id)?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/comments/{comment_id}",
    tag = "comments",
    summary = "Edit comment",
    request_body = CommentContent,
    params(("comment_id" = uuid::Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    current_user: CurrentUser,
    Json(body): Json<CommentContent>,
) -> Result<Json<CommentResponse>> {
    body.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Comments::new(&mut conn);
    let author = repo.author_of(comment_id).await?.or_not_found("Comment", comment_id)?;
    permissions::require_owner(&current_user, author, Operation::Update, "comment")?;
    let comment = repo.update(comment_id, &body.content).await.or_not_found("Comment", comment_id)?;

    Ok(Json(CommentResponse::from(comment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{comment_id}",
    tag = "comments",
    summary = "Delete comment",
    params(("comment_id" = uuid::Uuid, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted with its replies"),
        (status = 403, description = "Not the author or an admin"),
        (status = 404, description = "Comment not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Comments::new(&mut conn);
    let author = repo.author_of(comment_id).await?.or_not_found("Comment", comment_id)?;
    permissions::require_owner_or_admin(&current_user, author, Operation::Delete, "comment")?;
    if !repo.delete(comment_id).await? {
        return Err(not_found("Comment", comment_id));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{comment_id}/replies",
    tag = "comments",
    summary = "Reply to comment",
    request_body = CommentContent,
    params(("comment_id" = uuid::Uuid, Path, description = "Comment ID")),
    responses(
        (status = 201, description = "Reply added", body = ReplyResponse),
        (status = 400, description = "Invalid content"),
        (status = 404, description = "Comment not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_reply(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    current_user: CurrentUser,
    Json(body): Json<CommentContent>,
) -> Result<(StatusCode, Json<ReplyResponse>)> {
    body.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let reply = Replies::new(&mut conn)
        .create(&ReplyCreateDBRequest {
            comment_id,
            user_id: current_user.id,
            content: body.content,
        })
        .await
        .or_not_found("Comment", comment_id)?;

    Ok((StatusCode::CREATED, Json(ReplyResponse::from(reply))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/replies/{reply_id}",
    tag = "comments",
    summary = "Edit reply",
    request_body = CommentContent,
    params(("reply_id" = uuid::Uuid, Path, description = "Reply ID")),
    responses(
        (status = 200, description = "Reply updated", body = ReplyResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Reply not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_reply(
    State(state): State<AppState>,
    Path(reply_id): Path<ReplyId>,
    current_user: CurrentUser,
    Json(body): Json<CommentContent>,
) -> Result<Json<ReplyResponse>> {
    body.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Replies::new(&mut conn);
    let author = repo.author_of(reply_id).await?.or_not_found("Reply", reply_id)?;
    permissions::require_owner(&current_user, author, Operation::Update, "reply")?;
    let reply = repo.update(reply_id, &body.content).await.or_not_found("Reply", reply_id)?;

    Ok(Json(ReplyResponse::from(reply)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/replies/{reply_id}",
    tag = "comments",
    summary = "Delete reply",
    params(("reply_id" = uuid::Uuid, Path, description = "Reply ID")),
    responses(
        (status = 204, description = "Reply deleted"),
        (status = 403, description = "Not the author or an admin"),
        (status = 404, description = "Reply not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_reply(State(state): State<AppState>, Path(reply_id): Path<ReplyId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Replies::new(&mut conn);
    let author = repo.author_of(reply_id).await?.or_not_found("Reply", reply_id)?;
    permissions::require_owner_or_admin(&current_user, author, Operation::Delete, "reply")?;
    if !repo.delete(reply_id).await? {
        return Err(not_found("Reply", reply_id));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_admin_user, create_test_app, create_test_blog, create_test_location, create_test_user, user_token};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_filter_by_location(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let author = create_test_user(&pool).await;
        let ella = create_test_location(&pool, "Ella", "Uva").await;
        create_test_blog(&pool, author.id).await;

        let response = server
            .post("/api/v1/blogs")
            .authorization_bearer(user_token(&author))
            .json(&json!({
                "title": "Sunrise at Little Adam's Peak",
                "content": "Leave at five and bring a torch for the last stretch.",
                "location_ids": [ella.id]
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let blog: BlogResponse = response.json();
        assert_eq!(blog.author.id, author.id);
        assert_eq!(blog.locations.len(), 1);
        assert_eq!(blog.comment_count, 0);
        assert_eq!(blog.votes.score, 0);

        let response = server.get("/api/v1/blogs").add_query_param("location_id", ella.id).await;
        let page: PaginatedResponse<BlogResponse> = response.json();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.data[0].id, blog.id);

        let response = server.get("/api/v1/blogs").add_query_param("author_id", author.id).await;
        let page: PaginatedResponse<BlogResponse> = response.json();
        assert_eq!(page.total_count, 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_only_author_edits_but_admin_deletes(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let author = create_test_user(&pool).await;
        let admin = create_test_admin_user(&pool).await;
        let blog = create_test_blog(&pool, author.id).await;
        let path = format!("/api/v1/blogs/{}", blog.blog.id);

        server
            .patch(&path)
            .authorization_bearer(user_token(&admin))
            .json(&json!({"title": "Hijacked"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .patch(&path)
            .authorization_bearer(user_token(&author))
            .json(&json!({"title": "Edited title"}))
            .await;
        response.assert_status_ok();
        let edited: BlogResponse = response.json();
        assert_eq!(edited.title, "Edited title");

        server.delete(&path).authorization_bearer(user_token(&admin)).await.assert_status(StatusCode::NO_CONTENT);
        server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_comment_thread(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let author = create_test_user(&pool).await;
        let reader = create_test_user(&pool).await;
        let blog = create_test_blog(&pool, author.id).await;
        let comments_path = format!("/api/v1/blogs/{}/comments", blog.blog.id);

        let response = server
            .post(&comments_path)
            .authorization_bearer(user_token(&reader))
            .json(&json!({"content": "Which month did you go?"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let comment: CommentResponse = response.json();

        for content in ["March", "Dry season is best"] {
            server
                .post(&format!("/api/v1/comments/{}/replies", comment.id))
                .authorization_bearer(user_token(&author))
                .json(&json!({"content": content}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server.get(&comments_path).await;
        let threads: Vec<CommentResponse> = response.json();
        assert_eq!(threads.len(), 1);
        let replies = threads[0].replies.as_ref().unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].content, "March");

        // Deleting the comment takes its replies with it
        server
            .delete(&format!("/api/v1/comments/{}", comment.id))
            .authorization_bearer(user_token(&reader))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        let threads: Vec<CommentResponse> = server.get(&comments_path).await.json();
        assert!(threads.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_comment_on_missing_blog(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let reader = create_test_user(&pool).await;
        let missing = uuid::Uuid::new_v4();

        let response = server
            .post(&format!("/api/v1/blogs/{missing}/comments"))
            .authorization_bearer(user_token(&reader))
            .json(&json!({"content": "Hello?"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.text(), format!("Blog with ID {missing} not found"));

        let response = server
            .post(&format!("/api/v1/comments/{missing}/replies"))
            .authorization_bearer(user_token(&reader))
            .json(&json!({"content": "Hello?"}))
            .await;
        assert_eq!(response.text(), format!("Comment with ID {missing} not found"));

        server.get(&format!("/api/v1/blogs/{missing}/comments")).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reply_edit_is_owner_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let author = create_test_user(&pool).await;
        let stranger = create_test_user(&pool).await;
        let blog = create_test_blog(&pool, author.id).await;

        let comment: CommentResponse = server
            .post(&format!("/api/v1/blogs/{}/comments", blog.blog.id))
            .authorization_bearer(user_token(&author))
            .json(&json!({"content": "First"}))
            .await
            .json();
        let reply: ReplyResponse = server
            .post(&format!("/api/v1/comments/{}/replies", comment.id))
            .authorization_bearer(user_token(&author))
            .json(&json!({"content": "Second"}))
            .await
            .json();

        server
            .patch(&format!("/api/v1/replies/{}", reply.id))
            .authorization_bearer(user_token(&stranger))
            .json(&json!({"content": "Vandalised"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .patch(&format!("/api/v1/replies/{}", reply.id))
            .authorization_bearer(user_token(&author))
            .json(&json!({"content": "Second, edited"}))
            .await;
        let edited: ReplyResponse = response.json();
        assert_eq!(edited.content, "Second, edited");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_empty_comment_rejected(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let author = create_test_user(&pool).await;
        let blog = create_test_blog(&pool, author.id).await;

        server
            .post(&format!("/api/v1/blogs/{}/comments", blog.blog.id))
            .authorization_bearer(user_token(&author))
            .json(&json!({"content": "   "}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_saves(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let author = create_test_user(&pool).await;
        let reader = create_test_user(&pool).await;
        let token = user_token(&reader);
        let blog = create_test_blog(&pool, author.id).await;
        let save_path = format!("/api/v1/blogs/{}/save", blog.blog.id);

        server.post(&save_path).authorization_bearer(token.clone()).await.assert_status(StatusCode::CREATED);
        let response = server.post(&save_path).authorization_bearer(token.clone()).await;
        response.assert_status(StatusCode::CONFLICT);

        let saved: Vec<SavedBlogResponse> = server.get("/api/v1/blogs/saved").authorization_bearer(token.clone()).await.json();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].blog.id, blog.blog.id);

        let status: SaveStatusResponse = server
            .get(&format!("/api/v1/blogs/{}/save-status", blog.blog.id))
            .authorization_bearer(user_token(&author))
            .await
            .json();
        assert!(!status.is_saved);
        assert_eq!(status.count, 1);

        server.delete(&save_path).authorization_bearer(token.clone()).await.assert_status(StatusCode::NO_CONTENT);
        let response = server.delete(&save_path).authorization_bearer(token.clone()).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "Saved blog not found");

        let response = server
            .post(&format!("/api/v1/blogs/{}/save", uuid::Uuid::new_v4()))
            .authorization_bearer(token)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "Blog not found");
    }
}
