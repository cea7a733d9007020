//! Database repositories for blog comments and their replies.

use crate::db::{
    errors::{DbError, Result},
    models::blogs::{CommentCreateDBRequest, CommentDBResponse, CommentThreadDBResponse, ReplyCreateDBRequest, ReplyDBResponse},
};
use crate::types::{BlogId, CommentId, ReplyId, UserId, abbrev_uuid};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;

const COMMENT_SELECT: &str = r#"
    SELECT
        c.id, c.blog_id, c.user_id, u.name AS user_name, u.image AS user_image, c.content,
        (SELECT COUNT(*) FROM comment_votes v WHERE v.target_id = c.id AND v.vote_type = 'UP') AS upvotes,
        (SELECT COUNT(*) FROM comment_votes v WHERE v.target_id = c.id AND v.vote_type = 'DOWN') AS downvotes,
        c.created_at, c.updated_at
    FROM blog_comments c
    JOIN users u ON u.id = c.user_id
"#;

const REPLY_SELECT: &str = r#"
    SELECT
        r.id, r.comment_id, r.user_id, u.name AS user_name, u.image AS user_image, r.content,
        (SELECT COUNT(*) FROM reply_votes v WHERE v.target_id = r.id AND v.vote_type = 'UP') AS upvotes,
        (SELECT COUNT(*) FROM reply_votes v WHERE v.target_id = r.id AND v.vote_type = 'DOWN') AS downvotes,
        r.created_at, r.updated_at
    FROM comment_replies r
    JOIN users u ON u.id = r.user_id
"#;

pub struct Comments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Comments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fails with `NotFound` when the blog does not exist.
    #[instrument(skip(self, request), fields(blog_id = %abbrev_uuid(&request.blog_id)), err)]
    pub async fn create(&mut self, request: &CommentCreateDBRequest) -> Result<CommentDBResponse> {
        let id: Option<CommentId> = sqlx::query_scalar(
            r#"
            INSERT INTO blog_comments (blog_id, user_id, content)
            SELECT id, $2, $3 FROM blogs WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(request.blog_id)
        .bind(request.user_id)
        .bind(&request.content)
        .fetch_optional(&mut *self.db)
        .await?;

        let id = id.ok_or(DbError::NotFound)?;
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(comment_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: CommentId) -> Result<Option<CommentDBResponse>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = $1");
        let comment = sqlx::query_as::<_, CommentDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(comment)
    }

    /// All comments on a blog, newest first, each with its replies oldest first
    #[instrument(skip(self), fields(blog_id = %abbrev_uuid(&blog_id)), err)]
    pub async fn list_for_blog(&mut self, blog_id: BlogId) -> Result<Vec<CommentThreadDBResponse>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.blog_id = $1 ORDER BY c.created_at DESC, c.id");
        let comments = sqlx::query_as::<_, CommentDBResponse>(&sql)
            .bind(blog_id)
            .fetch_all(&mut *self.db)
            .await?;

        let ids: Vec<CommentId> = comments.iter().map(|c| c.id).collect();
        let mut replies = Replies::new(&mut *self.db).list_for_comments(&ids).await?;

        Ok(comments
            .into_iter()
            .map(|comment| CommentThreadDBResponse {
                replies: replies.remove(&comment.id).unwrap_or_default(),
                comment,
            })
            .collect())
    }

    #[instrument(skip(self, content), fields(comment_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: CommentId, content: &str) -> Result<CommentDBResponse> {
        let result = sqlx::query("UPDATE blog_comments SET content = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(content)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(comment_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: CommentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_comments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The author of a comment, if the comment exists
    #[instrument(skip(self), fields(comment_id = %abbrev_uuid(&id)), err)]
    pub async fn author_of(&mut self, id: CommentId) -> Result<Option<UserId>> {
        let author = sqlx::query_scalar("SELECT user_id FROM blog_comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(author)
    }
}

pub struct Replies<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Replies<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fails with `NotFound` when the comment does not exist.
    #[instrument(skip(self, request), fields(comment_id = %abbrev_uuid(&request.comment_id)), err)]
    pub async fn create(&mut self, request: &ReplyCreateDBRequest) -> Result<ReplyDBResponse> {
        let id: Option<ReplyId> = sqlx::query_scalar(
            r#"
            INSERT INTO comment_replies (comment_id, user_id, content)
            SELECT id, $2, $3 FROM blog_comments WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(request.comment_id)
        .bind(request.user_id)
        .bind(&request.content)
        .fetch_optional(&mut *self.db)
        .await?;

        let id = id.ok_or(DbError::NotFound)?;
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(reply_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: ReplyId) -> Result<Option<ReplyDBResponse>> {
        let sql = format!("{REPLY_SELECT} WHERE r.id = $1");
        let reply = sqlx::query_as::<_, ReplyDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(reply)
    }

    // Bulk fetch to avoid N+1 queries when listing threads
    async fn list_for_comments(&mut self, comment_ids: &[CommentId]) -> Result<HashMap<CommentId, Vec<ReplyDBResponse>>> {
        if comment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!("{REPLY_SELECT} WHERE r.comment_id = ANY($1) ORDER BY r.created_at ASC, r.id");
        let rows = sqlx::query_as::<_, ReplyDBResponse>(&sql)
            .bind(comment_ids)
            .fetch_all(&mut *self.db)
            .await?;

        let mut result: HashMap<CommentId, Vec<ReplyDBResponse>> = HashMap::new();
        for row in rows {
            result.entry(row.comment_id).or_default().push(row);
        }
        Ok(result)
    }

    #[instrument(skip(self, content), fields(reply_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: ReplyId, content: &str) -> Result<ReplyDBResponse> {
        let result = sqlx::query("UPDATE comment_replies SET content = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(content)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(reply_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: ReplyId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comment_replies WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The author of a reply, if the reply exists
    #[instrument(skip(self), fields(reply_id = %abbrev_uuid(&id)), err)]
    pub async fn author_of(&mut self, id: ReplyId) -> Result<Option<UserId>> {
        let author = sqlx::query_scalar("SELECT user_id FROM comment_replies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(author)
    }
}
