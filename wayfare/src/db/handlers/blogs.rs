//! Database repository for blogs and saved blogs.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::blogs::{BlogCreateDBRequest, BlogDBResponse, BlogLocationDBResponse, BlogRecord, BlogUpdateDBRequest, SavedBlogDBResponse},
    models::events::SaveStatus,
};
use crate::types::{BlogId, LocationId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing blogs
#[derive(Debug, Clone, Default)]
pub struct BlogFilter {
    pub skip: i64,
    pub limit: i64,
    pub author_id: Option<UserId>,
    pub location_id: Option<LocationId>,
}

impl BlogFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

const BLOG_SELECT: &str = r#"
    SELECT
        b.id, b.author_id, u.name AS author_name, u.image AS author_image, b.title, b.content,
        (SELECT COUNT(*) FROM blog_comments c WHERE c.blog_id = b.id) AS comment_count,
        (SELECT COUNT(*) FROM blog_votes v WHERE v.target_id = b.id AND v.vote_type = 'UP') AS upvotes,
        (SELECT COUNT(*) FROM blog_votes v WHERE v.target_id = b.id AND v.vote_type = 'DOWN') AS downvotes,
        b.created_at, b.updated_at
    FROM blogs b
    JOIN users u ON u.id = b.author_id
"#;

fn push_blog_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &BlogFilter) {
    if let Some(author_id) = filter.author_id {
        query.push(" AND b.author_id = ");
        query.push_bind(author_id);
    }
    if let Some(location_id) = filter.location_id {
        query.push(" AND EXISTS (SELECT 1 FROM blog_locations bl WHERE bl.blog_id = b.id AND bl.location_id = ");
        query.push_bind(location_id);
        query.push(")");
    }
}

pub struct Blogs<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Blogs<'c> {
    type CreateRequest = BlogCreateDBRequest;
    type UpdateRequest = BlogUpdateDBRequest;
    type Response = BlogDBResponse;
    type Id = BlogId;
    type Filter = BlogFilter;

    /// Should be called inside a transaction so the blog and its location links land together.
    #[instrument(skip(self, request), fields(author_id = %abbrev_uuid(&request.author_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: BlogId = sqlx::query_scalar("INSERT INTO blogs (author_id, title, content) VALUES ($1, $2, $3) RETURNING id")
            .bind(request.author_id)
            .bind(&request.title)
            .bind(&request.content)
            .fetch_one(&mut *self.db)
            .await?;

        self.insert_links(id, &request.location_ids).await?;
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(blog_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sql = format!("{BLOG_SELECT} WHERE b.id = $1");
        let Some(blog) = sqlx::query_as::<_, BlogRecord>(&sql).bind(id).fetch_optional(&mut *self.db).await? else {
            return Ok(None);
        };

        let locations = self.locations_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(Some(BlogDBResponse { blog, locations }))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(BLOG_SELECT);
        query.push(" WHERE 1=1");
        push_blog_filters(&mut query, filter);
        query.push(" ORDER BY b.created_at DESC, b.id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let blogs = query.build_query_as::<BlogRecord>().fetch_all(&mut *self.db).await?;
        self.attach_locations(blogs).await
    }

    #[instrument(skip(self), fields(blog_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Should be called inside a transaction when `location_ids` is set.
    #[instrument(skip(self, request), fields(blog_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let result = sqlx::query(
            r#"
            UPDATE blogs SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.content)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        if let Some(ref location_ids) = request.location_ids {
            sqlx::query("DELETE FROM blog_locations WHERE blog_id = $1")
                .bind(id)
                .execute(&mut *self.db)
                .await?;
            self.insert_links(id, location_ids).await?;
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> Blogs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &BlogFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM blogs b WHERE 1=1");
        push_blog_filters(&mut query, filter);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    /// The author of a blog, if the blog exists
    #[instrument(skip(self), fields(blog_id = %abbrev_uuid(&id)), err)]
    pub async fn author_of(&mut self, id: BlogId) -> Result<Option<UserId>> {
        let author = sqlx::query_scalar("SELECT author_id FROM blogs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(author)
    }

    async fn insert_links(&mut self, blog_id: BlogId, location_ids: &[LocationId]) -> Result<()> {
        for location_id in location_ids {
            sqlx::query("INSERT INTO blog_locations (blog_id, location_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(blog_id)
                .bind(*location_id)
                .execute(&mut *self.db)
                .await?;
        }
        Ok(())
    }

    // Bulk fetch to avoid N+1 queries when listing
    async fn locations_for(&mut self, blog_ids: &[BlogId]) -> Result<HashMap<BlogId, Vec<BlogLocationDBResponse>>> {
        if blog_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, BlogLocationDBResponse>(
            r#"
            SELECT bl.blog_id, bl.location_id, l.name, l.province
            FROM blog_locations bl
            JOIN locations l ON l.id = bl.location_id
            WHERE bl.blog_id = ANY($1)
            ORDER BY l.name
            "#,
        )
        .bind(blog_ids)
        .fetch_all(&mut *self.db)
        .await?;

        let mut result: HashMap<BlogId, Vec<BlogLocationDBResponse>> = HashMap::new();
        for row in rows {
            result.entry(row.blog_id).or_default().push(row);
        }
        Ok(result)
    }

    async fn attach_locations(&mut self, blogs: Vec<BlogRecord>) -> Result<Vec<BlogDBResponse>> {
        let ids: Vec<BlogId> = blogs.iter().map(|b| b.id).collect();
        let mut locations = self.locations_for(&ids).await?;
        Ok(blogs
            .into_iter()
            .map(|blog| BlogDBResponse {
                locations: locations.remove(&blog.id).unwrap_or_default(),
                blog,
            })
            .collect())
    }

    /// Save a blog for a user. `NotFound` if the blog does not exist, unique violation if
    /// already saved.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), blog_id = %abbrev_uuid(&blog_id)), err)]
    pub async fn save(&mut self, user_id: UserId, blog_id: BlogId) -> Result<()> {
        if self.author_of(blog_id).await?.is_none() {
            return Err(DbError::NotFound);
        }
        sqlx::query("INSERT INTO saved_blogs (user_id, blog_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(blog_id)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), blog_id = %abbrev_uuid(&blog_id)), err)]
    pub async fn unsave(&mut self, user_id: UserId, blog_id: BlogId) -> Result<()> {
        let result = sqlx::query("DELETE FROM saved_blogs WHERE user_id = $1 AND blog_id = $2")
            .bind(user_id)
            .bind(blog_id)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }

    /// Blogs a user has saved, most recently saved first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_saved(&mut self, user_id: UserId) -> Result<Vec<SavedBlogDBResponse>> {
        let saved: Vec<(BlogId, DateTime<Utc>)> =
            sqlx::query_as("SELECT blog_id, created_at FROM saved_blogs WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(&mut *self.db)
                .await?;

        let ids: Vec<BlogId> = saved.iter().map(|(id, _)| *id).collect();
        let sql = format!("{BLOG_SELECT} WHERE b.id = ANY($1)");
        let blogs = sqlx::query_as::<_, BlogRecord>(&sql).bind(&ids).fetch_all(&mut *self.db).await?;
        let mut by_id: HashMap<BlogId, BlogDBResponse> =
            self.attach_locations(blogs).await?.into_iter().map(|b| (b.blog.id, b)).collect();

        Ok(saved
            .into_iter()
            .filter_map(|(id, saved_at)| by_id.remove(&id).map(|blog| SavedBlogDBResponse { saved_at, blog }))
            .collect())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), blog_id = %abbrev_uuid(&blog_id)), err)]
    pub async fn save_status(&mut self, user_id: UserId, blog_id: BlogId) -> Result<SaveStatus> {
        let status = sqlx::query_as::<_, SaveStatus>(
            r#"
            SELECT
                COALESCE(BOOL_OR(user_id = $1), false) AS is_saved,
                COUNT(*) AS count
            FROM saved_blogs
            WHERE blog_id = $2
            "#,
        )
        .bind(user_id)
        .bind(blog_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(status)
    }
}
