//! Database models for blogs, comments and replies.

use crate::types::{BlogId, CommentId, LocationId, ReplyId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct BlogCreateDBRequest {
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub location_ids: Vec<LocationId>,
}

/// `location_ids`, when present, replaces the whole set of links
#[derive(Debug, Clone, Default)]
pub struct BlogUpdateDBRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub location_ids: Option<Vec<LocationId>>,
}

/// Blog row joined with its author and aggregate counts
#[derive(Debug, Clone, FromRow)]
pub struct BlogRecord {
    pub id: BlogId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_image: Option<String>,
    pub title: String,
    pub content: String,
    pub comment_count: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BlogLocationDBResponse {
    pub blog_id: BlogId,
    pub location_id: LocationId,
    pub name: String,
    pub province: String,
}

/// A blog together with the locations it is about
#[derive(Debug, Clone)]
pub struct BlogDBResponse {
    pub blog: BlogRecord,
    pub locations: Vec<BlogLocationDBResponse>,
}

/// A blog save joined with when it was saved
#[derive(Debug, Clone)]
pub struct SavedBlogDBResponse {
    pub saved_at: DateTime<Utc>,
    pub blog: BlogDBResponse,
}

#[derive(Debug, Clone)]
pub struct CommentCreateDBRequest {
    pub blog_id: BlogId,
    pub user_id: UserId,
    pub content: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentDBResponse {
    pub id: CommentId,
    pub blog_id: BlogId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_image: Option<String>,
    pub content: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment with its replies, oldest reply first
#[derive(Debug, Clone)]
pub struct CommentThreadDBResponse {
    pub comment: CommentDBResponse,
    pub replies: Vec<ReplyDBResponse>,
}

#[derive(Debug, Clone)]
pub struct ReplyCreateDBRequest {
    pub comment_id: CommentId,
    pub user_id: UserId,
    pub content: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReplyDBResponse {
    pub id: ReplyId,
    pub comment_id: CommentId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_image: Option<String>,
    pub content: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
