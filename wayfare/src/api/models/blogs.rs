//! API request/response models for blogs, comments and replies.

use super::{locations::LocationSummary, pagination::Pagination, users::UserSummary, validation};
use crate::db::models::blogs::{
    BlogCreateDBRequest, BlogDBResponse, BlogUpdateDBRequest, CommentDBResponse, CommentThreadDBResponse, ReplyDBResponse,
    SavedBlogDBResponse,
};
use crate::db::models::votes::VoteSummary;
use crate::errors::Result;
use crate::types::{BlogId, CommentId, LocationId, ReplyId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

const MAX_COMMENT_CHARS: usize = 2000;

fn votes(upvotes: i64, downvotes: i64) -> VoteSummary {
    VoteSummary {
        upvotes,
        downvotes,
        score: upvotes - downvotes,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogCreate {
    pub title: String,
    pub content: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub location_ids: Vec<LocationId>,
}

impl BlogCreate {
    pub fn validate(&self) -> Result<()> {
        validation::min_chars("Title", &self.title, 3)?;
        validation::min_chars("Content", &self.content, 10)
    }

    pub fn into_db(self, author_id: UserId) -> BlogCreateDBRequest {
        BlogCreateDBRequest {
            author_id,
            title: self.title.trim().to_string(),
            content: self.content,
            location_ids: self.location_ids,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BlogUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Replaces the full set of linked locations when present
    #[schema(value_type = Option<Vec<String>>)]
    pub location_ids: Option<Vec<LocationId>>,
}

impl BlogUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validation::min_chars("Title", title, 3)?;
        }
        if let Some(content) = &self.content {
            validation::min_chars("Content", content, 10)?;
        }
        Ok(())
    }
}

impl From<BlogUpdate> for BlogUpdateDBRequest {
    fn from(api: BlogUpdate) -> Self {
        Self {
            title: api.title.map(|t| t.trim().to_string()),
            content: api.content,
            location_ids: api.location_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BlogId,
    pub author: UserSummary,
    pub title: String,
    pub content: String,
    pub locations: Vec<LocationSummary>,
    pub comment_count: i64,
    pub votes: VoteSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlogDBResponse> for BlogResponse {
    fn from(db: BlogDBResponse) -> Self {
        let blog = db.blog;
        Self {
            id: blog.id,
            author: UserSummary {
                id: blog.author_id,
                name: blog.author_name,
                image: blog.author_image,
            },
            title: blog.title,
            content: blog.content,
            locations: db
                .locations
                .into_iter()
                .map(|l| LocationSummary {
                    id: l.location_id,
                    name: l.name,
                    province: l.province,
                })
                .collect(),
            comment_count: blog.comment_count,
            votes: votes(blog.upvotes, blog.downvotes),
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedBlogResponse {
    pub saved_at: DateTime<Utc>,
    pub blog: BlogResponse,
}

impl From<SavedBlogDBResponse> for SavedBlogResponse {
    fn from(db: SavedBlogDBResponse) -> Self {
        Self {
            saved_at: db.saved_at,
            blog: db.blog.into(),
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListBlogsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub author_id: Option<UserId>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
}

/// Body for creating or editing a comment or reply
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentContent {
    pub content: String,
}

impl CommentContent {
    pub fn validate(&self) -> Result<()> {
        validation::min_chars("Content", &self.content, 1)?;
        validation::max_chars("Content", &self.content, MAX_COMMENT_CHARS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplyResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReplyId,
    #[schema(value_type = String, format = "uuid")]
    pub comment_id: CommentId,
    pub user: UserSummary,
    pub content: String,
    pub votes: VoteSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CommentId,
    #[schema(value_type = String, format = "uuid")]
    pub blog_id: BlogId,
    pub user: UserSummary,
    pub content: String,
    pub votes: VoteSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Oldest first. Absent on single-comment responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<ReplyResponse>>,
}

impl From<ReplyDBResponse> for ReplyResponse {
    fn from(db: ReplyDBResponse) -> Self {
        Self {
            id: db.id,
            comment_id: db.comment_id,
            user: UserSummary {
                id: db.user_id,
                name: db.user_name,
                image: db.user_image,
            },
            content: db.content,
            votes: votes(db.upvotes, db.downvotes),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<CommentDBResponse> for CommentResponse {
    fn from(db: CommentDBResponse) -> Self {
        Self {
            id: db.id,
            blog_id: db.blog_id,
            user: UserSummary {
                id: db.user_id,
                name: db.user_name,
                image: db.user_image,
            },
            content: db.content,
            votes: votes(db.upvotes, db.downvotes),
            created_at: db.created_at,
            updated_at: db.updated_at,
            replies: None,
        }
    }
}

impl From<CommentThreadDBResponse> for CommentResponse {
    fn from(db: CommentThreadDBResponse) -> Self {
        let mut comment = CommentResponse::from(db.comment);
        comment.replies = Some(db.replies.into_iter().map(Into::into).collect());
        comment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_validation() {
        let blog = BlogCreate {
            title: "Ella".to_string(),
            content: "Nine arches at sunrise".to_string(),
            location_ids: vec![],
        };
        assert!(blog.validate().is_ok());

        let short = BlogCreate {
            content: "too short".to_string(),
            ..blog.clone()
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_comment_bounds() {
        assert!(CommentContent { content: " ".to_string() }.validate().is_err());
        assert!(CommentContent { content: "x".repeat(MAX_COMMENT_CHARS + 1) }.validate().is_err());
        assert!(CommentContent { content: "Lovely!".to_string() }.validate().is_ok());
    }
}
