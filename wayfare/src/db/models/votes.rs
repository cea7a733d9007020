//! Database models for up/down votes on blogs, comments and replies.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Direction of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "vote_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteType {
    Up,
    Down,
}

/// The kinds of content that can be voted on. Each kind has its own vote table, with
/// identical `(user_id, target_id, vote_type)` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Blog,
    Comment,
    Reply,
}

impl VoteTarget {
    pub(crate) fn vote_table(self) -> &'static str {
        match self {
            VoteTarget::Blog => "blog_votes",
            VoteTarget::Comment => "comment_votes",
            VoteTarget::Reply => "reply_votes",
        }
    }

    pub(crate) fn target_table(self) -> &'static str {
        match self {
            VoteTarget::Blog => "blogs",
            VoteTarget::Comment => "blog_comments",
            VoteTarget::Reply => "comment_replies",
        }
    }

    /// Name used in "not found" errors
    pub fn resource_name(self) -> &'static str {
        match self {
            VoteTarget::Blog => "Blog",
            VoteTarget::Comment => "Comment",
            VoteTarget::Reply => "Reply",
        }
    }
}

/// What a toggle did to the caller's vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    /// No previous vote; one was recorded
    Created,
    /// Same direction as before; the vote was withdrawn
    Removed,
    /// Opposite direction; the vote was flipped in place
    Updated,
}

/// Aggregate vote counts for one target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct VoteSummary {
    pub upvotes: i64,
    pub downvotes: i64,
    pub score: i64,
}

/// Result of a toggle
#[derive(Debug, Clone, Copy)]
pub struct VoteOutcome {
    pub action: VoteAction,
    /// The caller's vote after the toggle
    pub vote: Option<VoteType>,
    pub summary: VoteSummary,
}
