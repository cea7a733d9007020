//! Vote request/response models, shared by blogs, comments and replies.

use crate::db::models::votes::{VoteAction, VoteOutcome, VoteSummary, VoteType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct VoteRequest {
    pub vote_type: VoteType,
}

/// What a toggle did, and where the target stands afterwards
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct VoteResponse {
    pub action: VoteAction,
    /// The caller's vote after the toggle; `null` when it was removed
    pub vote: Option<VoteType>,
    pub summary: VoteSummary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct VoteStatusResponse {
    pub summary: VoteSummary,
    pub user_vote: Option<VoteType>,
}

impl From<VoteOutcome> for VoteResponse {
    fn from(outcome: VoteOutcome) -> Self {
        Self {
            action: outcome.action,
            vote: outcome.vote,
            summary: outcome.summary,
        }
    }
}
