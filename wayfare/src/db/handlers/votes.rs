//! Up/down vote toggling on blogs, comments and replies.
//!
//! Every target kind has its own table keyed by `(user_id, target_id)`, so a user holds at most
//! one vote per target. Casting a vote is a toggle:
//!
//! | existing | requested | result                    |
//! |----------|-----------|---------------------------|
//! | none     | UP/DOWN   | vote created              |
//! | UP       | UP        | vote removed (un-vote)    |
//! | UP       | DOWN      | vote flipped to DOWN      |
//!
//! The existing row is read with `FOR UPDATE`, so [`Votes::toggle`] must run inside a
//! transaction. Two first votes racing each other both see no row; the loser hits the primary
//! key and surfaces as a unique violation.

use crate::db::{
    errors::{DbError, Result},
    models::votes::{VoteAction, VoteOutcome, VoteSummary, VoteTarget, VoteType},
};
use crate::types::{UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Decide what a vote request does given the caller's existing vote.
pub fn decide(existing: Option<VoteType>, requested: VoteType) -> VoteAction {
    match existing {
        None => VoteAction::Created,
        Some(current) if current == requested => VoteAction::Removed,
        Some(_) => VoteAction::Updated,
    }
}

pub struct Votes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Votes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(target = ?target, target_id = %abbrev_uuid(&target_id)), err)]
    pub async fn target_exists(&mut self, target: VoteTarget, target_id: Uuid) -> Result<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", target.target_table());
        let exists: bool = sqlx::query_scalar(&sql).bind(target_id).fetch_one(&mut *self.db).await?;
        Ok(exists)
    }

    /// Toggle the caller's vote on a target. Must run inside a transaction.
    #[instrument(skip(self), fields(target = ?target, target_id = %abbrev_uuid(&target_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn toggle(&mut self, target: VoteTarget, target_id: Uuid, user_id: UserId, requested: VoteType) -> Result<VoteOutcome> {
        if !self.target_exists(target, target_id).await? {
            return Err(DbError::NotFound);
        }

        let table = target.vote_table();
        let existing: Option<VoteType> = sqlx::query_scalar(&format!(
            "SELECT vote_type FROM {table} WHERE user_id = $1 AND target_id = $2 FOR UPDATE"
        ))
        .bind(user_id)
        .bind(target_id)
        .fetch_optional(&mut *self.db)
        .await?;

        let action = decide(existing, requested);
        let vote = match action {
            VoteAction::Created => {
                sqlx::query(&format!("INSERT INTO {table} (user_id, target_id, vote_type) VALUES ($1, $2, $3)"))
                    .bind(user_id)
                    .bind(target_id)
                    .bind(requested)
                    .execute(&mut *self.db)
                    .await?;
                Some(requested)
            }
            VoteAction::Removed => {
                sqlx::query(&format!("DELETE FROM {table} WHERE user_id = $1 AND target_id = $2"))
                    .bind(user_id)
                    .bind(target_id)
                    .execute(&mut *self.db)
                    .await?;
                None
            }
            VoteAction::Updated => {
                sqlx::query(&format!(
                    "UPDATE {table} SET vote_type = $3, updated_at = NOW() WHERE user_id = $1 AND target_id = $2"
                ))
                .bind(user_id)
                .bind(target_id)
                .bind(requested)
                .execute(&mut *self.db)
                .await?;
                Some(requested)
            }
        };

        tracing::debug!(?action, "vote toggled");
        let summary = self.summary(target, target_id).await?;
        Ok(VoteOutcome { action, vote, summary })
    }

    #[instrument(skip(self), fields(target = ?target, target_id = %abbrev_uuid(&target_id)), err)]
    pub async fn summary(&mut self, target: VoteTarget, target_id: Uuid) -> Result<VoteSummary> {
        let sql = format!(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE vote_type = 'UP') AS upvotes,
                COUNT(*) FILTER (WHERE vote_type = 'DOWN') AS downvotes,
                COUNT(*) FILTER (WHERE vote_type = 'UP') - COUNT(*) FILTER (WHERE vote_type = 'DOWN') AS score
            FROM {}
            WHERE target_id = $1
            "#,
            target.vote_table()
        );
        let summary = sqlx::query_as::<_, VoteSummary>(&sql).bind(target_id).fetch_one(&mut *self.db).await?;
        Ok(summary)
    }

    #[instrument(skip(self), fields(target = ?target, target_id = %abbrev_uuid(&target_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn user_vote(&mut self, target: VoteTarget, target_id: Uuid, user_id: UserId) -> Result<Option<VoteType>> {
        let sql = format!("SELECT vote_type FROM {} WHERE user_id = $1 AND target_id = $2", target.vote_table());
        let vote = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(target_id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(vote)
    }
}
