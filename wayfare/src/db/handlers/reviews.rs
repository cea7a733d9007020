//! Database repository for tour reviews.

use crate::db::{
    errors::{DbError, Result},
    models::reviews::{ReviewCreateDBRequest, ReviewDBResponse, ReviewUpdateDBRequest, TourRatingDBResponse},
};
use crate::types::{ReviewId, TourId, UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

const REVIEW_SELECT: &str = r#"
    SELECT
        r.id, r.tour_id, t.title AS tour_title, r.user_id, u.name AS user_name, u.image AS user_image,
        r.rating, r.comment, r.created_at, r.updated_at
    FROM tour_reviews r
    JOIN tours t ON t.id = r.tour_id
    JOIN users u ON u.id = r.user_id
"#;

pub struct Reviews<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Reviews<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fails with `NotFound` when the tour does not exist, and with a unique violation when
    /// the user already reviewed it.
    #[instrument(skip(self, request), fields(tour_id = %abbrev_uuid(&request.tour_id), user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &ReviewCreateDBRequest) -> Result<ReviewDBResponse> {
        let id: Option<ReviewId> = sqlx::query_scalar(
            r#"
            INSERT INTO tour_reviews (tour_id, user_id, rating, comment)
            SELECT id, $2, $3, $4 FROM tours WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(request.tour_id)
        .bind(request.user_id)
        .bind(request.rating)
        .bind(&request.comment)
        .fetch_optional(&mut *self.db)
        .await?;

        let id = id.ok_or(DbError::NotFound)?;
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(review_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: ReviewId) -> Result<Option<ReviewDBResponse>> {
        let sql = format!("{REVIEW_SELECT} WHERE r.id = $1");
        let review = sqlx::query_as::<_, ReviewDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(review)
    }

    /// Reviews of a tour, newest first
    #[instrument(skip(self), fields(tour_id = %abbrev_uuid(&tour_id)), err)]
    pub async fn list_for_tour(&mut self, tour_id: TourId) -> Result<Vec<ReviewDBResponse>> {
        let sql = format!("{REVIEW_SELECT} WHERE r.tour_id = $1 ORDER BY r.created_at DESC, r.id");
        let reviews = sqlx::query_as::<_, ReviewDBResponse>(&sql)
            .bind(tour_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(reviews)
    }

    /// Reviews written by a user, newest first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<ReviewDBResponse>> {
        let sql = format!("{REVIEW_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC, r.id");
        let reviews = sqlx::query_as::<_, ReviewDBResponse>(&sql)
            .bind(user_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(reviews)
    }

    #[instrument(skip(self, request), fields(review_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: ReviewId, request: &ReviewUpdateDBRequest) -> Result<ReviewDBResponse> {
        let result = sqlx::query(
            r#"
            UPDATE tour_reviews SET
                rating = COALESCE($2, rating),
                comment = COALESCE($3, comment),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(request.rating)
        .bind(&request.comment)
        .execute(&mut *self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(review_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: ReviewId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tour_reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(tour_id = %abbrev_uuid(&tour_id)), err)]
    pub async fn rating(&mut self, tour_id: TourId) -> Result<TourRatingDBResponse> {
        let rating = sqlx::query_as::<_, TourRatingDBResponse>(
            r#"
            SELECT
                COALESCE(AVG(rating)::DOUBLE PRECISION, 0) AS average_rating,
                COUNT(*) AS total_reviews
            FROM tour_reviews
            WHERE tour_id = $1
            "#,
        )
        .bind(tour_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(rating)
    }
}
