//! Database repository for trips and trip participants.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::trips::{TripCreateDBRequest, TripDBResponse, TripParticipantDBResponse, TripUpdateDBRequest},
};
use crate::types::{LocationId, TripId, UserId, abbrev_uuid};
use chrono::NaiveDate;
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

const TRIP_SELECT: &str = r#"
    SELECT
        t.id, t.title, t.description, t.location_id, l.name AS location_name, t.created_by,
        t.start_date, t.end_date,
        (SELECT COUNT(*) FROM trip_participants p WHERE p.trip_id = t.id) AS participant_count,
        t.created_at, t.updated_at
    FROM trips t
    LEFT JOIN locations l ON l.id = t.location_id
"#;

/// Filter for listing trips
#[derive(Debug, Clone, Default)]
pub struct TripFilter {
    pub skip: i64,
    pub limit: i64,
    pub location_id: Option<LocationId>,
    /// Only trips starting on or after this date
    pub start_from: Option<NaiveDate>,
    /// Only trips ending on or before this date
    pub end_until: Option<NaiveDate>,
}

impl TripFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

fn push_trip_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &TripFilter) {
    if let Some(location_id) = filter.location_id {
        query.push(" AND t.location_id = ");
        query.push_bind(location_id);
    }
    if let Some(start_from) = filter.start_from {
        query.push(" AND t.start_date >= ");
        query.push_bind(start_from);
    }
    if let Some(end_until) = filter.end_until {
        query.push(" AND t.end_date <= ");
        query.push_bind(end_until);
    }
}

pub struct Trips<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Trips<'c> {
    type CreateRequest = TripCreateDBRequest;
    type UpdateRequest = TripUpdateDBRequest;
    type Response = TripDBResponse;
    type Id = TripId;
    type Filter = TripFilter;

    /// Creates the trip and enrols its creator as the first participant. Call inside a
    /// transaction so both rows land together.
    #[instrument(skip(self, request), fields(title = %request.title, created_by = %abbrev_uuid(&request.created_by)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: TripId = sqlx::query_scalar(
            r#"
            INSERT INTO trips (title, description, location_id, created_by, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.location_id)
        .bind(request.created_by)
        .bind(request.start_date)
        .bind(request.end_date)
        .fetch_one(&mut *self.db)
        .await?;

        sqlx::query("INSERT INTO trip_participants (trip_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(request.created_by)
            .execute(&mut *self.db)
            .await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(trip_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sql = format!("{TRIP_SELECT} WHERE t.id = $1");
        let trip = sqlx::query_as::<_, TripDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(trip)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(TRIP_SELECT);
        query.push(" WHERE 1=1");
        push_trip_filters(&mut query, filter);
        query.push(" ORDER BY t.start_date ASC, t.id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let trips = query.build_query_as::<TripDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(trips)
    }

    #[instrument(skip(self), fields(trip_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM trips WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(trip_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let updated: Option<TripId> = sqlx::query_scalar(
            r#"
            UPDATE trips SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location_id = COALESCE($4, location_id),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.location_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .fetch_optional(&mut *self.db)
        .await?;

        let id = updated.ok_or(DbError::NotFound)?;
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> Trips<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &TripFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM trips t WHERE 1=1");
        push_trip_filters(&mut query, filter);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    /// The creator of a trip, if the trip exists
    #[instrument(skip(self), fields(trip_id = %abbrev_uuid(&id)), err)]
    pub async fn creator_of(&mut self, id: TripId) -> Result<Option<UserId>> {
        let creator = sqlx::query_scalar("SELECT created_by FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(creator)
    }

    /// Participants in join order
    #[instrument(skip(self), fields(trip_id = %abbrev_uuid(&trip_id)), err)]
    pub async fn list_participants(&mut self, trip_id: TripId) -> Result<Vec<TripParticipantDBResponse>> {
        let participants = sqlx::query_as::<_, TripParticipantDBResponse>(
            r#"
            SELECT p.trip_id, p.user_id, u.name, u.email, u.image, p.joined_at
            FROM trip_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.trip_id = $1
            ORDER BY p.joined_at ASC
            "#,
        )
        .bind(trip_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(participants)
    }

    /// Enrol a user. A user already on the trip surfaces as a unique violation, an unknown
    /// user as a foreign key violation.
    #[instrument(skip(self), fields(trip_id = %abbrev_uuid(&trip_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn add_participant(&mut self, trip_id: TripId, user_id: UserId) -> Result<TripParticipantDBResponse> {
        sqlx::query("INSERT INTO trip_participants (trip_id, user_id) VALUES ($1, $2)")
            .bind(trip_id)
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        let participant = sqlx::query_as::<_, TripParticipantDBResponse>(
            r#"
            SELECT p.trip_id, p.user_id, u.name, u.email, u.image, p.joined_at
            FROM trip_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.trip_id = $1 AND p.user_id = $2
            "#,
        )
        .bind(trip_id)
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(participant)
    }

    #[instrument(skip(self), fields(trip_id = %abbrev_uuid(&trip_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn remove_participant(&mut self, trip_id: TripId, user_id: UserId) -> Result<()> {
        let result = sqlx::query("DELETE FROM trip_participants WHERE trip_id = $1 AND user_id = $2")
            .bind(trip_id)
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }

    /// Trips the user participates in, including ones they created
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<TripDBResponse>> {
        let sql = format!(
            "{TRIP_SELECT} WHERE t.id IN (SELECT trip_id FROM trip_participants WHERE user_id = $1) ORDER BY t.start_date ASC, t.id"
        );
        let trips = sqlx::query_as::<_, TripDBResponse>(&sql)
            .bind(user_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(trips)
    }
}
