//! Database repository for locations and favourite locations.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::locations::{FavoriteLocationDBResponse, LocationCreateDBRequest, LocationDBResponse, LocationUpdateDBRequest},
};
use crate::types::{LocationId, UserId, abbrev_uuid};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing locations
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    pub skip: i64,
    pub limit: i64,
    pub category: Option<String>,
    pub province: Option<String>,
    pub search: Option<String>, // Case-insensitive substring search on name
}

impl LocationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

fn push_location_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &LocationFilter) {
    if let Some(ref category) = filter.category {
        query.push(" AND category = ");
        query.push_bind(category.clone());
    }
    if let Some(ref province) = filter.province {
        query.push(" AND province = ");
        query.push_bind(province.clone());
    }
    if let Some(ref search) = filter.search {
        query.push(" AND LOWER(name) LIKE ");
        query.push_bind(format!("%{}%", search.to_lowercase()));
    }
}

pub struct Locations<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Locations<'c> {
    type CreateRequest = LocationCreateDBRequest;
    type UpdateRequest = LocationUpdateDBRequest;
    type Response = LocationDBResponse;
    type Id = LocationId;
    type Filter = LocationFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let location = sqlx::query_as::<_, LocationDBResponse>(
            r#"
            INSERT INTO locations (name, description, category, province, district, address, latitude, longitude, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.province)
        .bind(&request.district)
        .bind(&request.address)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(&request.images)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(location)
    }

    #[instrument(skip(self), fields(location_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let location = sqlx::query_as::<_, LocationDBResponse>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(location)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM locations WHERE 1=1");
        push_location_filters(&mut query, filter);
        query.push(" ORDER BY created_at DESC, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let locations = query.build_query_as::<LocationDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(locations)
    }

    #[instrument(skip(self), fields(location_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(location_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let location = sqlx::query_as::<_, LocationDBResponse>(
            r#"
            UPDATE locations SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                province = COALESCE($5, province),
                district = COALESCE($6, district),
                address = COALESCE($7, address),
                latitude = COALESCE($8, latitude),
                longitude = COALESCE($9, longitude),
                images = COALESCE($10, images),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.province)
        .bind(&request.district)
        .bind(&request.address)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(&request.images)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(location)
    }
}

impl<'c> Locations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &LocationFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM locations WHERE 1=1");
        push_location_filters(&mut query, filter);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), fields(location_id = %abbrev_uuid(&id)), err)]
    pub async fn exists(&mut self, id: LocationId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }

    /// Mark a location as a favourite. Fails with `NotFound` if the location does not exist and
    /// with a unique violation if it is already a favourite.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), location_id = %abbrev_uuid(&location_id)), err)]
    pub async fn add_favorite(&mut self, user_id: UserId, location_id: LocationId) -> Result<FavoriteLocationDBResponse> {
        if !self.exists(location_id).await? {
            return Err(DbError::NotFound);
        }

        sqlx::query("INSERT INTO favorite_locations (user_id, location_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(location_id)
            .execute(&mut *self.db)
            .await?;

        self.favorites_query(user_id, Some(location_id))
            .await?
            .into_iter()
            .next()
            .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), location_id = %abbrev_uuid(&location_id)), err)]
    pub async fn remove_favorite(&mut self, user_id: UserId, location_id: LocationId) -> Result<()> {
        let result = sqlx::query("DELETE FROM favorite_locations WHERE user_id = $1 AND location_id = $2")
            .bind(user_id)
            .bind(location_id)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }

    /// A user's favourites, most recently added first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_favorites(&mut self, user_id: UserId) -> Result<Vec<FavoriteLocationDBResponse>> {
        self.favorites_query(user_id, None).await
    }

    async fn favorites_query(&mut self, user_id: UserId, location_id: Option<LocationId>) -> Result<Vec<FavoriteLocationDBResponse>> {
        let favorites = sqlx::query_as::<_, FavoriteLocationDBResponse>(
            r#"
            SELECT f.user_id, f.created_at AS favorited_at, l.*
            FROM favorite_locations f
            JOIN locations l ON l.id = f.location_id
            WHERE f.user_id = $1 AND ($2::uuid IS NULL OR f.location_id = $2)
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(location_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(favorites)
    }
}
