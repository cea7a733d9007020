//! Database repository for tours.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::tours::{TourCreateDBRequest, TourDBResponse, TourUpdateDBRequest},
};
use crate::types::{AgencyId, LocationId, TourId, abbrev_uuid};
use rust_decimal::Decimal;
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

const TOUR_SELECT: &str = r#"
    SELECT
        t.id, t.agency_id, a.name AS agency_name, a.logo AS agency_logo, a.verified AS agency_verified,
        t.location_id, t.title, t.description, t.price, t.duration_days, t.max_capacity, t.images,
        t.itinerary, t.includes, t.excludes, t.start_dates, t.category, t.province, t.district,
        t.created_at, t.updated_at
    FROM tours t
    JOIN agencies a ON a.id = t.agency_id
"#;

/// Filter for listing tours
#[derive(Debug, Clone, Default)]
pub struct TourFilter {
    pub skip: i64,
    pub limit: i64,
    pub agency_id: Option<AgencyId>,
    pub location_id: Option<LocationId>,
    pub category: Option<String>,
    pub province: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring search on title and description
    pub search: Option<String>,
}

impl TourFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

fn push_tour_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &TourFilter) {
    if let Some(agency_id) = filter.agency_id {
        query.push(" AND t.agency_id = ");
        query.push_bind(agency_id);
    }
    if let Some(location_id) = filter.location_id {
        query.push(" AND t.location_id = ");
        query.push_bind(location_id);
    }
    if let Some(ref category) = filter.category {
        query.push(" AND t.category = ");
        query.push_bind(category.clone());
    }
    if let Some(ref province) = filter.province {
        query.push(" AND t.province = ");
        query.push_bind(province.clone());
    }
    if let Some(min_price) = filter.min_price {
        query.push(" AND t.price >= ");
        query.push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        query.push(" AND t.price <= ");
        query.push_bind(max_price);
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(t.title) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(t.description) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

pub struct Tours<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Tours<'c> {
    type CreateRequest = TourCreateDBRequest;
    type UpdateRequest = TourUpdateDBRequest;
    type Response = TourDBResponse;
    type Id = TourId;
    type Filter = TourFilter;

    #[instrument(skip(self, request), fields(title = %request.title, agency_id = %abbrev_uuid(&request.agency_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: TourId = sqlx::query_scalar(
            r#"
            INSERT INTO tours (
                agency_id, location_id, title, description, price, duration_days, max_capacity,
                images, itinerary, includes, excludes, start_dates, category, province, district
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id
            "#,
        )
        .bind(request.agency_id)
        .bind(request.location_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.duration_days)
        .bind(request.max_capacity)
        .bind(&request.images)
        .bind(&request.itinerary)
        .bind(&request.includes)
        .bind(&request.excludes)
        .bind(&request.start_dates)
        .bind(&request.category)
        .bind(&request.province)
        .bind(&request.district)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(tour_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sql = format!("{TOUR_SELECT} WHERE t.id = $1");
        let tour = sqlx::query_as::<_, TourDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(tour)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(TOUR_SELECT);
        query.push(" WHERE 1=1");
        push_tour_filters(&mut query, filter);
        query.push(" ORDER BY t.created_at DESC, t.id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let tours = query.build_query_as::<TourDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(tours)
    }

    /// Deletes the tour along with its reviews. Bookings are never cascaded: a tour that has
    /// any fails with a foreign key violation. Call inside a transaction.
    #[instrument(skip(self), fields(tour_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        sqlx::query("DELETE FROM tour_reviews WHERE tour_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        let result = sqlx::query("DELETE FROM tours WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(tour_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let updated: Option<TourId> = sqlx::query_scalar(
            r#"
            UPDATE tours SET
                location_id = COALESCE($2, location_id),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                duration_days = COALESCE($6, duration_days),
                images = COALESCE($7, images),
                itinerary = COALESCE($8, itinerary),
                includes = COALESCE($9, includes),
                excludes = COALESCE($10, excludes),
                start_dates = COALESCE($11, start_dates),
                category = COALESCE($12, category),
                province = COALESCE($13, province),
                district = COALESCE($14, district),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(request.location_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.duration_days)
        .bind(&request.images)
        .bind(&request.itinerary)
        .bind(&request.includes)
        .bind(&request.excludes)
        .bind(&request.start_dates)
        .bind(&request.category)
        .bind(&request.province)
        .bind(&request.district)
        .fetch_optional(&mut *self.db)
        .await?;

        let id = updated.ok_or(DbError::NotFound)?;
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> Tours<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &TourFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM tours t WHERE 1=1");
        push_tour_filters(&mut query, filter);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    /// The agency that owns a tour, if the tour exists
    #[instrument(skip(self), fields(tour_id = %abbrev_uuid(&id)), err)]
    pub async fn owner_of(&mut self, id: TourId) -> Result<Option<AgencyId>> {
        let owner = sqlx::query_scalar("SELECT agency_id FROM tours WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(owner)
    }

    #[instrument(skip(self), fields(tour_id = %abbrev_uuid(&id)), err)]
    pub async fn has_bookings(&mut self, id: TourId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tour_bookings WHERE tour_id = $1)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }
}
