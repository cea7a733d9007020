//! Database repository for travel agencies.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::agencies::{AgencyCreateDBRequest, AgencyDBResponse, AgencyUpdateDBRequest},
};
use crate::types::{AgencyId, abbrev_uuid};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing agencies
#[derive(Debug, Clone)]
pub struct AgencyFilter {
    pub skip: i64,
    pub limit: i64,
    pub verified: Option<bool>,
}

impl AgencyFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, verified: None }
    }
}

pub struct Agencies<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Agencies<'c> {
    type CreateRequest = AgencyCreateDBRequest;
    type UpdateRequest = AgencyUpdateDBRequest;
    type Response = AgencyDBResponse;
    type Id = AgencyId;
    type Filter = AgencyFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let agency = sqlx::query_as::<_, AgencyDBResponse>(
            r#"
            INSERT INTO agencies (name, email, password_hash, description, logo, website, phone_number, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(&request.description)
        .bind(&request.logo)
        .bind(&request.website)
        .bind(&request.phone_number)
        .bind(&request.address)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(agency)
    }

    #[instrument(skip(self), fields(agency_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let agency = sqlx::query_as::<_, AgencyDBResponse>("SELECT * FROM agencies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(agency)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM agencies WHERE 1=1");
        if let Some(verified) = filter.verified {
            query.push(" AND verified = ");
            query.push_bind(verified);
        }
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let agencies = query.build_query_as::<AgencyDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(agencies)
    }

    #[instrument(skip(self), fields(agency_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM agencies WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(agency_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let agency = sqlx::query_as::<_, AgencyDBResponse>(
            r#"
            UPDATE agencies SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                logo = COALESCE($4, logo),
                website = COALESCE($5, website),
                phone_number = COALESCE($6, phone_number),
                address = COALESCE($7, address),
                verified = COALESCE($8, verified),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.logo)
        .bind(&request.website)
        .bind(&request.phone_number)
        .bind(&request.address)
        .bind(request.verified)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(agency)
    }
}

impl<'c> Agencies<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<AgencyDBResponse>> {
        let agency = sqlx::query_as::<_, AgencyDBResponse>("SELECT * FROM agencies WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(agency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn agency_request(email: &str) -> AgencyCreateDBRequest {
        AgencyCreateDBRequest {
            name: "Ceylon Trails".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            description: Some("Hill country specialists".to_string()),
            logo: None,
            website: Some("https://trails.example.com".to_string()),
            phone_number: None,
            address: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_and_verify(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Agencies::new(&mut conn);

        let agency = repo.create(&agency_request("ops@trails.example.com")).await.unwrap();
        assert!(!agency.verified);

        let verified = repo
            .update(
                agency.id,
                &AgencyUpdateDBRequest {
                    verified: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(verified.verified);
        assert_eq!(verified.website.as_deref(), Some("https://trails.example.com"));

        let mut filter = AgencyFilter::new(0, 10);
        filter.verified = Some(true);
        assert_eq!(repo.list(&filter).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_agency_email(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Agencies::new(&mut conn);

        repo.create(&agency_request("same@example.com")).await.unwrap();
        let err = repo.create(&agency_request("same@example.com")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        assert!(repo.get_by_email("SAME@example.com").await.unwrap().is_some());
    }
}
