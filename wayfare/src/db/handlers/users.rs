//! Database repository for users.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::{UserId, abbrev_uuid};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>, // Case-insensitive substring search on email and name
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, search: None }
    }

    pub fn with_search(mut self, search: String) -> Self {
        self.search = Some(search);
        self
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

fn push_user_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &UserFilter) {
    if let Some(ref search) = filter.search {
        let search_pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(email) LIKE ");
        query.push_bind(search_pattern.clone());
        query.push(" OR LOWER(name) LIKE ");
        query.push_bind(search_pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (email, name, password_hash, image, auth_source, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.email)
        .bind(&request.name)
        .bind(&request.password_hash)
        .bind(&request.image)
        .bind(&request.auth_source)
        .bind(request.is_admin)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM users WHERE 1=1");
        push_user_filters(&mut query, filter);

        query.push(" ORDER BY created_at DESC, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let users = query.build_query_as::<UserDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                image = COALESCE($3, image),
                password_hash = COALESCE($4, password_hash),
                is_admin = COALESCE($5, is_admin),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.image)
        .bind(&request.password_hash)
        .bind(request.is_admin)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &UserFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        push_user_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    /// Find the user behind a Google login, creating one on first sight.
    ///
    /// An existing native account with the same email is reused rather than duplicated.
    #[instrument(skip(self, email, name, image), err)]
    pub async fn find_or_create_oauth_user(&mut self, email: &str, name: &str, image: Option<&str>) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (email, name, image, auth_source)
            VALUES ($1, $2, $3, 'google')
            ON CONFLICT ON CONSTRAINT users_email_unique
            DO UPDATE SET image = COALESCE(users.image, EXCLUDED.image), updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(image)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    /// Set a user's password hash, marking them an admin. Used by startup bootstrap.
    #[instrument(skip(self, password_hash), err)]
    pub async fn promote_to_admin(&mut self, id: UserId, password_hash: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET is_admin = true, password_hash = COALESCE($2, password_hash), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn user_request(email: &str, name: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            name: name.to_string(),
            password_hash: Some("hash".to_string()),
            image: None,
            auth_source: "native".to_string(),
            is_admin: false,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&user_request("ana@example.com", "Ana")).await.unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.auth_source, "native");
        assert!(!user.is_admin);

        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Ana");

        let by_email = repo.get_user_by_email("ANA@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_email_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&user_request("dup@example.com", "One")).await.unwrap();
        let err = repo.create(&user_request("dup@example.com", "Two")).await.unwrap_err();

        match err {
            DbError::UniqueViolation { constraint, table, .. } => {
                assert_eq!(constraint.as_deref(), Some("users_email_unique"));
                assert_eq!(table.as_deref(), Some("users"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_with_search_and_count(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&user_request("kasun@example.com", "Kasun")).await.unwrap();
        repo.create(&user_request("nimal@example.com", "Nimal")).await.unwrap();
        repo.create(&user_request("saman@test.org", "Saman")).await.unwrap();

        let filter = UserFilter::new(0, 10).with_search("EXAMPLE".to_string());
        let users = repo.list(&filter).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        let page = repo.list(&UserFilter::new(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(repo.count(&UserFilter::new(0, 10)).await.unwrap(), 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_keeps_unset_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&user_request("u@example.com", "Before")).await.unwrap();
        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    name: Some("After".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "After");
        assert_eq!(updated.password_hash, Some("hash".to_string()));
        assert!(updated.updated_at >= user.updated_at);

        let missing = repo.update(uuid::Uuid::new_v4(), &UserUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_or_create_oauth_user_reuses_account(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let native = repo.create(&user_request("g@example.com", "Native")).await.unwrap();
        let oauth = repo
            .find_or_create_oauth_user("g@example.com", "Google Name", Some("https://img"))
            .await
            .unwrap();

        assert_eq!(oauth.id, native.id);
        assert_eq!(oauth.image.as_deref(), Some("https://img"));
        assert_eq!(oauth.auth_source, "native");

        let fresh = repo.find_or_create_oauth_user("new@example.com", "New", None).await.unwrap();
        assert_eq!(fresh.auth_source, "google");
        assert!(fresh.password_hash.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&user_request("bye@example.com", "Bye")).await.unwrap();
        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }
}
