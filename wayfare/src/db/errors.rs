//! Errors raised by the repositories.
//!
//! Constraint failures are kept apart from everything else because most of them are caused by
//! the client: an email that is already registered, a second review of the same tour, a trip
//! whose end precedes its start, a booking for a tour that no longer exists. The API layer turns
//! them into 4xx responses (see [`crate::errors::Error`]). Anything else is opaque and ends up as
//! a 500.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// No row with the requested id. Handlers attach the resource name.
    #[error("Entity not found")]
    NotFound,

    /// A UNIQUE or primary key constraint rejected the write, e.g. `users_email_unique` or a
    /// second vote row for the same (user, target)
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// The write referenced a row that does not exist
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// A CHECK constraint rejected the row, e.g. `trips_date_order`
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let db_err = match &err {
            sqlx::Error::RowNotFound => return DbError::NotFound,
            sqlx::Error::Database(db_err) => db_err,
            _ => return DbError::Other(err.into()),
        };

        let constraint = db_err.constraint().map(str::to_string);
        let table = db_err.table().map(str::to_string);
        let message = db_err.message().to_string();

        if db_err.is_unique_violation() {
            DbError::UniqueViolation { constraint, table, message }
        } else if db_err.is_foreign_key_violation() {
            DbError::ForeignKeyViolation { constraint, table, message }
        } else if db_err.is_check_violation() {
            DbError::CheckViolation { constraint, table, message }
        } else {
            DbError::Other(err.into())
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_booking_for_missing_tour_is_foreign_key_violation(pool: PgPool) {
        let user = crate::test_utils::create_test_user(&pool).await;

        let err: DbError = sqlx::query(
            "INSERT INTO tour_bookings (tour_id, user_id, booking_date, participants, total_price) \
             VALUES (gen_random_uuid(), $1, CURRENT_DATE, 1, 10)",
        )
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap_err()
        .into();

        match err {
            DbError::ForeignKeyViolation { table, .. } => assert_eq!(table.as_deref(), Some("tour_bookings")),
            other => panic!("expected foreign key violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    async fn test_missing_row_and_syntax_errors(pool: PgPool) {
        let missing: DbError = sqlx::query("SELECT 1 WHERE false").fetch_one(&pool).await.unwrap_err().into();
        assert!(matches!(missing, DbError::NotFound));

        let broken: DbError = sqlx::query("SELEC 1").execute(&pool).await.unwrap_err().into();
        assert!(matches!(broken, DbError::Other(_)));
    }
}
