//! Read-only aggregate queries backing the admin dashboard.

use crate::db::{
    errors::Result,
    models::dashboard::{Activity, ActivityKind, CategoryCount, LocationEngagement, MonthlyValue, PlatformStats},
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

/// The per-month series the dashboard charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthlySeries {
    Users,
    Tours,
    Bookings,
    /// Sum of total_price over confirmed and completed bookings
    Revenue,
}

impl MonthlySeries {
    fn query(self) -> &'static str {
        match self {
            MonthlySeries::Users => {
                r#"
                SELECT EXTRACT(MONTH FROM created_at)::INT AS month, COUNT(*)::NUMERIC AS value
                FROM users WHERE EXTRACT(YEAR FROM created_at)::INT = $1
                GROUP BY 1 ORDER BY 1
                "#
            }
            MonthlySeries::Tours => {
                r#"
                SELECT EXTRACT(MONTH FROM created_at)::INT AS month, COUNT(*)::NUMERIC AS value
                FROM tours WHERE EXTRACT(YEAR FROM created_at)::INT = $1
                GROUP BY 1 ORDER BY 1
                "#
            }
            MonthlySeries::Bookings => {
                r#"
                SELECT EXTRACT(MONTH FROM created_at)::INT AS month, COUNT(*)::NUMERIC AS value
                FROM tour_bookings WHERE EXTRACT(YEAR FROM created_at)::INT = $1
                GROUP BY 1 ORDER BY 1
                "#
            }
            MonthlySeries::Revenue => {
                r#"
                SELECT EXTRACT(MONTH FROM created_at)::INT AS month, COALESCE(SUM(total_price), 0)::NUMERIC AS value
                FROM tour_bookings
                WHERE EXTRACT(YEAR FROM created_at)::INT = $1 AND status IN ('CONFIRMED', 'COMPLETED')
                GROUP BY 1 ORDER BY 1
                "#
            }
        }
    }
}

pub struct Dashboard<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Dashboard<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn stats(&mut self) -> Result<PlatformStats> {
        let stats = sqlx::query_as::<_, PlatformStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM tours) AS total_tours,
                (SELECT COUNT(*) FROM tour_bookings) AS total_bookings,
                (SELECT COUNT(*) FROM locations) AS total_locations,
                (SELECT COUNT(*) FROM blogs) AS total_blogs,
                (SELECT COALESCE(SUM(total_price), 0) FROM tour_bookings WHERE status <> 'CANCELLED') AS total_revenue,
                (SELECT COUNT(*) FROM tour_bookings WHERE status = 'PENDING') AS pending_bookings,
                (SELECT COUNT(*) FROM tour_bookings WHERE status = 'CONFIRMED') AS confirmed_bookings,
                (SELECT COUNT(*) FROM agencies WHERE verified) AS active_agencies
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;
        Ok(stats)
    }

    /// Values for the months of `year` that have any rows, in month order
    #[instrument(skip(self), err)]
    pub async fn monthly(&mut self, series: MonthlySeries, year: i32) -> Result<Vec<MonthlyValue>> {
        let values = sqlx::query_as::<_, MonthlyValue>(series.query())
            .bind(year)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(values)
    }

    #[instrument(skip(self), err)]
    pub async fn locations_by_category(&mut self) -> Result<Vec<CategoryCount>> {
        let counts = sqlx::query_as::<_, CategoryCount>(
            "SELECT category, COUNT(*) AS count FROM locations GROUP BY category ORDER BY count DESC, category",
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(counts)
    }

    /// Locations ranked by favourites, then by overall engagement
    #[instrument(skip(self), err)]
    pub async fn top_locations(&mut self, limit: i64) -> Result<Vec<LocationEngagement>> {
        let locations = sqlx::query_as::<_, LocationEngagement>(
            r#"
            WITH engagement AS (
                SELECT
                    l.id AS location_id, l.name, l.province, l.category,
                    (SELECT COUNT(*) FROM favorite_locations f WHERE f.location_id = l.id) AS favorites,
                    (SELECT COUNT(*) FROM trips t WHERE t.location_id = l.id) AS trips,
                    (SELECT COUNT(*) FROM tours t WHERE t.location_id = l.id) AS tours
                FROM locations l
            )
            SELECT *, favorites + trips + tours AS total_engagement
            FROM engagement
            ORDER BY favorites DESC, total_engagement DESC, name
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(locations)
    }

    /// The newest `limit` events across registrations, bookings, blog posts and new tours
    #[instrument(skip(self), err)]
    pub async fn recent_activities(&mut self, limit: i64) -> Result<Vec<Activity>> {
        let mut activities = Vec::new();

        let users: Vec<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT name, created_at FROM users ORDER BY created_at DESC LIMIT $1")
                .bind(limit)
                .fetch_all(&mut *self.db)
                .await?;
        activities.extend(users.into_iter().map(|(name, timestamp)| Activity {
            kind: ActivityKind::UserRegistration,
            title: "New user registered".to_string(),
            description: format!("{name} joined the platform"),
            timestamp,
        }));

        let bookings: Vec<(String, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT u.name, t.title, b.created_at
            FROM tour_bookings b
            JOIN users u ON u.id = b.user_id
            JOIN tours t ON t.id = b.tour_id
            ORDER BY b.created_at DESC LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;
        activities.extend(bookings.into_iter().map(|(user, tour, timestamp)| Activity {
            kind: ActivityKind::TourBooking,
            title: "New tour booking".to_string(),
            description: format!("{user} booked {tour}"),
            timestamp,
        }));

        let blogs: Vec<(String, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT u.name, b.title, b.created_at
            FROM blogs b
            JOIN users u ON u.id = b.author_id
            ORDER BY b.created_at DESC LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;
        activities.extend(blogs.into_iter().map(|(author, title, timestamp)| Activity {
            kind: ActivityKind::BlogPost,
            title: "New blog post".to_string(),
            description: format!("{author} published \"{title}\""),
            timestamp,
        }));

        let tours: Vec<(String, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT a.name, t.title, t.created_at
            FROM tours t
            JOIN agencies a ON a.id = t.agency_id
            ORDER BY t.created_at DESC LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;
        activities.extend(tours.into_iter().map(|(agency, title, timestamp)| Activity {
            kind: ActivityKind::TourCreation,
            title: "New tour created".to_string(),
            description: format!("{agency} created \"{title}\""),
            timestamp,
        }));

        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(activities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Bookings;
    use crate::db::models::bookings::BookingCreateDBRequest;
    use crate::test_utils::{create_test_agency, create_test_location, create_test_tour, create_test_user};
    use chrono::{Datelike, NaiveDate};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_stats_revenue_skips_cancelled(pool: PgPool) {
        let agency = create_test_agency(&pool).await;
        let tour = create_test_tour(&pool, agency.id, 20).await;
        let user = create_test_user(&pool).await;

        let mut tx = pool.begin().await.unwrap();
        for participants in [2, 3] {
            Bookings::new(&mut tx)
                .create(&BookingCreateDBRequest {
                    tour_id: tour.id,
                    user_id: user.id,
                    booking_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                    participants,
                    notes: None,
                })
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();
        sqlx::query("UPDATE tour_bookings SET status = 'CANCELLED' WHERE participants = 3")
            .execute(&pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let stats = Dashboard::new(&mut conn).stats().await.unwrap();
        assert_eq!(stats.total_bookings, 2);
        assert_eq!(stats.pending_bookings, 1);
        assert_eq!(stats.total_revenue, tour.price * Decimal::from(2));
        assert_eq!(stats.total_tours, 1);
        assert_eq!(stats.active_agencies, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_monthly_users_this_year(pool: PgPool) {
        create_test_user(&pool).await;
        create_test_user(&pool).await;

        let now = Utc::now();
        let mut conn = pool.acquire().await.unwrap();
        let values = Dashboard::new(&mut conn)
            .monthly(MonthlySeries::Users, now.year())
            .await
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].month, now.month() as i32);
        assert_eq!(values[0].value, Decimal::from(2));

        let last_year = Dashboard::new(&mut conn)
            .monthly(MonthlySeries::Revenue, now.year() - 1)
            .await
            .unwrap();
        assert!(last_year.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_top_locations_order(pool: PgPool) {
        let quiet = create_test_location(&pool, "Quiet Bay", "Eastern").await;
        let popular = create_test_location(&pool, "Popular Peak", "Central").await;
        for _ in 0..2 {
            let user = create_test_user(&pool).await;
            sqlx::query("INSERT INTO favorite_locations (user_id, location_id) VALUES ($1, $2)")
                .bind(user.id)
                .bind(popular.id)
                .execute(&pool)
                .await
                .unwrap();
        }

        let mut conn = pool.acquire().await.unwrap();
        let top = Dashboard::new(&mut conn).top_locations(10).await.unwrap();
        assert_eq!(top[0].location_id, popular.id);
        assert_eq!(top[0].favorites, 2);
        assert_eq!(top[0].total_engagement, 2);
        assert_eq!(top[1].location_id, quiet.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_recent_activities_merge_and_truncate(pool: PgPool) {
        let agency = create_test_agency(&pool).await;
        create_test_user(&pool).await;
        create_test_tour(&pool, agency.id, 5).await;

        let mut conn = pool.acquire().await.unwrap();
        let feed = Dashboard::new(&mut conn).recent_activities(20).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].kind, ActivityKind::TourCreation);
        assert!(feed[0].timestamp >= feed[1].timestamp);

        let one = Dashboard::new(&mut conn).recent_activities(1).await.unwrap();
        assert_eq!(one.len(), 1);
    }
}
