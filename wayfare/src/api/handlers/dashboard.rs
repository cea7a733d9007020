//! Admin dashboard. Read-only aggregates over the whole platform.

use crate::api::models::{
    dashboard::{
        ActivityResponse, CategoryCountResponse, LimitQuery, MonthlyPoint, MonthlyQuery, StatsResponse, TopLocationResponse, fill_months,
    },
    users::CurrentUser,
};
use crate::auth::permissions;
use crate::db::handlers::{Dashboard, dashboard::MonthlySeries};
use crate::errors::{Error, Result};
use crate::types::Operation;
use crate::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, Utc};

async fn monthly_series(state: &AppState, user: &CurrentUser, series: MonthlySeries, query: MonthlyQuery) -> Result<Vec<MonthlyPoint>> {
    permissions::require_admin(user, Operation::Read, "dashboard")?;
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let values = Dashboard::new(&mut conn).monthly(series, year).await?;

    Ok(fill_months(&values))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "dashboard",
    summary = "Platform totals",
    responses(
        (status = 200, description = "Platform-wide counts and revenue", body = StatsResponse),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn stats(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<StatsResponse>> {
    permissions::require_admin(&current_user, Operation::Read, "dashboard")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stats = Dashboard::new(&mut conn).stats().await?;

    Ok(Json(StatsResponse::from(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/monthly/users",
    tag = "dashboard",
    summary = "Monthly registrations",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Twelve months of new users", body = Vec<MonthlyPoint>),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn monthly_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<MonthlyPoint>>> {
    Ok(Json(monthly_series(&state, &current_user, MonthlySeries::Users, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/monthly/tours",
    tag = "dashboard",
    summary = "Monthly new tours",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Twelve months of new tours", body = Vec<MonthlyPoint>),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn monthly_tours(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<MonthlyPoint>>> {
    Ok(Json(monthly_series(&state, &current_user, MonthlySeries::Tours, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/monthly/bookings",
    tag = "dashboard",
    summary = "Monthly bookings",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Twelve months of bookings made", body = Vec<MonthlyPoint>),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn monthly_bookings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<MonthlyPoint>>> {
    Ok(Json(monthly_series(&state, &current_user, MonthlySeries::Bookings, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/monthly/revenue",
    tag = "dashboard",
    summary = "Monthly revenue",
    description = "Total price of confirmed and completed bookings, by the month they were made.",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Twelve months of revenue", body = Vec<MonthlyPoint>),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn monthly_revenue(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<MonthlyPoint>>> {
    Ok(Json(monthly_series(&state, &current_user, MonthlySeries::Revenue, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/locations/by-category",
    tag = "dashboard",
    summary = "Locations per category",
    responses(
        (status = 200, description = "Location counts, largest category first", body = Vec<CategoryCountResponse>),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn locations_by_category(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<CategoryCountResponse>>> {
    permissions::require_admin(&current_user, Operation::Read, "dashboard")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let counts = Dashboard::new(&mut conn).locations_by_category().await?;

    Ok(Json(counts.into_iter().map(CategoryCountResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/top-locations",
    tag = "dashboard",
    summary = "Most engaged locations",
    params(LimitQuery),
    responses(
        (status = 200, description = "Locations ranked by favourites, then total engagement", body = Vec<TopLocationResponse>),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn top_locations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<TopLocationResponse>>> {
    permissions::require_admin(&current_user, Operation::Read, "dashboard")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let locations = Dashboard::new(&mut conn).top_locations(query.limit_or(10)).await?;

    Ok(Json(locations.into_iter().map(TopLocationResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/recent-activities",
    tag = "dashboard",
    summary = "Recent activity feed",
    params(LimitQuery),
    responses(
        (status = 200, description = "Newest registrations, bookings, blog posts and tours", body = Vec<ActivityResponse>),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn recent_activities(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ActivityResponse>>> {
    permissions::require_admin(&current_user, Operation::Read, "dashboard")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let activities = Dashboard::new(&mut conn).recent_activities(query.limit_or(20)).await?;

    Ok(Json(activities.into_iter().map(ActivityResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_admin_user, create_test_agency, create_test_app, create_test_location, create_test_tour, create_test_user, user_token};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;

        for path in [
            "/api/v1/dashboard/stats",
            "/api/v1/dashboard/monthly/revenue",
            "/api/v1/dashboard/locations/by-category",
            "/api/v1/dashboard/top-locations",
            "/api/v1/dashboard/recent-activities",
        ] {
            server.get(path).authorization_bearer(user_token(&user)).await.assert_status(StatusCode::FORBIDDEN);
            server.get(path).await.assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_stats_and_revenue(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let agency = create_test_agency(&pool).await;
        let tour = create_test_tour(&pool, agency.id, 10).await;
        let booker = create_test_user(&pool).await;

        server
            .post("/api/v1/bookings")
            .authorization_bearer(user_token(&booker))
            .json(&json!({"tour_id": tour.id, "booking_date": "2026-06-01", "participants": 2}))
            .await
            .assert_status(StatusCode::CREATED);

        let stats: StatsResponse = server.get("/api/v1/dashboard/stats").authorization_bearer(user_token(&admin)).await.json();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_tours, 1);
        assert_eq!(stats.total_bookings, 1);
        assert_eq!(stats.pending_bookings, 1);
        assert_eq!(stats.total_revenue, tour.price * rust_decimal::Decimal::from(2));

        // Pending bookings do not count as monthly revenue
        let revenue: Vec<MonthlyPoint> = server
            .get("/api/v1/dashboard/monthly/revenue")
            .authorization_bearer(user_token(&admin))
            .await
            .json();
        assert_eq!(revenue.len(), 12);
        assert!(revenue.iter().all(|p| p.value.is_zero()));

        let bookings: Vec<MonthlyPoint> = server
            .get("/api/v1/dashboard/monthly/bookings")
            .authorization_bearer(user_token(&admin))
            .await
            .json();
        let this_month = Utc::now().month();
        assert_eq!(bookings[this_month as usize - 1].value, rust_decimal::Decimal::ONE);
        assert_eq!(bookings[0].month_name, "Jan");

        let last_year: Vec<MonthlyPoint> = server
            .get("/api/v1/dashboard/monthly/bookings")
            .add_query_param("year", Utc::now().year() - 1)
            .authorization_bearer(user_token(&admin))
            .await
            .json();
        assert!(last_year.iter().all(|p| p.value.is_zero()));

        sqlx::query("UPDATE tour_bookings SET status = 'CONFIRMED'").execute(&pool).await.unwrap();
        let response = server
            .get("/api/v1/dashboard/monthly/revenue")
            .authorization_bearer(user_token(&admin))
            .await;
        let raw: serde_json::Value = response.json();
        assert_eq!(raw[this_month as usize - 1]["value"], "300.00");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_location_rankings(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let fan = create_test_user(&pool).await;
        let quiet = create_test_location(&pool, "Quiet Cove", "Eastern").await;
        let popular = create_test_location(&pool, "Busy Beach", "Southern").await;

        server
            .post(&format!("/api/v1/favorites/locations/{}", popular.id))
            .authorization_bearer(user_token(&fan))
            .await
            .assert_status(StatusCode::CREATED);

        let top: Vec<TopLocationResponse> = server
            .get("/api/v1/dashboard/top-locations")
            .add_query_param("limit", 1)
            .authorization_bearer(user_token(&admin))
            .await
            .json();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].location_id, popular.id);
        assert_eq!(top[0].favorites, 1);
        assert_ne!(top[0].location_id, quiet.id);

        let categories: Vec<CategoryCountResponse> = server
            .get("/api/v1/dashboard/locations/by-category")
            .authorization_bearer(user_token(&admin))
            .await
            .json();
        assert_eq!(categories.iter().map(|c| c.count).sum::<i64>(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_recent_activities_newest_first(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let agency = create_test_agency(&pool).await;
        create_test_tour(&pool, agency.id, 5).await;

        let feed: Vec<serde_json::Value> = server
            .get("/api/v1/dashboard/recent-activities")
            .add_query_param("limit", 2)
            .authorization_bearer(user_token(&admin))
            .await
            .json();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0]["type"], "tour_creation");
        assert_eq!(feed[1]["type"], "user_registration");
    }
}
