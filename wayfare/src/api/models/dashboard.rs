//! Admin dashboard response models.

use crate::db::models::dashboard::{Activity, ActivityKind, CategoryCount, LocationEngagement, MonthlyValue, PlatformStats};
use crate::types::LocationId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

const MONTH_NAMES: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub total_users: i64,
    pub total_tours: i64,
    pub total_bookings: i64,
    pub total_locations: i64,
    pub total_blogs: i64,
    /// Sum of `total_price` over every booking that is not cancelled
    #[schema(value_type = String)]
    pub total_revenue: Decimal,
    pub pending_bookings: i64,
    pub confirmed_bookings: i64,
    /// Verified agencies
    pub active_agencies: i64,
}

impl From<PlatformStats> for StatsResponse {
    fn from(db: PlatformStats) -> Self {
        Self {
            total_users: db.total_users,
            total_tours: db.total_tours,
            total_bookings: db.total_bookings,
            total_locations: db.total_locations,
            total_blogs: db.total_blogs,
            total_revenue: db.total_revenue,
            pending_bookings: db.pending_bookings,
            confirmed_bookings: db.confirmed_bookings,
            active_agencies: db.active_agencies,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlyPoint {
    /// 1 to 12
    pub month: u32,
    pub month_name: String,
    /// A count, or revenue for the revenue series; serialized as a string
    #[schema(value_type = String)]
    pub value: Decimal,
}

/// Expand the months that had data into a full January to December series.
pub fn fill_months(values: &[MonthlyValue]) -> Vec<MonthlyPoint> {
    MONTH_NAMES
        .iter()
        .zip(1u32..)
        .map(|(name, month)| MonthlyPoint {
            month,
            month_name: name.to_string(),
            value: values
                .iter()
                .find(|v| v.month == month as i32)
                .map_or(Decimal::ZERO, |v| v.value),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCountResponse {
    pub category: String,
    pub count: i64,
}

impl From<CategoryCount> for CategoryCountResponse {
    fn from(db: CategoryCount) -> Self {
        Self {
            category: db.category,
            count: db.count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopLocationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub location_id: LocationId,
    pub name: String,
    pub province: String,
    pub category: String,
    pub favorites: i64,
    pub trips: i64,
    pub tours: i64,
    pub total_engagement: i64,
}

impl From<LocationEngagement> for TopLocationResponse {
    fn from(db: LocationEngagement) -> Self {
        Self {
            location_id: db.location_id,
            name: db.name,
            province: db.province,
            category: db.category,
            favorites: db.favorites,
            trips: db.trips,
            tours: db.tours,
            total_engagement: db.total_engagement,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityResponse {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Activity> for ActivityResponse {
    fn from(db: Activity) -> Self {
        Self {
            kind: db.kind,
            title: db.title,
            description: db.description,
            timestamp: db.timestamp,
        }
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthlyQuery {
    /// Defaults to the current year
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub year: Option<i32>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

impl LimitQuery {
    pub fn limit_or(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_months() {
        let values = vec![
            MonthlyValue {
                month: 2,
                value: Decimal::new(1250, 2),
            },
            MonthlyValue {
                month: 12,
                value: Decimal::from(3),
            },
        ];
        let series = fill_months(&values);

        assert_eq!(series.len(), 12);
        assert_eq!(series[0].month, 1);
        assert_eq!(series[0].month_name, "Jan");
        assert_eq!(series[0].value, Decimal::ZERO);
        // Cents survive untouched
        assert_eq!(series[1].value.to_string(), "12.50");
        assert_eq!(series[11].month_name, "Dec");
        assert_eq!(series[11].value, Decimal::from(3));
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(LimitQuery::default().limit_or(10), 10);
        assert_eq!(LimitQuery { limit: Some(0) }.limit_or(10), 1);
        assert_eq!(LimitQuery { limit: Some(1000) }.limit_or(10), 100);
    }
}
