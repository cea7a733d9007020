//! Database repository for events, their location links, and saved events.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::events::{
        EventCreateDBRequest, EventDBResponse, EventLocationDBResponse, EventLocationLink, EventRecord, EventUpdateDBRequest, SaveStatus,
    },
};
use crate::types::{EventId, LocationId, UserId, abbrev_uuid};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::{PgConnection, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing events
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub category: Option<String>,
    /// Events with at least one linked location in this province
    pub province: Option<String>,
    pub location_id: Option<LocationId>,
    /// Events overlapping this calendar month, as `(year, month)`
    pub month: Option<(i32, u32)>,
}

impl EventFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

/// Half-open UTC range covering one calendar month
pub(crate) fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((
        Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0)?),
        Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?),
    ))
}

fn push_event_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &EventFilter) {
    if let Some(ref search) = filter.search {
        query.push(" AND LOWER(e.name) LIKE ");
        query.push_bind(format!("%{}%", search.to_lowercase()));
    }
    if let Some(ref category) = filter.category {
        query.push(" AND e.category = ");
        query.push_bind(category.clone());
    }
    if let Some(ref province) = filter.province {
        query.push(" AND EXISTS (SELECT 1 FROM event_locations el JOIN locations l ON l.id = el.location_id WHERE el.event_id = e.id AND l.province = ");
        query.push_bind(province.clone());
        query.push(")");
    }
    if let Some(location_id) = filter.location_id {
        query.push(" AND EXISTS (SELECT 1 FROM event_locations el WHERE el.event_id = e.id AND el.location_id = ");
        query.push_bind(location_id);
        query.push(")");
    }
    if let Some((start, end)) = filter.month.and_then(|(y, m)| month_bounds(y, m)) {
        query.push(" AND e.start_date < ");
        query.push_bind(end);
        query.push(" AND e.end_date >= ");
        query.push_bind(start);
    }
}

pub struct Events<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Events<'c> {
    type CreateRequest = EventCreateDBRequest;
    type UpdateRequest = EventUpdateDBRequest;
    type Response = EventDBResponse;
    type Id = EventId;
    type Filter = EventFilter;

    /// Should be called inside a transaction so the event and its links land together.
    #[instrument(skip(self, request), fields(name = %request.name, locations = request.locations.len()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let event = sqlx::query_as::<_, EventRecord>(
            r#"
            INSERT INTO events (name, description, category, image, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.image)
        .bind(request.start_date)
        .bind(request.end_date)
        .fetch_one(&mut *self.db)
        .await?;

        self.insert_links(event.id, &request.locations).await?;
        let locations = self.locations_for(&[event.id]).await?.remove(&event.id).unwrap_or_default();

        Ok(EventDBResponse { event, locations })
    }

    #[instrument(skip(self), fields(event_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let Some(event) = sqlx::query_as::<_, EventRecord>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
        else {
            return Ok(None);
        };

        let locations = self.locations_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(Some(EventDBResponse { event, locations }))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT e.* FROM events e WHERE 1=1");
        push_event_filters(&mut query, filter);
        query.push(" ORDER BY e.start_date ASC, e.id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let events = query.build_query_as::<EventRecord>().fetch_all(&mut *self.db).await?;
        let ids: Vec<EventId> = events.iter().map(|e| e.id).collect();
        let mut locations = self.locations_for(&ids).await?;

        Ok(events
            .into_iter()
            .map(|event| EventDBResponse {
                locations: locations.remove(&event.id).unwrap_or_default(),
                event,
            })
            .collect())
    }

    #[instrument(skip(self), fields(event_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Should be called inside a transaction when `locations` is set.
    #[instrument(skip(self, request), fields(event_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let event = sqlx::query_as::<_, EventRecord>(
            r#"
            UPDATE events SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                image = COALESCE($5, image),
                start_date = COALESCE($6, start_date),
                end_date = COALESCE($7, end_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.image)
        .bind(request.start_date)
        .bind(request.end_date)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        if let Some(ref links) = request.locations {
            sqlx::query("DELETE FROM event_locations WHERE event_id = $1")
                .bind(id)
                .execute(&mut *self.db)
                .await?;
            self.insert_links(id, links).await?;
        }

        let locations = self.locations_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(EventDBResponse { event, locations })
    }
}

impl<'c> Events<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &EventFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM events e WHERE 1=1");
        push_event_filters(&mut query, filter);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    async fn insert_links(&mut self, event_id: EventId, links: &[EventLocationLink]) -> Result<()> {
        for link in links {
            sqlx::query(
                r#"
                INSERT INTO event_locations (event_id, location_id, start_date, end_date, description)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (event_id, location_id) DO UPDATE
                SET start_date = EXCLUDED.start_date, end_date = EXCLUDED.end_date, description = EXCLUDED.description
                "#,
            )
            .bind(event_id)
            .bind(link.location_id)
            .bind(link.start_date)
            .bind(link.end_date)
            .bind(&link.description)
            .execute(&mut *self.db)
            .await?;
        }
        Ok(())
    }

    // Bulk fetch to avoid N+1 queries when listing
    async fn locations_for(&mut self, event_ids: &[EventId]) -> Result<HashMap<EventId, Vec<EventLocationDBResponse>>> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, EventLocationDBResponse>(
            r#"
            SELECT el.event_id, el.location_id, l.name, l.province, l.category, el.start_date, el.end_date, el.description
            FROM event_locations el
            JOIN locations l ON l.id = el.location_id
            WHERE el.event_id = ANY($1)
            ORDER BY l.name
            "#,
        )
        .bind(event_ids)
        .fetch_all(&mut *self.db)
        .await?;

        let mut result: HashMap<EventId, Vec<EventLocationDBResponse>> = HashMap::new();
        for row in rows {
            result.entry(row.event_id).or_default().push(row);
        }
        Ok(result)
    }

    #[instrument(skip(self), fields(event_id = %abbrev_uuid(&id)), err)]
    pub async fn exists(&mut self, id: EventId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }

    /// Save an event for a user. `NotFound` if the event does not exist, unique violation if
    /// already saved.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), event_id = %abbrev_uuid(&event_id)), err)]
    pub async fn save(&mut self, user_id: UserId, event_id: EventId) -> Result<()> {
        if !self.exists(event_id).await? {
            return Err(DbError::NotFound);
        }
        sqlx::query("INSERT INTO saved_events (user_id, event_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(event_id)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), event_id = %abbrev_uuid(&event_id)), err)]
    pub async fn unsave(&mut self, user_id: UserId, event_id: EventId) -> Result<()> {
        let result = sqlx::query("DELETE FROM saved_events WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }

    /// Events a user has saved, most recently saved first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_saved(&mut self, user_id: UserId) -> Result<Vec<EventDBResponse>> {
        let events = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT e.* FROM saved_events s
            JOIN events e ON e.id = s.event_id
            WHERE s.user_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        let ids: Vec<EventId> = events.iter().map(|e| e.id).collect();
        let mut locations = self.locations_for(&ids).await?;
        Ok(events
            .into_iter()
            .map(|event| EventDBResponse {
                locations: locations.remove(&event.id).unwrap_or_default(),
                event,
            })
            .collect())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), event_id = %abbrev_uuid(&event_id)), err)]
    pub async fn save_status(&mut self, user_id: UserId, event_id: EventId) -> Result<SaveStatus> {
        let status = sqlx::query_as::<_, SaveStatus>(
            r#"
            SELECT
                COALESCE(BOOL_OR(user_id = $1), false) AS is_saved,
                COUNT(*) AS count
            FROM saved_events
            WHERE event_id = $2
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(status)
    }
}
