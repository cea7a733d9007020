//! Flight and hotel search, proxied to the travel data provider.

use crate::errors::{Error, Result};
use crate::travel::{
    TravelClient,
    flights::FlightSearchQuery,
    hotels::{HotelSearchQuery, HotelSearchResponse},
};
use crate::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

fn travel_client(state: &AppState) -> Result<Arc<TravelClient>> {
    state.travel.clone().ok_or_else(|| Error::Unavailable {
        message: "Travel search is not enabled".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/travel/flights/search",
    tag = "travel",
    summary = "Search flight offers",
    params(FlightSearchQuery),
    responses(
        (status = 200, description = "Provider flight offers, unmodified", body = Object),
        (status = 400, description = "Invalid search parameters"),
        (status = 502, description = "Provider unreachable or failing"),
        (status = 503, description = "Travel search disabled"),
    )
)]
#[tracing::instrument(skip_all, fields(origin = %query.origin_location_code, destination = %query.destination_location_code))]
pub async fn search_flights(State(state): State<AppState>, Query(query): Query<FlightSearchQuery>) -> Result<Json<serde_json::Value>> {
    let client = travel_client(&state)?;
    Ok(Json(client.search_flights(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/travel/hotels/search",
    tag = "travel",
    summary = "Search hotels near a point",
    params(HotelSearchQuery),
    responses(
        (status = 200, description = "Hotels within the radius", body = HotelSearchResponse),
        (status = 400, description = "Invalid search parameters"),
        (status = 502, description = "Provider unreachable or failing"),
        (status = 503, description = "Travel search disabled"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search_hotels(State(state): State<AppState>, Query(query): Query<HotelSearchQuery>) -> Result<Json<HotelSearchResponse>> {
    let client = travel_client(&state)?;
    Ok(Json(client.search_hotels(&query).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_app_with_state, create_test_state};
    use crate::travel::tests::{client_for, mount_token};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn app_with_provider(pool: PgPool, provider: &MockServer) -> axum_test::TestServer {
        let mut state = create_test_state(pool);
        state.travel = Some(Arc::new(client_for(provider)));
        create_test_app_with_state(state)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_disabled_returns_503(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .get("/api/v1/travel/hotels/search")
            .add_query_param("latitude", "6.9")
            .add_query_param("longitude", "79.8")
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text(), "Travel search is not enabled");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_flight_search_proxied(pool: PgPool) {
        let provider = MockServer::start().await;
        mount_token(&provider, 1).await;
        Mock::given(method("GET"))
            .and(path("/v2/shopping/flight-offers"))
            .and(header("authorization", "Bearer provider-token"))
            .and(query_param("originLocationCode", "CMB"))
            .and(query_param("adults", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"meta": {"count": 1}, "data": [{"id": "1"}]})))
            .expect(1)
            .mount(&provider)
            .await;
        let server = app_with_provider(pool, &provider).await;

        let body: serde_json::Value = server
            .get("/api/v1/travel/flights/search")
            .add_query_param("originLocationCode", "cmb")
            .add_query_param("destinationLocationCode", "DXB")
            .add_query_param("departureDate", "2026-12-01")
            .add_query_param("adults", 2)
            .await
            .json();
        assert_eq!(body["meta"]["count"], 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_hotel_search_and_upstream_errors(pool: PgPool) {
        let provider = MockServer::start().await;
        mount_token(&provider, 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/reference-data/locations/hotels/by-geocode"))
            .and(query_param("amenities", "SWIMMING_POOL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"name": "Galle Face"}, {"name": "Cinnamon"}]})))
            .mount(&provider)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/reference-data/locations/hotels/by-geocode"))
            .and(query_param("amenities", "SPA"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"errors": [{"title": "INVALID FORMAT", "code": 477, "detail": "amenities"}]})))
            .mount(&provider)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/reference-data/locations/hotels/by-geocode"))
            .and(query_param("amenities", "WIFI"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&provider)
            .await;
        let server = app_with_provider(pool, &provider).await;

        let search = |amenities: &'static str| {
            server
                .get("/api/v1/travel/hotels/search")
                .add_query_param("latitude", "6.93")
                .add_query_param("longitude", "79.85")
                .add_query_param("amenities", amenities)
        };

        let hotels: HotelSearchResponse = search("pool").await.json();
        assert_eq!(hotels.count, 2);

        search("spa").await.assert_status(StatusCode::BAD_REQUEST);
        search("wifi").await.assert_status(StatusCode::BAD_GATEWAY);

        server
            .get("/api/v1/travel/hotels/search")
            .add_query_param("latitude", "123")
            .add_query_param("longitude", "79.85")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
