//! Flight offer search.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::TravelClient;
use crate::errors::{Error, Result};

const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "ECONOMY",
            TravelClass::PremiumEconomy => "PREMIUM_ECONOMY",
            TravelClass::Business => "BUSINESS",
            TravelClass::First => "FIRST",
        }
    }
}

/// Query parameters for `GET /travel/flights/search`
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FlightSearchQuery {
    /// IATA code, e.g. `SGN`
    pub origin_location_code: String,
    /// IATA code, e.g. `HAN`
    pub destination_location_code: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[param(default = 1)]
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub travel_class: Option<TravelClass>,
    #[param(default = false)]
    pub non_stop: Option<bool>,
    #[param(default = "EUR")]
    pub currency_code: Option<String>,
    pub max_price: Option<u32>,
    /// Maximum number of offers to return
    #[param(default = 10)]
    pub max: Option<u32>,
}

fn iata(code: &str, field: &str) -> Result<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(Error::BadRequest {
            message: format!("{field} must be a 3-letter IATA code"),
        })
    }
}

impl FlightSearchQuery {
    /// Check the query and render it as provider parameters.
    pub fn to_params(&self) -> Result<Vec<(&'static str, String)>> {
        let origin = iata(&self.origin_location_code, "originLocationCode")?;
        let destination = iata(&self.destination_location_code, "destinationLocationCode")?;

        if let Some(return_date) = self.return_date
            && return_date < self.departure_date
        {
            return Err(Error::BadRequest {
                message: "returnDate must not be before departureDate".to_string(),
            });
        }

        let adults = self.adults.unwrap_or(1);
        if !(1..=9).contains(&adults) {
            return Err(Error::BadRequest {
                message: "adults must be between 1 and 9".to_string(),
            });
        }
        let max = self.max.unwrap_or(10);
        if !(1..=250).contains(&max) {
            return Err(Error::BadRequest {
                message: "max must be between 1 and 250".to_string(),
            });
        }

        let mut params = vec![
            ("originLocationCode", origin),
            ("destinationLocationCode", destination),
            ("departureDate", self.departure_date.to_string()),
            ("adults", adults.to_string()),
        ];
        if let Some(return_date) = self.return_date {
            params.push(("returnDate", return_date.to_string()));
        }
        if let Some(children) = self.children.filter(|c| *c > 0) {
            params.push(("children", children.to_string()));
        }
        params.push(("travelClass", self.travel_class.unwrap_or_default().as_str().to_string()));
        params.push(("nonStop", self.non_stop.unwrap_or(false).to_string()));
        params.push((
            "currencyCode",
            self.currency_code.as_deref().unwrap_or("EUR").to_ascii_uppercase(),
        ));
        if let Some(max_price) = self.max_price.filter(|p| *p > 0) {
            params.push(("maxPrice", max_price.to_string()));
        }
        params.push(("max", max.to_string()));

        Ok(params)
    }
}

impl TravelClient {
    /// Search flight offers; the provider's response body is returned as is.
    pub async fn search_flights(&self, query: &FlightSearchQuery) -> Result<serde_json::Value> {
        let params = query.to_params()?;
        self.get_json(FLIGHT_OFFERS_PATH, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::tests::{client_for, mount_token};
    use axum::http::StatusCode;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> FlightSearchQuery {
        FlightSearchQuery {
            origin_location_code: "sgn".to_string(),
            destination_location_code: "HAN".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            return_date: None,
            adults: None,
            children: None,
            travel_class: None,
            non_stop: None,
            currency_code: None,
            max_price: None,
            max: None,
        }
    }

    #[test]
    fn test_defaults_are_filled_in() {
        let params = query().to_params().unwrap();
        let get = |k: &str| params.iter().find(|(name, _)| *name == k).map(|(_, v)| v.as_str());

        assert_eq!(get("originLocationCode"), Some("SGN"));
        assert_eq!(get("adults"), Some("1"));
        assert_eq!(get("travelClass"), Some("ECONOMY"));
        assert_eq!(get("nonStop"), Some("false"));
        assert_eq!(get("currencyCode"), Some("EUR"));
        assert_eq!(get("max"), Some("10"));
        assert_eq!(get("children"), None);
        assert_eq!(get("maxPrice"), None);
        assert_eq!(get("returnDate"), None);
    }

    #[test]
    fn test_zero_children_and_price_are_omitted() {
        let mut q = query();
        q.children = Some(0);
        q.max_price = Some(0);
        let params = q.to_params().unwrap();
        assert!(!params.iter().any(|(k, _)| *k == "children" || *k == "maxPrice"));

        q.children = Some(2);
        q.max_price = Some(500);
        let params = q.to_params().unwrap();
        assert!(params.contains(&("children", "2".to_string())));
        assert!(params.contains(&("maxPrice", "500".to_string())));
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut q = query();
        q.origin_location_code = "SAIGON".to_string();
        assert!(q.to_params().is_err());

        let mut q = query();
        q.destination_location_code = "H4N".to_string();
        assert!(q.to_params().is_err());

        let mut q = query();
        q.return_date = NaiveDate::from_ymd_opt(2026, 11, 30);
        assert!(q.to_params().is_err());

        let mut q = query();
        q.adults = Some(0);
        assert!(q.to_params().is_err());
    }

    #[tokio::test]
    async fn test_search_forwards_params() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("GET"))
            .and(path(FLIGHT_OFFERS_PATH))
            .and(query_param("originLocationCode", "SGN"))
            .and(query_param("destinationLocationCode", "HAN"))
            .and(query_param("departureDate", "2026-12-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "meta": {"count": 1},
                "data": [{"id": "1", "price": {"total": "120.50", "currency": "EUR"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server).search_flights(&query()).await.unwrap();
        assert_eq!(body["meta"]["count"], 1);
        assert_eq!(body["data"][0]["price"]["total"], "120.50");
    }

    #[tokio::test]
    async fn test_invalid_query_never_reaches_provider() {
        let server = MockServer::start().await;
        mount_token(&server, 0).await;

        let mut q = query();
        q.origin_location_code = "X".to_string();
        let err = client_for(&server).search_flights(&q).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
