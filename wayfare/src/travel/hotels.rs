//! Hotel search by geocode.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::TravelClient;
use crate::errors::{Error, Result};

const HOTELS_BY_GEOCODE_PATH: &str = "/v1/reference-data/locations/hotels/by-geocode";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RadiusUnit {
    #[default]
    Km,
    Mi,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HotelSource {
    #[default]
    All,
    Bedbank,
    Directchain,
}

/// Query parameters for `GET /travel/hotels/search`
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HotelSearchQuery {
    pub latitude: f64,
    pub longitude: f64,
    #[param(default = 20)]
    pub radius: Option<u32>,
    pub radius_unit: Option<RadiusUnit>,
    /// Comma separated star ratings, e.g. `4,5`
    pub ratings: Option<String>,
    /// Comma separated amenities, e.g. `POOL,WIFI,GYM`
    pub amenities: Option<String>,
    pub hotel_source: Option<HotelSource>,
}

/// Hotel list as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HotelSearchResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<serde_json::Value>,
    pub count: usize,
}

/// Map a friendly amenity name onto the provider's code. Unknown names pass through upper-cased.
fn amenity_code(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase().replace([' ', '-'], "_");
    let code = match upper.as_str() {
        "POOL" | "SWIMMING_POOL" => "SWIMMING_POOL",
        "GYM" | "FITNESS" | "FITNESS_CENTER" => "FITNESS_CENTER",
        "AC" | "AIR_CONDITIONING" => "AIR_CONDITIONING",
        "PETS" | "PETS_ALLOWED" => "PETS_ALLOWED",
        "SHUTTLE" | "AIRPORT_SHUTTLE" => "AIRPORT_SHUTTLE",
        "WIFI" | "WI_FI" => "WIFI",
        "BAR" | "LOUNGE" => "BAR or LOUNGE",
        "BABYSITTING" | "BABY_SITTING" => "BABY-SITTING",
        "BUSINESS" | "BUSINESS_CENTER" => "BUSINESS_CENTER",
        "ACCESSIBLE" | "DISABLED_FACILITIES" => "DISABLED_FACILITIES",
        _ => return upper,
    };
    code.to_string()
}

impl HotelSearchQuery {
    pub fn to_params(&self) -> Result<Vec<(&'static str, String)>> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::BadRequest {
                message: "latitude must be between -90 and 90".to_string(),
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::BadRequest {
                message: "longitude must be between -180 and 180".to_string(),
            });
        }

        let unit = match self.radius_unit.unwrap_or_default() {
            RadiusUnit::Km => "KM",
            RadiusUnit::Mi => "MI",
        };
        let mut params = vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("radius", self.radius.unwrap_or(20).to_string()),
            ("radiusUnit", unit.to_string()),
        ];

        if let Some(ratings) = self.ratings.as_deref().filter(|r| !r.trim().is_empty()) {
            let ratings = ratings
                .split(',')
                .map(|r| match r.trim().parse::<u8>() {
                    Ok(n @ 1..=5) => Ok(n.to_string()),
                    _ => Err(Error::BadRequest {
                        message: format!("Invalid rating '{}': ratings must be between 1 and 5", r.trim()),
                    }),
                })
                .collect::<Result<Vec<_>>>()?;
            params.push(("ratings", ratings.join(",")));
        }

        if let Some(amenities) = self.amenities.as_deref().filter(|a| !a.trim().is_empty()) {
            let codes: Vec<String> = amenities
                .split(',')
                .filter(|a| !a.trim().is_empty())
                .map(amenity_code)
                .collect();
            params.push(("amenities", codes.join(",")));
        }

        match self.hotel_source.unwrap_or_default() {
            HotelSource::All => {}
            HotelSource::Bedbank => params.push(("hotelSource", "BEDBANK".to_string())),
            HotelSource::Directchain => params.push(("hotelSource", "DIRECTCHAIN".to_string())),
        }

        Ok(params)
    }
}

impl TravelClient {
    pub async fn search_hotels(&self, query: &HotelSearchQuery) -> Result<HotelSearchResponse> {
        let params = query.to_params()?;
        let body = self.get_json(HOTELS_BY_GEOCODE_PATH, &params).await?;

        let data = match body.get("data") {
            Some(serde_json::Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Ok(HotelSearchResponse { count: data.len(), data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::tests::{client_for, mount_token};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> HotelSearchQuery {
        HotelSearchQuery {
            latitude: 10.7769,
            longitude: 106.7009,
            radius: None,
            radius_unit: None,
            ratings: None,
            amenities: None,
            hotel_source: None,
        }
    }

    #[test]
    fn test_amenity_mapping() {
        assert_eq!(amenity_code("pool"), "SWIMMING_POOL");
        assert_eq!(amenity_code(" GYM "), "FITNESS_CENTER");
        assert_eq!(amenity_code("wi-fi"), "WIFI");
        assert_eq!(amenity_code("spa"), "SPA");
    }

    #[test]
    fn test_params() {
        let mut q = query();
        q.ratings = Some("4, 5".to_string());
        q.amenities = Some("POOL,gym,,SPA".to_string());
        let params = q.to_params().unwrap();

        assert!(params.contains(&("radius", "20".to_string())));
        assert!(params.contains(&("radiusUnit", "KM".to_string())));
        assert!(params.contains(&("ratings", "4,5".to_string())));
        assert!(params.contains(&("amenities", "SWIMMING_POOL,FITNESS_CENTER,SPA".to_string())));
        // ALL is the provider default and is never sent
        assert!(!params.iter().any(|(k, _)| *k == "hotelSource"));

        q.hotel_source = Some(HotelSource::Bedbank);
        assert!(q.to_params().unwrap().contains(&("hotelSource", "BEDBANK".to_string())));
    }

    #[test]
    fn test_range_checks() {
        let mut q = query();
        q.latitude = 91.0;
        assert!(q.to_params().is_err());

        let mut q = query();
        q.longitude = -180.5;
        assert!(q.to_params().is_err());

        let mut q = query();
        q.ratings = Some("3,6".to_string());
        assert!(q.to_params().is_err());
    }

    #[tokio::test]
    async fn test_search_returns_data_and_count() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("GET"))
            .and(path(HOTELS_BY_GEOCODE_PATH))
            .and(query_param("radiusUnit", "KM"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"hotelId": "HLSGN001", "name": "Riverside"},
                    {"hotelId": "HLSGN002", "name": "Old Quarter Inn"}
                ],
                "meta": {"count": 2}
            })))
            .mount(&server)
            .await;

        let response = client_for(&server).search_hotels(&query()).await.unwrap();
        assert_eq!(response.count, 2);
        assert_eq!(response.data[1]["name"], "Old Quarter Inn");
    }
}
