//! OpenAPI documentation for the wayfare API.
//!
//! Served as JSON at `/api-docs/openapi.json` and rendered with Scalar at `/docs`. Schemas are
//! collected from the handlers' `#[utoipa::path]` annotations.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Security schemes: bearer tokens for mobile apps, the session cookie for browsers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.security_schemes.insert(
            "BearerAuth".to_string(),
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Session token returned by `/authentication/login`, `/agencies/login` or \
                        `/authentication/token-exchange`:\n\n\
                        ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                    ))
                    .build(),
            ),
        );
        components.security_schemes.insert(
            "CookieAuth".to_string(),
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "wayfare_session",
                "Session cookie set on login. Browsers send it automatically.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "wayfare",
        description = "Travel platform API: accounts, locations, events, blogs, trips, tours, bookings and travel search."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::google_login,
        api::handlers::auth::google_callback,
        api::handlers::auth::token_exchange,
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::users::list_user_trips,
        api::handlers::agencies::register_agency,
        api::handlers::agencies::login_agency,
        api::handlers::agencies::agency_profile,
        api::handlers::agencies::get_agency,
        api::handlers::agencies::list_agency_tours,
        api::handlers::agencies::verify_agency,
        api::handlers::locations::list_locations,
        api::handlers::locations::create_location,
        api::handlers::locations::get_location,
        api::handlers::locations::update_location,
        api::handlers::locations::delete_location,
        api::handlers::locations::list_favorites,
        api::handlers::locations::add_favorite,
        api::handlers::locations::remove_favorite,
        api::handlers::events::list_events,
        api::handlers::events::create_event,
        api::handlers::events::get_event,
        api::handlers::events::update_event,
        api::handlers::events::delete_event,
        api::handlers::events::list_saved_events,
        api::handlers::events::save_event,
        api::handlers::events::unsave_event,
        api::handlers::events::event_save_status,
        api::handlers::blogs::list_blogs,
        api::handlers::blogs::create_blog,
        api::handlers::blogs::get_blog,
        api::handlers::blogs::update_blog,
        api::handlers::blogs::delete_blog,
        api::handlers::blogs::list_saved_blogs,
        api::handlers::blogs::save_blog,
        api::handlers::blogs::unsave_blog,
        api::handlers::blogs::blog_save_status,
        api::handlers::blogs::list_comments,
        api::handlers::blogs::create_comment,
        api::handlers::blogs::update_comment,
        api::handlers::blogs::delete_comment,
        api::handlers::blogs::create_reply,
        api::handlers::blogs::update_reply,
        api::handlers::blogs::delete_reply,
        api::handlers::votes::vote_blog,
        api::handlers::votes::blog_votes,
        api::handlers::votes::vote_comment,
        api::handlers::votes::comment_votes,
        api::handlers::votes::vote_reply,
        api::handlers::votes::reply_votes,
        api::handlers::trips::list_trips,
        api::handlers::trips::create_trip,
        api::handlers::trips::get_trip,
        api::handlers::trips::update_trip,
        api::handlers::trips::delete_trip,
        api::handlers::trips::list_participants,
        api::handlers::trips::add_participant,
        api::handlers::trips::remove_participant,
        api::handlers::tours::list_tours,
        api::handlers::tours::create_tour,
        api::handlers::tours::get_tour,
        api::handlers::tours::update_tour,
        api::handlers::tours::delete_tour,
        api::handlers::tours::list_tour_bookings,
        api::handlers::tours::list_tour_reviews,
        api::handlers::tours::tour_rating,
        api::handlers::bookings::create_booking,
        api::handlers::bookings::list_bookings,
        api::handlers::bookings::get_booking,
        api::handlers::bookings::update_booking,
        api::handlers::bookings::cancel_booking,
        api::handlers::bookings::update_booking_status,
        api::handlers::reviews::create_review,
        api::handlers::reviews::list_my_reviews,
        api::handlers::reviews::get_review,
        api::handlers::reviews::update_review,
        api::handlers::reviews::delete_review,
        api::handlers::dashboard::stats,
        api::handlers::dashboard::monthly_users,
        api::handlers::dashboard::monthly_tours,
        api::handlers::dashboard::monthly_bookings,
        api::handlers::dashboard::monthly_revenue,
        api::handlers::dashboard::locations_by_category,
        api::handlers::dashboard::top_locations,
        api::handlers::dashboard::recent_activities,
        api::handlers::travel::search_flights,
        api::handlers::travel::search_hotels,
    ),
    tags(
        (name = "authentication", description = "Registration, login and Google sign-in"),
        (name = "users", description = "User accounts"),
        (name = "agencies", description = "Travel agencies"),
        (name = "locations", description = "Locations and favourites"),
        (name = "events", description = "Events and saved events"),
        (name = "blogs", description = "Blogs and saved blogs"),
        (name = "comments", description = "Comments and replies on blogs"),
        (name = "votes", description = "Up/down votes on blogs, comments and replies"),
        (name = "trips", description = "Trips and their participants"),
        (name = "tours", description = "Tours published by agencies"),
        (name = "bookings", description = "Tour bookings"),
        (name = "reviews", description = "Tour reviews"),
        (name = "dashboard", description = "Admin statistics"),
        (name = "travel", description = "Flight and hotel search"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_protected_route_has_a_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
        assert!(components.security_schemes.contains_key("CookieAuth"));

        let booking = doc.paths.paths.get("/api/v1/bookings/{booking_id}/status").expect("booking status path");
        assert!(booking.patch.is_some());
        assert!(doc.paths.paths.contains_key("/authentication/token-exchange"));
    }
}
