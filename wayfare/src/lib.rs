//! # wayfare: Travel and Tourism Platform Backend
//!
//! `wayfare` is the REST backend behind a travel platform. Travellers browse locations and
//! events, plan trips with friends, write and vote on blogs, and book tours published by travel
//! agencies. A thin passthrough to a third-party provider adds flight and hotel search.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for all persistence. Every resource follows the same path through the code:
//! a handler in [`api::handlers`] validates its request model from [`api::models`], checks the
//! caller's permissions with [`auth::permissions`], and reads or writes through a repository in
//! [`db::handlers`].
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the resource API at `/api/v1/*` and the login flows at
//! `/authentication/*`. An OpenAPI document is served at `/api-docs/openapi.json` with a
//! browsable reference at `/docs`.
//!
//! The **authentication layer** ([`auth`]) issues signed session tokens for users and agencies.
//! Tokens arrive either as a cookie (browsers) or as a bearer header (mobile apps). Google
//! login keeps its short-lived state in [`auth::expiring::ExpiringStore`]s, swept by a
//! background task.
//!
//! The **database layer** ([`db`]) uses the repository pattern. The one piece of real
//! concurrency control lives in [`db::handlers::Bookings`]: the per-date capacity guard locks
//! the tour row so that concurrent bookings cannot jointly exceed a tour's capacity.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use wayfare::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = wayfare::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     wayfare::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod travel;
pub mod types;

#[cfg(test)]
mod test_utils;

use crate::{
    auth::{
        expiring::{self, ExpiringStore},
        google::{GoogleClient, OAuthFlow},
        password,
    },
    config::{CorsOrigin, PasswordConfig},
    db::handlers::{Repository, Users},
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
    travel::TravelClient,
    types::UserId,
};
use axum::http::HeaderValue;
use axum::{
    Router, http,
    routing::{get, patch, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file and environment
/// - `flows`: Pending Google logins, keyed by the OAuth `state` parameter
/// - `login_codes`: One-time codes handed to mobile apps after Google login
/// - `google`: Google OAuth client, when Google login is enabled
/// - `travel`: Flight and hotel search client, when travel search is enabled
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub flows: Arc<ExpiringStore<String, OAuthFlow>>,
    pub login_codes: Arc<ExpiringStore<String, UserId>>,
    pub google: Option<Arc<GoogleClient>>,
    pub travel: Option<Arc<TravelClient>>,
}

impl AppState {
    /// Build the state for a pool and configuration, creating the optional provider clients
    /// the configuration enables.
    pub fn from_config(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let google_config = &config.auth.google;

        Ok(AppState::builder()
            .db(db)
            .flows(Arc::new(ExpiringStore::new(google_config.flow_ttl, google_config.max_pending)))
            .login_codes(Arc::new(ExpiringStore::new(google_config.login_code_ttl, google_config.max_pending)))
            .maybe_google(GoogleClient::from_config(google_config, http.clone()).map(Arc::new))
            .maybe_travel(TravelClient::from_config(&config.travel, http).map(Arc::new))
            .config(config)
            .build())
    }
}

/// Get the wayfare database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing account with this email is promoted to admin, and its password is
/// replaced when one is given.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    password_config: &PasswordConfig,
    db: &PgPool,
) -> anyhow::Result<UserId> {
    let password_hash = match password {
        Some(pwd) => Some(
            password::hash_password(pwd.to_string(), password_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?,
        ),
        None => None,
    };

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_user_by_email(email).await? {
        user_repo.promote_to_admin(existing_user.id, password_hash.as_deref()).await?;
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let user_create = UserCreateDBRequest {
        email: email.to_string(),
        name: "Administrator".to_string(),
        password_hash,
        image: None,
        auth_source: "system".to_string(),
        is_admin: true,
    };
    let created_user = user_repo.create(&user_create).await?;

    tx.commit().await?;
    info!(user_id = %created_user.id, "Created initial admin user");
    Ok(created_user.id)
}

/// Connect to PostgreSQL, run migrations and make sure the admin account exists
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let lifetime = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(lifetime(settings.idle_timeout_secs))
        .max_lifetime(lifetime(settings.max_lifetime_secs))
        .connect(&config.database.url)
        .await?;
    migrator().run(&pool).await?;

    create_initial_admin_user(
        &config.admin_email,
        config.admin_password.as_deref(),
        &config.auth.native.password,
        &pool,
    )
    .await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            // Url serializes with a trailing slash that browsers never send in Origin
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with every endpoint, the API docs and the middleware stack.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{
        agencies, auth, blogs, bookings, dashboard, events, locations, reviews, tours, travel, trips, users, votes,
    };

    // Login flows live at the root so they can be fronted separately from the API
    let auth_routes = Router::new()
        .route("/authentication/register", post(auth::register))
        .route("/authentication/login", post(auth::login))
        .route("/authentication/logout", post(auth::logout))
        .route("/authentication/google", get(auth::google_login))
        .route("/authentication/google/callback", get(auth::google_callback))
        .route("/authentication/token-exchange", post(auth::token_exchange));

    let api_routes = Router::new()
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{user_id}",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        .route("/users/{user_id}/trips", get(users::list_user_trips))
        // Agencies
        .route("/agencies/register", post(agencies::register_agency))
        .route("/agencies/login", post(agencies::login_agency))
        .route("/agencies/profile", get(agencies::agency_profile))
        .route("/agencies/{agency_id}", get(agencies::get_agency))
        .route("/agencies/{agency_id}/tours", get(agencies::list_agency_tours))
        .route("/agencies/{agency_id}/verify", post(agencies::verify_agency))
        // Locations and favourites
        .route("/locations", get(locations::list_locations).post(locations::create_location))
        .route(
            "/locations/{location_id}",
            get(locations::get_location)
                .patch(locations::update_location)
                .delete(locations::delete_location),
        )
        .route("/favorites/locations", get(locations::list_favorites))
        .route(
            "/favorites/locations/{location_id}",
            post(locations::add_favorite).delete(locations::remove_favorite),
        )
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/saved", get(events::list_saved_events))
        .route(
            "/events/{event_id}",
            get(events::get_event).patch(events::update_event).delete(events::delete_event),
        )
        .route("/events/{event_id}/save", post(events::save_event).delete(events::unsave_event))
        .route("/events/{event_id}/save-status", get(events::event_save_status))
        // Blogs, comments and replies
        .route("/blogs", get(blogs::list_blogs).post(blogs::create_blog))
        .route("/blogs/saved", get(blogs::list_saved_blogs))
        .route(
            "/blogs/{blog_id}",
            get(blogs::get_blog).patch(blogs::update_blog).delete(blogs::delete_blog),
        )
        .route("/blogs/{blog_id}/save", post(blogs::save_blog).delete(blogs::unsave_blog))
        .route("/blogs/{blog_id}/save-status", get(blogs::blog_save_status))
        .route("/blogs/{blog_id}/comments", get(blogs::list_comments).post(blogs::create_comment))
        .route(
            "/comments/{comment_id}",
            patch(blogs::update_comment).delete(blogs::delete_comment),
        )
        .route("/comments/{comment_id}/replies", post(blogs::create_reply))
        .route("/replies/{reply_id}", patch(blogs::update_reply).delete(blogs::delete_reply))
        // Votes
        .route("/blogs/{blog_id}/votes", get(votes::blog_votes).post(votes::vote_blog))
        .route("/comments/{comment_id}/votes", get(votes::comment_votes).post(votes::vote_comment))
        .route("/replies/{reply_id}/votes", get(votes::reply_votes).post(votes::vote_reply))
        // Trips
        .route("/trips", get(trips::list_trips).post(trips::create_trip))
        .route(
            "/trips/{trip_id}",
            get(trips::get_trip).patch(trips::update_trip).delete(trips::delete_trip),
        )
        .route(
            "/trips/{trip_id}/participants",
            get(trips::list_participants).post(trips::add_participant),
        )
        .route(
            "/trips/{trip_id}/participants/{user_id}",
            axum::routing::delete(trips::remove_participant),
        )
        // Tours
        .route("/tours", get(tours::list_tours).post(tours::create_tour))
        .route(
            "/tours/{tour_id}",
            get(tours::get_tour).patch(tours::update_tour).delete(tours::delete_tour),
        )
        .route("/tours/{tour_id}/bookings", get(tours::list_tour_bookings))
        .route("/tours/{tour_id}/reviews", get(tours::list_tour_reviews))
        .route("/tours/{tour_id}/rating", get(tours::tour_rating))
        // Bookings
        .route("/bookings", get(bookings::list_bookings).post(bookings::create_booking))
        .route(
            "/bookings/{booking_id}",
            get(bookings::get_booking)
                .patch(bookings::update_booking)
                .delete(bookings::cancel_booking),
        )
        .route("/bookings/{booking_id}/status", patch(bookings::update_booking_status))
        // Reviews
        .route("/reviews", get(reviews::list_my_reviews).post(reviews::create_review))
        .route(
            "/reviews/{review_id}",
            get(reviews::get_review).patch(reviews::update_review).delete(reviews::delete_review),
        )
        // Admin dashboard
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/monthly/users", get(dashboard::monthly_users))
        .route("/dashboard/monthly/tours", get(dashboard::monthly_tours))
        .route("/dashboard/monthly/bookings", get(dashboard::monthly_bookings))
        .route("/dashboard/monthly/revenue", get(dashboard::monthly_revenue))
        .route("/dashboard/locations/by-category", get(dashboard::locations_by_category))
        .route("/dashboard/top-locations", get(dashboard::top_locations))
        .route("/dashboard/recent-activities", get(dashboard::recent_activities))
        // Travel search
        .route("/travel/flights/search", get(travel::search_flights))
        .route("/travel/hotels/search", get(travel::search_hotels));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Start the task that evicts expired entries from the login stores.
fn spawn_store_sweeper(state: &AppState, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
    let flows = state.flows.clone();
    let login_codes = state.login_codes.clone();
    tokio::spawn(expiring::run_sweeper(state.config.stores.sweep_interval, shutdown, move || {
        flows.sweep() + login_codes.sweep()
    }))
}

/// Main application struct that owns all resources.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations, ensures the
///    admin account exists and starts the store sweeper
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, stops the sweeper and closes the pool
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    sweeper: tokio::task::JoinHandle<()>,
    shutdown_token: CancellationToken,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!(host = %config.host, port = config.port, "Starting wayfare");
        let pool = setup_database(&config).await?;
        Self::with_pool(pool, config)
    }

    fn with_pool(pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let state = AppState::from_config(pool.clone(), config.clone())?;
        let shutdown_token = CancellationToken::new();
        let sweeper = spawn_store_sweeper(&state, shutdown_token.clone());
        let router = build_router(state)?;

        Ok(Self {
            router,
            config,
            pool,
            sweeper,
            shutdown_token,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("wayfare listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        self.shutdown_token.cancel();
        if let Err(e) = self.sweeper.await {
            tracing::warn!("Store sweeper ended abnormally: {e}");
        }

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
