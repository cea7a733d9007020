//! Test utilities shared by handler and repository tests.

use crate::api::models::{agencies::CurrentAgency, users::CurrentUser};
use crate::auth::password::{self, Argon2Params};
use crate::auth::session::{self, SessionClaims};
use crate::config::{Config, PasswordConfig};
use crate::db::{
    handlers::{Agencies, Blogs, Locations, Repository, Tours, Users},
    models::{
        agencies::{AgencyCreateDBRequest, AgencyDBResponse},
        blogs::{BlogCreateDBRequest, BlogDBResponse},
        locations::{LocationCreateDBRequest, LocationDBResponse},
        tours::{TourCreateDBRequest, TourDBResponse},
        users::{UserCreateDBRequest, UserDBResponse},
    },
};
use crate::types::{AgencyId, UserId};
use crate::AppState;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Password every fixture agency is created with
pub const TEST_AGENCY_PASSWORD: &str = "agency-password";

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    };
    // Cheapest parameters argon2 accepts; hashing dominates test time otherwise
    config.auth.native.password = PasswordConfig {
        argon2_memory_kib: 8,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Default::default()
    };
    config.auth.native.session.cookie_secure = false;
    config
}

pub fn create_test_state(pool: PgPool) -> AppState {
    state_with_config(pool, create_test_config())
}

fn state_with_config(pool: PgPool, config: Config) -> AppState {
    // main installs the provider in production; reqwest is built without one
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    AppState::from_config(pool, config).expect("Failed to create app state")
}

pub fn create_test_app_with_state(state: AppState) -> TestServer {
    let router = crate::build_router(state).expect("Failed to build router");
    TestServer::new(router.into_make_service()).expect("Failed to create test server")
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    create_test_app_with_state(state_with_config(pool, config))
}

async fn insert_user(pool: &PgPool, is_admin: bool) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let id = Uuid::new_v4().simple();

    let user_create = UserCreateDBRequest {
        email: format!("traveller_{id}@example.com"),
        name: format!("Traveller {}", &id.to_string()[..8]),
        password_hash: None,
        image: None,
        auth_source: "test".to_string(),
        is_admin,
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

pub async fn create_test_user(pool: &PgPool) -> UserDBResponse {
    insert_user(pool, false).await
}

pub async fn create_test_admin_user(pool: &PgPool) -> UserDBResponse {
    insert_user(pool, true).await
}

pub async fn create_test_agency(pool: &PgPool) -> AgencyDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut agency_repo = Agencies::new(&mut conn);
    let id = Uuid::new_v4().simple();
    let params = Argon2Params::from(&create_test_config().auth.native.password);

    let agency_create = AgencyCreateDBRequest {
        name: format!("Agency {}", &id.to_string()[..8]),
        email: format!("agency_{id}@example.com"),
        password_hash: password::hash_string_with_params(TEST_AGENCY_PASSWORD, params).expect("Failed to hash password"),
        description: Some("Guided tours across the island".to_string()),
        logo: None,
        website: None,
        phone_number: None,
        address: None,
    };

    agency_repo.create(&agency_create).await.expect("Failed to create test agency")
}

pub async fn create_test_location(pool: &PgPool, name: &str, province: &str) -> LocationDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let request = LocationCreateDBRequest {
        name: name.to_string(),
        description: format!("{name} is worth the trip"),
        category: "Nature".to_string(),
        province: province.to_string(),
        district: None,
        address: None,
        latitude: None,
        longitude: None,
        images: vec![],
    };

    Locations::new(&mut conn).create(&request).await.expect("Failed to create test location")
}

pub async fn create_test_blog(pool: &PgPool, author_id: UserId) -> BlogDBResponse {
    let mut tx = pool.begin().await.expect("Failed to begin transaction");
    let request = BlogCreateDBRequest {
        author_id,
        title: "Three days in the hill country".to_string(),
        content: "Tea estates, waterfalls and a very slow train.".to_string(),
        location_ids: vec![],
    };

    let blog = Blogs::new(&mut tx).create(&request).await.expect("Failed to create test blog");
    tx.commit().await.expect("Failed to commit transaction");
    blog
}

/// Create a tour priced at 150.00 with a single start date a month from now.
pub async fn create_test_tour(pool: &PgPool, agency_id: AgencyId, max_capacity: i32) -> TourDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let request = TourCreateDBRequest {
        agency_id,
        location_id: None,
        title: format!("Tour {}", &Uuid::new_v4().simple().to_string()[..8]),
        description: "A guided day out".to_string(),
        price: Decimal::new(15000, 2),
        duration_days: 1,
        max_capacity,
        images: vec![],
        itinerary: "Pickup at 7, back by 6".to_string(),
        includes: None,
        excludes: None,
        start_dates: vec![(Utc::now() + Duration::days(30)).date_naive()],
        category: None,
        province: None,
        district: None,
    };

    Tours::new(&mut conn).create(&request).await.expect("Failed to create test tour")
}

pub fn user_token(user: &UserDBResponse) -> String {
    let config = create_test_config();
    let claims = SessionClaims::for_user(&CurrentUser::from(user), &config);
    session::create_session_token(&claims, &config).expect("Failed to create session token")
}

pub fn agency_token(agency: &AgencyDBResponse) -> String {
    let config = create_test_config();
    let claims = SessionClaims::for_agency(&CurrentAgency::from(agency), &config);
    session::create_session_token(&claims, &config).expect("Failed to create session token")
}
