use crate::api::handlers::NotFoundExt;
use crate::api::models::{
    agencies::{AgencyLoginRequest, AgencyRegisterRequest, AgencyResponse, CurrentAgency},
    auth::{AgencyAuthResponse, AgencyLoginResponse, WithSessionCookie},
    pagination::{PaginatedResponse, Pagination},
    tours::TourResponse,
    users::CurrentUser,
    validation::normalize_email,
};
use crate::auth::{
    password, permissions,
    session::{self, SessionClaims},
};
use crate::config::Config;
use crate::db::handlers::{Agencies, Repository, Tours, tours::TourFilter};
use crate::db::models::agencies::{AgencyCreateDBRequest, AgencyDBResponse, AgencyUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{AgencyId, Operation};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

fn agency_session(agency: AgencyDBResponse, config: &Config, status: StatusCode) -> Result<AgencyLoginResponse> {
    let claims = SessionClaims::for_agency(&CurrentAgency::from(&agency), config);
    let token = session::create_session_token(&claims, config)?;
    let cookie = session::create_session_cookie(&token, config);

    Ok(WithSessionCookie {
        status,
        body: AgencyAuthResponse {
            agency: AgencyResponse::from(agency),
            access_token: token,
        },
        cookie,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/agencies/register",
    tag = "agencies",
    summary = "Register an agency",
    request_body = AgencyRegisterRequest,
    responses(
        (status = 201, description = "Agency registered", body = AgencyAuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already in use"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register_agency(
    State(state): State<AppState>,
    Json(request): Json<AgencyRegisterRequest>,
) -> Result<AgencyLoginResponse> {
    let passwords = &state.config.auth.native.password;
    request.validate(passwords.agency_min_length, passwords.max_length)?;

    let password_hash = password::hash_password(request.password, passwords).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let agency = Agencies::new(&mut conn)
        .create(&AgencyCreateDBRequest {
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
            password_hash,
            description: request.description,
            logo: request.logo,
            website: request.website,
            phone_number: request.phone_number,
            address: request.address,
        })
        .await?;

    info!(agency_id = %agency.id, "Agency registered");
    agency_session(agency, &state.config, StatusCode::CREATED)
}

#[utoipa::path(
    post,
    path = "/api/v1/agencies/login",
    tag = "agencies",
    summary = "Agency login",
    request_body = AgencyLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AgencyAuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_agency(State(state): State<AppState>, Json(request): Json<AgencyLoginRequest>) -> Result<AgencyLoginResponse> {
    let invalid = || Error::Unauthenticated {
        message: Some("Invalid credentials".to_string()),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let agency = Agencies::new(&mut conn)
        .get_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(request.password, agency.password_hash.clone()).await? {
        return Err(invalid());
    }

    agency_session(agency, &state.config, StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/agencies/profile",
    tag = "agencies",
    summary = "The calling agency's profile",
    responses(
        (status = 200, description = "Agency profile", body = AgencyResponse),
        (status = 401, description = "Not an agency session"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn agency_profile(State(state): State<AppState>, current_agency: CurrentAgency) -> Result<Json<AgencyResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let agency = Agencies::new(&mut conn)
        .get_by_id(current_agency.id)
        .await?
        .or_not_found("Agency", current_agency.id)?;

    Ok(Json(AgencyResponse::from(agency)))
}

#[utoipa::path(
    get,
    path = "/api/v1/agencies/{agency_id}",
    tag = "agencies",
    summary = "Get agency",
    params(("agency_id" = uuid::Uuid, Path, description = "Agency ID")),
    responses(
        (status = 200, description = "Public agency profile", body = AgencyResponse),
        (status = 404, description = "Agency not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_agency(State(state): State<AppState>, Path(agency_id): Path<AgencyId>) -> Result<Json<AgencyResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let agency = Agencies::new(&mut conn).get_by_id(agency_id).await?.or_not_found("Agency", agency_id)?;

    Ok(Json(AgencyResponse::from(agency)))
}

#[utoipa::path(
    get,
    path = "/api/v1/agencies/{agency_id}/tours",
    tag = "agencies",
    summary = "List an agency's tours",
    params(("agency_id" = uuid::Uuid, Path, description = "Agency ID"), Pagination),
    responses(
        (status = 200, description = "The agency's tours", body = PaginatedResponse<TourResponse>),
        (status = 404, description = "Agency not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_agency_tours(
    State(state): State<AppState>,
    Path(agency_id): Path<AgencyId>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<TourResponse>>> {
    let (skip, limit) = pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Agencies::new(&mut conn).get_by_id(agency_id).await?.or_not_found("Agency", agency_id)?;

    let filter = TourFilter {
        agency_id: Some(agency_id),
        ..TourFilter::new(skip, limit)
    };
    let mut tours = Tours::new(&mut conn);
    let page = tours.list(&filter).await?;
    let total = tours.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        page.into_iter().map(TourResponse::from).collect(),
        total,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/agencies/{agency_id}/verify",
    tag = "agencies",
    summary = "Verify an agency",
    params(("agency_id" = uuid::Uuid, Path, description = "Agency ID")),
    responses(
        (status = 200, description = "Agency verified", body = AgencyResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Agency not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn verify_agency(
    State(state): State<AppState>,
    Path(agency_id): Path<AgencyId>,
    current_user: CurrentUser,
) -> Result<Json<AgencyResponse>> {
    permissions::require_admin(&current_user, Operation::Update, "agency")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let agency = Agencies::new(&mut conn)
        .update(
            agency_id,
            &AgencyUpdateDBRequest {
                verified: Some(true),
                ..Default::default()
            },
        )
        .await
        .or_not_found("Agency", agency_id)?;

    info!(agency_id = %agency.id, "Agency verified");
    Ok(Json(AgencyResponse::from(agency)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        agency_token, create_test_admin_user, create_test_agency, create_test_app, create_test_tour, create_test_user, user_token,
    };
    use serde_json::json;
    use sqlx::PgPool;

    fn registration(email: &str, password: &str) -> serde_json::Value {
        json!({
            "name": "Lanka Expeditions",
            "email": email,
            "password": password,
            "website": "https://lanka.example.com"
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_and_login(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/v1/agencies/register")
            .json(&registration("Hello@Lanka.example.com", "long-password"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: AgencyAuthResponse = response.json();
        assert_eq!(body.agency.email, "hello@lanka.example.com");
        assert!(!body.agency.verified);

        // Agency profile responses never carry the password hash
        let raw: serde_json::Value = response.json();
        assert!(raw["agency"].get("password_hash").is_none());

        let response = server
            .post("/api/v1/agencies/login")
            .json(&json!({"email": "hello@lanka.example.com", "password": "long-password"}))
            .await;
        response.assert_status_ok();
        let login: AgencyAuthResponse = response.json();

        let response = server.get("/api/v1/agencies/profile").authorization_bearer(login.access_token).await;
        response.assert_status_ok();
        let profile: AgencyResponse = response.json();
        assert_eq!(profile.id, body.agency.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_rules(pool: PgPool) {
        let server = create_test_app(pool).await;

        // Agencies need longer passwords than users
        let response = server.post("/api/v1/agencies/register").json(&registration("a@lanka.example.com", "seven77")).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Password must be at least 8 characters");

        server
            .post("/api/v1/agencies/register")
            .json(&registration("b@lanka.example.com", "long-password"))
            .await
            .assert_status(StatusCode::CREATED);
        let response = server
            .post("/api/v1/agencies/register")
            .json(&registration("b@lanka.example.com", "long-password"))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let error: serde_json::Value = response.json();
        assert_eq!(error["message"], "Email already in use");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_invalid_credentials(pool: PgPool) {
        let server = create_test_app(pool).await;
        server
            .post("/api/v1/agencies/register")
            .json(&registration("c@lanka.example.com", "long-password"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/v1/agencies/login")
            .json(&json!({"email": "c@lanka.example.com", "password": "not-the-password"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "Invalid credentials");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_profile_rejects_user_tokens(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;

        server
            .get("/api/v1/agencies/profile")
            .authorization_bearer(user_token(&user))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_public_profile_and_tours(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let agency = create_test_agency(&pool).await;
        create_test_tour(&pool, agency.id, 10).await;
        create_test_tour(&pool, agency.id, 5).await;

        let response = server.get(&format!("/api/v1/agencies/{}", agency.id)).await;
        response.assert_status_ok();

        let response = server.get(&format!("/api/v1/agencies/{}/tours", agency.id)).await;
        response.assert_status_ok();
        let page: PaginatedResponse<TourResponse> = response.json();
        assert_eq!(page.total_count, 2);
        assert!(page.data.iter().all(|t| t.agency.id == agency.id));

        server
            .get(&format!("/api/v1/agencies/{}/tours", uuid::Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_verify_is_admin_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let agency = create_test_agency(&pool).await;
        let admin = create_test_admin_user(&pool).await;
        let path = format!("/api/v1/agencies/{}/verify", agency.id);

        server
            .post(&path)
            .authorization_bearer(agency_token(&agency))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server.post(&path).authorization_bearer(user_token(&admin)).await;
        response.assert_status_ok();
        let verified: AgencyResponse = response.json();
        assert!(verified.verified);
    }
}
