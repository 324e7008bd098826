use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::domain::models::auth::{AuthResponse, TenantProfile};
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use argon2::{PasswordHash, Argon2, PasswordVerifier};
use tracing::info;

#[derive(serde::Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state.tenant_repo.find_by_username(&payload.username).await?
        .ok_or(AppError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&tenant.password_hash)
        .map_err(|_| AppError::Internal)?;

    Argon2::default().verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized)?;

    let (access_jwt, csrf_token) = state.auth_service.login(&tenant)?;

    set_access_cookie(&cookies, &access_jwt);

    info!("Tenant logged in: {}", tenant.id);

    Ok(Json(AuthResponse {
        csrf_token,
        tenant: TenantProfile {
            id: tenant.id,
            username: tenant.username,
            business_name: tenant.business_name,
        }
    }))
}

pub async fn logout(cookies: Cookies) -> Result<impl IntoResponse, AppError> {
    cookies.remove(Cookie::build(("access_token", "")).path("/").into());

    info!("Tenant logged out");

    Ok(StatusCode::OK)
}

fn set_access_cookie(cookies: &Cookies, access: &str) {
    let mut access_c = Cookie::new("access_token", access.to_string());
    access_c.set_http_only(true);
    access_c.set_secure(true);
    access_c.set_same_site(SameSite::Strict);
    access_c.set_path("/");
    access_c.set_max_age(Duration::minutes(15));
    cookies.add(access_c);
}
