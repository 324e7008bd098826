use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{ai, auth, health, tenant};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))

        // Tenant Admin
        .route("/api/v1/tenants", post(tenant::create_tenant).get(tenant::list_tenants))
        .route("/api/v1/tenants/me", get(tenant::get_current_tenant).put(tenant::update_current_tenant))
        .route("/api/v1/tenants/{tenant_id}", get(tenant::get_tenant).delete(tenant::delete_tenant))

        // Chat
        .route("/api/v1/chat", post(ai::chat))

        // AI Settings
        .route("/api/v1/{tenant_id}/ai/models", get(ai::list_models))
        .route("/api/v1/{tenant_id}/ai/validate", get(ai::validate_credential))
        .route("/api/v1/{tenant_id}/ai/info", get(ai::tenant_info))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        tenant_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
