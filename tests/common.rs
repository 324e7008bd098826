use assistant_gateway::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::repositories::sqlite_tenant_repo::SqliteTenantRepo,
    domain::models::chat::{ChatMessage, CompletionCall, CompletionStream},
    domain::ports::{LlmService, TenantRepository},
    domain::services::auth_service::AuthService,
    domain::services::completion_service::CompletionService,
    domain::services::credential_vault::CredentialVault,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use futures::StreamExt;
use tower::ServiceExt;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api_key: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Provider stub. Echoes the message contents it received joined with '|',
/// so tests can assert on exactly what crossed the provider boundary, and
/// records the API key used for each call.
pub struct EchoLlmService {
    calls: Mutex<Vec<RecordedCall>>,
    fail_next: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl EchoLlmService {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls.lock().unwrap().last().cloned().expect("no provider calls recorded")
    }

    fn record_and_render(&self, api_key: &str, call: &CompletionCall) -> Result<String, AppError> {
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(AppError::Provider(message));
        }
        self.calls.lock().unwrap().push(RecordedCall {
            api_key: api_key.to_string(),
            model: call.model.clone(),
            messages: call.messages.clone(),
        });
        Ok(call
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("|"))
    }
}

#[async_trait]
impl LlmService for EchoLlmService {
    async fn complete(&self, api_key: &str, call: &CompletionCall) -> Result<String, AppError> {
        self.record_and_render(api_key, call)
    }

    async fn complete_stream(
        &self,
        api_key: &str,
        call: &CompletionCall,
    ) -> Result<CompletionStream, AppError> {
        let rendered = self.record_and_render(api_key, call)?;
        // Chunked by chars so multibyte answers split cleanly.
        let fragments: Vec<Result<String, AppError>> = rendered
            .chars()
            .collect::<Vec<_>>()
            .chunks(7)
            .map(|chunk| Ok(chunk.iter().collect::<String>()))
            .collect();
        Ok(futures::stream::iter(fragments).boxed())
    }
}

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub llm: Arc<EchoLlmService>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            openai_base_url: "http://localhost:9".to_string(),
            credential_encryption_key: None,
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
        };

        let vault = Arc::new(CredentialVault::generate());
        let llm = Arc::new(EchoLlmService::new());
        let tenant_repo: Arc<dyn TenantRepository> = Arc::new(SqliteTenantRepo::new(pool.clone()));
        let auth_service = Arc::new(AuthService::new(config.clone()));
        let completion_service = Arc::new(CompletionService::new(
            tenant_repo.clone(),
            vault.clone(),
            llm.clone(),
        ));

        let state = Arc::new(AppState {
            config: config.clone(),
            tenant_repo,
            vault,
            auth_service,
            completion_service,
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            llm,
        }
    }

    pub async fn post_json(&self, uri: &str, payload: Value) -> axum::response::Response {
        self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router.clone().oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        ).await.unwrap()
    }

    /// Creates a tenant through the API and returns its id.
    pub async fn create_tenant(&self, username: &str, password: &str, business_name: &str, api_key: &str, system_prompt: &str) -> String {
        let response = self.post_json("/api/v1/tenants", json!({
            "username": username,
            "password": password,
            "business_name": business_name,
            "api_key": api_key,
            "system_prompt": system_prompt,
        })).await;

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            panic!("Tenant creation failed in test helper: status {}, body: {:?}", status, String::from_utf8_lossy(&bytes));
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        body["id"].as_str().expect("created tenant has no id").to_string()
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthHeaders {
        let payload = json!({
            "username": username,
            "password": password
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let cookies: Vec<String> = response.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|h| h.to_str().unwrap().to_string())
            .collect();

        let access_token_cookie = cookies.iter()
            .find(|c| c.contains("access_token="))
            .expect("No access_token cookie returned");

        let start = access_token_cookie.find("access_token=").unwrap() + 13;
        let end = access_token_cookie[start..].find(';').unwrap_or(access_token_cookie.len() - start);
        let access_token = access_token_cookie[start..start+end].to_string();

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

        AuthHeaders {
            access_token,
            csrf_token
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
