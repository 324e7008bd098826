use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{LlmService, TenantRepository};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::completion_service::CompletionService;
use crate::domain::services::credential_vault::CredentialVault;
use crate::infra::ai::openai_service::OpenAiService;
use crate::infra::repositories::{
    postgres_tenant_repo::PostgresTenantRepo, sqlite_tenant_repo::SqliteTenantRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let vault = match &config.credential_encryption_key {
        Some(key) => Arc::new(
            CredentialVault::from_base64(key)
                .expect("CREDENTIAL_ENCRYPTION_KEY must be base64 of exactly 32 bytes"),
        ),
        None => {
            warn!("CREDENTIAL_ENCRYPTION_KEY not set; generated an ephemeral key. Stored API keys become unreadable after restart.");
            Arc::new(CredentialVault::generate())
        }
    };

    let llm_service: Arc<dyn LlmService> =
        Arc::new(OpenAiService::new(config.openai_base_url.clone()));
    let auth_service = Arc::new(AuthService::new(config.clone()));

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let tenant_repo: Arc<dyn TenantRepository> = Arc::new(PostgresTenantRepo::new(pool.clone()));
        let completion_service = Arc::new(CompletionService::new(
            tenant_repo.clone(),
            vault.clone(),
            llm_service.clone(),
        ));

        AppState {
            config: config.clone(),
            tenant_repo,
            vault,
            auth_service,
            completion_service,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        let tenant_repo: Arc<dyn TenantRepository> = Arc::new(SqliteTenantRepo::new(pool.clone()));
        let completion_service = Arc::new(CompletionService::new(
            tenant_repo.clone(),
            vault.clone(),
            llm_service.clone(),
        ));

        AppState {
            config: config.clone(),
            tenant_repo,
            vault,
            auth_service,
            completion_service,
        }
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
