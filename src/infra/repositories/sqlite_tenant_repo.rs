use crate::domain::{models::tenant::Tenant, ports::TenantRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteTenantRepo {
    pool: SqlitePool,
}

impl SqliteTenantRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for SqliteTenantRepo {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError> {
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (id, username, password_hash, business_name, api_key_ciphertext, system_prompt, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&tenant.id)
            .bind(&tenant.username)
            .bind(&tenant.password_hash)
            .bind(&tenant.business_name)
            .bind(&tenant.api_key_ciphertext)
            .bind(&tenant.system_prompt)
            .bind(tenant.created_at)
            .bind(tenant.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, AppError> {
        sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE id = ?",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Tenant>, AppError> {
        sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE username = ?",
        )
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Tenant>, AppError> {
        sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants ORDER BY created_at",
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    // Username is the login identity and never changes after registration.
    async fn update(&self, tenant: &Tenant) -> Result<Tenant, AppError> {
        sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET password_hash=?, business_name=?, api_key_ciphertext=?, system_prompt=?, updated_at=? WHERE id=? RETURNING *"
        )
            .bind(&tenant.password_hash)
            .bind(&tenant.business_name)
            .bind(&tenant.api_key_ciphertext)
            .bind(&tenant.system_prompt)
            .bind(tenant.updated_at)
            .bind(&tenant.id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM tenants WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
