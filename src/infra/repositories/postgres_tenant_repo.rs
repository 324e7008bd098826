use crate::domain::{models::tenant::Tenant, ports::TenantRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresTenantRepo {
    pool: PgPool,
}

impl PostgresTenantRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepo {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError> {
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (id, username, password_hash, business_name, api_key_ciphertext, system_prompt, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *"
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
            "SELECT * FROM tenants WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Tenant>, AppError> {
        sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE username = $1",
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
            "UPDATE tenants SET password_hash=$1, business_name=$2, api_key_ciphertext=$3, system_prompt=$4, updated_at=$5 WHERE id=$6 RETURNING *"
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
        sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
