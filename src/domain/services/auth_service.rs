use crate::config::Config;
use crate::domain::models::{auth::Claims, tenant::Tenant};
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

pub struct AuthService {
    config: Config,
    encoding_key: EncodingKey,
}

impl AuthService {
    pub fn new(config: Config) -> Self {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())
            .expect("Invalid JWT Private Key PEM");

        Self { config, encoding_key }
    }

    /// Issues a short-lived access token plus the CSRF token embedded in its
    /// claims. The caller stores the JWT in an http-only cookie and returns
    /// the CSRF token in the response body.
    pub fn login(&self, tenant: &Tenant) -> Result<(String, String), AppError> {
        let csrf_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
        let now = Utc::now();
        let exp = (now + Duration::minutes(15)).timestamp() as usize;

        let claims = Claims {
            iss: self.config.auth_issuer.clone(),
            sub: tenant.id.clone(),
            aud: "assistant-panel".to_string(),
            exp,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            business_name: tenant.business_name.clone(),
            csrf_token: csrf_token.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        Ok((access_token, csrf_token))
    }
}
