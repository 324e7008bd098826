use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://assistant-gateway.local/claims/business_name")]
    pub business_name: String,

    #[serde(rename = "https://assistant-gateway.local/claims/csrf")]
    pub csrf_token: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub csrf_token: String,
    pub tenant: TenantProfile,
}

#[derive(Serialize)]
pub struct TenantProfile {
    pub id: String,
    pub username: String,
    pub business_name: String,
}
