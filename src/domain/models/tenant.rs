use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Tenant {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub business_name: String,
    #[serde(skip_serializing)]
    pub api_key_ciphertext: Option<String>,
    pub system_prompt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub enum CredentialState<'a> {
    NotConfigured,
    Ciphertext(&'a str),
}

impl Tenant {
    pub fn new(username: String, password_hash: String, business_name: String, system_prompt: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            business_name,
            api_key_ciphertext: None,
            system_prompt,
            created_at: now,
            updated_at: now,
        }
    }

    // NULL and the empty string both mean "no key stored"; the empty string
    // is never a ciphertext.
    pub fn credential_state(&self) -> CredentialState<'_> {
        match self.api_key_ciphertext.as_deref() {
            None | Some("") => CredentialState::NotConfigured,
            Some(ciphertext) => CredentialState::Ciphertext(ciphertext),
        }
    }

    pub fn has_credential(&self) -> bool {
        matches!(self.credential_state(), CredentialState::Ciphertext(_))
    }
}
