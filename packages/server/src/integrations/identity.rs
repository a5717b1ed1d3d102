use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;

/// Profile returned by the identity provider for a verified credential pair.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ExternalUser {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form role string. Mapped through `Role::from_external`.
    pub role: String,
    #[serde(default)]
    pub nim: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub study_program: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("identity service returned status {0}")]
    Status(u16),
    #[error("identity service unreachable: {0}")]
    Transport(String),
    #[error("invalid identity response: {0}")]
    InvalidResponse(String),
}

/// Verifies credentials against the institution's user directory.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<ExternalUser, IdentityError>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    user: ExternalUser,
}

/// HTTP client for the identity API: `POST {base_url}{login_path}`.
#[derive(Clone)]
pub struct RemoteIdentityProvider {
    client: reqwest::Client,
    url: String,
}

impl RemoteIdentityProvider {
    pub fn new(client: reqwest::Client, config: &IdentityConfig) -> Self {
        let url = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.login_path.trim_start_matches('/')
        );
        Self { client, url }
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ExternalUser, IdentityError> {
        let resp = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = resp.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
                return Err(IdentityError::InvalidCredentials);
            }
            s if !s.is_success() => return Err(IdentityError::Status(s.as_u16())),
            _ => {}
        }

        let raw = resp
            .text()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        let body: LoginResponse = serde_json::from_str(&raw)
            .map_err(|e| IdentityError::InvalidResponse(format!("json parse failed: {e}")))?;

        Ok(body.user)
    }
}
