//! Bindings for the auth endpoints. Thin wrappers over the pipeline; no
//! logic beyond the DTOs.

use crate::identity::{Identity, Role};
use qbank_http::{ApiClient, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Availability {
    pub available: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Health {
    pub status: String,
    pub service: String,
    pub timestamp: f64,
}

pub async fn login(client: &ApiClient, request: &LoginRequest) -> Result<TokenResponse> {
    client.post_json("/api/v1/auth/login", request).await
}

pub async fn current_user(client: &ApiClient) -> Result<Identity> {
    client.get_json("/api/v1/auth/me").await
}

/// Exchange a refresh token for a fresh credential.
pub async fn refresh_token(client: &ApiClient, refresh_token: &str) -> Result<TokenResponse> {
    client
        .post_json(
            "/api/v1/auth/refresh",
            &RefreshRequest {
                refresh_token: refresh_token.to_string(),
            },
        )
        .await
}

/// Best-effort server-side logout notification.
pub async fn logout(client: &ApiClient) -> Result<()> {
    client.post_empty("/api/v1/auth/logout").await
}

pub async fn register(client: &ApiClient, request: &RegisterRequest) -> Result<Identity> {
    client.post_json("/api/v1/auth/register", request).await
}

pub async fn change_password(
    client: &ApiClient,
    current_password: &str,
    new_password: &str,
) -> Result<()> {
    client
        .post_unit(
            "/api/v1/auth/change-password",
            &ChangePasswordRequest {
                current_password: current_password.to_string(),
                new_password: new_password.to_string(),
            },
        )
        .await
}

pub async fn check_username(client: &ApiClient, username: &str) -> Result<bool> {
    let availability: Availability = client
        .get_json(&format!("/api/v1/auth/check-username/{username}"))
        .await?;
    Ok(availability.available)
}

pub async fn check_email(client: &ApiClient, email: &str) -> Result<bool> {
    let availability: Availability = client
        .get_json(&format!("/api/v1/auth/check-email/{email}"))
        .await?;
    Ok(availability.available)
}

pub async fn health(client: &ApiClient) -> Result<Health> {
    client.get_json("/health").await
}
