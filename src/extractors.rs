use crate::config::AppConfig;
use crate::error::AppError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

/// Proof that the request carried a bearer token the identity provider
/// accepted. Extracting this on a route is what makes it admin-only.
pub struct AuthUser;

impl<S> FromRequestParts<S> for AuthUser
where
    reqwest::Client: FromRef<S>,
    AppConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let client = reqwest::Client::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let response = client
            .get(format!("{}/auth/v1/user", config.auth_url))
            .header("apikey", &config.auth_api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Identity provider unreachable: {:?}", e);
                AppError::Unauthorized
            })?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthUser)
    }
}
