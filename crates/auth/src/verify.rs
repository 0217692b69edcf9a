//! Request-scoped session checks
//!
//! Answers "is this request authenticated" from cookies alone, for the
//! edge-layer request gate. The two vendors check differently: Supabase
//! validates the token against the backend, Firebase is a cookie
//! presence check only.

use async_trait::async_trait;
use axum_extra::extract::cookie::CookieJar;
use reqwest::Client;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::types::ProviderTag;

/// Cookie carrying the active provider selection.
pub const AUTH_PROVIDER_COOKIE: &str = "auth_provider";

/// Opaque Firebase session cookie; vendor-managed.
pub const FIREBASE_SESSION_COOKIE: &str = "firebase_session";

/// Supabase access-token cookie.
pub const SUPABASE_SESSION_COOKIE: &str = "sb-access-token";

/// Request-scoped authentication check for the request gate.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn is_authenticated(
        &self,
        provider: ProviderTag,
        jar: &CookieJar,
    ) -> Result<bool, AuthError>;
}

/// Vendor-backed verifier.
pub struct VendorSessionVerifier {
    client: Client,
    supabase_url: String,
    supabase_anon_key: String,
}

impl VendorSessionVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::new(),
            supabase_url: config.supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key: config.supabase_anon_key.clone(),
        }
    }

    async fn check_supabase(&self, jar: &CookieJar) -> Result<bool, AuthError> {
        let Some(cookie) = jar.get(SUPABASE_SESSION_COOKIE) else {
            return Ok(false);
        };

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.supabase_url))
            .header("apikey", &self.supabase_anon_key)
            .bearer_auth(cookie.value())
            .send()
            .await
            .map_err(AuthError::from_reqwest)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "Supabase session check returned {}",
                status
            )));
        }

        Ok(true)
    }
}

#[async_trait]
impl SessionVerifier for VendorSessionVerifier {
    async fn is_authenticated(
        &self,
        provider: ProviderTag,
        jar: &CookieJar,
    ) -> Result<bool, AuthError> {
        match provider {
            // Presence check only; the cookie value is never verified
            // here. Weaker than the Supabase path; the in-app route
            // guard stays the final authority.
            ProviderTag::Firebase => Ok(jar.get(FIREBASE_SESSION_COOKIE).is_some()),
            ProviderTag::Supabase => self.check_supabase(jar).await,
        }
    }
}
