//! Supabase authentication adapter
//!
//! Calls the GoTrue REST API under `{SUPABASE_URL}/auth/v1` using
//! reqwest, with the anon key in the `apikey` header and the session
//! token as a bearer where an endpoint requires one.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::provider::{
    AuthProvider, FederatedFlow, FederatedOutcome, SessionEvents, SessionSubscription,
};
use crate::types::{ProviderTag, SupabaseUser, VendorSession, VendorUser};

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    auth_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: Option<SupabaseUser>,
}

/// GoTrue error body; the shape varies by endpoint and version.
#[derive(Debug, Deserialize)]
struct GotrueError {
    error_description: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

/// Supabase authentication adapter.
pub struct SupabaseProvider {
    client: Client,
    base_url: String,
    anon_key: String,
    site_url: String,
    flow: Arc<dyn FederatedFlow>,
    events: SessionEvents,
    session: Mutex<Option<VendorSession>>,
}

impl SupabaseProvider {
    pub fn new(config: &AuthConfig, flow: Arc<dyn FederatedFlow>) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/auth/v1", config.supabase_url.trim_end_matches('/')),
            anon_key: config.supabase_anon_key.clone(),
            site_url: config.site_url.clone(),
            flow,
            events: SessionEvents::new(),
            session: Mutex::new(None),
        }
    }

    async fn post_auth(
        &self,
        path: &str,
        body: &impl Serialize,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, AuthError> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .json(body);

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request.send().await.map_err(AuthError::from_reqwest)
    }

    fn parse_session(&self, value: serde_json::Value) -> Result<VendorSession, AuthError> {
        if value.get("access_token").is_some() {
            let response: SessionResponse = serde_json::from_value(value)
                .map_err(|e| AuthError::Provider(format!("malformed Supabase session: {}", e)))?;
            let user = response
                .user
                .ok_or_else(|| AuthError::Provider("session response missing user".to_string()))?;

            Ok(VendorSession {
                user: VendorUser::Supabase(user),
                access_token: response.access_token,
                refresh_token: response.refresh_token,
                expires_at: response
                    .expires_in
                    .map(|seconds| Utc::now() + Duration::seconds(seconds)),
            })
        } else {
            // Sign-up pending email confirmation returns the bare user
            // record; there is no session yet.
            let user: SupabaseUser = serde_json::from_value(value)
                .map_err(|e| AuthError::Provider(format!("malformed Supabase user: {}", e)))?;

            Ok(VendorSession {
                user: VendorUser::Supabase(user),
                access_token: None,
                refresh_token: None,
                expires_at: None,
            })
        }
    }

    /// Record the new session locally and notify listeners. Sessions
    /// without tokens (confirmation pending) are not a transition.
    async fn install(&self, session: VendorSession) -> VendorSession {
        if session.access_token.is_some() {
            *self.session.lock().await = Some(session.clone());
            self.events.emit(Some(session.user.clone()));
        }
        session
    }

    /// Exchange an OAuth callback `code` for a session (PKCE grant).
    /// Used by the `/auth/callback` endpoint.
    pub async fn exchange_code(&self, code: &str) -> Result<VendorSession, AuthError> {
        let response = self
            .post_auth(
                "/token?grant_type=pkce",
                &ExchangeRequest { auth_code: code },
                None,
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(error_message(status, &body)));
        }

        let value = response.json().await.map_err(AuthError::from_reqwest)?;
        Ok(self.install(self.parse_session(value)?).await)
    }

    fn authorize_url(&self) -> Result<Url, AuthError> {
        let mut url = Url::parse(&format!("{}/authorize", self.base_url))
            .map_err(|e| AuthError::Provider(format!("invalid authorize URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("provider", "google")
            .append_pair("redirect_to", &format!("{}/auth/callback", self.site_url));
        Ok(url)
    }
}

#[async_trait]
impl AuthProvider for SupabaseProvider {
    fn tag(&self) -> ProviderTag {
        ProviderTag::Supabase
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<VendorSession, AuthError> {
        tracing::debug!(provider = "supabase", "sign-up request");
        let response = self
            .post_auth("/signup", &CredentialsRequest { email, password }, None)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                400 | 422 => AuthError::Validation(error_message(status, &body)),
                _ => AuthError::Provider(error_message(status, &body)),
            });
        }

        let value = response.json().await.map_err(AuthError::from_reqwest)?;
        Ok(self.install(self.parse_session(value)?).await)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<VendorSession, AuthError> {
        tracing::debug!(provider = "supabase", "sign-in request");
        let response = self
            .post_auth(
                "/token?grant_type=password",
                &CredentialsRequest { email, password },
                None,
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                400 | 401 => AuthError::InvalidCredentials,
                _ => AuthError::Provider(error_message(status, &body)),
            });
        }

        let value = response.json().await.map_err(AuthError::from_reqwest)?;
        Ok(self.install(self.parse_session(value)?).await)
    }

    async fn sign_in_federated(&self) -> Result<VendorSession, AuthError> {
        match self.flow.run(self.authorize_url()?).await? {
            FederatedOutcome::Credential(code) => self.exchange_code(&code).await,
            FederatedOutcome::Dismissed => Err(AuthError::PopupClosed),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self
            .session
            .lock()
            .await
            .as_ref()
            .and_then(|session| session.access_token.clone());

        if let Some(token) = token {
            let response = self
                .post_auth("/logout", &serde_json::json!({}), Some(&token))
                .await?;

            let status = response.status();
            // 401 means the token already expired server-side; the
            // local sign-out still proceeds.
            if !status.is_success() && status.as_u16() != 401 {
                let body = response.text().await.unwrap_or_default();
                return Err(AuthError::Provider(error_message(status, &body)));
            }
        }

        *self.session.lock().await = None;
        self.events.emit(None);
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .post_auth("/recover", &EmailRequest { email }, None)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(error_message(status, &body)));
        }

        Ok(())
    }

    async fn current_user(&self) -> Result<Option<VendorUser>, AuthError> {
        // Revalidates against the backend; the asynchronous vendor of
        // the pair.
        let token = self
            .session
            .lock()
            .await
            .as_ref()
            .and_then(|session| session.access_token.clone());

        let Some(token) = token else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(AuthError::from_reqwest)?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(error_message(status, &body)));
        }

        let user: SupabaseUser = response.json().await.map_err(AuthError::from_reqwest)?;
        Ok(Some(VendorUser::Supabase(user)))
    }

    fn subscribe(&self) -> Result<SessionSubscription, AuthError> {
        Ok(self.events.subscribe())
    }
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<GotrueError>(body)
        .ok()
        .and_then(|e| e.error_description.or(e.msg).or(e.error))
        .unwrap_or_else(|| format!("Supabase API returned {}", status))
}
