//! Firebase Authentication adapter
//!
//! Calls the Identity Toolkit REST API
//! (https://identitytoolkit.googleapis.com) using reqwest, with the API
//! key carried in the query string as the vendor requires.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::provider::{
    AuthProvider, FederatedFlow, FederatedOutcome, SessionEvents, SessionSubscription,
};
use crate::types::{FirebaseUser, ProviderTag, VendorSession, VendorUser};

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "returnSecureToken")]
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
struct IdpRequest {
    #[serde(rename = "requestUri")]
    request_uri: String,
    #[serde(rename = "postBody")]
    post_body: String,
    #[serde(rename = "returnSecureToken")]
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
struct OobRequest<'a> {
    #[serde(rename = "requestType")]
    request_type: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(rename = "localId")]
    local_id: String,
    email: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "photoUrl")]
    photo_url: Option<String>,
    #[serde(rename = "idToken")]
    id_token: Option<String>,
    #[serde(rename = "refreshToken")]
    refresh_token: Option<String>,
    #[serde(rename = "expiresIn")]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OobResponse {
    #[allow(dead_code)]
    email: Option<String>,
}

/// Identity Toolkit error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Firebase Authentication adapter.
pub struct FirebaseProvider {
    client: Client,
    api_key: String,
    base_url: String,
    site_url: String,
    flow: Arc<dyn FederatedFlow>,
    events: SessionEvents,
    session: Mutex<Option<VendorSession>>,
}

impl FirebaseProvider {
    pub fn new(config: &AuthConfig, flow: Arc<dyn FederatedFlow>) -> Self {
        let base_url = config
            .firebase_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            client: Client::new(),
            api_key: config.firebase_api_key.clone(),
            base_url,
            site_url: config.site_url.clone(),
            flow,
            events: SessionEvents::new(),
            session: Mutex::new(None),
        }
    }

    fn endpoint(&self, operation: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.base_url, operation, self.api_key
        )
    }

    async fn post_account<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &impl Serialize,
    ) -> Result<T, AuthError> {
        let response = self
            .client
            .post(self.endpoint(operation))
            .json(body)
            .send()
            .await
            .map_err(AuthError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_api_error(status, &error_body));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("malformed Firebase response: {}", e)))
    }

    fn session_from(&self, account: AccountResponse) -> VendorSession {
        let expires_at = account
            .expires_in
            .as_deref()
            .and_then(|seconds| seconds.parse::<i64>().ok())
            .map(|seconds| Utc::now() + Duration::seconds(seconds));

        VendorSession {
            user: VendorUser::Firebase(FirebaseUser {
                uid: account.local_id,
                email: account.email,
                display_name: account.display_name,
                photo_url: account.photo_url,
            }),
            access_token: account.id_token,
            refresh_token: account.refresh_token,
            expires_at,
        }
    }

    /// Record the new session locally and notify listeners.
    async fn install(&self, session: VendorSession) -> VendorSession {
        *self.session.lock().await = Some(session.clone());
        self.events.emit(Some(session.user.clone()));
        session
    }

    fn authorize_url(&self) -> Result<Url, AuthError> {
        let mut url = Url::parse(GOOGLE_AUTHORIZE_URL)
            .map_err(|e| AuthError::Provider(format!("invalid authorize URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("redirect_uri", &format!("{}/auth/callback", self.site_url));
        Ok(url)
    }
}

#[async_trait]
impl AuthProvider for FirebaseProvider {
    fn tag(&self) -> ProviderTag {
        ProviderTag::Firebase
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<VendorSession, AuthError> {
        tracing::debug!(provider = "firebase", "sign-up request");
        let account: AccountResponse = self
            .post_account(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        Ok(self.install(self.session_from(account)).await)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<VendorSession, AuthError> {
        tracing::debug!(provider = "firebase", "sign-in request");
        let account: AccountResponse = self
            .post_account(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        Ok(self.install(self.session_from(account)).await)
    }

    async fn sign_in_federated(&self) -> Result<VendorSession, AuthError> {
        match self.flow.run(self.authorize_url()?).await? {
            FederatedOutcome::Credential(id_token) => {
                let account: AccountResponse = self
                    .post_account(
                        "signInWithIdp",
                        &IdpRequest {
                            request_uri: format!("{}/auth/callback", self.site_url),
                            post_body: format!("id_token={}&providerId=google.com", id_token),
                            return_secure_token: true,
                        },
                    )
                    .await?;

                Ok(self.install(self.session_from(account)).await)
            }
            FederatedOutcome::Dismissed => Err(AuthError::PopupClosed),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // The Firebase client SDK signs out locally; there is no
        // revocation call to make here.
        *self.session.lock().await = None;
        self.events.emit(None);
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let result: Result<OobResponse, AuthError> = self
            .post_account(
                "sendOobCode",
                &OobRequest {
                    request_type: "PASSWORD_RESET",
                    email,
                },
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            // EMAIL_NOT_FOUND collapses to success: unknown addresses
            // must be indistinguishable from known ones.
            Err(AuthError::InvalidCredentials) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn current_user(&self) -> Result<Option<VendorUser>, AuthError> {
        // Local snapshot, no network; the synchronous vendor of the
        // pair behind the uniform async signature.
        Ok(self
            .session
            .lock()
            .await
            .as_ref()
            .map(|session| session.user.clone()))
    }

    fn subscribe(&self) -> Result<SessionSubscription, AuthError> {
        Ok(self.events.subscribe())
    }
}

fn map_api_error(status: reqwest::StatusCode, body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("Firebase API returned {}", status));

    // Identity Toolkit codes sometimes carry a suffix, e.g.
    // "WEAK_PASSWORD : Password should be at least 6 characters".
    let code = message.split_whitespace().next().unwrap_or("");

    match code {
        "EMAIL_EXISTS" | "INVALID_EMAIL" | "MISSING_EMAIL" | "MISSING_PASSWORD"
        | "WEAK_PASSWORD" => AuthError::Validation(message),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthError::InvalidCredentials
        }
        _ => AuthError::Provider(message),
    }
}
