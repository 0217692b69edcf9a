//! Unified auth endpoints
//!
//! Thin JSON surface over the facade: each endpoint dispatches to the
//! selected provider, persists the resulting session in cookies, and
//! reports failures with the shared error taxonomy.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

use authgate_auth::{
    AuthError, NormalizedUser, ProviderTag, VendorSession, AUTH_PROVIDER_COOKIE,
    FIREBASE_SESSION_COOKIE, SUPABASE_SESSION_COOKIE,
};

use crate::middleware::AppState;
use crate::routes::AUTHENTICATED_LANDING;

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub provider: Option<ProviderTag>,
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub user: NormalizedUser,
    pub redirect_to: String,
}

/// Apply a per-request provider selection before dispatching.
fn select_provider(state: &AppState, query: &AuthQuery) -> ProviderTag {
    match query.provider {
        Some(provider) => {
            state.auth.set_provider(provider);
            provider
        }
        None => state.auth.provider(),
    }
}

/// Persist the provider choice and, when the vendor issued tokens, the
/// session itself.
pub(crate) fn session_cookies(
    jar: CookieJar,
    provider: ProviderTag,
    session: &VendorSession,
) -> CookieJar {
    let jar = jar.add(provider_cookie(provider));

    match (provider, session.access_token.as_deref()) {
        (ProviderTag::Firebase, Some(token)) => jar.add(http_cookie(FIREBASE_SESSION_COOKIE, token)),
        (ProviderTag::Supabase, Some(token)) => jar.add(http_cookie(SUPABASE_SESSION_COOKIE, token)),
        (_, None) => jar,
    }
}

fn http_cookie(name: &str, value: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .http_only(true)
        .build()
}

/// Read by the request gate and client scripts alike; not HttpOnly.
fn provider_cookie(provider: ProviderTag) -> Cookie<'static> {
    Cookie::build((AUTH_PROVIDER_COOKIE, provider.to_string()))
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<AuthQuery>,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, AuthError> {
    let provider = select_provider(&state, &query);
    let session = state.auth.sign_up(&body.email, &body.password).await?;

    let user = NormalizedUser::from_vendor(&session.user);
    let jar = session_cookies(jar, provider, &session);

    Ok((StatusCode::CREATED, jar, Json(user)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<AuthQuery>,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, AuthError> {
    let provider = select_provider(&state, &query);
    let session = state.auth.sign_in(&body.email, &body.password).await?;

    let user = NormalizedUser::from_vendor(&session.user);
    let jar = session_cookies(jar, provider, &session);

    // Post-sign-in navigation honors the `redirect` parameter set by
    // the gate, falling back to the authenticated landing page.
    let redirect_to = query
        .redirect
        .unwrap_or_else(|| AUTHENTICATED_LANDING.to_string());

    Ok((jar, Json(SignInResponse { user, redirect_to })))
}

pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<AuthQuery>,
) -> Result<impl IntoResponse, AuthError> {
    select_provider(&state, &query);
    state.auth.sign_out().await?;

    let jar = jar
        .remove(removal_cookie(FIREBASE_SESSION_COOKIE))
        .remove(removal_cookie(SUPABASE_SESSION_COOKIE))
        .remove(removal_cookie(AUTH_PROVIDER_COOKIE));

    Ok((jar, Json(serde_json::json!({ "signed_out": true }))))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
    Json(body): Json<EmailBody>,
) -> Result<impl IntoResponse, AuthError> {
    select_provider(&state, &query);
    state.auth.reset_password(&body.email).await?;

    // Same response whether or not the address exists.
    Ok(Json(serde_json::json!({
        "message": "Check your email for a password reset link"
    })))
}

pub async fn session(State(state): State<AppState>) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .auth
        .current_user()
        .await?
        .as_ref()
        .map(NormalizedUser::from_vendor);

    Ok(Json(serde_json::json!({ "user": user })))
}
