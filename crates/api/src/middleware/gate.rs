//! Edge-layer request gate
//!
//! Redirects before handlers run, from transport-level signals only:
//! the path class, the provider-selection cookie, and a
//! provider-specific session check. Vendor failures are swallowed and
//! the request passes through; the in-app route guard stays the final
//! authority.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use authgate_auth::{
    sign_in_redirect, AuthService, ProviderTag, SessionVerifier, SupabaseProvider,
    AUTH_PROVIDER_COOKIE, SIGN_IN_PATH,
};

use crate::routes::{classify_path, RouteClass, AUTHENTICATED_LANDING};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub supabase: Arc<SupabaseProvider>,
    pub verifier: Arc<dyn SessionVerifier>,
    pub default_provider: ProviderTag,
}

pub async fn request_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let class = classify_path(&path);
    if class == RouteClass::Unclassified {
        return next.run(request).await;
    }

    let provider = jar
        .get(AUTH_PROVIDER_COOKIE)
        .and_then(|cookie| cookie.value().parse::<ProviderTag>().ok())
        .unwrap_or(state.default_provider);

    let authenticated = match state.verifier.is_authenticated(provider, &jar).await {
        Ok(authenticated) => authenticated,
        Err(err) => {
            // Fail open; the route guard makes the final call.
            tracing::warn!(provider = %provider, path = %path, error = %err, "session check failed; allowing request through");
            return next.run(request).await;
        }
    };

    match class {
        RouteClass::Protected if !authenticated => {
            Redirect::temporary(&sign_in_redirect(SIGN_IN_PATH, &path)).into_response()
        }
        RouteClass::PublicAuth if authenticated => {
            Redirect::temporary(AUTHENTICATED_LANDING).into_response()
        }
        _ => next.run(request).await,
    }
}
