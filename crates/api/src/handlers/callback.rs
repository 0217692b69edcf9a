//! OAuth callback endpoint
//!
//! Inbound leg of the federated redirect flow: exchanges the vendor's
//! `code` for a session, then lands on the home page. Failures land on
//! the error page instead of surfacing to the caller.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use authgate_auth::ProviderTag;

use crate::middleware::AppState;

const ERROR_LANDING: &str = "/auth/error?message=Could%20not%20authenticate%20user";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    let Some(code) = query.code else {
        // Nothing to exchange; fall through to the home page.
        return (jar, Redirect::temporary("/"));
    };

    match state.supabase.exchange_code(&code).await {
        Ok(session) => {
            let jar = super::auth::session_cookies(jar, ProviderTag::Supabase, &session);
            (jar, Redirect::temporary("/"))
        }
        Err(err) => {
            tracing::error!(error = %err, "auth callback code exchange failed");
            (jar, Redirect::temporary(ERROR_LANDING))
        }
    }
}
