//! Route definitions and path classification

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::AppState};

/// Routes requiring an authenticated session.
pub const PROTECTED_ROUTES: &[&str] = &["/dashboard", "/profile", "/settings"];

/// Auth routes that signed-in users are redirected away from.
pub const PUBLIC_AUTH_ROUTES: &[&str] = &[
    "/auth/signin",
    "/auth/signup",
    "/auth/reset-password",
    "/auth/callback",
];

/// Landing location for already-authenticated visitors.
pub const AUTHENTICATED_LANDING: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    PublicAuth,
    Unclassified,
}

/// Classify a request path against the two disjoint route lists:
/// exact match or a full path segment under a listed prefix.
pub fn classify_path(path: &str) -> RouteClass {
    if matches_any(path, PROTECTED_ROUTES) {
        return RouteClass::Protected;
    }
    if matches_any(path, PUBLIC_AUTH_ROUTES) {
        return RouteClass::PublicAuth;
    }
    RouteClass::Unclassified
}

fn matches_any(path: &str, routes: &[&str]) -> bool {
    routes.iter().any(|route| {
        path == *route
            || path
                .strip_prefix(route)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Create unified auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(handlers::auth::sign_up))
        .route("/auth/signin", post(handlers::auth::sign_in))
        .route("/auth/signout", post(handlers::auth::sign_out))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route("/auth/session", get(handlers::auth::session))
        .route("/auth/callback", get(handlers::callback::callback))
}

/// Create protected page routes
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::pages::dashboard))
        .route("/profile", get(handlers::pages::profile))
        .route("/settings", get(handlers::pages::settings))
}

/// Create all API routes
pub fn create_routes() -> Router<AppState> {
    Router::new().merge(auth_routes()).merge(page_routes())
}
