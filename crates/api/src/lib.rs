//! HTTP surface for the unified auth layer

pub mod handlers;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};

use authgate_auth::{
    AuthConfig, AuthProvider, AuthService, FederatedFlow, FirebaseProvider, SupabaseProvider,
    VendorSessionVerifier,
};
use middleware::AppState;

/// Create the application router over the real vendor adapters, with
/// the request gate installed.
pub fn create_app(config: &AuthConfig, flow: Arc<dyn FederatedFlow>) -> Router {
    let firebase = Arc::new(FirebaseProvider::new(config, Arc::clone(&flow)));
    let supabase = Arc::new(SupabaseProvider::new(config, flow));

    let auth = Arc::new(AuthService::with_adapters(
        Arc::clone(&firebase) as Arc<dyn AuthProvider>,
        Arc::clone(&supabase) as Arc<dyn AuthProvider>,
        config.default_provider,
    ));

    let state = AppState {
        auth,
        supabase,
        verifier: Arc::new(VendorSessionVerifier::new(config)),
        default_provider: config.default_provider,
    };

    app_with_state(state)
}

/// Router over an explicit state; tests inject adapters and verifiers
/// here.
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/", axum::routing::get(|| async { "Authgate" }))
        .route("/health", axum::routing::get(health_check))
        .merge(routes::create_routes())
        .layer(from_fn_with_state(state.clone(), middleware::request_gate))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
