//! Request gate scenarios over the full router with stub vendors

mod common;

use authgate_auth::ProviderTag;
use axum::http::StatusCode;
use common::{get_request, location, send, test_app, OUTAGE_SUPABASE_TOKEN, VALID_SUPABASE_TOKEN};

#[tokio::test]
async fn test_protected_path_redirects_without_session() {
    let app = test_app(ProviderTag::Firebase).await;

    let response = send(&app.router, get_request("/dashboard", None)).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/auth/signin?redirect=%2Fdashboard");
}

#[tokio::test]
async fn test_nested_protected_path_preserved_in_redirect() {
    let app = test_app(ProviderTag::Firebase).await;

    let response = send(
        &app.router,
        get_request("/dashboard/reports", Some("auth_provider=firebase")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "/auth/signin?redirect=%2Fdashboard%2Freports"
    );
}

#[tokio::test]
async fn test_firebase_cookie_presence_allows_protected_path() {
    let app = test_app(ProviderTag::Firebase).await;

    // Presence check only: any value passes the gate.
    let response = send(
        &app.router,
        get_request("/dashboard", Some("firebase_session=anything")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_auth_redirects_authenticated_visitor() {
    let app = test_app(ProviderTag::Supabase).await;

    let cookies = format!(
        "auth_provider=supabase; sb-access-token={}",
        VALID_SUPABASE_TOKEN
    );
    let response = send(&app.router, get_request("/auth/signin", Some(&cookies))).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_supabase_invalid_token_redirects_to_signin() {
    let app = test_app(ProviderTag::Supabase).await;

    let response = send(
        &app.router,
        get_request(
            "/dashboard",
            Some("auth_provider=supabase; sb-access-token=garbage"),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/auth/signin?redirect=%2Fdashboard");
}

// A vendor outage during the session check must not become a site
// outage: the gate lets the request through.
#[tokio::test]
async fn test_vendor_error_fails_open() {
    let app = test_app(ProviderTag::Supabase).await;

    let cookies = format!(
        "auth_provider=supabase; sb-access-token={}",
        OUTAGE_SUPABASE_TOKEN
    );
    let response = send(&app.router, get_request("/dashboard", Some(&cookies))).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unclassified_paths_pass_through() {
    let app = test_app(ProviderTag::Firebase).await;

    let response = send(&app.router, get_request("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app.router, get_request("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Unknown path: no auth logic, plain 404.
    let response = send(&app.router, get_request("/about", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_provider_cookie_overrides_default() {
    // Default is supabase, but the request selects firebase and
    // carries its session cookie.
    let app = test_app(ProviderTag::Supabase).await;

    let response = send(
        &app.router,
        get_request(
            "/dashboard",
            Some("auth_provider=firebase; firebase_session=anything"),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_provider_cookie_falls_back_to_default() {
    let app = test_app(ProviderTag::Firebase).await;

    let response = send(
        &app.router,
        get_request(
            "/dashboard",
            Some("auth_provider=okta; firebase_session=anything"),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}
