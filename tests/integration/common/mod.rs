//! Shared harness for integration tests
//!
//! Spins in-process stub vendor backends (Identity Toolkit and GoTrue
//! lookalikes) on ephemeral ports and builds the application router
//! against them, so tests exercise the real adapters over real HTTP
//! without touching either vendor.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Json, Query},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, Request, StatusCode,
    },
    response::Response,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use authgate_auth::{mock::MockFederatedFlow, AuthConfig, ProviderTag};

/// Token the stub GoTrue `/user` endpoint accepts.
pub const VALID_SUPABASE_TOKEN: &str = "supabase-access-token";
/// Token that makes the stub `/user` endpoint fail server-side.
pub const OUTAGE_SUPABASE_TOKEN: &str = "trigger-500";

pub struct StubVendors {
    pub firebase_url: String,
    pub supabase_url: String,
}

pub struct TestApp {
    pub router: Router,
    pub config: AuthConfig,
}

/// Build the full application against freshly spawned stub vendors.
pub async fn test_app(default_provider: ProviderTag) -> TestApp {
    let vendors = spawn_stub_vendors().await;
    let config = test_config(&vendors, default_provider);
    let router = authgate_api::create_app(
        &config,
        Arc::new(MockFederatedFlow::with_credential("google-id-token")),
    );

    TestApp { router, config }
}

pub fn test_config(vendors: &StubVendors, default_provider: ProviderTag) -> AuthConfig {
    AuthConfig {
        firebase_api_key: "test-api-key".to_string(),
        firebase_base_url: Some(vendors.firebase_url.clone()),
        supabase_url: vendors.supabase_url.clone(),
        supabase_anon_key: "test-anon-key".to_string(),
        default_provider,
        site_url: "http://localhost:3000".to_string(),
        port: 0,
    }
}

pub async fn spawn_stub_vendors() -> StubVendors {
    StubVendors {
        firebase_url: spawn(stub_firebase_router()).await,
        supabase_url: spawn(stub_supabase_router()).await,
    }
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{}", addr)
}

// ---------------------------------------------------------------------
// Stub Identity Toolkit backend

fn stub_firebase_router() -> Router {
    Router::new()
        .route("/v1/accounts:signUp", post(firebase_sign_up))
        .route("/v1/accounts:signInWithPassword", post(firebase_sign_in))
        .route("/v1/accounts:sendOobCode", post(firebase_send_oob))
        .route("/v1/accounts:signInWithIdp", post(firebase_sign_in_idp))
}

fn firebase_account(email: &str, display_name: &str) -> Value {
    json!({
        "localId": "firebase-uid-1",
        "email": email,
        "displayName": display_name,
        "photoUrl": "https://example.com/avatar.png",
        "idToken": "firebase-id-token",
        "refreshToken": "firebase-refresh",
        "expiresIn": "3600",
    })
}

fn firebase_error(code: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": { "code": 400, "message": code } })),
    )
}

async fn firebase_sign_up(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if email == "taken@example.com" {
        return firebase_error("EMAIL_EXISTS");
    }
    (StatusCode::OK, Json(firebase_account(&email, "Test User")))
}

async fn firebase_sign_in(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"].as_str() == Some("wrong-password") {
        return firebase_error("INVALID_LOGIN_CREDENTIALS");
    }
    let email = body["email"].as_str().unwrap_or_default().to_string();
    (StatusCode::OK, Json(firebase_account(&email, "Test User")))
}

async fn firebase_send_oob(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if email == "nonexistent@x.com" {
        return firebase_error("EMAIL_NOT_FOUND");
    }
    (StatusCode::OK, Json(json!({ "email": email })))
}

async fn firebase_sign_in_idp(Json(_body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(firebase_account("federated@example.com", "Federated User")),
    )
}

// ---------------------------------------------------------------------
// Stub GoTrue backend

fn stub_supabase_router() -> Router {
    Router::new()
        .route("/auth/v1/token", post(supabase_token))
        .route("/auth/v1/signup", post(supabase_sign_up))
        .route("/auth/v1/recover", post(supabase_recover))
        .route("/auth/v1/logout", post(supabase_logout))
        .route("/auth/v1/user", get(supabase_user_endpoint))
}

fn supabase_user(email: &str) -> Value {
    json!({
        "id": "supabase-uid-1",
        "email": email,
        "user_metadata": {
            "full_name": "Test User",
            "avatar_url": "https://example.com/avatar.png",
        },
    })
}

fn supabase_session(email: &str) -> Value {
    json!({
        "access_token": VALID_SUPABASE_TOKEN,
        "refresh_token": "supabase-refresh",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": supabase_user(email),
    })
}

async fn supabase_token(
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    match params.get("grant_type").map(String::as_str) {
        Some("password") => {
            if body["password"].as_str() == Some("wrong-password") {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_grant",
                        "error_description": "Invalid login credentials",
                    })),
                );
            }
            let email = body["email"].as_str().unwrap_or_default().to_string();
            (StatusCode::OK, Json(supabase_session(&email)))
        }
        Some("pkce") => {
            if body["auth_code"].as_str() == Some("valid-code") {
                (StatusCode::OK, Json(supabase_session("federated@example.com")))
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "msg": "invalid flow state, no valid flow state found" })),
                )
            }
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "msg": "unsupported grant type" })),
        ),
    }
}

async fn supabase_sign_up(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if email == "taken@example.com" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "code": 422, "msg": "User already registered" })),
        );
    }
    if email.starts_with("pending") {
        // Email confirmation pending: bare user record, no session.
        return (StatusCode::OK, Json(supabase_user(&email)));
    }
    (StatusCode::OK, Json(supabase_session(&email)))
}

async fn supabase_recover(Json(_body): Json<Value>) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({})))
}

async fn supabase_logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn supabase_user_endpoint(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();

    if token == OUTAGE_SUPABASE_TOKEN {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "msg": "internal error" })),
        );
    }
    if token == VALID_SUPABASE_TOKEN {
        return (StatusCode::OK, Json(supabase_user("user@example.com")));
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "msg": "invalid JWT" })),
    )
}

// ---------------------------------------------------------------------
// Request helpers

pub fn get_request(uri: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookies) = cookies {
        builder = builder.header(COOKIE, cookies);
    }
    builder.body(Body::empty()).expect("build request")
}

pub fn post_json_request(uri: &str, body: Value, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookies) = cookies {
        builder = builder.header(COOKIE, cookies);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("build request")
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router call failed")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is json")
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .expect("response has no Location header")
        .to_str()
        .expect("Location is not utf-8")
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}
