//! Configuration loaded from environment variables

use std::env;

use crate::error::AuthError;
use crate::types::ProviderTag;

/// Authentication configuration.
///
/// Vendor endpoints and keys for both adapters plus the process-wide
/// default provider selection (overridable per request by cookie).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub firebase_api_key: String,
    /// Override for the Identity Toolkit endpoint; tests point this at
    /// a stub server.
    pub firebase_base_url: Option<String>,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub default_provider: ProviderTag,
    /// Public origin of this application, used for vendor redirect
    /// targets.
    pub site_url: String,
    pub port: u16,
}

impl AuthConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            firebase_api_key: env::var("FIREBASE_API_KEY").map_err(|_| {
                AuthError::Configuration("FIREBASE_API_KEY is required".to_string())
            })?,
            firebase_base_url: env::var("FIREBASE_AUTH_BASE_URL").ok(),

            supabase_url: env::var("SUPABASE_URL")
                .map_err(|_| AuthError::Configuration("SUPABASE_URL is required".to_string()))?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY").map_err(|_| {
                AuthError::Configuration("SUPABASE_ANON_KEY is required".to_string())
            })?,

            default_provider: match env::var("AUTH_PROVIDER") {
                Ok(value) => value.parse()?,
                Err(_) => ProviderTag::Firebase,
            },

            site_url: env::var("SITE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }
}
