//! Core data types shared across the authentication layer

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Identity vendor backing the unified interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTag {
    Firebase,
    Supabase,
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderTag::Firebase => write!(f, "firebase"),
            ProviderTag::Supabase => write!(f, "supabase"),
        }
    }
}

impl FromStr for ProviderTag {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firebase" => Ok(ProviderTag::Firebase),
            "supabase" => Ok(ProviderTag::Supabase),
            other => Err(AuthError::Validation(format!(
                "unknown auth provider: {}",
                other
            ))),
        }
    }
}

/// Firebase account record (Identity Toolkit shape).
#[derive(Debug, Clone, PartialEq)]
pub struct FirebaseUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Supabase user record (GoTrue shape).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SupabaseUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: SupabaseUserMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SupabaseUserMetadata {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// A user record in the shape the producing vendor returned it.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorUser {
    Firebase(FirebaseUser),
    Supabase(SupabaseUser),
}

impl VendorUser {
    pub fn tag(&self) -> ProviderTag {
        match self {
            VendorUser::Firebase(_) => ProviderTag::Firebase,
            VendorUser::Supabase(_) => ProviderTag::Supabase,
        }
    }
}

/// Vendor session: the authenticated user plus the tokens the vendor
/// issued. Tokens are absent when the vendor withheld them (Supabase
/// sign-up pending email confirmation).
#[derive(Debug, Clone)]
pub struct VendorSession {
    pub user: VendorUser,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Vendor-agnostic user shape handed to the UI layer.
///
/// Recomputed from the vendor record on every session-change
/// notification; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub provider: ProviderTag,
}

impl NormalizedUser {
    /// Map a vendor user record onto the common shape. The `provider`
    /// field always reflects the variant that produced the record.
    pub fn from_vendor(user: &VendorUser) -> Self {
        match user {
            VendorUser::Firebase(u) => Self {
                id: u.uid.clone(),
                email: u.email.clone(),
                display_name: u.display_name.clone(),
                photo_url: u.photo_url.clone(),
                provider: ProviderTag::Firebase,
            },
            VendorUser::Supabase(u) => Self {
                id: u.id.clone(),
                email: u.email.clone(),
                display_name: u.user_metadata.full_name.clone(),
                photo_url: u.user_metadata.avatar_url.clone(),
                provider: ProviderTag::Supabase,
            },
        }
    }
}

/// Session state observed by the UI layer.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub user: Option<NormalizedUser>,
    pub loading: bool,
    pub error: Option<AuthError>,
}

impl SessionState {
    /// State while a listener attach is in flight.
    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
        }
    }

    /// Resolved state from a session-change notification.
    pub fn resolved(user: Option<NormalizedUser>) -> Self {
        Self {
            user,
            loading: false,
            error: None,
        }
    }

    /// Listener setup failed; no user value.
    pub fn failed(error: AuthError) -> Self {
        Self {
            user: None,
            loading: false,
            error: Some(error),
        }
    }

    /// True once the listener has reported, successfully or not.
    pub fn is_resolved(&self) -> bool {
        !self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        !self.loading && self.user.is_some()
    }
}
