//! Unified auth facade
//!
//! Holds the currently selected provider tag and forwards each unified
//! operation to the matching adapter. Exactly one adapter serves any
//! given call; the tag is read once at dispatch.

use std::sync::{Arc, RwLock};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::firebase::FirebaseProvider;
use crate::provider::{AuthProvider, FederatedFlow, SessionSubscription};
use crate::supabase::SupabaseProvider;
use crate::types::{ProviderTag, VendorSession, VendorUser};

/// Provider-switchable authentication facade.
pub struct AuthService {
    provider: RwLock<ProviderTag>,
    firebase: Arc<dyn AuthProvider>,
    supabase: Arc<dyn AuthProvider>,
}

impl AuthService {
    /// Build the facade over the two real vendor adapters.
    pub fn new(config: &AuthConfig, flow: Arc<dyn FederatedFlow>) -> Self {
        Self::with_adapters(
            Arc::new(FirebaseProvider::new(config, Arc::clone(&flow))),
            Arc::new(SupabaseProvider::new(config, flow)),
            config.default_provider,
        )
    }

    /// Inject adapters directly; tests swap in mocks here.
    pub fn with_adapters(
        firebase: Arc<dyn AuthProvider>,
        supabase: Arc<dyn AuthProvider>,
        default_provider: ProviderTag,
    ) -> Self {
        Self {
            provider: RwLock::new(default_provider),
            firebase,
            supabase,
        }
    }

    pub fn provider(&self) -> ProviderTag {
        *self.provider.read().expect("provider lock poisoned")
    }

    /// Select the active provider, effective for every subsequent call.
    /// Any live session listener is untouched; swapping it belongs to
    /// the session context observing this change.
    pub fn set_provider(&self, tag: ProviderTag) {
        *self.provider.write().expect("provider lock poisoned") = tag;
    }

    /// Adapter backing the current tag.
    pub fn adapter(&self) -> Arc<dyn AuthProvider> {
        self.adapter_for(self.provider())
    }

    pub fn adapter_for(&self, tag: ProviderTag) -> Arc<dyn AuthProvider> {
        match tag {
            ProviderTag::Firebase => Arc::clone(&self.firebase),
            ProviderTag::Supabase => Arc::clone(&self.supabase),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<VendorSession, AuthError> {
        self.adapter().sign_up(email, password).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<VendorSession, AuthError> {
        self.adapter().sign_in(email, password).await
    }

    pub async fn sign_in_federated(&self) -> Result<VendorSession, AuthError> {
        self.adapter().sign_in_federated().await
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.adapter().sign_out().await
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.adapter().reset_password(email).await
    }

    pub async fn current_user(&self) -> Result<Option<VendorUser>, AuthError> {
        self.adapter().current_user().await
    }

    pub fn subscribe(&self) -> Result<SessionSubscription, AuthError> {
        self.adapter().subscribe()
    }
}
