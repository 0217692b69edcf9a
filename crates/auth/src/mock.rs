//! Programmable mock provider and federated flow
//!
//! Mirrors the real adapters' observable behavior: emits session
//! events, keeps a current-user snapshot, and lets tests script
//! failures and federated-flow outcomes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::Mutex;
use url::Url;

use crate::error::AuthError;
use crate::provider::{
    AuthProvider, FederatedFlow, FederatedOutcome, SessionEvents, SessionSubscription,
};
use crate::types::{
    FirebaseUser, ProviderTag, SupabaseUser, SupabaseUserMetadata, VendorSession, VendorUser,
};

/// Mock provider adapter for tests.
pub struct MockProvider {
    tag: ProviderTag,
    events: SessionEvents,
    current: Mutex<Option<VendorUser>>,
    next_error: Mutex<Option<AuthError>>,
    subscribe_error: StdMutex<Option<AuthError>>,
    federated_outcome: Mutex<FederatedOutcome>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(tag: ProviderTag) -> Self {
        Self {
            tag,
            events: SessionEvents::new(),
            current: Mutex::new(None),
            next_error: Mutex::new(None),
            subscribe_error: StdMutex::new(None),
            federated_outcome: Mutex::new(FederatedOutcome::Credential(
                "mock-credential".to_string(),
            )),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn firebase() -> Self {
        Self::new(ProviderTag::Firebase)
    }

    pub fn supabase() -> Self {
        Self::new(ProviderTag::Supabase)
    }

    /// Fail the next unified operation with `error`.
    pub async fn fail_next(&self, error: AuthError) {
        *self.next_error.lock().await = Some(error);
    }

    /// Fail the next `subscribe` with `error`.
    pub fn fail_subscribe(&self, error: AuthError) {
        *self.subscribe_error.lock().expect("lock poisoned") = Some(error);
    }

    pub async fn set_federated_outcome(&self, outcome: FederatedOutcome) {
        *self.federated_outcome.lock().await = outcome;
    }

    /// Emit a session transition as the vendor would.
    pub async fn emit(&self, user: Option<VendorUser>) {
        *self.current.lock().await = user.clone();
        self.events.emit(user);
    }

    /// Number of unified operations dispatched to this adapter.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Vendor user in this adapter's native shape.
    pub fn vendor_user(&self, id: &str) -> VendorUser {
        match self.tag {
            ProviderTag::Firebase => VendorUser::Firebase(FirebaseUser {
                uid: id.to_string(),
                email: Some(format!("{}@example.com", id)),
                display_name: Some("Mock User".to_string()),
                photo_url: None,
            }),
            ProviderTag::Supabase => VendorUser::Supabase(SupabaseUser {
                id: id.to_string(),
                email: Some(format!("{}@example.com", id)),
                user_metadata: SupabaseUserMetadata {
                    full_name: Some("Mock User".to_string()),
                    avatar_url: None,
                },
            }),
        }
    }

    fn session_for(&self, user: VendorUser) -> VendorSession {
        VendorSession {
            user,
            access_token: Some(format!("mock-{}-token", self.tag)),
            refresh_token: None,
            expires_at: None,
        }
    }

    async fn take_error(&self) -> Option<AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.next_error.lock().await.take()
    }

    async fn establish(&self, id: &str) -> VendorSession {
        let user = self.vendor_user(id);
        self.emit(Some(user.clone())).await;
        self.session_for(user)
    }
}

#[async_trait]
impl AuthProvider for MockProvider {
    fn tag(&self) -> ProviderTag {
        self.tag
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<VendorSession, AuthError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.establish(email).await)
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<VendorSession, AuthError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.establish(email).await)
    }

    async fn sign_in_federated(&self) -> Result<VendorSession, AuthError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        match self.federated_outcome.lock().await.clone() {
            FederatedOutcome::Credential(_) => Ok(self.establish("federated-user").await),
            FederatedOutcome::Dismissed => Err(AuthError::PopupClosed),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        self.emit(None).await;
        Ok(())
    }

    async fn reset_password(&self, _email: &str) -> Result<(), AuthError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<VendorUser>, AuthError> {
        Ok(self.current.lock().await.clone())
    }

    fn subscribe(&self) -> Result<SessionSubscription, AuthError> {
        if let Some(error) = self.subscribe_error.lock().expect("lock poisoned").take() {
            return Err(error);
        }
        Ok(self.events.subscribe())
    }
}

/// Mock federated flow resolving with a scripted outcome.
pub struct MockFederatedFlow {
    outcome: Mutex<FederatedOutcome>,
}

impl MockFederatedFlow {
    pub fn with_credential(credential: &str) -> Self {
        Self {
            outcome: Mutex::new(FederatedOutcome::Credential(credential.to_string())),
        }
    }

    pub fn dismissed() -> Self {
        Self {
            outcome: Mutex::new(FederatedOutcome::Dismissed),
        }
    }

    pub async fn set_outcome(&self, outcome: FederatedOutcome) {
        *self.outcome.lock().await = outcome;
    }
}

#[async_trait]
impl FederatedFlow for MockFederatedFlow {
    async fn run(&self, _authorize_url: Url) -> Result<FederatedOutcome, AuthError> {
        Ok(self.outcome.lock().await.clone())
    }
}
