//! Provider adapter contract and session subscription primitives

use async_trait::async_trait;
use tokio::sync::broadcast;
use url::Url;

use crate::error::AuthError;
use crate::types::{ProviderTag, VendorSession, VendorUser};

/// Capacity of each adapter's session-change channel.
const SESSION_EVENT_CAPACITY: usize = 16;

/// Unified per-vendor operation set.
///
/// Both adapters wrap their vendor's REST API behind this contract. All
/// operations go over the network except where noted on the
/// implementation; none of them persist anything locally beyond the
/// adapter's own session snapshot.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn tag(&self) -> ProviderTag;

    async fn sign_up(&self, email: &str, password: &str) -> Result<VendorSession, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<VendorSession, AuthError>;

    /// Interactive federated sign-in. Suspends until the vendor's
    /// browser flow completes; a closed window resolves to
    /// [`AuthError::PopupClosed`], never a hang.
    async fn sign_in_federated(&self) -> Result<VendorSession, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Unknown addresses must be indistinguishable from known ones.
    async fn reset_password(&self, email: &str) -> Result<(), AuthError>;

    /// Current user snapshot. One vendor answers locally, the other
    /// revalidates over the network; callers must treat both as
    /// potentially asynchronous.
    async fn current_user(&self) -> Result<Option<VendorUser>, AuthError>;

    /// Register a session-change listener. Fires with the new vendor
    /// user (or `None`) on sign-in, sign-out and federated completion.
    fn subscribe(&self) -> Result<SessionSubscription, AuthError>;
}

/// Outcome of the vendor's interactive federated flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FederatedOutcome {
    /// Credential delivered to the redirect target: a Google id token
    /// for Firebase, a PKCE auth code for Supabase.
    Credential(String),
    /// The window was closed before the flow completed.
    Dismissed,
}

/// Drives the vendor's interactive browser flow.
///
/// Implementations open `authorize_url` however the embedding UI does
/// (popup, system browser plus loopback listener) and resolve with
/// whatever credential the vendor delivered. They must always resolve;
/// abandonment is reported as [`FederatedOutcome::Dismissed`].
#[async_trait]
pub trait FederatedFlow: Send + Sync {
    async fn run(&self, authorize_url: Url) -> Result<FederatedOutcome, AuthError>;
}

/// Flow driver for deployments with no interactive surface; federated
/// sign-in goes through the `/auth/callback` redirect flow instead.
pub struct RedirectOnlyFlow;

#[async_trait]
impl FederatedFlow for RedirectOnlyFlow {
    async fn run(&self, _authorize_url: Url) -> Result<FederatedOutcome, AuthError> {
        Ok(FederatedOutcome::Dismissed)
    }
}

/// Session event bus owned by an adapter.
#[derive(Debug)]
pub(crate) struct SessionEvents {
    tx: broadcast::Sender<Option<VendorUser>>,
}

impl SessionEvents {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self { tx }
    }

    /// Notify listeners of a session transition. A send error only
    /// means nobody is listening.
    pub(crate) fn emit(&self, user: Option<VendorUser>) {
        let _ = self.tx.send(user);
    }

    pub(crate) fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: Some(self.tx.subscribe()),
        }
    }
}

/// Cancellable handle on an adapter's session-change notifications.
///
/// `dispose` is idempotent; a disposed subscription yields no further
/// events.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: Option<broadcast::Receiver<Option<VendorUser>>>,
}

impl SessionSubscription {
    /// Next session transition, or `None` once disposed or the adapter
    /// dropped its end. A lagging consumer skips missed events rather
    /// than failing.
    pub async fn next(&mut self) -> Option<Option<VendorUser>> {
        loop {
            let rx = self.rx.as_mut()?;
            match rx.recv().await {
                Ok(user) => return Some(user),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "session listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Release the subscription. Calling twice is a no-op.
    pub fn dispose(&mut self) {
        self.rx = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.rx.is_none()
    }
}
