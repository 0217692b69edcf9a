//! Session context
//!
//! Process-local session state derived from the active adapter's
//! session-change notifications. Constructed explicitly and passed by
//! handle to consumers; there is no ambient singleton.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::error::AuthError;
use crate::facade::AuthService;
use crate::types::{NormalizedUser, ProviderTag, SessionState, VendorSession, VendorUser};

/// Session state holder bound to the facade's active provider.
///
/// One listener subscription is live at any time. Switching providers
/// tears the previous listener down before subscribing anew, and a
/// generation check keeps a superseded listener from ever writing
/// state the context has moved past.
pub struct SessionContext {
    service: Arc<AuthService>,
    state: Arc<watch::Sender<SessionState>>,
    generation: Arc<AtomicU64>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionContext {
    /// Create a context bound to the facade's current provider and
    /// start listening for session changes.
    pub async fn new(service: Arc<AuthService>) -> Self {
        let (tx, _) = watch::channel(SessionState::loading());
        let context = Self {
            service,
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            listener: Mutex::new(None),
        };

        let tag = context.service.provider();
        context.attach(tag).await;
        context
    }

    pub fn provider(&self) -> ProviderTag {
        self.service.provider()
    }

    /// Switch the active provider: facade tag first, then listener
    /// swap.
    pub async fn set_provider(&self, tag: ProviderTag) {
        self.service.set_provider(tag);
        self.attach(tag).await;
    }

    /// Snapshot of the current session state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe every state transition; route guards re-evaluate on
    /// each.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    async fn attach(&self, tag: ProviderTag) {
        // Invalidate in-flight listener writes before anything else.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.state.send_replace(SessionState::loading());

        // Tear down the superseded listener strictly before subscribing
        // anew; two live listeners must never race on this state.
        if let Some(previous) = self.listener.lock().await.take() {
            previous.abort();
        }

        let adapter = self.service.adapter_for(tag);
        let mut subscription = match adapter.subscribe() {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::error!(provider = %tag, error = %err, "session listener setup failed");
                self.state.send_replace(SessionState::failed(
                    AuthError::SubscriptionSetup(err.to_string()),
                ));
                return;
            }
        };

        let state = Arc::clone(&self.state);
        let generations = Arc::clone(&self.generation);
        let task = tokio::spawn(async move {
            // Seed with the adapter's current session before streaming
            // change events.
            let initial = match adapter.current_user().await {
                Ok(user) => user,
                Err(err) => {
                    tracing::debug!(provider = %adapter.tag(), error = %err, "initial session snapshot failed");
                    None
                }
            };
            apply(&state, &generations, generation, initial);

            while let Some(user) = subscription.next().await {
                apply(&state, &generations, generation, user);
            }
        });

        *self.listener.lock().await = Some(task);
    }

    fn record_failure(&self, err: &AuthError) {
        self.state.send_modify(|state| state.error = Some(err.clone()));
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<VendorSession, AuthError> {
        match self.service.sign_up(email, password).await {
            Ok(session) => Ok(session),
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<VendorSession, AuthError> {
        match self.service.sign_in(email, password).await {
            Ok(session) => Ok(session),
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn sign_in_federated(&self) -> Result<VendorSession, AuthError> {
        match self.service.sign_in_federated().await {
            Ok(session) => Ok(session),
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Sign out and clear the user eagerly instead of waiting for the
    /// listener round-trip.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        match self.service.sign_out().await {
            Ok(()) => {
                self.state.send_modify(|state| {
                    state.user = None;
                    state.loading = false;
                });
                Ok(())
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        match self.service.reset_password(email).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        if let Some(task) = self.listener.get_mut().take() {
            task.abort();
        }
    }
}

fn apply(
    state: &watch::Sender<SessionState>,
    generations: &AtomicU64,
    generation: u64,
    user: Option<VendorUser>,
) {
    // A superseded listener must never write; the context has moved on.
    if generations.load(Ordering::SeqCst) != generation {
        return;
    }

    state.send_replace(SessionState::resolved(
        user.as_ref().map(NormalizedUser::from_vendor),
    ));
}
