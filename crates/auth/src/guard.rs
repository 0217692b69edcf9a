//! Route guard
//!
//! Rendering gate for protected views, driven by [`SessionState`].
//! Stateless: callers re-evaluate on every state change, so a sign-out
//! while a protected view is showing immediately flips the decision
//! back to a redirect.

use crate::types::SessionState;

/// Default sign-in location for unauthenticated redirects.
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// What the view layer should do for a protected view right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not yet resolved; show a loading placeholder.
    Pending,
    /// Resolved unauthenticated; navigate away and render nothing.
    Redirect(String),
    /// Authenticated; render the wrapped view with its inputs
    /// unchanged.
    Render,
}

/// Client-side gate wrapping a protected view.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    sign_in_path: String,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self {
            sign_in_path: SIGN_IN_PATH.to_string(),
        }
    }

    /// Redirect somewhere other than the default sign-in page.
    pub fn with_redirect_to(path: &str) -> Self {
        Self {
            sign_in_path: path.to_string(),
        }
    }

    pub fn evaluate(&self, state: &SessionState, current_path: &str) -> GuardDecision {
        if state.loading {
            return GuardDecision::Pending;
        }

        if state.user.is_none() {
            return GuardDecision::Redirect(sign_in_redirect(&self.sign_in_path, current_path));
        }

        GuardDecision::Render
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign-in location carrying the original path in the `redirect`
/// parameter so the post-sign-in flow can return there.
pub fn sign_in_redirect(sign_in_path: &str, original_path: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(original_path.as_bytes()).collect();
    format!("{}?redirect={}", sign_in_path, encoded)
}
