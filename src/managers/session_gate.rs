//! Session gate and the sign-in / sign-out actions around it.

use std::sync::Arc;

use tracing::warn;

use crate::services::backend::AuthProvider;
use crate::types::errors::AuthError;
use crate::types::session::{Navigation, OAuthProvider, SignInRedirect, User};

/// Result of checking the session before showing a protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// A user is signed in; render the protected view for them.
    Render(User),
    /// Nobody is signed in; go to the sign-in entry point and render nothing.
    Redirect(Navigation),
}

/// Guards the main list view behind an authenticated session.
///
/// Holds no cached session: every [`SessionGate::check`] asks the auth
/// capability again, so a sign-out made elsewhere is seen on the next mount.
pub struct SessionGate {
    auth: Arc<dyn AuthProvider>,
    sign_in_path: String,
}

impl SessionGate {
    pub fn new(auth: Arc<dyn AuthProvider>, sign_in_path: impl Into<String>) -> Self {
        Self {
            auth,
            sign_in_path: sign_in_path.into(),
        }
    }

    pub async fn check(&self) -> GateDecision {
        match self.auth.current_user().await {
            Ok(Some(user)) => GateDecision::Render(user),
            Ok(None) => GateDecision::Redirect(Navigation::SignIn(self.sign_in_path.clone())),
            Err(e) => {
                warn!(error = %e, "session lookup failed, treating as signed out");
                GateDecision::Redirect(Navigation::SignIn(self.sign_in_path.clone()))
            }
        }
    }
}

/// Starts an OAuth sign-in from the sign-in entry point. The provider sends the
/// user back to `redirect_origin`.
pub async fn start_sign_in(
    auth: &dyn AuthProvider,
    provider: OAuthProvider,
    redirect_origin: &str,
) -> Result<SignInRedirect, AuthError> {
    auth.sign_in(provider, redirect_origin).await
}

/// Signs out and always lands on the sign-in entry point. A failed sign-out is
/// logged and otherwise ignored.
pub async fn sign_out(auth: &dyn AuthProvider, sign_in_path: &str) -> Navigation {
    if let Err(e) = auth.sign_out().await {
        warn!(error = %e, "sign-out failed");
    }
    Navigation::SignIn(sign_in_path.to_string())
}
