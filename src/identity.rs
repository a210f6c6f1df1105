//! Anonymous identity provider.
//!
//! Each browser session gets one opaque, stable identity. Auth-state changes
//! are published on a `watch` channel; when a session is signed out a new
//! anonymous identity has to be requested.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::IdentityError;

/// Current authentication state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn { identity: String },
}

/// Issues anonymous identities and reports auth-state changes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Return the signed-in identity, signing in anonymously if needed.
    async fn get_or_create_anonymous_identity(&self) -> Result<String, IdentityError>;

    /// Drop the current identity.
    async fn sign_out(&self);

    /// Receive every auth-state change.
    fn subscribe(&self) -> watch::Receiver<AuthState>;
}

/// In-process provider minting UUID v4 identities.
pub struct AnonymousIdentityProvider {
    state: watch::Sender<AuthState>,
}

impl AnonymousIdentityProvider {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::SignedOut);
        Self { state }
    }

    /// Start already signed in as `identity` (a returning session).
    pub fn resume(identity: impl Into<String>) -> Self {
        let (state, _) = watch::channel(AuthState::SignedIn {
            identity: identity.into(),
        });
        Self { state }
    }

    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }
}

impl Default for AnonymousIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for AnonymousIdentityProvider {
    async fn get_or_create_anonymous_identity(&self) -> Result<String, IdentityError> {
        // Check and issue under the channel lock so concurrent callers agree.
        let mut current = None;
        let issued = self.state.send_if_modified(|state| match state {
            AuthState::SignedIn { identity } => {
                current = Some(identity.clone());
                false
            }
            AuthState::SignedOut => {
                let identity = Uuid::new_v4().to_string();
                current = Some(identity.clone());
                *state = AuthState::SignedIn { identity };
                true
            }
        });

        let identity = current
            .ok_or_else(|| IdentityError::IssueFailed("auth state was not updated".to_string()))?;
        if issued {
            info!(identity = %identity, "Signed in anonymously");
        }
        Ok(identity)
    }

    async fn sign_out(&self) {
        self.state.send_replace(AuthState::SignedOut);
        info!("Signed out");
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}

/// Spawn a task that signs back in anonymously whenever the provider reports
/// a sign-out. Runs until the returned handle is aborted.
pub fn spawn_reauth_task(provider: Arc<dyn IdentityProvider>) -> JoinHandle<()> {
    let mut rx = provider.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let signed_out = matches!(*rx.borrow_and_update(), AuthState::SignedOut);
            if !signed_out {
                continue;
            }
            match provider.get_or_create_anonymous_identity().await {
                Ok(identity) => info!(identity = %identity, "Re-issued anonymous identity"),
                Err(e) => warn!(error = %e, "Failed to re-issue anonymous identity"),
            }
        }
    })
}
