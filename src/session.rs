//! Per-identity session: which page the owner is on, as an explicit state
//! machine instead of loose page and tier variables.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::business::model::Tier;
use crate::onboarding::state::OnboardingState;

/// The page a session is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Page {
    Welcome,
    Onboarding { state: OnboardingState },
    Dashboard { tier: Tier },
    Enterprise,
}

impl Page {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Onboarding { .. } => "onboarding",
            Self::Dashboard { .. } => "dashboard",
            Self::Enterprise => "enterprise",
        }
    }
}

/// Session transition errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot go from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("No session for identity {0}")]
    Unknown(String),
}

/// One owner's navigation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub identity: String,
    pub page: Page,
}

impl Session {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            page: Page::Welcome,
        }
    }

    /// Welcome → Onboarding with an empty form.
    pub fn start_onboarding(&mut self) -> Result<(), SessionError> {
        self.require_welcome("onboarding")?;
        self.page = Page::Onboarding {
            state: OnboardingState::new(),
        };
        Ok(())
    }

    /// Welcome → Enterprise portal.
    pub fn enter_enterprise(&mut self) -> Result<(), SessionError> {
        self.require_welcome("enterprise")?;
        self.page = Page::Enterprise;
        Ok(())
    }

    /// Welcome → Dashboard for a business that already exists.
    pub fn resume(&mut self, tier: Tier) -> Result<(), SessionError> {
        self.require_welcome("dashboard")?;
        self.page = Page::Dashboard { tier };
        Ok(())
    }

    /// Onboarding → Dashboard once the record has been written.
    pub fn finish_onboarding(&mut self, tier: Tier) -> Result<(), SessionError> {
        match self.page {
            Page::Onboarding { .. } => {
                self.page = Page::Dashboard { tier };
                Ok(())
            }
            _ => Err(SessionError::InvalidTransition {
                from: self.page.name(),
                to: "dashboard",
            }),
        }
    }

    /// Any page → Welcome. Clears any half-finished onboarding.
    pub fn back_to_welcome(&mut self) {
        self.page = Page::Welcome;
    }

    pub fn onboarding(&self) -> Option<&OnboardingState> {
        match &self.page {
            Page::Onboarding { state } => Some(state),
            _ => None,
        }
    }

    pub fn onboarding_mut(&mut self) -> Option<&mut OnboardingState> {
        match &mut self.page {
            Page::Onboarding { state } => Some(state),
            _ => None,
        }
    }

    fn require_welcome(&self, to: &'static str) -> Result<(), SessionError> {
        if self.page == Page::Welcome {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.page.name(),
                to,
            })
        }
    }
}

/// All live sessions, keyed by identity.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `identity`, creating a Welcome one if needed.
    pub async fn open(&self, identity: &str) -> Session {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(identity.to_string())
            .or_insert_with(|| Session::new(identity))
            .clone()
    }

    /// Drop the session for `identity`, returning it if there was one.
    pub async fn close(&self, identity: &str) -> Option<Session> {
        self.sessions.write().await.remove(identity)
    }

    pub async fn get(&self, identity: &str) -> Result<Session, SessionError> {
        self.sessions
            .read()
            .await
            .get(identity)
            .cloned()
            .ok_or_else(|| SessionError::Unknown(identity.to_string()))
    }

    /// Run `f` against the session and return its result plus a snapshot of
    /// the session afterwards.
    pub async fn update<T, E, F>(&self, identity: &str, f: F) -> Result<(T, Session), E>
    where
        F: FnOnce(&mut Session) -> Result<T, E>,
        E: From<SessionError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(identity)
            .ok_or_else(|| SessionError::Unknown(identity.to_string()))?;
        let value = f(session)?;
        Ok((value, session.clone()))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
