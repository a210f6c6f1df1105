//! Hub: the application service tying sessions, onboarding, the ledger and
//! the enterprise view to one document store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::business::ledger::{HealthReport, Ledger};
use crate::business::model::{BUSINESSES, BusinessRecord, NewTransaction, TransactionRecord};
use crate::business::repo;
use crate::dashboard::DashboardView;
use crate::enterprise::{self, EnterpriseOverview};
use crate::error::{Error, Result};
use crate::identity::{IdentityProvider, spawn_reauth_task};
use crate::onboarding::{OnboardingManager, OnboardingStep, StepFields};
use crate::session::{Page, Session, SessionError, SessionRegistry};
use crate::store::DocumentStore;

/// The provider a session signed in through, plus its re-auth task.
struct IdentitySlot {
    provider: Arc<dyn IdentityProvider>,
    reauth: JoinHandle<()>,
}

impl IdentitySlot {
    fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let reauth = spawn_reauth_task(Arc::clone(&provider));
        Self { provider, reauth }
    }
}

impl Drop for IdentitySlot {
    fn drop(&mut self) {
        self.reauth.abort();
    }
}

/// Application service. One per process, shared across requests.
pub struct Hub {
    store: Arc<dyn DocumentStore>,
    sessions: SessionRegistry,
    identities: RwLock<HashMap<String, IdentitySlot>>,
    onboarding: OnboardingManager,
    ledger: Ledger,
    recent_limit: usize,
}

impl Hub {
    pub fn new(store: Arc<dyn DocumentStore>, recent_limit: usize) -> Self {
        Self {
            onboarding: OnboardingManager::new(Arc::clone(&store)),
            ledger: Ledger::new(Arc::clone(&store)),
            sessions: SessionRegistry::new(),
            identities: RwLock::new(HashMap::new()),
            store,
            recent_limit,
        }
    }

    /// Sign in through `provider` and open (or reopen) that identity's session.
    ///
    /// The first provider seen for an identity is kept for the life of the
    /// session, with a task that re-issues an identity after any sign-out.
    pub async fn open_session(&self, provider: Arc<dyn IdentityProvider>) -> Result<Session> {
        let identity = provider.get_or_create_anonymous_identity().await?;
        self.identities
            .write()
            .await
            .entry(identity.clone())
            .or_insert_with(|| IdentitySlot::new(provider));
        let session = self.sessions.open(&identity).await;
        debug!(identity = %identity, page = session.page.name(), "Session opened");
        Ok(session)
    }

    /// End the session for `identity`, sign its provider out, and open a
    /// fresh Welcome session under the newly issued anonymous identity.
    pub async fn sign_out(&self, identity: &str) -> Result<Session> {
        let slot = self
            .identities
            .write()
            .await
            .remove(identity)
            .ok_or_else(|| SessionError::Unknown(identity.to_string()))?;
        self.sessions.close(identity).await;

        slot.provider.sign_out().await;
        let next = slot.provider.get_or_create_anonymous_identity().await?;

        let session = self.sessions.open(&next).await;
        self.identities.write().await.insert(next.clone(), slot);
        info!(previous = identity, identity = %next, "Signed out, new identity issued");
        Ok(session)
    }

    pub async fn session(&self, identity: &str) -> Result<Session> {
        Ok(self.sessions.get(identity).await?)
    }

    /// Begin onboarding, or go straight to the dashboard when this identity
    /// already has a business record. Both start from Welcome.
    pub async fn start_onboarding(&self, identity: &str) -> Result<Session> {
        let existing = self.onboarding.existing(identity).await?;
        let (_, session) = self
            .sessions
            .update(identity, |session| -> Result<()> {
                match &existing {
                    Some(record) => session.resume(record.tier)?,
                    None => session.start_onboarding()?,
                }
                Ok(())
            })
            .await?;
        Ok(session)
    }

    /// Record the posted fields and move past every step except the last.
    pub async fn apply_step(&self, identity: &str, fields: StepFields) -> Result<Session> {
        let (_, session) = self
            .sessions
            .update(identity, |session| -> Result<()> {
                let page = session.page.name();
                let state = session
                    .onboarding_mut()
                    .ok_or(SessionError::InvalidTransition {
                        from: page,
                        to: "onboarding",
                    })?;
                state.apply(fields)?;
                if state.step != OnboardingStep::RecordKeeping {
                    state.advance()?;
                }
                Ok(())
            })
            .await?;
        Ok(session)
    }

    /// Submit the finished form. On a store failure the session keeps its
    /// answers on the last step.
    ///
    /// Once the record is written it is returned, even if the session left
    /// its onboarding page in the meantime.
    pub async fn submit(&self, identity: &str) -> Result<BusinessRecord> {
        let session = self.sessions.get(identity).await?;
        let mut state = session
            .onboarding()
            .cloned()
            .ok_or(SessionError::InvalidTransition {
                from: session.page.name(),
                to: "dashboard",
            })?;

        let record = self.onboarding.submit(identity, &mut state).await?;

        let settled = self
            .sessions
            .update(identity, |session| session.finish_onboarding(record.tier))
            .await;
        if let Err(e) = settled {
            warn!(identity, error = %e, "Business saved but session left onboarding during the write");
        }
        Ok(record)
    }

    pub async fn back_to_welcome(&self, identity: &str) -> Result<Session> {
        let (_, session) = self
            .sessions
            .update(identity, |session| -> Result<()> {
                session.back_to_welcome();
                Ok(())
            })
            .await?;
        Ok(session)
    }

    pub async fn enter_enterprise(&self, identity: &str) -> Result<Session> {
        let (_, session) = self
            .sessions
            .update(identity, |session| -> Result<()> {
                session.enter_enterprise()?;
                Ok(())
            })
            .await?;
        info!(identity, "Entered enterprise portal");
        Ok(session)
    }

    pub async fn business(&self, identity: &str) -> Result<BusinessRecord> {
        repo::load_business(self.store.as_ref(), identity)
            .await?
            .ok_or_else(|| Error::NotOnboarded {
                identity: identity.to_string(),
            })
    }

    /// Dashboard for an identity, driven by the stored tier.
    pub async fn dashboard(&self, identity: &str) -> Result<DashboardView> {
        let doc = self.store.get_record(BUSINESSES, identity).await?;
        Ok(DashboardView::for_document(doc.as_ref()))
    }

    pub async fn add_transaction(
        &self,
        identity: &str,
        tx: NewTransaction,
    ) -> Result<TransactionRecord> {
        self.ledger.add_transaction(identity, tx).await
    }

    pub async fn transactions(&self, identity: &str) -> Result<Vec<TransactionRecord>> {
        self.ledger.list_transactions(identity).await
    }

    pub async fn health_report(&self, identity: &str) -> Result<HealthReport> {
        self.ledger.health_report(identity).await
    }

    pub async fn enterprise_overview(&self) -> Result<EnterpriseOverview> {
        Ok(enterprise::load_overview(self.store.as_ref(), self.recent_limit).await?)
    }

    /// Whether the identity's session is on the dashboard.
    pub async fn on_dashboard(&self, identity: &str) -> bool {
        matches!(
            self.sessions.get(identity).await.map(|s| s.page),
            Ok(Page::Dashboard { .. })
        )
    }
}
