//! OnboardingManager: turns a finished onboarding form into a persisted
//! business record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::business::model::BusinessRecord;
use crate::business::repo;
use crate::business::tier::classify;
use crate::error::Error;
use crate::store::DocumentStore;

use super::state::OnboardingState;

/// Coordinates the terminal onboarding action: classification, timestamps
/// and the single store write.
pub struct OnboardingManager {
    store: Arc<dyn DocumentStore>,
}

impl OnboardingManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The existing record for `identity`, if onboarding already happened.
    pub async fn existing(&self, identity: &str) -> Result<Option<BusinessRecord>, Error> {
        Ok(repo::load_business(self.store.as_ref(), identity).await?)
    }

    /// Classify, stamp, and persist the onboarding answers.
    ///
    /// Exactly one document write happens. If it fails the state stays on
    /// the last step with every answer intact so the caller can retry; on
    /// success the state enters Complete.
    ///
    /// The tier is assigned once. Submitting again for the same identity
    /// replaces the profile answers but keeps the stored tier and
    /// `created_at`, bumping only `updated_at`.
    pub async fn submit(
        &self,
        identity: &str,
        state: &mut OnboardingState,
    ) -> Result<BusinessRecord, Error> {
        let profile = state.candidate()?;
        let now = Utc::now();
        let record = match self.existing(identity).await? {
            Some(previous) => BusinessRecord {
                identity: identity.to_string(),
                profile,
                tier: previous.tier,
                created_at: previous.created_at,
                updated_at: now,
            },
            None => BusinessRecord {
                identity: identity.to_string(),
                tier: classify(profile.revenue_band, profile.has_separate_bank_account),
                profile,
                created_at: now,
                updated_at: now,
            },
        };
        let tier = record.tier;

        if let Err(e) = repo::save_business(self.store.as_ref(), &record).await {
            warn!(identity, error = %e, "Failed to persist business record");
            return Err(e.into());
        }

        state.mark_complete();
        info!(
            identity,
            tier = %tier,
            business = %record.profile.business_name,
            "Onboarding complete"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::model::{
        BUSINESSES, BusinessType, RecordKeepingMethod, RevenueBand, Tier,
    };
    use crate::error::{PersistenceError, ValidationError};
    use crate::onboarding::state::{OnboardingStep, StepFields};
    use crate::store::MemoryStore;

    fn acme_state(band: RevenueBand, bank: bool) -> OnboardingState {
        let mut state = OnboardingState::new();
        state
            .apply(StepFields {
                business_name: Some("Acme".to_string()),
                business_type: Some(BusinessType::Retail),
                ..Default::default()
            })
            .unwrap();
        state.advance().unwrap();
        state
            .apply(StepFields {
                revenue_band: Some(band),
                years_in_operation: Some(2),
                ..Default::default()
            })
            .unwrap();
        state.advance().unwrap();
        state
            .apply(StepFields {
                record_keeping_method: Some(RecordKeepingMethod::Digital),
                has_separate_bank_account: Some(bank),
                ..Default::default()
            })
            .unwrap();
        state
    }

    fn manager() -> (Arc<MemoryStore>, OnboardingManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = OnboardingManager::new(store.clone());
        (store, manager)
    }

    #[tokio::test]
    async fn submit_classifies_and_persists() {
        let (store, manager) = manager();
        let mut state = acme_state(RevenueBand::Medium, true);

        let record = manager.submit("u1", &mut state).await.unwrap();
        assert_eq!(record.tier, Tier::Intermediate);
        assert_eq!(record.identity, "u1");
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(state.step, OnboardingStep::Complete);

        let stored = manager.existing("u1").await.unwrap().unwrap();
        assert_eq!(stored, record);
        assert_eq!(store.count(BUSINESSES).await, 1);
    }

    #[tokio::test]
    async fn no_bank_account_is_basic_even_when_high() {
        let (_store, manager) = manager();
        let mut state = acme_state(RevenueBand::High, false);
        let record = manager.submit("u1", &mut state).await.unwrap();
        assert_eq!(record.tier, Tier::Basic);
    }

    #[tokio::test]
    async fn failed_write_keeps_answers_for_retry() {
        let (store, manager) = manager();
        let mut state = acme_state(RevenueBand::High, true);
        let before = state.clone();

        store.fail_writes(true);
        let err = manager.submit("u1", &mut state).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Persistence(PersistenceError::WriteRejected(_))
        ));
        assert_eq!(state, before);
        assert_eq!(state.step, OnboardingStep::RecordKeeping);
        assert_eq!(store.count(BUSINESSES).await, 0);

        store.fail_writes(false);
        let record = manager.submit("u1", &mut state).await.unwrap();
        assert_eq!(record.tier, Tier::Pro);
        assert_eq!(store.count(BUSINESSES).await, 1);
    }

    #[tokio::test]
    async fn resubmitting_keeps_creation_time() {
        let (store, manager) = manager();
        let mut first = acme_state(RevenueBand::Medium, true);
        let mut second = acme_state(RevenueBand::Medium, true);

        let original = manager.submit("u1", &mut first).await.unwrap();
        let again = manager.submit("u1", &mut second).await.unwrap();
        assert_eq!(store.count(BUSINESSES).await, 1);
        assert_eq!(again.created_at, original.created_at);
        assert!(again.updated_at >= original.updated_at);

        let stored = manager.existing("u1").await.unwrap().unwrap();
        assert_eq!(stored.created_at, original.created_at);
    }

    #[tokio::test]
    async fn tier_is_kept_on_resubmit() {
        let (_store, manager) = manager();
        let mut first = acme_state(RevenueBand::Medium, true);
        manager.submit("u1", &mut first).await.unwrap();

        let mut grown = acme_state(RevenueBand::High, true);
        let record = manager.submit("u1", &mut grown).await.unwrap();
        assert_eq!(record.tier, Tier::Intermediate);
        assert_eq!(record.profile.revenue_band, RevenueBand::High);
        assert_eq!(grown.step, OnboardingStep::Complete);
    }

    #[tokio::test]
    async fn incomplete_form_never_writes() {
        let (store, manager) = manager();
        let mut state = acme_state(RevenueBand::Low, true);
        state.draft.record_keeping_method = None;

        let err = manager.submit("u1", &mut state).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField {
                field: "record_keeping_method"
            })
        ));
        assert_eq!(state.step, OnboardingStep::RecordKeeping);
        assert_eq!(store.count(BUSINESSES).await, 0);
    }

    #[tokio::test]
    async fn submit_from_early_step_is_rejected() {
        let (store, manager) = manager();
        let mut state = OnboardingState::new();
        let err = manager.submit("u1", &mut state).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidTransition { .. })
        ));
        assert_eq!(store.count(BUSINESSES).await, 0);
    }
}
