//! Onboarding state machine: tracks which step the owner is on and the
//! answers collected so far.

use serde::{Deserialize, Serialize};

use crate::business::model::{BusinessProfile, BusinessType, RecordKeepingMethod, RevenueBand};
use crate::error::ValidationError;

/// The steps of the onboarding form.
///
/// Progresses linearly: BusinessBasics → Revenue → RecordKeeping → Complete.
/// The last hop happens only through a successful submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    #[default]
    BusinessBasics,
    Revenue,
    RecordKeeping,
    Complete,
}

impl OnboardingStep {
    /// Number of input steps before Complete.
    pub const INPUT_STEPS: u8 = 3;

    /// 1-based position, with Complete one past the last input step.
    pub fn number(&self) -> u8 {
        match self {
            Self::BusinessBasics => 1,
            Self::Revenue => 2,
            Self::RecordKeeping => 3,
            Self::Complete => 4,
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (BusinessBasics, Revenue) | (Revenue, RecordKeeping) | (RecordKeeping, Complete)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            BusinessBasics => Some(Revenue),
            Revenue => Some(RecordKeeping),
            RecordKeeping => Some(Complete),
            Complete => None,
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BusinessBasics => "business_basics",
            Self::Revenue => "revenue",
            Self::RecordKeeping => "record_keeping",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Field values posted for the current step. Absent fields are left as they
/// were; fields belonging to another step are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_type: Option<BusinessType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_band: Option<RevenueBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_in_operation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_keeping_method: Option<RecordKeepingMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_separate_bank_account: Option<bool>,
}

/// Answers collected so far. Every value here has already been validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingDraft {
    pub business_name: Option<String>,
    pub business_type: Option<BusinessType>,
    pub revenue_band: Option<RevenueBand>,
    pub years_in_operation: Option<u32>,
    pub record_keeping_method: Option<RecordKeepingMethod>,
    pub has_separate_bank_account: Option<bool>,
}

/// Onboarding progress for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingState {
    pub step: OnboardingStep,
    pub draft: OnboardingDraft,
}

impl OnboardingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of the form completed, for a progress bar.
    pub fn progress(&self) -> f32 {
        let done = self.step.number().min(OnboardingStep::INPUT_STEPS);
        f32::from(done) / f32::from(OnboardingStep::INPUT_STEPS)
    }

    /// Record the posted values for the current step.
    ///
    /// Nothing is written unless every posted field is valid for this step.
    pub fn apply(&mut self, fields: StepFields) -> Result<(), ValidationError> {
        use OnboardingStep::*;
        let current = self.step;
        let guard = |field: &'static str, owner: OnboardingStep, present: bool| {
            if present && current != owner {
                Err(ValidationError::WrongStep { field, current })
            } else {
                Ok(())
            }
        };

        guard("business_name", BusinessBasics, fields.business_name.is_some())?;
        guard("business_type", BusinessBasics, fields.business_type.is_some())?;
        guard("revenue_band", Revenue, fields.revenue_band.is_some())?;
        guard("years_in_operation", Revenue, fields.years_in_operation.is_some())?;
        guard(
            "record_keeping_method",
            RecordKeeping,
            fields.record_keeping_method.is_some(),
        )?;
        guard(
            "has_separate_bank_account",
            RecordKeeping,
            fields.has_separate_bank_account.is_some(),
        )?;

        let name = match fields.business_name {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::MissingField {
                        field: "business_name",
                    });
                }
                Some(trimmed.to_string())
            }
            None => None,
        };

        let years = match fields.years_in_operation {
            Some(value) => Some(u32::try_from(value).map_err(|_| {
                ValidationError::OutOfRange {
                    field: "years_in_operation",
                    value,
                }
            })?),
            None => None,
        };

        let draft = &mut self.draft;
        if name.is_some() {
            draft.business_name = name;
        }
        if fields.business_type.is_some() {
            draft.business_type = fields.business_type;
        }
        if fields.revenue_band.is_some() {
            draft.revenue_band = fields.revenue_band;
        }
        if years.is_some() {
            draft.years_in_operation = years;
        }
        if fields.record_keeping_method.is_some() {
            draft.record_keeping_method = fields.record_keeping_method;
        }
        if fields.has_separate_bank_account.is_some() {
            draft.has_separate_bank_account = fields.has_separate_bank_account;
        }
        Ok(())
    }

    /// Move to the next input step once the current one is filled in.
    ///
    /// The final step cannot be advanced past here; it completes through
    /// submit.
    pub fn advance(&mut self) -> Result<OnboardingStep, ValidationError> {
        match self.step {
            OnboardingStep::RecordKeeping => {
                return Err(ValidationError::InvalidTransition {
                    from: self.step,
                    reason: "the last step completes by submitting",
                });
            }
            OnboardingStep::Complete => {
                return Err(ValidationError::InvalidTransition {
                    from: self.step,
                    reason: "onboarding is already complete",
                });
            }
            _ => {}
        }

        self.check_step_complete(self.step)?;
        let next = self
            .step
            .next()
            .filter(|next| self.step.can_transition_to(*next))
            .ok_or(ValidationError::InvalidTransition {
                from: self.step,
                reason: "no next step",
            })?;
        self.step = next;
        Ok(next)
    }

    /// The full profile, available only on the last input step with every
    /// field present.
    pub fn candidate(&self) -> Result<BusinessProfile, ValidationError> {
        if self.step != OnboardingStep::RecordKeeping {
            return Err(ValidationError::InvalidTransition {
                from: self.step,
                reason: "submit is only available on the last step",
            });
        }
        let d = &self.draft;
        Ok(BusinessProfile {
            business_name: d.business_name.clone().ok_or(missing("business_name"))?,
            business_type: d.business_type.ok_or(missing("business_type"))?,
            revenue_band: d.revenue_band.ok_or(missing("revenue_band"))?,
            years_in_operation: d.years_in_operation.ok_or(missing("years_in_operation"))?,
            record_keeping_method: d
                .record_keeping_method
                .ok_or(missing("record_keeping_method"))?,
            has_separate_bank_account: d
                .has_separate_bank_account
                .ok_or(missing("has_separate_bank_account"))?,
        })
    }

    /// Enter Complete. Only called after the record has been persisted.
    pub(crate) fn mark_complete(&mut self) {
        if self.step.can_transition_to(OnboardingStep::Complete) {
            self.step = OnboardingStep::Complete;
        }
    }

    fn check_step_complete(&self, step: OnboardingStep) -> Result<(), ValidationError> {
        let d = &self.draft;
        match step {
            OnboardingStep::BusinessBasics => {
                d.business_name.as_ref().ok_or(missing("business_name"))?;
                d.business_type.ok_or(missing("business_type"))?;
            }
            OnboardingStep::Revenue => {
                d.revenue_band.ok_or(missing("revenue_band"))?;
                d.years_in_operation.ok_or(missing("years_in_operation"))?;
            }
            OnboardingStep::RecordKeeping => {
                d.record_keeping_method
                    .ok_or(missing("record_keeping_method"))?;
                d.has_separate_bank_account
                    .ok_or(missing("has_separate_bank_account"))?;
            }
            OnboardingStep::Complete => {}
        }
        Ok(())
    }
}

fn missing(field: &'static str) -> ValidationError {
    ValidationError::MissingField { field }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basics() -> StepFields {
        StepFields {
            business_name: Some("Acme".to_string()),
            business_type: Some(BusinessType::Retail),
            ..Default::default()
        }
    }

    fn revenue() -> StepFields {
        StepFields {
            revenue_band: Some(RevenueBand::Medium),
            years_in_operation: Some(2),
            ..Default::default()
        }
    }

    fn record_keeping() -> StepFields {
        StepFields {
            record_keeping_method: Some(RecordKeepingMethod::Digital),
            has_separate_bank_account: Some(true),
            ..Default::default()
        }
    }

    fn filled_to_last_step() -> OnboardingState {
        let mut state = OnboardingState::new();
        state.apply(basics()).unwrap();
        state.advance().unwrap();
        state.apply(revenue()).unwrap();
        state.advance().unwrap();
        state.apply(record_keeping()).unwrap();
        state
    }

    #[test]
    fn valid_transitions() {
        use OnboardingStep::*;
        for (from, to) in [
            (BusinessBasics, Revenue),
            (Revenue, RecordKeeping),
            (RecordKeeping, Complete),
        ] {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use OnboardingStep::*;
        // Skip steps
        assert!(!BusinessBasics.can_transition_to(RecordKeeping));
        assert!(!BusinessBasics.can_transition_to(Complete));
        // Go backward
        assert!(!Revenue.can_transition_to(BusinessBasics));
        assert!(!Complete.can_transition_to(RecordKeeping));
        // Self-transition
        assert!(!Revenue.can_transition_to(Revenue));
    }

    #[test]
    fn display_matches_serde() {
        use OnboardingStep::*;
        for step in [BusinessBasics, Revenue, RecordKeeping, Complete] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json);
        }
    }

    #[test]
    fn advance_requires_every_field() {
        let mut state = OnboardingState::new();
        assert_eq!(
            state.advance().unwrap_err(),
            ValidationError::MissingField {
                field: "business_name"
            }
        );

        state
            .apply(StepFields {
                business_name: Some("Acme".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            state.advance().unwrap_err(),
            ValidationError::MissingField {
                field: "business_type"
            }
        );
        assert_eq!(state.step, OnboardingStep::BusinessBasics);

        state
            .apply(StepFields {
                business_type: Some(BusinessType::Other),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(state.advance().unwrap(), OnboardingStep::Revenue);

        state
            .apply(StepFields {
                revenue_band: Some(RevenueBand::Low),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            state.advance().unwrap_err(),
            ValidationError::MissingField {
                field: "years_in_operation"
            }
        );
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut state = OnboardingState::new();
        let err = state
            .apply(StepFields {
                business_name: Some("   ".to_string()),
                business_type: Some(BusinessType::Retail),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "business_name"
            }
        );
        // Nothing from the rejected post is kept.
        assert_eq!(state.draft, OnboardingDraft::default());
    }

    #[test]
    fn name_is_trimmed() {
        let mut state = OnboardingState::new();
        state
            .apply(StepFields {
                business_name: Some("  Mama's Kota  ".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(state.draft.business_name.as_deref(), Some("Mama's Kota"));
    }

    #[test]
    fn negative_years_rejected() {
        let mut state = OnboardingState::new();
        state.apply(basics()).unwrap();
        state.advance().unwrap();
        let err = state
            .apply(StepFields {
                revenue_band: Some(RevenueBand::High),
                years_in_operation: Some(-1),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "years_in_operation",
                value: -1
            }
        );
        assert!(state.draft.revenue_band.is_none());
    }

    #[test]
    fn zero_years_is_fine() {
        let mut state = OnboardingState::new();
        state.apply(basics()).unwrap();
        state.advance().unwrap();
        state
            .apply(StepFields {
                revenue_band: Some(RevenueBand::Low),
                years_in_operation: Some(0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(state.advance().unwrap(), OnboardingStep::RecordKeeping);
    }

    #[test]
    fn fields_from_other_steps_rejected() {
        let mut state = OnboardingState::new();
        let err = state.apply(revenue()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongStep {
                field: "revenue_band",
                current: OnboardingStep::BusinessBasics
            }
        );

        state.apply(basics()).unwrap();
        state.advance().unwrap();
        let err = state.apply(basics()).unwrap_err();
        assert!(matches!(err, ValidationError::WrongStep { field: "business_name", .. }));
    }

    #[test]
    fn last_step_does_not_advance_to_complete() {
        let mut state = filled_to_last_step();
        let err = state.advance().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTransition { .. }));
        assert_eq!(state.step, OnboardingStep::RecordKeeping);
    }

    #[test]
    fn candidate_collects_all_answers() {
        let state = filled_to_last_step();
        let profile = state.candidate().unwrap();
        assert_eq!(profile.business_name, "Acme");
        assert_eq!(profile.business_type, BusinessType::Retail);
        assert_eq!(profile.revenue_band, RevenueBand::Medium);
        assert_eq!(profile.years_in_operation, 2);
        assert_eq!(profile.record_keeping_method, RecordKeepingMethod::Digital);
        assert!(profile.has_separate_bank_account);
    }

    #[test]
    fn candidate_requires_last_step_fields() {
        let mut state = filled_to_last_step();
        state.draft.has_separate_bank_account = None;
        assert_eq!(
            state.candidate().unwrap_err(),
            ValidationError::MissingField {
                field: "has_separate_bank_account"
            }
        );

        let early = OnboardingState::new();
        assert!(matches!(
            early.candidate().unwrap_err(),
            ValidationError::InvalidTransition { .. }
        ));
    }

    #[test]
    fn mark_complete_only_from_last_step() {
        let mut early = OnboardingState::new();
        early.mark_complete();
        assert_eq!(early.step, OnboardingStep::BusinessBasics);

        let mut state = filled_to_last_step();
        state.mark_complete();
        assert!(state.step.is_terminal());
        assert!(state.advance().is_err());
    }

    #[test]
    fn progress_tracks_steps() {
        let mut state = OnboardingState::new();
        assert!((state.progress() - 1.0 / 3.0).abs() < f32::EPSILON);
        state.apply(basics()).unwrap();
        state.advance().unwrap();
        assert!((state.progress() - 2.0 / 3.0).abs() < f32::EPSILON);
        let mut done = filled_to_last_step();
        done.mark_complete();
        assert!((done.progress() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn step_fields_deserialize_partial() {
        let fields: StepFields =
            serde_json::from_str(r#"{"business_name": "Acme", "business_type": "street_food"}"#)
                .unwrap();
        assert_eq!(fields.business_name.as_deref(), Some("Acme"));
        assert_eq!(fields.business_type, Some(BusinessType::StreetFood));
        assert!(fields.revenue_band.is_none());
    }
}
