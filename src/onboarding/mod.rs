//! Onboarding: the three-step business form.
//!
//! The owner fills in basics, revenue, and record keeping in order. Submitting
//! the last step classifies the business into a tier and writes its record.

pub mod manager;
pub mod state;

pub use manager::OnboardingManager;
pub use state::{OnboardingDraft, OnboardingState, OnboardingStep, StepFields};
