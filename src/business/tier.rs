//! Tier classification.

use crate::error::InvalidInputError;

use super::model::{RevenueBand, Tier};

/// Map revenue and banking status to a tier. First match wins:
/// low revenue or no separate account is Basic, medium is Intermediate,
/// everything else is Pro.
pub fn classify(revenue_band: RevenueBand, has_separate_bank_account: bool) -> Tier {
    if revenue_band == RevenueBand::Low || !has_separate_bank_account {
        Tier::Basic
    } else if revenue_band == RevenueBand::Medium {
        Tier::Intermediate
    } else {
        Tier::Pro
    }
}

/// Classify from an untyped revenue band, rejecting anything outside
/// `low`, `medium`, `high`.
pub fn classify_raw(
    revenue_band: &str,
    has_separate_bank_account: bool,
) -> Result<Tier, InvalidInputError> {
    let band = revenue_band.parse::<RevenueBand>()?;
    Ok(classify(band, has_separate_bank_account))
}
