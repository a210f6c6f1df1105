//! Dashboard view selection: which feature panel a tier gets.

use serde::{Deserialize, Serialize};

use crate::business::model::Tier;
use crate::store::Document;

/// A dashboard affordance. Each belongs to exactly one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    LearningModules,
    AdminDelegation,
    TransactionLogging,
    HealthReport,
    TransactionList,
    Analytics,
    InvestorMatching,
}

impl Feature {
    pub fn title(&self) -> &'static str {
        match self {
            Self::LearningModules => "Learning Modules",
            Self::AdminDelegation => "Assign Admin",
            Self::TransactionLogging => "Log Transactions",
            Self::HealthReport => "Business Health",
            Self::TransactionList => "Transaction History",
            Self::Analytics => "Advanced Analytics",
            Self::InvestorMatching => "Investor Ready",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::LearningModules => "Start with financial literacy basics",
            Self::AdminDelegation => "Designate someone to help manage finances",
            Self::TransactionLogging => "Track your income and expenses",
            Self::HealthReport => "View your business health report",
            Self::TransactionList => "Review everything you have logged",
            Self::Analytics => "Deep insights into your business performance",
            Self::InvestorMatching => "Connect with potential investors",
        }
    }
}

/// Features shown for a tier. The three sets are disjoint.
pub fn features_for(tier: Tier) -> &'static [Feature] {
    match tier {
        Tier::Basic => &[Feature::LearningModules, Feature::AdminDelegation],
        Tier::Intermediate => &[
            Feature::TransactionLogging,
            Feature::HealthReport,
            Feature::TransactionList,
        ],
        Tier::Pro => &[Feature::Analytics, Feature::InvestorMatching],
    }
}

/// Panel heading for a tier.
pub fn heading_for(tier: Tier) -> &'static str {
    match tier {
        Tier::Basic => "Basic Tier - The Builder",
        Tier::Intermediate => "Intermediate Tier - The Grower",
        Tier::Pro => "Pro Tier - The Optimizer",
    }
}

/// One rendered feature card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCard {
    pub feature: Feature,
    pub title: String,
    pub description: String,
}

impl From<Feature> for FeatureCard {
    fn from(feature: Feature) -> Self {
        Self {
            feature,
            title: feature.title().to_string(),
            description: feature.description().to_string(),
        }
    }
}

/// What the dashboard should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardView {
    Panel {
        tier: Tier,
        heading: String,
        features: Vec<FeatureCard>,
    },
    /// No usable tier: send the owner back through onboarding.
    RedirectToOnboarding { reason: String },
}

impl DashboardView {
    pub fn for_tier(tier: Tier) -> Self {
        Self::Panel {
            tier,
            heading: heading_for(tier).to_string(),
            features: features_for(tier).iter().copied().map(FeatureCard::from).collect(),
        }
    }

    /// Select from a raw tier value. Missing or unrecognized tiers redirect
    /// to onboarding instead of falling back to some panel.
    pub fn select(tier: Option<&str>) -> Self {
        match tier {
            Some(raw) => match raw.parse::<Tier>() {
                Ok(tier) => Self::for_tier(tier),
                Err(reason) => Self::RedirectToOnboarding { reason },
            },
            None => Self::RedirectToOnboarding {
                reason: "no tier assigned".to_string(),
            },
        }
    }

    /// Select from a stored business document (or its absence).
    pub fn for_document(doc: Option<&Document>) -> Self {
        match doc {
            Some(doc) => Self::select(doc.get("tier").and_then(|t| t.as_str())),
            None => Self::RedirectToOnboarding {
                reason: "business not onboarded".to_string(),
            },
        }
    }

    pub fn features(&self) -> Vec<Feature> {
        match self {
            Self::Panel { features, .. } => features.iter().map(|c| c.feature).collect(),
            Self::RedirectToOnboarding { .. } => Vec::new(),
        }
    }
}
