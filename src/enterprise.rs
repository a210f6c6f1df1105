//! Enterprise portal: read-only aggregates over every business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::business::model::{BusinessRecord, BusinessType, Tier};
use crate::business::repo;
use crate::error::PersistenceError;
use crate::store::DocumentStore;

/// Short listing entry for the "recent businesses" slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessSummary {
    pub identity: String,
    pub business_name: String,
    pub business_type: BusinessType,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
}

impl From<&BusinessRecord> for BusinessSummary {
    fn from(record: &BusinessRecord) -> Self {
        Self {
            identity: record.identity.clone(),
            business_name: record.profile.business_name.clone(),
            business_type: record.profile.business_type,
            tier: record.tier,
            created_at: record.created_at,
        }
    }
}

/// Tier counts plus the most recently onboarded businesses.
///
/// `total == basic + intermediate + pro` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterpriseOverview {
    pub total: usize,
    pub basic: usize,
    pub intermediate: usize,
    pub pro: usize,
    pub recent: Vec<BusinessSummary>,
}

impl EnterpriseOverview {
    pub fn from_records(records: &[BusinessRecord], recent_limit: usize) -> Self {
        let count = |tier: Tier| records.iter().filter(|r| r.tier == tier).count();
        let basic = count(Tier::Basic);
        let intermediate = count(Tier::Intermediate);
        let pro = count(Tier::Pro);

        let mut recent: Vec<&BusinessRecord> = records.iter().collect();
        recent.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        let recent = recent
            .into_iter()
            .take(recent_limit)
            .map(BusinessSummary::from)
            .collect();

        Self {
            total: basic + intermediate + pro,
            basic,
            intermediate,
            pro,
            recent,
        }
    }
}

/// Scan every business and build the overview.
pub async fn load_overview(
    store: &dyn DocumentStore,
    recent_limit: usize,
) -> Result<EnterpriseOverview, PersistenceError> {
    let records = repo::list_businesses(store).await?;
    tracing::debug!(count = records.len(), "Loaded businesses for enterprise overview");
    Ok(EnterpriseOverview::from_records(&records, recent_limit))
}
