//! Business and transaction data models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;

/// Collection holding one business document per identity.
pub const BUSINESSES: &str = "businesses";

/// Sub-collection path for a business's transactions.
pub fn transactions_path(identity: &str) -> String {
    format!("{BUSINESSES}/{identity}/transactions")
}

/// What kind of business this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    StreetFood,
    Retail,
    Services,
    Manufacturing,
    Other,
}

/// Average monthly revenue bracket.
///
/// Deserializes through `FromStr`, so an unknown band surfaces as
/// `InvalidInputError::RevenueBand`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum RevenueBand {
    Low,
    Medium,
    High,
}

impl RevenueBand {
    /// Human-readable bracket shown next to the choice.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "R0 - R5,000",
            Self::Medium => "R5,000 - R15,000",
            Self::High => "R15,000+",
        }
    }
}

impl std::fmt::Display for RevenueBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RevenueBand {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(InvalidInputError::RevenueBand(other.to_string())),
        }
    }
}

impl TryFrom<String> for RevenueBand {
    type Error = InvalidInputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How the owner currently keeps business records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKeepingMethod {
    Memory,
    Notebook,
    Digital,
}

/// Coarse sophistication bucket driving which dashboard features are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Basic,
    Intermediate,
    Pro,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Basic => "Basic",
            Self::Intermediate => "Intermediate",
            Self::Pro => "Pro",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Basic" => Ok(Self::Basic),
            "Intermediate" => Ok(Self::Intermediate),
            "Pro" => Ok(Self::Pro),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// Everything collected by onboarding, before identity and tier are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub business_name: String,
    pub business_type: BusinessType,
    pub revenue_band: RevenueBand,
    pub years_in_operation: u32,
    pub record_keeping_method: RecordKeepingMethod,
    pub has_separate_bank_account: bool,
}

/// The persisted business document. One per identity.
///
/// `tier` is computed once at creation and stored; it is never re-derived
/// from the other fields on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub identity: String,
    #[serde(flatten)]
    pub profile: BusinessProfile,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessRecord {
    pub fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_document(doc: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc)
    }
}

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

/// A transaction as entered by the user, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to now when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// A stored transaction belonging to one business. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn sample_record() -> BusinessRecord {
        let now = Utc::now();
        BusinessRecord {
            identity: "u1".to_string(),
            profile: BusinessProfile {
                business_name: "Acme".to_string(),
                business_type: BusinessType::StreetFood,
                revenue_band: RevenueBand::Medium,
                years_in_operation: 2,
                record_keeping_method: RecordKeepingMethod::Notebook,
                has_separate_bank_account: true,
            },
            tier: Tier::Intermediate,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn record_document_is_flat() {
        let doc = sample_record().to_document().unwrap();
        assert_eq!(doc["identity"], "u1");
        assert_eq!(doc["business_name"], "Acme");
        assert_eq!(doc["business_type"], "street_food");
        assert_eq!(doc["revenue_band"], "medium");
        assert_eq!(doc["record_keeping_method"], "notebook");
        assert_eq!(doc["tier"], "Intermediate");
    }

    #[test]
    fn record_document_roundtrip() {
        let record = sample_record();
        let parsed = BusinessRecord::from_document(record.to_document().unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn revenue_band_parse_rejects_unknown() {
        assert_eq!("high".parse::<RevenueBand>().unwrap(), RevenueBand::High);
        let err = "huge".parse::<RevenueBand>().unwrap_err();
        assert_eq!(err, InvalidInputError::RevenueBand("huge".to_string()));
    }

    #[test]
    fn revenue_band_deserializes_through_from_str() {
        let band: RevenueBand = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(band, RevenueBand::Medium);
        assert_eq!(serde_json::to_string(&band).unwrap(), "\"medium\"");

        let err = serde_json::from_str::<RevenueBand>("\"huge\"").unwrap_err();
        assert!(err.to_string().contains("Unknown revenue band: \"huge\""));
    }

    #[test]
    fn revenue_band_labels() {
        assert_eq!(RevenueBand::Low.label(), "R0 - R5,000");
        assert_eq!(RevenueBand::Medium.label(), "R5,000 - R15,000");
        assert_eq!(RevenueBand::High.label(), "R15,000+");
    }

    #[test]
    fn tier_display_matches_serde() {
        for tier in [Tier::Basic, Tier::Intermediate, Tier::Pro] {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(format!("\"{tier}\""), json);
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
        assert!("Platinum".parse::<Tier>().is_err());
    }

    #[test]
    fn new_transaction_uses_type_key() {
        let tx: NewTransaction = serde_json::from_value(serde_json::json!({
            "amount": "120.50",
            "type": "expense",
            "category": "stock"
        }))
        .unwrap();
        assert_eq!(tx.amount, dec!(120.50));
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(tx.category, "stock");
        assert!(tx.description.is_empty());
        assert!(tx.date.is_none());
    }
}
