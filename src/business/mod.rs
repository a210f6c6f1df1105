//! Business domain: records, tier classification, and the transaction
//! ledger.

pub mod ledger;
pub mod model;
pub mod repo;
pub mod tier;

pub use ledger::{HealthReport, Ledger};
pub use model::{
    BusinessProfile, BusinessRecord, BusinessType, NewTransaction, RecordKeepingMethod,
    RevenueBand, Tier, TransactionRecord, TransactionType,
};
pub use tier::{classify, classify_raw};
