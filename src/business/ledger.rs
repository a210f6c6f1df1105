//! Transaction ledger: income and expense entries per business, plus the
//! health report built from them.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, PersistenceError, ValidationError};
use crate::store::DocumentStore;

use super::model::{NewTransaction, TransactionRecord, TransactionType, transactions_path};
use super::repo;

/// Stored body of a transaction. The id lives on the store entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransactionDocument {
    amount: Decimal,
    #[serde(rename = "type")]
    kind: TransactionType,
    category: String,
    description: String,
    date: chrono::DateTime<Utc>,
}

/// Income, expense and net totals for one business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub transaction_count: usize,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
    /// Expense totals keyed by category.
    pub expenses_by_category: BTreeMap<String, Decimal>,
}

impl HealthReport {
    /// Sum the transactions. Totals outside the `Decimal` range are a
    /// `TotalOverflow` error.
    pub fn from_transactions(transactions: &[TransactionRecord]) -> Result<Self, ValidationError> {
        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        let mut expenses_by_category = BTreeMap::new();

        for tx in transactions {
            match tx.kind {
                TransactionType::Income => {
                    total_income = checked_total(total_income, tx.amount, "total_income")?;
                }
                TransactionType::Expense => {
                    total_expense = checked_total(total_expense, tx.amount, "total_expense")?;
                    let category = if tx.category.trim().is_empty() {
                        "uncategorized".to_string()
                    } else {
                        tx.category.trim().to_lowercase()
                    };
                    let slot = expenses_by_category.entry(category).or_insert(Decimal::ZERO);
                    *slot = checked_total(*slot, tx.amount, "expenses_by_category")?;
                }
            }
        }

        let net = total_income
            .checked_sub(total_expense)
            .ok_or(ValidationError::TotalOverflow { field: "net" })?;

        Ok(Self {
            transaction_count: transactions.len(),
            total_income,
            total_expense,
            net,
            expenses_by_category,
        })
    }
}

fn checked_total(
    total: Decimal,
    amount: Decimal,
    field: &'static str,
) -> Result<Decimal, ValidationError> {
    total
        .checked_add(amount)
        .ok_or(ValidationError::TotalOverflow { field })
}

/// Append and read transactions for onboarded businesses.
pub struct Ledger {
    store: Arc<dyn DocumentStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append a transaction. The business must already exist.
    pub async fn add_transaction(
        &self,
        identity: &str,
        tx: NewTransaction,
    ) -> Result<TransactionRecord, Error> {
        if tx.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount {
                amount: tx.amount.to_string(),
            }
            .into());
        }
        self.require_business(identity).await?;

        let doc = TransactionDocument {
            amount: tx.amount,
            kind: tx.kind,
            category: tx.category.trim().to_string(),
            description: tx.description.trim().to_string(),
            date: tx.date.unwrap_or_else(Utc::now),
        };
        let value =
            serde_json::to_value(&doc).map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let id = self
            .store
            .add_record(&transactions_path(identity), &value)
            .await
            .inspect_err(|e| warn!(identity, error = %e, "Failed to log transaction"))?;

        info!(identity, id = %id, amount = %doc.amount, kind = ?doc.kind, "Transaction logged");
        Ok(TransactionRecord {
            id,
            amount: doc.amount,
            kind: doc.kind,
            category: doc.category,
            description: doc.description,
            date: doc.date,
        })
    }

    /// All transactions for a business, oldest first.
    pub async fn list_transactions(&self, identity: &str) -> Result<Vec<TransactionRecord>, Error> {
        self.require_business(identity).await?;

        let entries = self.store.list_records(&transactions_path(identity)).await?;
        let mut transactions = Vec::with_capacity(entries.len());
        for entry in entries {
            let doc: TransactionDocument = serde_json::from_value(entry.data).map_err(|e| {
                PersistenceError::Serialization(format!("transaction {}: {e}", entry.id))
            })?;
            transactions.push(TransactionRecord {
                id: entry.id,
                amount: doc.amount,
                kind: doc.kind,
                category: doc.category,
                description: doc.description,
                date: doc.date,
            });
        }
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(transactions)
    }

    pub async fn health_report(&self, identity: &str) -> Result<HealthReport, Error> {
        let transactions = self.list_transactions(identity).await?;
        HealthReport::from_transactions(&transactions)
            .inspect_err(|e| warn!(identity, error = %e, "Health report totals overflowed"))
            .map_err(Error::from)
    }

    async fn require_business(&self, identity: &str) -> Result<(), Error> {
        match repo::load_business(self.store.as_ref(), identity).await? {
            Some(_) => Ok(()),
            None => Err(Error::NotOnboarded {
                identity: identity.to_string(),
            }),
        }
    }
}
