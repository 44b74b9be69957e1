use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{BasisPoints, Cents, DelinquencyTerms};

/// Tunable billing parameters. Every field has a production default; a
/// JSON config file may override any subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Monthly interest rate on overdue charges, in basis points (100 = 1%)
    pub monthly_interest_bp: BasisPoints,
    /// Flat penalty rate on overdue charges, in basis points (200 = 2%)
    pub penalty_bp: BasisPoints,
    /// Days until an undated charge falls due
    pub default_term_days: i64,
    /// Days overdue after which delinquency is routed to the escalation set
    pub escalation_after_days: i64,
    /// Payments above this amount notify management
    pub high_value_cents: Cents,
    /// Payments above this amount notify billing ops for review
    pub review_cents: Cents,
    /// Attempts for the optimistic used-limit update before giving up
    pub ledger_retry_attempts: u32,
    /// Minimum exclusion window for the overdue sweep, in minutes
    pub overdue_lease_minutes: i64,
    /// Minimum exclusion window for monthly generation, in minutes
    pub monthly_lease_minutes: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            monthly_interest_bp: 100,
            penalty_bp: 200,
            default_term_days: 30,
            escalation_after_days: 30,
            high_value_cents: 100_000,
            review_cents: 50_000,
            ledger_retry_attempts: 5,
            overdue_lease_minutes: 5,
            monthly_lease_minutes: 30,
        }
    }
}

impl BillingConfig {
    /// Load configuration from a JSON file. Missing fields fall back to
    /// their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn delinquency_terms(&self) -> DelinquencyTerms {
        DelinquencyTerms {
            monthly_interest_bp: self.monthly_interest_bp,
            penalty_bp: self.penalty_bp,
        }
    }
}
