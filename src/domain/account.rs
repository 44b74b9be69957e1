use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type AccountId = Uuid;

/// An account holding trade-credit capacity.
///
/// `available_limit` is always derived from `credit_limit - used_limit`;
/// it is never stored independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub credit_limit_cents: Cents,
    pub used_limit_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, credit_limit_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            credit_limit_cents,
            used_limit_cents: 0,
            created_at: Utc::now(),
        }
    }

    /// Seed the committed amount, for administrative imports of accounts
    /// that already carry exposure. Nothing caps this at the credit limit.
    pub fn with_used_limit(mut self, used_limit_cents: Cents) -> Self {
        self.used_limit_cents = used_limit_cents;
        self
    }

    /// Credit still available: limit minus committed amount.
    pub fn available_limit_cents(&self) -> Cents {
        self.credit_limit_cents - self.used_limit_cents
    }

    /// Committed amount after releasing `amount` back onto the account.
    /// A release never drives the used limit below zero: a charge releases
    /// at most what the account currently holds.
    pub fn used_limit_after_release(&self, amount: Cents) -> Cents {
        self.used_limit_cents - amount.min(self.used_limit_cents)
    }
}
