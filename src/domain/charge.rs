use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, AccountId, TradeId};

pub type ChargeId = Uuid;
pub type UserId = Uuid;
pub type ManagerId = Uuid;

/// Days until a charge falls due when no due date is given.
pub const DEFAULT_TERM_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    /// Awaiting payment, not yet due or within term
    Pending,
    /// Past its due date without payment
    Overdue,
    /// Settled; the only status that touches the credit ledger
    Paid,
    /// Manually voided; no ledger side effect
    Cancelled,
}

impl ChargeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeStatus::Pending => "pending",
            ChargeStatus::Overdue => "overdue",
            ChargeStatus::Paid => "paid",
            ChargeStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ChargeStatus::Pending),
            "overdue" => Some(ChargeStatus::Overdue),
            "paid" => Some(ChargeStatus::Paid),
            "cancelled" => Some(ChargeStatus::Cancelled),
            _ => None,
        }
    }

    /// Paid and Cancelled admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChargeStatus::Paid | ChargeStatus::Cancelled)
    }

    /// Still collectible: counted in exposure and aging.
    pub fn is_open(&self) -> bool {
        matches!(self, ChargeStatus::Pending | ChargeStatus::Overdue)
    }
}

impl std::fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Allow-list of legal status edges. Every mutation path goes through this
/// single function; there is no other way to move a charge between states.
pub fn can_transition(from: ChargeStatus, to: ChargeStatus) -> bool {
    use ChargeStatus::*;
    matches!(
        (from, to),
        (Pending, Paid) | (Pending, Overdue) | (Pending, Cancelled) | (Overdue, Paid) | (Overdue, Cancelled)
    )
}

/// One billable obligation. A charge must anchor to at least one of an
/// account, a user, or a trade; only account-anchored charges interact
/// with the credit ledger on payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub id: ChargeId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    /// Human-readable label, e.g. "Charge 2/2024"
    pub reference: String,
    pub status: ChargeStatus,
    pub due_date: DateTime<Utc>,
    /// Set only when the charge transitions to Paid
    pub paid_date: Option<DateTime<Utc>>,
    pub account_id: Option<AccountId>,
    pub user_id: Option<UserId>,
    pub trade_id: Option<TradeId>,
    /// Responsible party for escalation routing
    pub manager_id: Option<ManagerId>,
    pub created_at: DateTime<Utc>,
}

impl Charge {
    /// Create a new pending charge. Defaults: due in DEFAULT_TERM_DAYS,
    /// reference derived from the creation month.
    pub fn new(amount_cents: Cents) -> Self {
        assert!(amount_cents > 0, "Charge amount must be positive");
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            amount_cents,
            reference: default_reference(created_at),
            status: ChargeStatus::Pending,
            due_date: created_at + Duration::days(DEFAULT_TERM_DAYS),
            paid_date: None,
            account_id: None,
            user_id: None,
            trade_id: None,
            manager_id: None,
            created_at,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_trade(mut self, trade_id: TradeId) -> Self {
        self.trade_id = Some(trade_id);
        self
    }

    pub fn with_manager(mut self, manager_id: ManagerId) -> Self {
        self.manager_id = Some(manager_id);
        self
    }

    /// A charge must be billed against something: an account, a user,
    /// or a trade.
    pub fn has_anchor(&self) -> bool {
        self.account_id.is_some() || self.user_id.is_some() || self.trade_id.is_some()
    }
}

/// Default reference label for a charge created at `date`: "Charge <month>/<year>"
pub fn default_reference(date: DateTime<Utc>) -> String {
    format!("Charge {}/{}", date.month(), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ChargeStatus::Pending,
            ChargeStatus::Overdue,
            ChargeStatus::Paid,
            ChargeStatus::Cancelled,
        ] {
            let s = status.as_str();
            let parsed = ChargeStatus::from_str(s).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_transition_allow_list() {
        use ChargeStatus::*;

        assert!(can_transition(Pending, Paid));
        assert!(can_transition(Pending, Overdue));
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(Overdue, Paid));
        assert!(can_transition(Overdue, Cancelled));

        // Terminal states admit nothing
        for to in [Pending, Overdue, Paid, Cancelled] {
            assert!(!can_transition(Paid, to));
            assert!(!can_transition(Cancelled, to));
        }
        // No path back to Pending, and Overdue is only entered from Pending
        assert!(!can_transition(Overdue, Pending));
        assert!(!can_transition(Pending, Pending));
    }

    #[test]
    fn test_new_charge_defaults() {
        let charge = Charge::new(120000);
        assert_eq!(charge.status, ChargeStatus::Pending);
        assert_eq!(charge.paid_date, None);
        assert_eq!(
            charge.due_date - charge.created_at,
            Duration::days(DEFAULT_TERM_DAYS)
        );
        assert_eq!(charge.reference, default_reference(charge.created_at));
        assert!(!charge.has_anchor());
    }

    #[test]
    fn test_anchor_detection() {
        let charge = Charge::new(5000).with_account(Uuid::new_v4());
        assert!(charge.has_anchor());

        let charge = Charge::new(5000).with_user(Uuid::new_v4());
        assert!(charge.has_anchor());

        let charge = Charge::new(5000).with_trade(Uuid::new_v4());
        assert!(charge.has_anchor());
    }

    #[test]
    fn test_default_reference_format() {
        let date = DateTime::parse_from_rfc3339("2024-02-09T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(default_reference(date), "Charge 2/2024");
    }

    #[test]
    #[should_panic(expected = "Charge amount must be positive")]
    fn test_charge_requires_positive_amount() {
        Charge::new(0);
    }
}
