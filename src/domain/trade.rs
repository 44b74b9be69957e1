use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{add_months, Cents};

pub type TradeId = Uuid;
pub type InstallmentId = Uuid;

/// A marketplace trade whose value and commission can be billed in
/// installments. Totals are editable after installments exist; stored
/// installments are only brought back in line by an explicit recalculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub reference: String,
    pub total_cents: Cents,
    pub commission_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    pub fn new(reference: String, total_cents: Cents, commission_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference,
            total_cents,
            commission_cents,
            created_at: Utc::now(),
        }
    }
}

/// One slice of a trade, identified by its 1-based number within the plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub trade_id: TradeId,
    pub number: i64,
    pub amount_cents: Cents,
    pub commission_cents: Cents,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Split a trade's totals into `count` monthly installments starting at
/// `first_due`.
///
/// Division remainders are spread one cent at a time over the earliest
/// installments, so installment amounts always sum back to the trade total
/// exactly (and commissions to the commission total).
pub fn split_installments(trade: &Trade, count: i64, first_due: DateTime<Utc>) -> Vec<Installment> {
    assert!(count >= 1, "Installment count must be at least 1");

    let created_at = Utc::now();
    (1..=count)
        .map(|number| Installment {
            id: Uuid::new_v4(),
            trade_id: trade.id,
            number,
            amount_cents: split_share(trade.total_cents, count, number),
            commission_cents: split_share(trade.commission_cents, count, number),
            due_date: add_months(first_due, (number - 1) as u32),
            created_at,
        })
        .collect()
}

/// Re-derive installment shares from a trade's *current* totals, keeping
/// ids, numbers and due dates. Stored installments drift when the parent
/// trade is edited; this is the on-demand reconciliation.
pub fn recalculate_shares(trade: &Trade, existing: &[Installment]) -> Vec<Installment> {
    let count = existing.len() as i64;
    existing
        .iter()
        .map(|installment| Installment {
            amount_cents: split_share(trade.total_cents, count, installment.number),
            commission_cents: split_share(trade.commission_cents, count, installment.number),
            ..installment.clone()
        })
        .collect()
}

/// The share of `total` carried by installment `number` out of `count`:
/// total/count, plus one remainder cent for the first total%count slices.
fn split_share(total: Cents, count: i64, number: i64) -> Cents {
    let base = total / count;
    let remainder = total % count;
    if number <= remainder { base + 1 } else { base }
}
