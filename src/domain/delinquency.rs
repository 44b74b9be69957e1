use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{apply_rate, pro_rata_monthly, BasisPoints, Cents, Charge, ChargeId};

/// Rates applied to overdue charges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DelinquencyTerms {
    /// Monthly interest rate in basis points (100 = 1%/month)
    pub monthly_interest_bp: BasisPoints,
    /// Flat penalty rate in basis points (200 = 2%)
    pub penalty_bp: BasisPoints,
}

impl Default for DelinquencyTerms {
    fn default() -> Self {
        Self {
            monthly_interest_bp: 100,
            penalty_bp: 200,
        }
    }
}

/// Interest and penalty assessed against one overdue charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueAssessment {
    pub charge_id: ChargeId,
    pub amount_cents: Cents,
    pub days_overdue: i64,
    pub interest_cents: Cents,
    pub penalty_cents: Cents,
    pub total_cents: Cents,
}

/// Whole days elapsed since the due date, floored, never negative.
pub fn days_overdue(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - due_date).num_days().max(0)
}

/// Assess interest and penalty on a charge as of `now`.
///
/// Interest accrues pro-rata on the monthly rate (a month counts as 30
/// days); the penalty is flat on the principal. Assessment is a pure
/// computation: it never mutates the charge.
pub fn assess(charge: &Charge, now: DateTime<Utc>, terms: DelinquencyTerms) -> OverdueAssessment {
    let days = days_overdue(charge.due_date, now);
    let interest_cents = pro_rata_monthly(charge.amount_cents, terms.monthly_interest_bp, days);
    let penalty_cents = apply_rate(charge.amount_cents, terms.penalty_bp);

    OverdueAssessment {
        charge_id: charge.id,
        amount_cents: charge.amount_cents,
        days_overdue: days,
        interest_cents,
        penalty_cents,
        total_cents: charge.amount_cents + interest_cents + penalty_cents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn parse_date(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{}T00:00:00Z", s))
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_days_overdue_floors_whole_days() {
        let due = parse_date("2024-01-10");
        // 29 days and 23 hours late still counts as 29 days
        let now = due + Duration::days(29) + Duration::hours(23);
        assert_eq!(days_overdue(due, now), 29);
    }

    #[test]
    fn test_days_overdue_never_negative() {
        let due = parse_date("2024-01-10");
        assert_eq!(days_overdue(due, due - Duration::days(5)), 0);
        assert_eq!(days_overdue(due, due), 0);
    }

    #[test]
    fn test_assessment_one_month_overdue() {
        // Charge of 1200.00 due 2024-01-10, assessed 2024-02-09: 30 days
        // overdue, 12.00 interest, 24.00 penalty, 1236.00 total.
        let charge = Charge::new(120000)
            .with_account(uuid::Uuid::new_v4())
            .with_due_date(parse_date("2024-01-10"));
        let assessment = assess(&charge, parse_date("2024-02-09"), DelinquencyTerms::default());

        assert_eq!(assessment.days_overdue, 30);
        assert_eq!(assessment.interest_cents, 1200);
        assert_eq!(assessment.penalty_cents, 2400);
        assert_eq!(assessment.total_cents, 123600);
    }

    #[test]
    fn test_assessment_not_yet_due_accrues_penalty_only() {
        let charge = Charge::new(100000).with_due_date(parse_date("2024-03-01"));
        let assessment = assess(&charge, parse_date("2024-02-01"), DelinquencyTerms::default());

        assert_eq!(assessment.days_overdue, 0);
        assert_eq!(assessment.interest_cents, 0);
        assert_eq!(assessment.penalty_cents, 2000);
        assert_eq!(assessment.total_cents, 102000);
    }

    #[test]
    fn test_assessment_uses_configured_rates() {
        let terms = DelinquencyTerms {
            monthly_interest_bp: 300, // 3%/month
            penalty_bp: 1000,         // 10%
        };
        let charge = Charge::new(50000).with_due_date(parse_date("2024-01-01"));
        let assessment = assess(&charge, parse_date("2024-01-16"), terms);

        assert_eq!(assessment.days_overdue, 15);
        // 3%/month over half a month = 1.5% of 500.00 = 7.50
        assert_eq!(assessment.interest_cents, 750);
        assert_eq!(assessment.penalty_cents, 5000);
        assert_eq!(assessment.total_cents, 55750);
    }
}
