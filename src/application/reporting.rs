use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{assess, days_overdue, Cents, Charge, DelinquencyTerms};

const BUCKET_LABELS: [&str; 5] = ["current", "1-30", "31-60", "61-90", "over-90"];

/// One aging band of the receivables report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingBucket {
    pub label: String,
    pub count: i64,
    /// Face value of the charges in this band
    pub principal_cents: Cents,
    /// Principal plus accrued interest and penalty for overdue bands;
    /// equals principal for the current band
    pub assessed_cents: Cents,
}

/// Open receivables bucketed by how far past due they are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: DateTime<Utc>,
    pub buckets: Vec<AgingBucket>,
    pub total_open_cents: Cents,
    pub total_assessed_cents: Cents,
}

/// Build the aging report from a snapshot of open charges.
/// Closed charges (paid, cancelled) must be filtered out by the caller.
pub fn build_aging_report(
    charges: &[Charge],
    now: DateTime<Utc>,
    terms: DelinquencyTerms,
) -> AgingReport {
    let mut buckets: Vec<AgingBucket> = BUCKET_LABELS
        .iter()
        .map(|label| AgingBucket {
            label: label.to_string(),
            count: 0,
            principal_cents: 0,
            assessed_cents: 0,
        })
        .collect();

    for charge in charges {
        let days = days_overdue(charge.due_date, now);
        let index = bucket_index(days);

        let assessed = if days > 0 {
            assess(charge, now, terms).total_cents
        } else {
            charge.amount_cents
        };

        let bucket = &mut buckets[index];
        bucket.count += 1;
        bucket.principal_cents += charge.amount_cents;
        bucket.assessed_cents += assessed;
    }

    let total_open_cents = buckets.iter().map(|b| b.principal_cents).sum();
    let total_assessed_cents = buckets.iter().map(|b| b.assessed_cents).sum();

    AgingReport {
        as_of: now,
        buckets,
        total_open_cents,
        total_assessed_cents,
    }
}

fn bucket_index(days: i64) -> usize {
    match days {
        0 => 0,
        1..=30 => 1,
        31..=60 => 2,
        61..=90 => 3,
        _ => 4,
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

    fn charge_due(amount: Cents, due: DateTime<Utc>) -> Charge {
        Charge::new(amount)
            .with_account(uuid::Uuid::new_v4())
            .with_due_date(due)
    }

    #[test]
    fn test_empty_report() {
        let report = build_aging_report(&[], parse_date("2024-02-01"), DelinquencyTerms::default());
        assert_eq!(report.buckets.len(), 5);
        assert_eq!(report.total_open_cents, 0);
        assert_eq!(report.total_assessed_cents, 0);
    }

    #[test]
    fn test_bucketing_by_days_overdue() {
        let now = parse_date("2024-04-01");
        let charges = vec![
            charge_due(10000, now + Duration::days(10)), // not due yet
            charge_due(20000, now - Duration::days(15)), // 1-30
            charge_due(30000, now - Duration::days(45)), // 31-60
            charge_due(40000, now - Duration::days(75)), // 61-90
            charge_due(50000, now - Duration::days(200)), // over-90
        ];

        let report = build_aging_report(&charges, now, DelinquencyTerms::default());

        let counts: Vec<i64> = report.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 1, 1]);
        assert_eq!(report.buckets[0].principal_cents, 10000);
        assert_eq!(report.buckets[4].principal_cents, 50000);
        assert_eq!(report.total_open_cents, 150000);
    }

    #[test]
    fn test_current_band_assessed_equals_principal() {
        let now = parse_date("2024-04-01");
        let charges = vec![charge_due(10000, now + Duration::days(5))];

        let report = build_aging_report(&charges, now, DelinquencyTerms::default());
        assert_eq!(report.buckets[0].assessed_cents, 10000);
        assert_eq!(report.total_assessed_cents, 10000);
    }

    #[test]
    fn test_overdue_band_includes_interest_and_penalty() {
        let now = parse_date("2024-02-09");
        // 1200.00, 30 days overdue: 12.00 interest + 24.00 penalty
        let charges = vec![charge_due(120000, parse_date("2024-01-10"))];

        let report = build_aging_report(&charges, now, DelinquencyTerms::default());
        assert_eq!(report.buckets[1].principal_cents, 120000);
        assert_eq!(report.buckets[1].assessed_cents, 123600);
        assert_eq!(report.total_assessed_cents, 123600);
    }

    #[test]
    fn test_boundary_days_land_in_lower_bands() {
        let now = parse_date("2024-04-01");
        let charges = vec![
            charge_due(1000, now - Duration::days(30)),
            charge_due(1000, now - Duration::days(31)),
            charge_due(1000, now - Duration::days(90)),
            charge_due(1000, now - Duration::days(91)),
        ];

        let report = build_aging_report(&charges, now, DelinquencyTerms::default());
        let counts: Vec<i64> = report.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![0, 1, 1, 1, 1]);
    }
}
