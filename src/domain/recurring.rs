use chrono::{DateTime, Datelike, Months, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents};

pub type PlanId = Uuid;

/// Status of a recurring billing plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    Paused,
    Completed,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Paused => "paused",
            PlanStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(PlanStatus::Active),
            "paused" => Some(PlanStatus::Paused),
            "completed" => Some(PlanStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring monthly billing plan: the source of truth for monthly charge
/// generation. Bills every month on the start date's day (clamped to the
/// last day of shorter months).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringPlan {
    pub id: PlanId,
    pub name: String,
    pub account_id: AccountId,
    pub amount_cents: Cents,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    /// Watermark: the last billing period already materialized as a charge
    pub last_generated_at: Option<DateTime<Utc>>,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
}

impl RecurringPlan {
    pub fn new(
        name: String,
        account_id: AccountId,
        amount_cents: Cents,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            account_id,
            amount_cents,
            start_date,
            end_date: None,
            last_generated_at: None,
            status: PlanStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// Set end date (for finite plans)
    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// The next billing period after the watermark, or None for plans that
    /// are not active or have run past their end date.
    pub fn next_billing_date(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.status != PlanStatus::Active {
            return None;
        }

        let reference_date = self.last_generated_at.unwrap_or(self.start_date);

        if reference_date > now {
            return Some(reference_date);
        }

        let next = if self.last_generated_at.is_none() {
            self.start_date
        } else {
            add_months(reference_date, 1)
        };

        if let Some(end_date) = self.end_date {
            if next > end_date {
                return None;
            }
        }

        Some(next)
    }

    /// Check if this plan has at least one unbilled period
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_billing_date(now) {
            Some(next) => next <= now,
            None => false,
        }
    }

    /// All billing periods between the watermark and `now`, oldest first.
    /// A sweep that was down for several months catches up one charge per
    /// missed period.
    pub fn pending_periods(&self, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        if self.status != PlanStatus::Active {
            return vec![];
        }

        let mut periods = Vec::new();
        let mut current = self.last_generated_at.unwrap_or(self.start_date);

        if current > now {
            return vec![];
        }

        if self.last_generated_at.is_none() && self.start_date <= now {
            periods.push(self.start_date);
            current = self.start_date;
        }

        loop {
            let next = add_months(current, 1);

            if next > now {
                break;
            }

            if let Some(end_date) = self.end_date {
                if next > end_date {
                    break;
                }
            }

            periods.push(next);
            current = next;
        }

        periods
    }

    /// A plan is exhausted once no further period fits before its end date.
    pub fn is_exhausted(&self, now: DateTime<Utc>) -> bool {
        self.status == PlanStatus::Active
            && self.end_date.is_some()
            && self.next_billing_date(now).is_none()
    }
}

/// Add calendar months to a date, clamping to the last day of shorter
/// months (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let naive = date.date_naive();
    let current_day = naive.day();

    let target_month_first = naive
        .with_day(1)
        .unwrap()
        .checked_add_months(Months::new(months))
        .unwrap();

    let next_date = target_month_first.with_day(current_day).unwrap_or_else(|| {
        // Day doesn't exist in the target month; use its last day
        target_month_first
            .checked_add_months(Months::new(1))
            .unwrap()
            .pred_opt()
            .unwrap()
    });

    next_date
        .and_hms_opt(date.hour(), date.minute(), date.second())
        .unwrap()
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_date(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{}T10:00:00Z", s))
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample_plan(start: DateTime<Utc>) -> RecurringPlan {
        RecurringPlan::new("membership".to_string(), Uuid::new_v4(), 15000, start)
    }

    #[test]
    fn test_plan_status_roundtrip() {
        for status in [PlanStatus::Active, PlanStatus::Paused, PlanStatus::Completed] {
            let s = status.as_str();
            let parsed = PlanStatus::from_str(s).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_first_billing_is_start_date() {
        let start = parse_date("2024-01-15");
        let plan = sample_plan(start);

        assert_eq!(plan.next_billing_date(start), Some(start));
        assert!(plan.is_due(start));
        assert!(!plan.is_due(start - chrono::Duration::days(1)));
    }

    #[test]
    fn test_subsequent_billing_is_one_month_later() {
        let start = parse_date("2024-01-15");
        let mut plan = sample_plan(start);
        plan.last_generated_at = Some(start);

        let next = plan.next_billing_date(parse_date("2024-02-20")).unwrap();
        assert_eq!(next.date_naive().to_string(), "2024-02-15");
    }

    #[test]
    fn test_month_end_clamping() {
        let start = parse_date("2024-01-31");
        let mut plan = sample_plan(start);
        plan.last_generated_at = Some(start);

        let next = plan.next_billing_date(parse_date("2024-03-01")).unwrap();
        // 2024 is a leap year
        assert_eq!(next.date_naive().to_string(), "2024-02-29");
    }

    #[test]
    fn test_pending_periods_catch_up() {
        let start = parse_date("2024-01-10");
        let plan = sample_plan(start);

        let periods = plan.pending_periods(parse_date("2024-04-12"));
        assert_eq!(periods.len(), 4);
        assert_eq!(periods[0].date_naive().to_string(), "2024-01-10");
        assert_eq!(periods[3].date_naive().to_string(), "2024-04-10");
    }

    #[test]
    fn test_paused_plan_never_due() {
        let start = parse_date("2024-01-10");
        let mut plan = sample_plan(start);
        plan.status = PlanStatus::Paused;

        assert!(!plan.is_due(parse_date("2024-06-01")));
        assert!(plan.pending_periods(parse_date("2024-06-01")).is_empty());
    }

    #[test]
    fn test_end_date_stops_billing() {
        let start = parse_date("2024-01-10");
        let plan = sample_plan(start).with_end_date(parse_date("2024-03-15"));

        let periods = plan.pending_periods(parse_date("2024-08-01"));
        // Jan, Feb, Mar only
        assert_eq!(periods.len(), 3);
    }

    #[test]
    fn test_exhausted_plan() {
        let start = parse_date("2024-01-10");
        let mut plan = sample_plan(start).with_end_date(parse_date("2024-02-15"));
        plan.last_generated_at = Some(parse_date("2024-02-10"));

        assert!(plan.is_exhausted(parse_date("2024-03-01")));
    }

    #[test]
    fn test_add_months_plain() {
        let date = parse_date("2024-03-15");
        assert_eq!(add_months(date, 1).date_naive().to_string(), "2024-04-15");
        assert_eq!(add_months(date, 12).date_naive().to_string(), "2025-03-15");
    }
}
