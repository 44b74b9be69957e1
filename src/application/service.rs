use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::{
    assess, can_transition, default_reference, recalculate_shares, split_installments, Account,
    AccountId, Cents, Charge, ChargeId, ChargeStatus, Installment, ManagerId, OverdueAssessment,
    PlanStatus, RecurringPlan, Trade, TradeId, UserId,
};
use crate::storage::{LeaseAttempt, Repository};

use super::{
    build_aging_report, AgingReport, AppError, BillingConfig, EventKind, NotificationDispatcher,
    NotificationEvent, RecipientSet,
};

/// Lease name for the overdue-marking sweep.
pub const OVERDUE_SWEEP_JOB: &str = "overdue-sweep";
/// Lease name for monthly charge generation.
pub const MONTHLY_GENERATION_JOB: &str = "monthly-generation";

/// Application service for the billing engine: the single write path for
/// charges, the credit ledger, installment plans and recurring billing.
/// This is the primary interface for any client (CLI, API, scheduler).
pub struct BillingService {
    repo: Repository,
    config: BillingConfig,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

/// Input for creating a charge. Unset fields take billing defaults.
#[derive(Debug, Clone, Default)]
pub struct NewCharge {
    pub amount_cents: Cents,
    pub reference: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// Owning account, by name
    pub account: Option<String>,
    pub user_id: Option<UserId>,
    pub trade_id: Option<TradeId>,
    pub manager_id: Option<ManagerId>,
}

/// Filter for querying charges
#[derive(Debug, Clone, Default)]
pub struct ChargeFilter {
    pub account: Option<String>,
    pub status: Option<ChargeStatus>,
    pub limit: Option<usize>,
}

/// Result of marking a charge paid
pub struct PaymentResult {
    pub charge: Charge,
    /// Updated account, when the charge was account-anchored
    pub account: Option<Account>,
}

/// Result of one overdue sweep run
pub struct OverdueSweepReport {
    pub marked: Vec<OverdueAssessment>,
    pub escalated: usize,
}

/// Result of one monthly generation run
pub struct GenerationReport {
    pub generated: Vec<Charge>,
    pub completed_plans: Vec<String>,
}

impl BillingService {
    /// Create a new billing service with the given repository, configuration
    /// and notification dispatcher.
    pub fn new(
        repo: Repository,
        config: BillingConfig,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            repo,
            config,
            dispatcher,
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(
        database_path: &str,
        config: BillingConfig,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, config, dispatcher))
    }

    /// Connect to an existing database.
    pub async fn connect(
        database_path: &str,
        config: BillingConfig,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, config, dispatcher))
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    // ========================
    // Account operations
    // ========================

    /// Open a new account. `used_limit_cents` seeds pre-existing exposure
    /// for administrative imports; it is not capped at the credit limit.
    pub async fn open_account(
        &self,
        name: String,
        credit_limit_cents: Cents,
        used_limit_cents: Cents,
    ) -> Result<Account, AppError> {
        if credit_limit_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Credit limit cannot be negative".to_string(),
            ));
        }
        if used_limit_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Used limit cannot be negative".to_string(),
            ));
        }
        if self.repo.get_account_by_name(&name).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(name));
        }

        let account = Account::new(name, credit_limit_cents).with_used_limit(used_limit_cents);
        self.repo.save_account(&account).await?;
        Ok(account)
    }

    /// Get an account by name.
    pub async fn get_account(&self, name: &str) -> Result<Account, AppError> {
        self.repo
            .get_account_by_name(name)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(name.to_string()))
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    /// Change an account's approved credit limit. The used limit is left
    /// alone; available credit moves with the new limit.
    pub async fn set_credit_limit(
        &self,
        name: &str,
        credit_limit_cents: Cents,
    ) -> Result<Account, AppError> {
        if credit_limit_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Credit limit cannot be negative".to_string(),
            ));
        }
        let mut account = self.get_account(name).await?;
        self.repo
            .update_credit_limit(account.id, credit_limit_cents)
            .await?;
        account.credit_limit_cents = credit_limit_cents;
        Ok(account)
    }

    // ========================
    // Charge operations
    // ========================

    /// Create a new charge. Rejects non-positive amounts and charges with
    /// no anchor entity; fills in the billing defaults for reference, due
    /// date and status.
    pub async fn create_charge(&self, new_charge: NewCharge) -> Result<Charge, AppError> {
        if new_charge.amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }

        let account = match &new_charge.account {
            Some(name) => Some(self.get_account(name).await?),
            None => None,
        };

        let mut charge = Charge::new(new_charge.amount_cents);

        match new_charge.reference.filter(|r| !r.trim().is_empty()) {
            Some(reference) => charge = charge.with_reference(reference),
            // Blank references keep the "Charge <month>/<year>" default
            None => {}
        }

        let due_date = new_charge.due_date.unwrap_or_else(|| {
            charge.created_at + Duration::days(self.config.default_term_days)
        });
        charge = charge.with_due_date(due_date);

        if let Some(account) = &account {
            charge = charge.with_account(account.id);
        }
        if let Some(user_id) = new_charge.user_id {
            charge = charge.with_user(user_id);
        }
        if let Some(trade_id) = new_charge.trade_id {
            charge = charge.with_trade(trade_id);
        }
        if let Some(manager_id) = new_charge.manager_id {
            charge = charge.with_manager(manager_id);
        }

        if !charge.has_anchor() {
            return Err(AppError::MissingAnchor);
        }

        self.repo.save_charge(&charge).await?;

        if charge.amount_cents > self.config.high_value_cents {
            self.notify(
                EventKind::ChargeCreated,
                &charge,
                RecipientSet::Management,
                json!({ "due_date": charge.due_date.to_rfc3339() }),
            );
        }

        Ok(charge)
    }

    /// Get a charge by ID.
    pub async fn get_charge(&self, id: ChargeId) -> Result<Charge, AppError> {
        self.repo
            .get_charge(id)
            .await?
            .ok_or_else(|| AppError::ChargeNotFound(id.to_string()))
    }

    /// List charges with optional account/status filters.
    pub async fn list_charges(&self, filter: ChargeFilter) -> Result<Vec<Charge>, AppError> {
        let account_id = match &filter.account {
            Some(name) => Some(self.get_account(name).await?.id),
            None => None,
        };

        Ok(self
            .repo
            .list_charges_filtered(account_id, filter.status, filter.limit)
            .await?)
    }

    /// Mark a charge as paid.
    ///
    /// The status edge is validated against the allow-list and applied with
    /// an atomic guard; afterwards, an account-anchored charge releases its
    /// amount back onto the account's used limit. Payment notifications go
    /// out last and never affect the committed state.
    pub async fn mark_paid(
        &self,
        id: ChargeId,
        paid_date: DateTime<Utc>,
    ) -> Result<PaymentResult, AppError> {
        let charge = self.get_charge(id).await?;
        if !can_transition(charge.status, ChargeStatus::Paid) {
            return Err(AppError::InvalidTransition {
                from: charge.status,
                to: ChargeStatus::Paid,
            });
        }

        let updated = self
            .repo
            .transition_status(
                id,
                &[ChargeStatus::Pending, ChargeStatus::Overdue],
                ChargeStatus::Paid,
                Some(paid_date),
            )
            .await?;

        let charge = match updated {
            Some(charge) => charge,
            // Lost a race: someone else moved the charge first
            None => {
                let current = self.get_charge(id).await?;
                return Err(AppError::InvalidTransition {
                    from: current.status,
                    to: ChargeStatus::Paid,
                });
            }
        };

        let account = match charge.account_id {
            Some(account_id) => Some(self.release_credit(account_id, charge.amount_cents).await?),
            None => None,
        };

        // Two independent thresholds, two escalation paths
        if charge.amount_cents > self.config.high_value_cents {
            self.notify(
                EventKind::PaymentConfirmed,
                &charge,
                RecipientSet::Management,
                json!({ "paid_date": paid_date.to_rfc3339() }),
            );
        }
        if charge.amount_cents > self.config.review_cents {
            self.notify(
                EventKind::PaymentConfirmed,
                &charge,
                RecipientSet::BillingOps,
                json!({ "paid_date": paid_date.to_rfc3339() }),
            );
        }

        Ok(PaymentResult { charge, account })
    }

    /// Release a paid charge's amount back onto its account.
    ///
    /// Optimistic concurrency: read the account, compute the clamped new
    /// used limit, and compare-and-swap it in. A lost race re-reads and
    /// retries up to the configured attempt limit, then surfaces a
    /// conflict.
    async fn release_credit(
        &self,
        account_id: AccountId,
        amount: Cents,
    ) -> Result<Account, AppError> {
        let attempts = self.config.ledger_retry_attempts.max(1);

        for _ in 0..attempts {
            let account = self
                .repo
                .get_account(account_id)
                .await?
                .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;

            let new_used = account.used_limit_after_release(amount);
            if self
                .repo
                .try_swap_used_limit(account_id, account.used_limit_cents, new_used)
                .await?
            {
                return Ok(Account {
                    used_limit_cents: new_used,
                    ..account
                });
            }
        }

        Err(AppError::ConcurrentUpdateConflict {
            account_id,
            attempts,
        })
    }

    /// Cancel a charge. Cancellation has no ledger side effect: committed
    /// credit stays committed even though the charge will never be paid.
    pub async fn cancel_charge(&self, id: ChargeId) -> Result<Charge, AppError> {
        let charge = self.get_charge(id).await?;
        if !can_transition(charge.status, ChargeStatus::Cancelled) {
            return Err(AppError::InvalidTransition {
                from: charge.status,
                to: ChargeStatus::Cancelled,
            });
        }

        let updated = self
            .repo
            .transition_status(
                id,
                &[ChargeStatus::Pending, ChargeStatus::Overdue],
                ChargeStatus::Cancelled,
                None,
            )
            .await?;

        match updated {
            Some(charge) => Ok(charge),
            None => {
                let current = self.get_charge(id).await?;
                Err(AppError::InvalidTransition {
                    from: current.status,
                    to: ChargeStatus::Cancelled,
                })
            }
        }
    }

    /// Delete a charge. Deleting a paid charge is allowed but warned:
    /// its ledger release is not undone.
    pub async fn delete_charge(&self, id: ChargeId) -> Result<Charge, AppError> {
        let charge = self.get_charge(id).await?;

        if charge.status == ChargeStatus::Paid {
            warn!(
                charge_id = %charge.id,
                reference = %charge.reference,
                "Deleting a paid charge; its credit release stays on the ledger"
            );
        }

        if !self.repo.delete_charge(id).await? {
            return Err(AppError::ChargeNotFound(id.to_string()));
        }
        Ok(charge)
    }

    /// Assess interest and penalty on a charge as of `now`, without
    /// mutating anything.
    pub async fn assess_charge(
        &self,
        id: ChargeId,
        now: DateTime<Utc>,
    ) -> Result<OverdueAssessment, AppError> {
        let charge = self.get_charge(id).await?;
        Ok(assess(&charge, now, self.config.delinquency_terms()))
    }

    // ========================
    // Sweeps
    // ========================

    /// Mark every pending charge past its due date as overdue.
    ///
    /// Runs behind the overdue-sweep lease so two invocations within the
    /// exclusion window cannot overlap. Each marked charge gets a
    /// delinquency assessment and notification; charges more than the
    /// escalation threshold overdue are additionally routed to the
    /// escalation recipient set.
    pub async fn run_overdue_sweep(
        &self,
        now: DateTime<Utc>,
    ) -> Result<OverdueSweepReport, AppError> {
        self.acquire_lease(OVERDUE_SWEEP_JOB, now, self.config.overdue_lease_minutes)
            .await?;

        let due = self.repo.list_due_pending(now).await?;
        let mut marked = Vec::new();
        let mut escalated = 0;

        for charge in due {
            // The snapshot may be stale: skip charges paid or cancelled
            // since it was taken
            let overdue_charge = match self
                .repo
                .transition_status(charge.id, &[ChargeStatus::Pending], ChargeStatus::Overdue, None)
                .await?
            {
                Some(charge) => charge,
                None => continue,
            };

            let assessment = assess(&overdue_charge, now, self.config.delinquency_terms());
            let metadata = json!({
                "days_overdue": assessment.days_overdue,
                "interest_cents": assessment.interest_cents,
                "penalty_cents": assessment.penalty_cents,
                "total_cents": assessment.total_cents,
            });

            self.notify(
                EventKind::Delinquency,
                &overdue_charge,
                RecipientSet::BillingOps,
                metadata.clone(),
            );
            if assessment.days_overdue > self.config.escalation_after_days {
                self.notify(
                    EventKind::Delinquency,
                    &overdue_charge,
                    RecipientSet::Escalation,
                    metadata,
                );
                escalated += 1;
            }

            marked.push(assessment);
        }

        info!(marked = marked.len(), escalated, "Overdue sweep complete");
        Ok(OverdueSweepReport { marked, escalated })
    }

    /// Materialize charges for every recurring plan with unbilled periods.
    ///
    /// Runs behind the monthly-generation lease. A plan that was skipped
    /// for several months catches up one charge per missed period; plans
    /// past their end date are completed.
    pub async fn generate_monthly_charges(
        &self,
        now: DateTime<Utc>,
    ) -> Result<GenerationReport, AppError> {
        self.acquire_lease(MONTHLY_GENERATION_JOB, now, self.config.monthly_lease_minutes)
            .await?;

        let plans = self.repo.list_plans(true).await?;
        let mut generated = Vec::new();
        let mut completed_plans = Vec::new();

        for plan in plans {
            let periods = plan.pending_periods(now);

            if periods.is_empty() {
                if plan.is_exhausted(now) {
                    self.repo
                        .update_plan_status(plan.id, PlanStatus::Completed)
                        .await?;
                    completed_plans.push(plan.name.clone());
                }
                continue;
            }

            for period in &periods {
                let charge = Charge::new(plan.amount_cents)
                    .with_account(plan.account_id)
                    .with_reference(default_reference(*period))
                    .with_due_date(*period + Duration::days(self.config.default_term_days));
                self.repo.save_charge(&charge).await?;

                if charge.amount_cents > self.config.high_value_cents {
                    self.notify(
                        EventKind::ChargeCreated,
                        &charge,
                        RecipientSet::Management,
                        json!({ "plan": plan.name }),
                    );
                }
                generated.push(charge);
            }

            let last_period = *periods.last().unwrap();
            let mut advanced = plan.clone();
            advanced.last_generated_at = Some(last_period);

            let status = if advanced.is_exhausted(now) {
                PlanStatus::Completed
            } else {
                plan.status
            };
            self.repo
                .mark_plan_generated(plan.id, last_period, status)
                .await?;
            if status == PlanStatus::Completed {
                completed_plans.push(plan.name.clone());
            }
        }

        info!(
            generated = generated.len(),
            completed = completed_plans.len(),
            "Monthly generation complete"
        );
        Ok(GenerationReport {
            generated,
            completed_plans,
        })
    }

    async fn acquire_lease(
        &self,
        job: &str,
        now: DateTime<Utc>,
        window_minutes: i64,
    ) -> Result<(), AppError> {
        let locked_until = now + Duration::minutes(window_minutes);
        match self.repo.try_acquire_lease(job, now, locked_until).await? {
            LeaseAttempt::Acquired => Ok(()),
            LeaseAttempt::Held { locked_until } => Err(AppError::SweepAlreadyRunning {
                job: job.to_string(),
                locked_until,
            }),
        }
    }

    // ========================
    // Trades and installments
    // ========================

    /// Record a new trade.
    pub async fn record_trade(
        &self,
        reference: String,
        total_cents: Cents,
        commission_cents: Cents,
    ) -> Result<Trade, AppError> {
        if total_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Trade total must be positive".to_string(),
            ));
        }
        if commission_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Commission cannot be negative".to_string(),
            ));
        }

        let trade = Trade::new(reference, total_cents, commission_cents);
        self.repo.save_trade(&trade).await?;
        Ok(trade)
    }

    /// Get a trade by ID.
    pub async fn get_trade(&self, id: TradeId) -> Result<Trade, AppError> {
        self.repo
            .get_trade(id)
            .await?
            .ok_or_else(|| AppError::TradeNotFound(id.to_string()))
    }

    /// List all trades.
    pub async fn list_trades(&self) -> Result<Vec<Trade>, AppError> {
        Ok(self.repo.list_trades().await?)
    }

    /// Edit a trade's totals. Existing installments are NOT touched; they
    /// drift until `recalculate_installments` is called.
    pub async fn update_trade(
        &self,
        id: TradeId,
        total_cents: Cents,
        commission_cents: Cents,
    ) -> Result<Trade, AppError> {
        if total_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Trade total must be positive".to_string(),
            ));
        }
        if commission_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Commission cannot be negative".to_string(),
            ));
        }
        if !self
            .repo
            .update_trade_totals(id, total_cents, commission_cents)
            .await?
        {
            return Err(AppError::TradeNotFound(id.to_string()));
        }
        self.get_trade(id).await
    }

    /// Split a trade into `count` monthly installments, replacing any
    /// existing plan: numbers 1..=count are upserted and surplus numbers
    /// from a previously longer plan are dropped.
    pub async fn split_trade(
        &self,
        trade_id: TradeId,
        count: i64,
        first_due: Option<DateTime<Utc>>,
    ) -> Result<Vec<Installment>, AppError> {
        if count < 1 {
            return Err(AppError::InvalidInstallmentCount(count));
        }

        let trade = self.get_trade(trade_id).await?;
        let first_due = first_due
            .unwrap_or_else(|| Utc::now() + Duration::days(self.config.default_term_days));

        let installments = split_installments(&trade, count, first_due);
        for installment in &installments {
            self.repo.upsert_installment(installment).await?;
        }
        self.repo
            .delete_installments_beyond(trade_id, count)
            .await?;

        // Upserting keeps prior row ids; return what is actually stored
        Ok(self.repo.list_installments(trade_id).await?)
    }

    /// Re-derive installment amounts from the trade's current totals,
    /// keeping numbers and due dates. This is the only reconciliation path
    /// for drift introduced by trade edits.
    pub async fn recalculate_installments(
        &self,
        trade_id: TradeId,
    ) -> Result<Vec<Installment>, AppError> {
        let trade = self.get_trade(trade_id).await?;
        let existing = self.repo.list_installments(trade_id).await?;

        let updated = recalculate_shares(&trade, &existing);
        for installment in &updated {
            self.repo.upsert_installment(installment).await?;
        }

        Ok(self.repo.list_installments(trade_id).await?)
    }

    /// List a trade's installments.
    pub async fn list_installments(&self, trade_id: TradeId) -> Result<Vec<Installment>, AppError> {
        // Surface unknown trades instead of returning an empty plan
        self.get_trade(trade_id).await?;
        Ok(self.repo.list_installments(trade_id).await?)
    }

    // ========================
    // Recurring plans
    // ========================

    /// Create a recurring monthly billing plan for an account.
    pub async fn create_plan(
        &self,
        name: String,
        account_name: &str,
        amount_cents: Cents,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<RecurringPlan, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Plan amount must be positive".to_string(),
            ));
        }
        if self.repo.get_plan_by_name(&name).await?.is_some() {
            return Err(AppError::PlanAlreadyExists(name));
        }

        let account = self.get_account(account_name).await?;
        let mut plan = RecurringPlan::new(name, account.id, amount_cents, start_date);
        if let Some(end_date) = end_date {
            plan = plan.with_end_date(end_date);
        }

        self.repo.save_plan(&plan).await?;
        Ok(plan)
    }

    /// Get a recurring plan by name.
    pub async fn get_plan(&self, name: &str) -> Result<RecurringPlan, AppError> {
        self.repo
            .get_plan_by_name(name)
            .await?
            .ok_or_else(|| AppError::PlanNotFound(name.to_string()))
    }

    /// List recurring plans.
    pub async fn list_plans(&self, only_active: bool) -> Result<Vec<RecurringPlan>, AppError> {
        Ok(self.repo.list_plans(only_active).await?)
    }

    /// Pause an active plan.
    pub async fn pause_plan(&self, name: &str) -> Result<RecurringPlan, AppError> {
        let mut plan = self.get_plan(name).await?;
        self.repo
            .update_plan_status(plan.id, PlanStatus::Paused)
            .await?;
        plan.status = PlanStatus::Paused;
        Ok(plan)
    }

    /// Resume a paused plan.
    pub async fn resume_plan(&self, name: &str) -> Result<RecurringPlan, AppError> {
        let mut plan = self.get_plan(name).await?;
        self.repo
            .update_plan_status(plan.id, PlanStatus::Active)
            .await?;
        plan.status = PlanStatus::Active;
        Ok(plan)
    }

    // ========================
    // Reporting
    // ========================

    /// Build the receivables aging report over all open charges.
    pub async fn aging_report(&self, now: DateTime<Utc>) -> Result<AgingReport, AppError> {
        let mut open = self
            .repo
            .list_charges_filtered(None, Some(ChargeStatus::Pending), None)
            .await?;
        open.extend(
            self.repo
                .list_charges_filtered(None, Some(ChargeStatus::Overdue), None)
                .await?,
        );

        Ok(build_aging_report(
            &open,
            now,
            self.config.delinquency_terms(),
        ))
    }

    // ========================
    // Notifications
    // ========================

    /// Best-effort dispatch: failures are logged and swallowed, never
    /// propagated into the charge/ledger state change that triggered them.
    fn notify(
        &self,
        kind: EventKind,
        charge: &Charge,
        recipients: RecipientSet,
        metadata: serde_json::Value,
    ) {
        let event = NotificationEvent {
            kind,
            charge: charge.clone(),
            recipients,
            metadata,
        };
        if let Err(err) = self.dispatcher.dispatch(event) {
            warn!(
                error = %err,
                event = kind.as_str(),
                charge_id = %charge.id,
                "Notification dispatch failed"
            );
        }
    }
}
