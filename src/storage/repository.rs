use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, Cents, Charge, ChargeId, ChargeStatus, Installment, PlanId, PlanStatus,
    RecurringPlan, Trade, TradeId,
};

use super::{
    MIGRATION_001_INITIAL, MIGRATION_002_TRADES, MIGRATION_003_RECURRING_PLANS,
    MIGRATION_004_JOB_LEASES,
};

const CHARGE_COLUMNS: &str = "id, amount_cents, reference, status, due_date, paid_date, account_id, user_id, trade_id, manager_id, created_at";

/// Outcome of a lease acquisition attempt for a named sweep job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseAttempt {
    Acquired,
    Held { locked_until: DateTime<Utc> },
}

/// Repository for persisting and querying accounts, charges, trades,
/// installments and recurring plans.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        for (name, sql) in [
            ("001", MIGRATION_001_INITIAL),
            ("002", MIGRATION_002_TRADES),
            ("003", MIGRATION_003_RECURRING_PLANS),
            ("004", MIGRATION_004_JOB_LEASES),
        ] {
            sqlx::raw_sql(sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to run migration {}", name))?;
        }
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account to the database.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, credit_limit_cents, used_limit_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.name)
        .bind(account.credit_limit_cents)
        .bind(account.used_limit_cents)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            "SELECT id, name, credit_limit_cents, used_limit_cents, created_at FROM accounts WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Get an account by name.
    pub async fn get_account_by_name(&self, name: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            "SELECT id, name, credit_limit_cents, used_limit_cents, created_at FROM accounts WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// List all accounts ordered by name.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            "SELECT id, name, credit_limit_cents, used_limit_cents, created_at FROM accounts ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Update the approved credit limit of an account.
    pub async fn update_credit_limit(&self, id: AccountId, credit_limit_cents: Cents) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET credit_limit_cents = ? WHERE id = ?")
            .bind(credit_limit_cents)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update credit limit")?;
        Ok(result.rows_affected() > 0)
    }

    /// One compare-and-swap attempt on an account's used limit.
    ///
    /// Succeeds only if the stored value still equals `expected_used_cents`,
    /// so two concurrent releases on the same account can never both apply
    /// against the same snapshot. The caller owns the retry loop.
    pub async fn try_swap_used_limit(
        &self,
        id: AccountId,
        expected_used_cents: Cents,
        new_used_cents: Cents,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET used_limit_cents = ? WHERE id = ? AND used_limit_cents = ?",
        )
        .bind(new_used_cents)
        .bind(id.to_string())
        .bind(expected_used_cents)
        .execute(&self.pool)
        .await
        .context("Failed to update used limit")?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            name: row.get("name"),
            credit_limit_cents: row.get("credit_limit_cents"),
            used_limit_cents: row.get("used_limit_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Charge operations
    // ========================

    /// Save a new charge to the database.
    pub async fn save_charge(&self, charge: &Charge) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO charges (id, amount_cents, reference, status, due_date, paid_date, account_id, user_id, trade_id, manager_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(charge.id.to_string())
        .bind(charge.amount_cents)
        .bind(&charge.reference)
        .bind(charge.status.as_str())
        .bind(charge.due_date.to_rfc3339())
        .bind(charge.paid_date.map(|dt| dt.to_rfc3339()))
        .bind(charge.account_id.map(|id| id.to_string()))
        .bind(charge.user_id.map(|id| id.to_string()))
        .bind(charge.trade_id.map(|id| id.to_string()))
        .bind(charge.manager_id.map(|id| id.to_string()))
        .bind(charge.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save charge")?;
        Ok(())
    }

    /// Get a charge by ID.
    pub async fn get_charge(&self, id: ChargeId) -> Result<Option<Charge>> {
        let row = sqlx::query(&format!("SELECT {} FROM charges WHERE id = ?", CHARGE_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch charge")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_charge(&row)?)),
            None => Ok(None),
        }
    }

    /// List charges with optional filters, in insertion order.
    pub async fn list_charges_filtered(
        &self,
        account_id: Option<AccountId>,
        status: Option<ChargeStatus>,
        limit: Option<usize>,
    ) -> Result<Vec<Charge>> {
        let mut query = format!("SELECT {} FROM charges WHERE 1=1", CHARGE_COLUMNS);

        let account_id_str = account_id.map(|id| id.to_string());

        if account_id.is_some() {
            query.push_str(" AND account_id = ?");
        }
        if status.is_some() {
            query.push_str(" AND status = ?");
        }

        query.push_str(" ORDER BY rowid");

        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let mut sql_query = sqlx::query(&query);

        if let Some(ref aid_str) = account_id_str {
            sql_query = sql_query.bind(aid_str);
        }
        if let Some(st) = status {
            sql_query = sql_query.bind(st.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list charges")?;

        rows.iter().map(Self::row_to_charge).collect()
    }

    /// List pending charges whose due date has passed: the overdue sweep's
    /// working set, snapshot at call time.
    pub async fn list_due_pending(&self, now: DateTime<Utc>) -> Result<Vec<Charge>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM charges WHERE status = 'pending' AND due_date < ? ORDER BY due_date",
            CHARGE_COLUMNS
        ))
        .bind(now.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list due pending charges")?;

        rows.iter().map(Self::row_to_charge).collect()
    }

    /// Atomically move a charge along one allowed status edge.
    ///
    /// The `allowed_from` guard travels inside the UPDATE itself, so a
    /// concurrent transition on the same charge makes this a no-op instead
    /// of overwriting; returns the updated charge, or None when the charge
    /// was missing or no longer in an allowed source status.
    pub async fn transition_status(
        &self,
        id: ChargeId,
        allowed_from: &[ChargeStatus],
        to: ChargeStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> Result<Option<Charge>> {
        let placeholders = vec!["?"; allowed_from.len()].join(", ");
        let query = format!(
            "UPDATE charges SET status = ?, paid_date = COALESCE(?, paid_date) WHERE id = ? AND status IN ({}) RETURNING {}",
            placeholders, CHARGE_COLUMNS
        );

        let mut sql_query = sqlx::query(&query)
            .bind(to.as_str())
            .bind(paid_date.map(|dt| dt.to_rfc3339()))
            .bind(id.to_string());

        for from in allowed_from {
            sql_query = sql_query.bind(from.as_str());
        }

        let row = sql_query
            .fetch_optional(&self.pool)
            .await
            .context("Failed to transition charge status")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_charge(&row)?)),
            None => Ok(None),
        }
    }

    /// Delete a charge. Returns false if the id was unknown.
    pub async fn delete_charge(&self, id: ChargeId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM charges WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete charge")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_charge(row: &sqlx::sqlite::SqliteRow) -> Result<Charge> {
        let id_str: String = row.get("id");
        let status_str: String = row.get("status");
        let due_date_str: String = row.get("due_date");
        let paid_date_str: Option<String> = row.get("paid_date");
        let account_id_str: Option<String> = row.get("account_id");
        let user_id_str: Option<String> = row.get("user_id");
        let trade_id_str: Option<String> = row.get("trade_id");
        let manager_id_str: Option<String> = row.get("manager_id");
        let created_at_str: String = row.get("created_at");

        Ok(Charge {
            id: Uuid::parse_str(&id_str).context("Invalid charge ID")?,
            amount_cents: row.get("amount_cents"),
            reference: row.get("reference"),
            status: ChargeStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid charge status: {}", status_str))?,
            due_date: DateTime::parse_from_rfc3339(&due_date_str)
                .context("Invalid due_date timestamp")?
                .with_timezone(&Utc),
            paid_date: paid_date_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid paid_date timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
            account_id: Self::parse_optional_id(account_id_str, "account_id")?,
            user_id: Self::parse_optional_id(user_id_str, "user_id")?,
            trade_id: Self::parse_optional_id(trade_id_str, "trade_id")?,
            manager_id: Self::parse_optional_id(manager_id_str, "manager_id")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn parse_optional_id(value: Option<String>, column: &str) -> Result<Option<Uuid>> {
        value
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .with_context(|| format!("Invalid {}", column))
    }

    // ========================
    // Trade and installment operations
    // ========================

    /// Save a new trade to the database.
    pub async fn save_trade(&self, trade: &Trade) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trades (id, reference, total_cents, commission_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(trade.id.to_string())
        .bind(&trade.reference)
        .bind(trade.total_cents)
        .bind(trade.commission_cents)
        .bind(trade.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save trade")?;
        Ok(())
    }

    /// Get a trade by ID.
    pub async fn get_trade(&self, id: TradeId) -> Result<Option<Trade>> {
        let row = sqlx::query(
            "SELECT id, reference, total_cents, commission_cents, created_at FROM trades WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch trade")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_trade(&row)?)),
            None => Ok(None),
        }
    }

    /// List all trades in insertion order.
    pub async fn list_trades(&self) -> Result<Vec<Trade>> {
        let rows = sqlx::query(
            "SELECT id, reference, total_cents, commission_cents, created_at FROM trades ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list trades")?;

        rows.iter().map(Self::row_to_trade).collect()
    }

    /// Update a trade's totals. Stored installments are left untouched;
    /// they drift until an explicit recalculation.
    pub async fn update_trade_totals(
        &self,
        id: TradeId,
        total_cents: Cents,
        commission_cents: Cents,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE trades SET total_cents = ?, commission_cents = ? WHERE id = ?")
                .bind(total_cents)
                .bind(commission_cents)
                .bind(id.to_string())
                .execute(&self.pool)
                .await
                .context("Failed to update trade totals")?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert or replace one installment, keyed by (trade, number).
    pub async fn upsert_installment(&self, installment: &Installment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO installments (id, trade_id, number, amount_cents, commission_cents, due_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (trade_id, number) DO UPDATE SET
                amount_cents = excluded.amount_cents,
                commission_cents = excluded.commission_cents,
                due_date = excluded.due_date
            "#,
        )
        .bind(installment.id.to_string())
        .bind(installment.trade_id.to_string())
        .bind(installment.number)
        .bind(installment.amount_cents)
        .bind(installment.commission_cents)
        .bind(installment.due_date.to_rfc3339())
        .bind(installment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to upsert installment")?;
        Ok(())
    }

    /// List a trade's installments ordered by number.
    pub async fn list_installments(&self, trade_id: TradeId) -> Result<Vec<Installment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, trade_id, number, amount_cents, commission_cents, due_date, created_at
            FROM installments
            WHERE trade_id = ?
            ORDER BY number
            "#,
        )
        .bind(trade_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list installments")?;

        rows.iter().map(Self::row_to_installment).collect()
    }

    /// Drop installments past the plan length, for regenerations that
    /// shrink the count.
    pub async fn delete_installments_beyond(&self, trade_id: TradeId, count: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM installments WHERE trade_id = ? AND number > ?")
            .bind(trade_id.to_string())
            .bind(count)
            .execute(&self.pool)
            .await
            .context("Failed to delete surplus installments")?;
        Ok(result.rows_affected())
    }

    fn row_to_trade(row: &sqlx::sqlite::SqliteRow) -> Result<Trade> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Trade {
            id: Uuid::parse_str(&id_str).context("Invalid trade ID")?,
            reference: row.get("reference"),
            total_cents: row.get("total_cents"),
            commission_cents: row.get("commission_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_installment(row: &sqlx::sqlite::SqliteRow) -> Result<Installment> {
        let id_str: String = row.get("id");
        let trade_id_str: String = row.get("trade_id");
        let due_date_str: String = row.get("due_date");
        let created_at_str: String = row.get("created_at");

        Ok(Installment {
            id: Uuid::parse_str(&id_str).context("Invalid installment ID")?,
            trade_id: Uuid::parse_str(&trade_id_str).context("Invalid trade ID")?,
            number: row.get("number"),
            amount_cents: row.get("amount_cents"),
            commission_cents: row.get("commission_cents"),
            due_date: DateTime::parse_from_rfc3339(&due_date_str)
                .context("Invalid due_date timestamp")?
                .with_timezone(&Utc),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Recurring plan operations
    // ========================

    /// Save a new recurring plan to the database.
    pub async fn save_plan(&self, plan: &RecurringPlan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recurring_plans (id, name, account_id, amount_cents, start_date, end_date, last_generated_at, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(plan.id.to_string())
        .bind(&plan.name)
        .bind(plan.account_id.to_string())
        .bind(plan.amount_cents)
        .bind(plan.start_date.to_rfc3339())
        .bind(plan.end_date.map(|dt| dt.to_rfc3339()))
        .bind(plan.last_generated_at.map(|dt| dt.to_rfc3339()))
        .bind(plan.status.as_str())
        .bind(plan.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save plan")?;
        Ok(())
    }

    /// Get a recurring plan by name.
    pub async fn get_plan_by_name(&self, name: &str) -> Result<Option<RecurringPlan>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, account_id, amount_cents, start_date, end_date, last_generated_at, status, created_at
            FROM recurring_plans
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch plan by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_plan(&row)?)),
            None => Ok(None),
        }
    }

    /// List recurring plans (optionally only active ones), ordered by name.
    pub async fn list_plans(&self, only_active: bool) -> Result<Vec<RecurringPlan>> {
        let query = if only_active {
            "SELECT id, name, account_id, amount_cents, start_date, end_date, last_generated_at, status, created_at FROM recurring_plans WHERE status = 'active' ORDER BY name"
        } else {
            "SELECT id, name, account_id, amount_cents, start_date, end_date, last_generated_at, status, created_at FROM recurring_plans ORDER BY name"
        };

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list plans")?;

        rows.iter().map(Self::row_to_plan).collect()
    }

    /// Update a plan's status.
    pub async fn update_plan_status(&self, id: PlanId, status: PlanStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE recurring_plans SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update plan status")?;
        Ok(result.rows_affected() > 0)
    }

    /// Advance a plan's generation watermark, optionally completing it.
    pub async fn mark_plan_generated(
        &self,
        id: PlanId,
        last_generated_at: DateTime<Utc>,
        status: PlanStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE recurring_plans SET last_generated_at = ?, status = ? WHERE id = ?")
            .bind(last_generated_at.to_rfc3339())
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to mark plan generated")?;
        Ok(())
    }

    fn row_to_plan(row: &sqlx::sqlite::SqliteRow) -> Result<RecurringPlan> {
        let id_str: String = row.get("id");
        let account_id_str: String = row.get("account_id");
        let start_date_str: String = row.get("start_date");
        let end_date_str: Option<String> = row.get("end_date");
        let last_generated_str: Option<String> = row.get("last_generated_at");
        let status_str: String = row.get("status");
        let created_at_str: String = row.get("created_at");

        Ok(RecurringPlan {
            id: Uuid::parse_str(&id_str).context("Invalid plan ID")?,
            name: row.get("name"),
            account_id: Uuid::parse_str(&account_id_str).context("Invalid account ID")?,
            amount_cents: row.get("amount_cents"),
            start_date: DateTime::parse_from_rfc3339(&start_date_str)
                .context("Invalid start_date timestamp")?
                .with_timezone(&Utc),
            end_date: end_date_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid end_date timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
            last_generated_at: last_generated_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid last_generated_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
            status: PlanStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid plan status: {}", status_str))?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Job lease operations
    // ========================

    /// Try to take the mutual-exclusion lease for a named sweep job.
    ///
    /// A single upsert claims the lease only when the stored one has
    /// expired, so two sweeps racing for the same job name resolve inside
    /// the database. The lease is held for its full window; sweeps do not
    /// release early (the window is a minimum exclusion period).
    pub async fn try_acquire_lease(
        &self,
        job_name: &str,
        now: DateTime<Utc>,
        locked_until: DateTime<Utc>,
    ) -> Result<LeaseAttempt> {
        let result = sqlx::query(
            r#"
            INSERT INTO job_leases (name, locked_until)
            VALUES (?, ?)
            ON CONFLICT (name) DO UPDATE SET locked_until = excluded.locked_until
            WHERE job_leases.locked_until <= ?
            "#,
        )
        .bind(job_name)
        .bind(locked_until.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to acquire job lease")?;

        if result.rows_affected() > 0 {
            return Ok(LeaseAttempt::Acquired);
        }

        let row = sqlx::query("SELECT locked_until FROM job_leases WHERE name = ?")
            .bind(job_name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to read held job lease")?;

        let locked_until_str: String = row.get("locked_until");
        Ok(LeaseAttempt::Held {
            locked_until: DateTime::parse_from_rfc3339(&locked_until_str)
                .context("Invalid locked_until timestamp")?
                .with_timezone(&Utc),
        })
    }
}
