use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{
    BillingConfig, BillingService, ChargeFilter, LogDispatcher, NewCharge,
};
use crate::domain::{format_cents, parse_cents, ChargeStatus};
use crate::io::{Exporter, Importer, ImportOptions};

/// Exigo - Trade-Credit Billing Engine
#[derive(Parser)]
#[command(name = "exigo")]
#[command(about = "A trade-credit billing engine: charges, credit ledger and delinquency sweeps")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "exigo.db")]
    pub database: String,

    /// Billing config file (JSON); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Charge management commands
    #[command(subcommand)]
    Charge(ChargeCommands),

    /// Scheduled sweep commands (invoke these from cron)
    #[command(subcommand)]
    Sweep(SweepCommands),

    /// Trade and installment plan commands
    #[command(subcommand)]
    Trade(TradeCommands),

    /// Recurring billing plan commands
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Receivables aging report
    Aging {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: charges, accounts, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import charges from CSV
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Open {
        /// Account name (must be unique)
        name: String,

        /// Approved credit limit (e.g., "5000" or "5000.00")
        #[arg(short, long)]
        limit: String,

        /// Pre-existing committed amount, for administrative imports
        #[arg(short, long, default_value = "0")]
        used: String,
    },

    /// List all accounts
    List,

    /// Show account details
    Show {
        /// Account name
        name: String,
    },

    /// Change an account's approved credit limit
    SetLimit {
        /// Account name
        name: String,

        /// New credit limit (e.g., "5000.00")
        limit: String,
    },
}

#[derive(Subcommand)]
pub enum ChargeCommands {
    /// Create a new charge
    Create {
        /// Amount to bill (e.g., "1200.00")
        amount: String,

        /// Reference label (defaults to "Charge <month>/<year>")
        #[arg(short, long)]
        reference: Option<String>,

        /// Due date (YYYY-MM-DD, defaults to the configured term)
        #[arg(long)]
        due: Option<String>,

        /// Owning account name
        #[arg(short, long)]
        account: Option<String>,

        /// Anchor user ID (UUID)
        #[arg(long)]
        user: Option<String>,

        /// Anchor trade ID (UUID)
        #[arg(long)]
        trade: Option<String>,

        /// Responsible manager ID (UUID), for escalation routing
        #[arg(long)]
        manager: Option<String>,
    },

    /// Mark a charge as paid
    Pay {
        /// Charge ID
        id: String,

        /// Payment date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Cancel a charge
    Cancel {
        /// Charge ID
        id: String,
    },

    /// Delete a charge (warns when deleting a paid charge)
    Delete {
        /// Charge ID
        id: String,
    },

    /// Show charge details
    Show {
        /// Charge ID
        id: String,
    },

    /// List charges
    List {
        /// Filter by account name
        #[arg(long)]
        account: Option<String>,

        /// Filter by status: pending, overdue, paid, cancelled
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of charges to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Assess interest and penalty on a charge as of today
    Assess {
        /// Charge ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SweepCommands {
    /// Mark pending charges past their due date as overdue
    Overdue,

    /// Generate charges for recurring billing plans
    Monthly,
}

#[derive(Subcommand)]
pub enum TradeCommands {
    /// Record a new trade
    Record {
        /// Trade reference label
        reference: String,

        /// Trade total value (e.g., "12000.00")
        #[arg(short, long)]
        total: String,

        /// Commission on the trade
        #[arg(short, long, default_value = "0")]
        commission: String,
    },

    /// Edit a trade's totals (installments drift until recalculated)
    Update {
        /// Trade ID
        id: String,

        /// New total value
        #[arg(short, long)]
        total: String,

        /// New commission
        #[arg(short, long)]
        commission: String,
    },

    /// Split a trade into monthly installments
    Split {
        /// Trade ID
        id: String,

        /// Number of installments
        count: i64,

        /// First due date (YYYY-MM-DD, defaults to the configured term)
        #[arg(long)]
        first_due: Option<String>,
    },

    /// Re-derive installment amounts from the trade's current totals
    Recalculate {
        /// Trade ID
        id: String,
    },

    /// List a trade's installments
    Installments {
        /// Trade ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a recurring monthly billing plan
    Create {
        /// Plan name (must be unique)
        name: String,

        /// Account to bill
        #[arg(short, long)]
        account: String,

        /// Amount billed each month (e.g., "150.00")
        #[arg(long)]
        amount: String,

        /// First billing date (YYYY-MM-DD); also fixes the billing day
        #[arg(long)]
        start_date: String,

        /// Optional end date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
    },

    /// List recurring plans
    List {
        /// Include paused and completed plans
        #[arg(long)]
        all: bool,
    },

    /// Pause a plan
    Pause {
        /// Plan name
        name: String,
    },

    /// Resume a paused plan
    Resume {
        /// Plan name
        name: String,
    },
}

impl Cli {
    fn load_config(&self) -> Result<BillingConfig> {
        match &self.config {
            Some(path) => BillingConfig::from_file(path),
            None => Ok(BillingConfig::default()),
        }
    }

    async fn service(&self) -> Result<BillingService> {
        let config = self.load_config()?;
        Ok(BillingService::connect(&self.database, config, Arc::new(LogDispatcher)).await?)
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            Commands::Init => {
                let config = self.load_config()?;
                BillingService::init(&self.database, config, Arc::new(LogDispatcher)).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = self.service().await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Charge(charge_cmd) => {
                let service = self.service().await?;
                run_charge_command(&service, charge_cmd).await?;
            }

            Commands::Sweep(sweep_cmd) => {
                let service = self.service().await?;
                run_sweep_command(&service, sweep_cmd).await?;
            }

            Commands::Trade(trade_cmd) => {
                let service = self.service().await?;
                run_trade_command(&service, trade_cmd).await?;
            }

            Commands::Plan(plan_cmd) => {
                let service = self.service().await?;
                run_plan_command(&service, plan_cmd).await?;
            }

            Commands::Aging { format } => {
                let service = self.service().await?;
                let report = service.aging_report(Utc::now()).await?;

                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!("Receivables aging as of {}", report.as_of.format("%Y-%m-%d"));
                    println!("{:<10} {:>6} {:>14} {:>14}", "bucket", "count", "principal", "assessed");
                    for bucket in &report.buckets {
                        println!(
                            "{:<10} {:>6} {:>14} {:>14}",
                            bucket.label,
                            bucket.count,
                            format_cents(bucket.principal_cents),
                            format_cents(bucket.assessed_cents)
                        );
                    }
                    println!(
                        "{:<10} {:>6} {:>14} {:>14}",
                        "total",
                        "",
                        format_cents(report.total_open_cents),
                        format_cents(report.total_assessed_cents)
                    );
                }
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = self.service().await?;
                run_export_command(&service, export_type, output.as_deref()).await?;
            }

            Commands::Import { input, dry_run } => {
                let service = self.service().await?;
                run_import_command(&service, input.as_deref(), *dry_run).await?;
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &BillingService, command: &AccountCommands) -> Result<()> {
    match command {
        AccountCommands::Open { name, limit, used } => {
            let limit_cents = parse_cents(limit).context("Invalid limit format")?;
            let used_cents = parse_cents(used).context("Invalid used format")?;
            let account = service
                .open_account(name.clone(), limit_cents, used_cents)
                .await?;
            println!(
                "Opened account: {} (limit {}, available {})",
                account.name,
                format_cents(account.credit_limit_cents),
                format_cents(account.available_limit_cents())
            );
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts");
                return Ok(());
            }
            for account in accounts {
                println!(
                    "{:<24} limit {:>12}  used {:>12}  available {:>12}",
                    account.name,
                    format_cents(account.credit_limit_cents),
                    format_cents(account.used_limit_cents),
                    format_cents(account.available_limit_cents())
                );
            }
        }

        AccountCommands::Show { name } => {
            let account = service.get_account(name).await?;
            println!("Account: {}", account.name);
            println!("  ID: {}", account.id);
            println!("  Credit limit: {}", format_cents(account.credit_limit_cents));
            println!("  Used limit: {}", format_cents(account.used_limit_cents));
            println!(
                "  Available limit: {}",
                format_cents(account.available_limit_cents())
            );
            println!("  Created: {}", account.created_at.format("%Y-%m-%d"));
        }

        AccountCommands::SetLimit { name, limit } => {
            let limit_cents = parse_cents(limit).context("Invalid limit format")?;
            let account = service.set_credit_limit(name, limit_cents).await?;
            println!(
                "Updated {}: limit {}, available {}",
                account.name,
                format_cents(account.credit_limit_cents),
                format_cents(account.available_limit_cents())
            );
        }
    }
    Ok(())
}

async fn run_charge_command(service: &BillingService, command: &ChargeCommands) -> Result<()> {
    match command {
        ChargeCommands::Create {
            amount,
            reference,
            due,
            account,
            user,
            trade,
            manager,
        } => {
            let amount_cents =
                parse_cents(amount).context("Invalid amount format. Use '50.00' or '50'")?;
            let due_date = due.as_deref().map(parse_date).transpose()?;

            let new_charge = NewCharge {
                amount_cents,
                reference: reference.clone(),
                due_date,
                account: account.clone(),
                user_id: parse_optional_uuid(user.as_deref(), "user")?,
                trade_id: parse_optional_uuid(trade.as_deref(), "trade")?,
                manager_id: parse_optional_uuid(manager.as_deref(), "manager")?,
            };

            let charge = service.create_charge(new_charge).await?;
            println!(
                "Created charge: {} {} due {} ({})",
                charge.reference,
                format_cents(charge.amount_cents),
                charge.due_date.format("%Y-%m-%d"),
                charge.id
            );
        }

        ChargeCommands::Pay { id, date } => {
            let charge_id = parse_uuid(id, "charge")?;
            let paid_date = match date {
                Some(date_str) => parse_date(date_str)?,
                None => Utc::now(),
            };

            let result = service.mark_paid(charge_id, paid_date).await?;
            println!(
                "Paid charge: {} {}",
                result.charge.reference,
                format_cents(result.charge.amount_cents)
            );
            if let Some(account) = result.account {
                println!(
                    "Released credit on {}: used {}, available {}",
                    account.name,
                    format_cents(account.used_limit_cents),
                    format_cents(account.available_limit_cents())
                );
            }
        }

        ChargeCommands::Cancel { id } => {
            let charge_id = parse_uuid(id, "charge")?;
            let charge = service.cancel_charge(charge_id).await?;
            println!(
                "Cancelled charge: {} {}",
                charge.reference,
                format_cents(charge.amount_cents)
            );
        }

        ChargeCommands::Delete { id } => {
            let charge_id = parse_uuid(id, "charge")?;
            let charge = service.delete_charge(charge_id).await?;
            if charge.status == ChargeStatus::Paid {
                println!(
                    "Warning: deleted a PAID charge; its credit release stays on the ledger"
                );
            }
            println!("Deleted charge: {} ({})", charge.reference, charge.id);
        }

        ChargeCommands::Show { id } => {
            let charge_id = parse_uuid(id, "charge")?;
            let charge = service.get_charge(charge_id).await?;
            println!("Charge: {}", charge.reference);
            println!("  ID: {}", charge.id);
            println!("  Amount: {}", format_cents(charge.amount_cents));
            println!("  Status: {}", charge.status);
            println!("  Due: {}", charge.due_date.format("%Y-%m-%d"));
            if let Some(paid_date) = charge.paid_date {
                println!("  Paid: {}", paid_date.format("%Y-%m-%d"));
            }
            if let Some(account_id) = charge.account_id {
                println!("  Account: {}", account_id);
            }
            if let Some(user_id) = charge.user_id {
                println!("  User: {}", user_id);
            }
            if let Some(trade_id) = charge.trade_id {
                println!("  Trade: {}", trade_id);
            }
            if let Some(manager_id) = charge.manager_id {
                println!("  Manager: {}", manager_id);
            }
        }

        ChargeCommands::List {
            account,
            status,
            limit,
        } => {
            let status = status
                .as_deref()
                .map(|s| {
                    ChargeStatus::from_str(s)
                        .ok_or_else(|| anyhow::anyhow!("Invalid status: {}", s))
                })
                .transpose()?;

            let filter = ChargeFilter {
                account: account.clone(),
                status,
                limit: *limit,
            };

            let charges = service.list_charges(filter).await?;
            if charges.is_empty() {
                println!("No charges");
                return Ok(());
            }
            for charge in charges {
                println!(
                    "{}  {:<10} {:>12}  due {}  {}",
                    charge.id,
                    charge.status,
                    format_cents(charge.amount_cents),
                    charge.due_date.format("%Y-%m-%d"),
                    charge.reference
                );
            }
        }

        ChargeCommands::Assess { id } => {
            let charge_id = parse_uuid(id, "charge")?;
            let assessment = service.assess_charge(charge_id, Utc::now()).await?;
            println!("Days overdue: {}", assessment.days_overdue);
            println!("Principal: {}", format_cents(assessment.amount_cents));
            println!("Interest: {}", format_cents(assessment.interest_cents));
            println!("Penalty: {}", format_cents(assessment.penalty_cents));
            println!("Total: {}", format_cents(assessment.total_cents));
        }
    }
    Ok(())
}

async fn run_sweep_command(service: &BillingService, command: &SweepCommands) -> Result<()> {
    match command {
        SweepCommands::Overdue => {
            let report = service.run_overdue_sweep(Utc::now()).await?;
            println!(
                "Marked {} charge(s) overdue ({} escalated)",
                report.marked.len(),
                report.escalated
            );
            for assessment in &report.marked {
                println!(
                    "  {}: {} days overdue, total with charges {}",
                    assessment.charge_id,
                    assessment.days_overdue,
                    format_cents(assessment.total_cents)
                );
            }
        }

        SweepCommands::Monthly => {
            let report = service.generate_monthly_charges(Utc::now()).await?;
            println!("Generated {} charge(s)", report.generated.len());
            for charge in &report.generated {
                println!(
                    "  {} {} due {}",
                    charge.reference,
                    format_cents(charge.amount_cents),
                    charge.due_date.format("%Y-%m-%d")
                );
            }
            for name in &report.completed_plans {
                println!("Plan completed: {}", name);
            }
        }
    }
    Ok(())
}

async fn run_trade_command(service: &BillingService, command: &TradeCommands) -> Result<()> {
    match command {
        TradeCommands::Record {
            reference,
            total,
            commission,
        } => {
            let total_cents = parse_cents(total).context("Invalid total format")?;
            let commission_cents = parse_cents(commission).context("Invalid commission format")?;
            let trade = service
                .record_trade(reference.clone(), total_cents, commission_cents)
                .await?;
            println!(
                "Recorded trade: {} total {} commission {} ({})",
                trade.reference,
                format_cents(trade.total_cents),
                format_cents(trade.commission_cents),
                trade.id
            );
        }

        TradeCommands::Update {
            id,
            total,
            commission,
        } => {
            let trade_id = parse_uuid(id, "trade")?;
            let total_cents = parse_cents(total).context("Invalid total format")?;
            let commission_cents = parse_cents(commission).context("Invalid commission format")?;
            let trade = service
                .update_trade(trade_id, total_cents, commission_cents)
                .await?;
            println!(
                "Updated trade {}: total {} commission {}",
                trade.reference,
                format_cents(trade.total_cents),
                format_cents(trade.commission_cents)
            );
            println!("Note: existing installments keep their old amounts until 'trade recalculate'");
        }

        TradeCommands::Split {
            id,
            count,
            first_due,
        } => {
            let trade_id = parse_uuid(id, "trade")?;
            let first_due = first_due.as_deref().map(parse_date).transpose()?;
            let installments = service.split_trade(trade_id, *count, first_due).await?;
            println!("Split into {} installment(s):", installments.len());
            print_installments(&installments);
        }

        TradeCommands::Recalculate { id } => {
            let trade_id = parse_uuid(id, "trade")?;
            let installments = service.recalculate_installments(trade_id).await?;
            println!("Recalculated {} installment(s):", installments.len());
            print_installments(&installments);
        }

        TradeCommands::Installments { id } => {
            let trade_id = parse_uuid(id, "trade")?;
            let installments = service.list_installments(trade_id).await?;
            if installments.is_empty() {
                println!("No installments");
                return Ok(());
            }
            print_installments(&installments);
        }
    }
    Ok(())
}

fn print_installments(installments: &[crate::domain::Installment]) {
    for installment in installments {
        println!(
            "  #{:<3} {:>12} (commission {:>10}) due {}",
            installment.number,
            format_cents(installment.amount_cents),
            format_cents(installment.commission_cents),
            installment.due_date.format("%Y-%m-%d")
        );
    }
}

async fn run_plan_command(service: &BillingService, command: &PlanCommands) -> Result<()> {
    match command {
        PlanCommands::Create {
            name,
            account,
            amount,
            start_date,
            end_date,
        } => {
            let amount_cents = parse_cents(amount).context("Invalid amount format")?;
            let start = parse_date(start_date)?;
            let end = end_date.as_deref().map(parse_date).transpose()?;

            let plan = service
                .create_plan(name.clone(), account, amount_cents, start, end)
                .await?;
            println!(
                "Created plan: {} bills {} monthly from {}",
                plan.name,
                format_cents(plan.amount_cents),
                plan.start_date.format("%Y-%m-%d")
            );
        }

        PlanCommands::List { all } => {
            let plans = service.list_plans(!all).await?;
            if plans.is_empty() {
                println!("No plans");
                return Ok(());
            }
            for plan in plans {
                let last = plan
                    .last_generated_at
                    .map(|dt| dt.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:<24} {:<10} {:>12}/month  last billed {}",
                    plan.name,
                    plan.status,
                    format_cents(plan.amount_cents),
                    last
                );
            }
        }

        PlanCommands::Pause { name } => {
            let plan = service.pause_plan(name).await?;
            println!("Paused plan: {}", plan.name);
        }

        PlanCommands::Resume { name } => {
            let plan = service.resume_plan(name).await?;
            println!("Resumed plan: {}", plan.name);
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &BillingService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    let mut writer: Box<dyn std::io::Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path).context("Failed to create output file")?),
        None => Box::new(std::io::stdout()),
    };

    match export_type {
        "charges" => {
            let count = exporter.export_charges_csv(&mut writer).await?;
            eprintln!("Exported {} charge(s)", count);
        }
        "accounts" => {
            let count = exporter.export_accounts_csv(&mut writer).await?;
            eprintln!("Exported {} account(s)", count);
        }
        "full" => {
            let snapshot = exporter.export_full_json(&mut writer).await?;
            eprintln!(
                "Exported {} account(s), {} charge(s), {} trade(s)",
                snapshot.accounts.len(),
                snapshot.charges.len(),
                snapshot.trades.len()
            );
        }
        other => anyhow::bail!("Unknown export type: {} (expected charges, accounts, full)", other),
    }

    Ok(())
}

async fn run_import_command(
    service: &BillingService,
    input: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let importer = Importer::new(service);
    let options = ImportOptions { dry_run };

    let reader: Box<dyn std::io::Read> = match input {
        Some(path) => Box::new(std::fs::File::open(path).context("Failed to open input file")?),
        None => Box::new(std::io::stdin()),
    };

    let result = importer.import_charges_csv(reader, options).await?;

    if dry_run {
        println!("Dry run: {} charge(s) would be imported", result.imported);
    } else {
        println!("Imported {} charge(s)", result.imported);
    }

    if !result.errors.is_empty() {
        println!("{} error(s):", result.errors.len());
        for error in &result.errors {
            match &error.field {
                Some(field) => println!("  line {} ({}): {}", error.line, field, error.error),
                None => println!("  line {}: {}", error.line, error.error),
            }
        }
    }

    Ok(())
}

/// Parse a YYYY-MM-DD date into a UTC timestamp at midnight.
fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", input))?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

fn parse_uuid(input: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(input).with_context(|| format!("Invalid {} ID format (expected UUID)", what))
}

fn parse_optional_uuid(input: Option<&str>, what: &str) -> Result<Option<Uuid>> {
    input.map(|s| parse_uuid(s, what)).transpose()
}
