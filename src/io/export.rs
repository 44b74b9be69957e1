use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{BillingService, ChargeFilter};
use crate::domain::{format_cents, Account, Charge, Installment, RecurringPlan, Trade};

/// Database snapshot for full export/import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub charges: Vec<Charge>,
    pub trades: Vec<Trade>,
    pub installments: Vec<Installment>,
    pub plans: Vec<RecurringPlan>,
}

/// Exporter for converting billing data to various formats
pub struct Exporter<'a> {
    service: &'a BillingService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a BillingService) -> Self {
        Self { service }
    }

    /// Export charges to CSV format
    pub async fn export_charges_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let charges = self.service.list_charges(ChargeFilter::default()).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "reference",
            "status",
            "amount",
            "due_date",
            "paid_date",
            "account_id",
            "created_at",
        ])?;

        for charge in &charges {
            csv_writer.write_record([
                charge.id.to_string(),
                charge.reference.clone(),
                charge.status.to_string(),
                format_cents(charge.amount_cents),
                charge.due_date.to_rfc3339(),
                charge
                    .paid_date
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default(),
                charge
                    .account_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                charge.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(charges.len())
    }

    /// Export accounts to CSV format
    pub async fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let accounts = self.service.list_accounts().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "name",
            "credit_limit",
            "used_limit",
            "available_limit",
            "created_at",
        ])?;

        for account in &accounts {
            csv_writer.write_record([
                account.id.to_string(),
                account.name.clone(),
                format_cents(account.credit_limit_cents),
                format_cents(account.used_limit_cents),
                format_cents(account.available_limit_cents()),
                account.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(accounts.len())
    }

    /// Export the full database as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, writer: W) -> Result<DatabaseSnapshot> {
        let accounts = self.service.list_accounts().await?;
        let charges = self.service.list_charges(ChargeFilter::default()).await?;
        let trades = self.service.list_trades().await?;
        let plans = self.service.list_plans(false).await?;

        let mut installments = Vec::new();
        for trade in &trades {
            installments.extend(self.service.list_installments(trade.id).await?);
        }

        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts,
            charges,
            trades,
            installments,
            plans,
        };

        serde_json::to_writer_pretty(writer, &snapshot)?;
        Ok(snapshot)
    }
}
