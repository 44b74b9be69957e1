use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Read;

use crate::application::{BillingService, NewCharge};
use crate::domain::parse_cents;

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
}

/// Importer for charges generated by an external billing system.
///
/// Expected CSV columns: `amount, reference, due_date, account`, with a
/// header row. `reference` and `due_date` may be empty (billing defaults
/// apply); `account` is the owning account's name and is required, since
/// imported charges must anchor to an account.
pub struct Importer<'a> {
    service: &'a BillingService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a BillingService) -> Self {
        Self { service }
    }

    /// Import charges from CSV. Bad rows are collected as per-line errors
    /// and never abort the rest of the file.
    pub async fn import_charges_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut imported = 0;
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let amount_str = record.get(0).unwrap_or("");
            let reference = record.get(1).filter(|s| !s.is_empty()).map(String::from);
            let due_date_str = record.get(2).unwrap_or("");
            let account = record.get(3).unwrap_or("");

            let amount_cents = match parse_cents(amount_str) {
                Ok(a) => a,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Invalid amount: {}", e),
                    });
                    continue;
                }
            };

            let due_date = if due_date_str.is_empty() {
                None
            } else {
                match parse_due_date(due_date_str) {
                    Ok(dt) => Some(dt),
                    Err(e) => {
                        errors.push(ImportError {
                            line,
                            field: Some("due_date".to_string()),
                            error: format!("Invalid due date: {}", e),
                        });
                        continue;
                    }
                }
            };

            if account.is_empty() {
                errors.push(ImportError {
                    line,
                    field: Some("account".to_string()),
                    error: "Imported charges must name an account".to_string(),
                });
                continue;
            }

            if options.dry_run {
                imported += 1;
                continue;
            }

            let new_charge = NewCharge {
                amount_cents,
                reference,
                due_date,
                account: Some(account.to_string()),
                ..NewCharge::default()
            };

            match self.service.create_charge(new_charge).await {
                Ok(_) => imported += 1,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(ImportResult { imported, errors })
    }
}

/// Parse a due date as either YYYY-MM-DD or full RFC 3339.
fn parse_due_date(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc());
    }
    Ok(DateTime::parse_from_rfc3339(input)?.with_timezone(&Utc))
}
