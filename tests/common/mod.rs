// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use exigo::application::{
    BillingConfig, BillingService, NotificationDispatcher, RecordingDispatcher,
};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database and a
/// recording dispatcher for asserting on notifications
pub async fn test_service() -> Result<(BillingService, Arc<RecordingDispatcher>, TempDir)> {
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let (service, temp_dir) =
        test_service_with(BillingConfig::default(), dispatcher.clone()).await?;
    Ok((service, dispatcher, temp_dir))
}

/// Helper to create a test service with explicit config and dispatcher
pub async fn test_service_with(
    config: BillingConfig,
    dispatcher: Arc<dyn NotificationDispatcher>,
) -> Result<(BillingService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = BillingService::init(db_path.to_str().unwrap(), config, dispatcher).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Test fixture: standard account setup
pub struct StandardAccounts;

impl StandardAccounts {
    /// Create the basic account pair:
    /// - "Acme" with a 5000.00 limit and 1000.00 already committed
    /// - "Borealis" with a 2000.00 limit and no exposure
    pub async fn create_basic(service: &BillingService) -> Result<()> {
        service.open_account("Acme".into(), 500000, 100000).await?;
        service.open_account("Borealis".into(), 200000, 0).await?;
        Ok(())
    }
}
