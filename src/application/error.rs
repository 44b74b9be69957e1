use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{AccountId, ChargeStatus};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Charge not found: {0}")]
    ChargeNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Trade not found: {0}")]
    TradeNotFound(String),

    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Plan already exists: {0}")]
    PlanAlreadyExists(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Charge must reference an account, a user, or a trade")]
    MissingAnchor,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ChargeStatus,
        to: ChargeStatus,
    },

    #[error("Invalid installment count: {0}")]
    InvalidInstallmentCount(i64),

    #[error("Concurrent update on account {account_id} lost after {attempts} attempts")]
    ConcurrentUpdateConflict {
        account_id: AccountId,
        attempts: u32,
    },

    #[error("Sweep '{job}' is already running (lease held until {locked_until})")]
    SweepAlreadyRunning {
        job: String,
        locked_until: DateTime<Utc>,
    },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
