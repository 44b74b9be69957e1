mod repository;

pub use repository::*;

/// SQL migration for initial schema (accounts, charges)
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for trades and installments
pub const MIGRATION_002_TRADES: &str = include_str!("migrations/002_trades.sql");

/// SQL migration for recurring billing plans
pub const MIGRATION_003_RECURRING_PLANS: &str = include_str!("migrations/003_recurring_plans.sql");

/// SQL migration for sweep job leases
pub const MIGRATION_004_JOB_LEASES: &str = include_str!("migrations/004_job_leases.sql");
