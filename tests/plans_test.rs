mod common;

use anyhow::Result;
use common::{parse_date, test_service, StandardAccounts};
use exigo::application::{AppError, ChargeFilter};
use exigo::domain::{ChargeStatus, PlanStatus};

#[tokio::test]
async fn test_monthly_generation_creates_charges() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service
        .create_plan(
            "acme-membership".into(),
            "Acme",
            15000,
            parse_date("2024-01-10"),
            None,
        )
        .await?;

    let report = service
        .generate_monthly_charges(parse_date("2024-01-15"))
        .await?;

    assert_eq!(report.generated.len(), 1);
    let charge = &report.generated[0];
    assert_eq!(charge.amount_cents, 15000);
    assert_eq!(charge.status, ChargeStatus::Pending);
    assert_eq!(charge.reference, "Charge 1/2024");
    // Due a term after the billing period
    assert_eq!(charge.due_date, parse_date("2024-02-09"));

    let acme_charges = service
        .list_charges(ChargeFilter {
            account: Some("Acme".into()),
            ..ChargeFilter::default()
        })
        .await?;
    assert_eq!(acme_charges.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_generation_is_idempotent_within_a_period() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service
        .create_plan(
            "acme-membership".into(),
            "Acme",
            15000,
            parse_date("2024-01-10"),
            None,
        )
        .await?;

    let first = service
        .generate_monthly_charges(parse_date("2024-01-15"))
        .await?;
    assert_eq!(first.generated.len(), 1);

    // Re-running later in the same period generates nothing new
    let second = service
        .generate_monthly_charges(parse_date("2024-02-05"))
        .await?;
    assert!(second.generated.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_generation_catches_up_missed_periods() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service
        .create_plan(
            "acme-membership".into(),
            "Acme",
            15000,
            parse_date("2024-01-10"),
            None,
        )
        .await?;

    // First run three months late: one charge per missed period
    let report = service
        .generate_monthly_charges(parse_date("2024-03-20"))
        .await?;

    let references: Vec<String> = report.generated.iter().map(|c| c.reference.clone()).collect();
    assert_eq!(
        references,
        vec!["Charge 1/2024", "Charge 2/2024", "Charge 3/2024"]
    );

    Ok(())
}

#[tokio::test]
async fn test_plan_completes_at_end_date() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service
        .create_plan(
            "short-plan".into(),
            "Acme",
            15000,
            parse_date("2024-01-10"),
            Some(parse_date("2024-02-15")),
        )
        .await?;

    let report = service
        .generate_monthly_charges(parse_date("2024-06-01"))
        .await?;

    // Jan and Feb billed, then the plan is done
    assert_eq!(report.generated.len(), 2);
    assert_eq!(report.completed_plans, vec!["short-plan".to_string()]);
    assert_eq!(
        service.get_plan("short-plan").await?.status,
        PlanStatus::Completed
    );

    Ok(())
}

#[tokio::test]
async fn test_paused_plan_is_skipped() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service
        .create_plan(
            "acme-membership".into(),
            "Acme",
            15000,
            parse_date("2024-01-10"),
            None,
        )
        .await?;
    service.pause_plan("acme-membership").await?;

    let report = service
        .generate_monthly_charges(parse_date("2024-03-01"))
        .await?;
    assert!(report.generated.is_empty());

    // Resuming picks the missed periods back up
    service.resume_plan("acme-membership").await?;
    let report = service
        .generate_monthly_charges(parse_date("2024-03-20"))
        .await?;
    assert_eq!(report.generated.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_plan_name_rejected() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service
        .create_plan(
            "acme-membership".into(),
            "Acme",
            15000,
            parse_date("2024-01-10"),
            None,
        )
        .await?;

    let result = service
        .create_plan(
            "acme-membership".into(),
            "Borealis",
            20000,
            parse_date("2024-02-01"),
            None,
        )
        .await;
    assert!(matches!(result, Err(AppError::PlanAlreadyExists(_))));

    Ok(())
}

#[tokio::test]
async fn test_plan_requires_known_account_and_positive_amount() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    let result = service
        .create_plan(
            "ghost-plan".into(),
            "Nowhere",
            15000,
            parse_date("2024-01-10"),
            None,
        )
        .await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    let result = service
        .create_plan("zero-plan".into(), "Acme", 0, parse_date("2024-01-10"), None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    Ok(())
}
