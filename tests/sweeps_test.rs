mod common;

use anyhow::Result;
use chrono::Duration;
use common::{parse_date, test_service, StandardAccounts};
use exigo::application::{AppError, NewCharge, OVERDUE_SWEEP_JOB};

#[tokio::test]
async fn test_overdue_sweep_does_not_overlap_itself() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    let now = parse_date("2024-02-01");
    service.run_overdue_sweep(now).await?;

    // A second run inside the exclusion window is refused
    let result = service.run_overdue_sweep(now).await;
    match result {
        Err(AppError::SweepAlreadyRunning { job, locked_until }) => {
            assert_eq!(job, OVERDUE_SWEEP_JOB);
            assert_eq!(locked_until, now + Duration::minutes(5));
        }
        other => panic!("expected SweepAlreadyRunning, got {:?}", other.map(|_| ())),
    }

    Ok(())
}

#[tokio::test]
async fn test_lease_is_held_for_the_full_window() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    let now = parse_date("2024-02-01");
    service.run_overdue_sweep(now).await?;

    // The sweep finished long ago, but the window is a minimum exclusion
    // period: four minutes in, the lease is still held
    let result = service.run_overdue_sweep(now + Duration::minutes(4)).await;
    assert!(matches!(result, Err(AppError::SweepAlreadyRunning { .. })));

    // Once the window has elapsed the lease can be retaken
    let result = service.run_overdue_sweep(now + Duration::minutes(5)).await;
    assert!(result.is_ok());

    Ok(())
}

#[tokio::test]
async fn test_overdue_and_monthly_leases_are_independent() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    let now = parse_date("2024-02-01");
    service.run_overdue_sweep(now).await?;

    // The overdue lease does not block monthly generation
    let report = service.generate_monthly_charges(now).await?;
    assert!(report.generated.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_monthly_generation_does_not_overlap_itself() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    let now = parse_date("2024-02-01");
    service.generate_monthly_charges(now).await?;

    // Monthly generation has a 30 minute window
    let result = service
        .generate_monthly_charges(now + Duration::minutes(29))
        .await;
    assert!(matches!(result, Err(AppError::SweepAlreadyRunning { .. })));

    let result = service
        .generate_monthly_charges(now + Duration::minutes(30))
        .await;
    assert!(result.is_ok());

    Ok(())
}

#[tokio::test]
async fn test_refused_sweep_leaves_charges_untouched() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    let now = parse_date("2024-02-01");
    service.run_overdue_sweep(now).await?;

    // Created after the first sweep, already due
    service
        .create_charge(NewCharge {
            amount_cents: 10000,
            due_date: Some(parse_date("2024-01-10")),
            account: Some("Acme".into()),
            ..NewCharge::default()
        })
        .await?;

    // The refused run must not have marked anything
    assert!(service.run_overdue_sweep(now).await.is_err());
    let report = service
        .run_overdue_sweep(now + Duration::minutes(10))
        .await?;
    assert_eq!(report.marked.len(), 1);

    Ok(())
}
