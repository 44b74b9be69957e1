mod common;

use anyhow::Result;
use common::{parse_date, test_service, StandardAccounts};
use exigo::application::{ChargeFilter, NewCharge};
use exigo::domain::ChargeStatus;
use exigo::io::{DatabaseSnapshot, Exporter, Importer, ImportOptions};

#[tokio::test]
async fn test_full_billing_lifecycle() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    // Two charges against Acme: one falls due, one does not
    let overdue = service
        .create_charge(NewCharge {
            amount_cents: 120000,
            due_date: Some(parse_date("2024-01-10")),
            account: Some("Acme".into()),
            ..NewCharge::default()
        })
        .await?;
    let current = service
        .create_charge(NewCharge {
            amount_cents: 40000,
            due_date: Some(parse_date("2024-04-01")),
            account: Some("Acme".into()),
            ..NewCharge::default()
        })
        .await?;

    // Sweep on 2024-02-09: the first charge goes overdue, 30 days late
    let sweep = service.run_overdue_sweep(parse_date("2024-02-09")).await?;
    assert_eq!(sweep.marked.len(), 1);
    assert_eq!(sweep.marked[0].total_cents, 123600);

    // The aging report sees one current and one 1-30 band charge
    let report = service.aging_report(parse_date("2024-02-09")).await?;
    assert_eq!(report.total_open_cents, 160000);
    assert_eq!(report.buckets[0].count, 1);
    assert_eq!(report.buckets[1].count, 1);
    assert_eq!(report.buckets[1].assessed_cents, 123600);

    // Pay the overdue charge: credit released, charge closed
    let payment = service
        .mark_paid(overdue.id, parse_date("2024-02-10"))
        .await?;
    assert_eq!(payment.account.unwrap().used_limit_cents, 0);

    let report = service.aging_report(parse_date("2024-02-10")).await?;
    assert_eq!(report.total_open_cents, 40000);

    // The untouched charge is still pending
    assert_eq!(
        service.get_charge(current.id).await?.status,
        ChargeStatus::Pending
    );

    Ok(())
}

#[tokio::test]
async fn test_export_charges_csv() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    for amount in [10000, 20000, 30000] {
        service
            .create_charge(NewCharge {
                amount_cents: amount,
                account: Some("Acme".into()),
                ..NewCharge::default()
            })
            .await?;
    }

    let exporter = Exporter::new(&service);
    let mut buffer = Vec::new();
    let count = exporter.export_charges_csv(&mut buffer).await?;
    assert_eq!(count, 3);

    let csv = String::from_utf8(buffer)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4); // header + 3 charges
    assert!(lines[0].starts_with("id,reference,status,amount"));
    assert!(lines[1].contains("pending"));
    assert!(lines[1].contains("100.00"));

    Ok(())
}

#[tokio::test]
async fn test_export_full_snapshot_roundtrips_as_json() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service
        .create_charge(NewCharge {
            amount_cents: 50000,
            account: Some("Acme".into()),
            ..NewCharge::default()
        })
        .await?;
    let trade = service.record_trade("T-1".into(), 120000, 6000).await?;
    service
        .split_trade(trade.id, 3, Some(parse_date("2024-02-01")))
        .await?;
    service
        .create_plan(
            "acme-membership".into(),
            "Acme",
            15000,
            parse_date("2024-01-10"),
            None,
        )
        .await?;

    let exporter = Exporter::new(&service);
    let mut buffer = Vec::new();
    exporter.export_full_json(&mut buffer).await?;

    let snapshot: DatabaseSnapshot = serde_json::from_slice(&buffer)?;
    assert_eq!(snapshot.accounts.len(), 2);
    assert_eq!(snapshot.charges.len(), 1);
    assert_eq!(snapshot.trades.len(), 1);
    assert_eq!(snapshot.installments.len(), 3);
    assert_eq!(snapshot.plans.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_import_charges_csv() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    let csv = "\
amount,reference,due_date,account
1200.00,Invoice 7,2024-03-01,Acme
350.50,,,Borealis
oops,Bad row,,Acme
75.00,No account,,
";

    let importer = Importer::new(&service);
    let result = importer
        .import_charges_csv(csv.as_bytes(), ImportOptions::default())
        .await?;

    assert_eq!(result.imported, 2);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].field.as_deref(), Some("amount"));
    assert_eq!(result.errors[1].field.as_deref(), Some("account"));

    let acme = service
        .list_charges(ChargeFilter {
            account: Some("Acme".into()),
            ..ChargeFilter::default()
        })
        .await?;
    assert_eq!(acme.len(), 1);
    assert_eq!(acme[0].amount_cents, 120000);
    assert_eq!(acme[0].reference, "Invoice 7");
    assert_eq!(acme[0].due_date, parse_date("2024-03-01"));

    // Defaults applied for the sparse row
    let borealis = service
        .list_charges(ChargeFilter {
            account: Some("Borealis".into()),
            ..ChargeFilter::default()
        })
        .await?;
    assert_eq!(borealis.len(), 1);
    assert_eq!(borealis[0].amount_cents, 35050);
    assert!(borealis[0].reference.starts_with("Charge "));

    Ok(())
}

#[tokio::test]
async fn test_import_dry_run_writes_nothing() -> Result<()> {
    let (service, _events, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    let csv = "\
amount,reference,due_date,account
1200.00,Invoice 7,2024-03-01,Acme
";

    let importer = Importer::new(&service);
    let result = importer
        .import_charges_csv(csv.as_bytes(), ImportOptions { dry_run: true })
        .await?;

    assert_eq!(result.imported, 1);
    assert!(service
        .list_charges(ChargeFilter::default())
        .await?
        .is_empty());

    Ok(())
}
