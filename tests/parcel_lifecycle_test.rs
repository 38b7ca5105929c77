mod common;

use anyhow::Result;
use common::{drain_distributions, postal_worker, stored_version, test_ledger};
use postal::application::LedgerError;
use postal::domain::{ParcelStatus, TransitionRule, SORTING_CENTER};
use postal::storage::StateStore;

#[tokio::test]
async fn test_created_parcel_starts_good_at_sorting_center() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    ledger
        .create_parcel(&postal_worker(), "PKG001", "123 Main St, Atlanta")
        .await?;

    let parcel = ledger.query_parcel("PKG001").await?;
    assert_eq!(parcel.id, "PKG001");
    assert_eq!(parcel.destination, "123 Main St, Atlanta");
    assert_eq!(parcel.current_address, SORTING_CENTER);
    assert_eq!(parcel.status, ParcelStatus::Good);
    assert_eq!(parcel.owner, postal_worker().0);
    assert_eq!(parcel.doc_type, "parcel");

    Ok(())
}

#[tokio::test]
async fn test_full_delivery_scenario() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let mut events = ledger.sink().subscribe();

    ledger
        .create_parcel(&postal_worker(), "PKG001", "Atlanta")
        .await?;

    // Not the destination: no event
    let parcel = ledger.transport("PKG001", "Nairobi").await?;
    assert_eq!(parcel.current_address, "Nairobi");
    assert!(drain_distributions(&mut events).is_empty());

    // Destination reached
    let parcel = ledger.transport("PKG001", "Atlanta").await?;
    assert_eq!(parcel.current_address, "Atlanta");
    let delivered = drain_distributions(&mut events);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].id, "PKG001");
    assert_eq!(delivered[0].msg, "Delivered");

    let parcel = ledger.change_status("PKG001", ParcelStatus::Damaged).await?;
    assert_eq!(parcel.status, ParcelStatus::Damaged);

    let err = ledger
        .change_status("PKG001", ParcelStatus::Good)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidTransition {
            rule: TransitionRule::DamagedToGood,
            ..
        }
    ));

    let parcel = ledger
        .change_status("PKG001", ParcelStatus::Destroyed)
        .await?;
    assert_eq!(parcel.status, ParcelStatus::Destroyed);

    let err = ledger
        .change_status("PKG001", ParcelStatus::Good)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidTransition {
            rule: TransitionRule::Destroyed,
            ..
        }
    ));

    let stored = ledger.query_parcel("PKG001").await?;
    assert_eq!(stored.status, ParcelStatus::Destroyed);
    assert_eq!(stored.current_address, "Atlanta");

    Ok(())
}

#[tokio::test]
async fn test_destroyed_rejects_every_status() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.create_parcel(&postal_worker(), "PKG002", "Lagos").await?;
    ledger
        .change_status("PKG002", ParcelStatus::Destroyed)
        .await?;
    let version = stored_version(&ledger, "PKG002").await?;

    for status in ParcelStatus::ALL {
        let err = ledger.change_status("PKG002", status).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
        assert_eq!(
            err.to_string(),
            "Invalid status transition for PKG002: Parcel is DESTROYED"
        );
    }

    // Rejected changes never write
    assert_eq!(stored_version(&ledger, "PKG002").await?, version);

    Ok(())
}

#[tokio::test]
async fn test_good_and_damaged_self_transitions() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.create_parcel(&postal_worker(), "PKG003", "Oslo").await?;

    let parcel = ledger.change_status("PKG003", ParcelStatus::Good).await?;
    assert_eq!(parcel.status, ParcelStatus::Good);

    ledger.change_status("PKG003", ParcelStatus::Damaged).await?;
    let parcel = ledger.change_status("PKG003", ParcelStatus::Damaged).await?;
    assert_eq!(parcel.status, ParcelStatus::Damaged);

    Ok(())
}

#[tokio::test]
async fn test_repeated_transport_to_destination_fires_each_time() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let mut events = ledger.sink().subscribe();
    ledger.create_parcel(&postal_worker(), "PKG004", "Lima").await?;

    ledger.transport("PKG004", "Lima").await?;
    ledger.transport("PKG004", "Lima").await?;
    ledger.transport("PKG004", "Lima").await?;

    let delivered = drain_distributions(&mut events);
    assert_eq!(delivered.len(), 3);
    assert!(delivered.iter().all(|e| e.id == "PKG004"));

    Ok(())
}

#[tokio::test]
async fn test_transport_ignores_status() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.create_parcel(&postal_worker(), "PKG005", "Quito").await?;
    ledger
        .change_status("PKG005", ParcelStatus::Destroyed)
        .await?;

    let parcel = ledger.transport("PKG005", "Landfill").await?;
    assert_eq!(parcel.current_address, "Landfill");
    assert_eq!(parcel.status, ParcelStatus::Destroyed);

    Ok(())
}

#[tokio::test]
async fn test_missing_parcel_is_not_found() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    let err = ledger.query_parcel("NOPE").await.unwrap_err();
    assert!(matches!(&err, LedgerError::NotFound(id) if id == "NOPE"));
    assert_eq!(err.to_string(), "NOPE does not exist");

    let err = ledger.transport("NOPE", "Atlanta").await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let err = ledger
        .change_status("NOPE", ParcelStatus::Damaged)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    // Lookups never create records
    assert_eq!(ledger.store().get("NOPE").await?, None);

    Ok(())
}

#[tokio::test]
async fn test_create_overwrites_existing_parcel() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.create_parcel(&postal_worker(), "PKG006", "Paris").await?;
    ledger.transport("PKG006", "Lyon").await?;
    ledger
        .change_status("PKG006", ParcelStatus::Damaged)
        .await?;

    ledger.create_parcel(&postal_worker(), "PKG006", "Rome").await?;

    let parcel = ledger.query_parcel("PKG006").await?;
    assert_eq!(parcel.destination, "Rome");
    assert_eq!(parcel.current_address, SORTING_CENTER);
    assert_eq!(parcel.status, ParcelStatus::Good);
    assert_eq!(stored_version(&ledger, "PKG006").await?, Some(4));

    Ok(())
}

#[tokio::test]
async fn test_stored_document_is_plain_json() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.create_parcel(&postal_worker(), "PKG007", "Accra").await?;

    let bytes = ledger.store().get("PKG007").await?.unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(doc["docType"], "parcel");
    assert_eq!(doc["currentAddress"], "Sorting Center");
    assert_eq!(doc["status"], "GOOD");

    Ok(())
}

#[tokio::test]
async fn test_concurrent_transports_all_persist() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.create_parcel(&postal_worker(), "PKG008", "Cairo").await?;

    let (a, b, c) = tokio::join!(
        ledger.transport("PKG008", "Tunis"),
        ledger.transport("PKG008", "Algiers"),
        ledger.transport("PKG008", "Cairo"),
    );
    a?;
    b?;
    c?;

    // One create plus three serialized writes
    assert_eq!(stored_version(&ledger, "PKG008").await?, Some(4));

    Ok(())
}
