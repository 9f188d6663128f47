use service_catalog_core::applications::{AccessDuration, ApplicationStatus, ApplyRequest, AuditDecision};
use service_catalog_core::events::CatalogEvent;
use service_catalog_core::services::ServiceFilter;
use service_catalog_core::{seed, CountMode, VIRTUAL_ROOT_ID};

#[tokio::test]
async fn directory_session_emits_events_in_order() {
    let mut store = seed::catalog();
    let mut rx = store.subscribe();

    let id = store.add_directory(Some("cloud"), "Zarr Arrays").unwrap();
    store.rename_directory(&id, "Zarr Datacubes").unwrap();
    store.move_directory(&id, "iot").unwrap();
    let removed = store.delete_directory(&id);
    assert_eq!(removed, vec![id.clone()]);

    assert_eq!(
        rx.recv().await.unwrap(),
        CatalogEvent::DirectoryCreated { id: id.clone(), parent: Some("cloud".into()) }
    );
    assert_eq!(rx.recv().await.unwrap(), CatalogEvent::DirectoryRenamed { id: id.clone() });
    assert_eq!(
        rx.recv().await.unwrap(),
        CatalogEvent::DirectoryMoved { id: id.clone(), after: "iot".into() }
    );
    assert_eq!(rx.recv().await.unwrap(), CatalogEvent::DirectoryDeleted { ids: vec![id] });
}

#[test]
fn market_view_counts_and_filters() {
    let store = seed::catalog();
    let counted = store.forest_with_counts(CountMode::Market);
    let cloud = counted.iter().find(|d| d.id == "cloud").unwrap();
    assert_eq!(cloud.count, Some(1));

    let visible = store.services_in(&ServiceFilter {
        directory_id: VIRTUAL_ROOT_ID.to_string(),
        online_only: true,
        search: "hubei".to_string(),
        ..Default::default()
    });
    let ids: Vec<_> = visible.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "5"]);
}

#[test]
fn application_lifecycle() {
    let mut store = seed::catalog();
    let before = store.applications().stats();

    let record = store
        .apply_for_service(
            "7",
            ApplyRequest {
                duration: AccessDuration::SevenDays,
                protocols: vec!["WMTS".into()],
                ..Default::default()
            },
        )
        .unwrap();
    assert!(record.id.starts_with("APP-"));
    assert_eq!(record.id.len(), "APP-20260130-123".len());
    assert_eq!(record.status, ApplicationStatus::Pending);
    assert_eq!(store.applications().stats().pending, before.pending + 1);

    let approved = store
        .audit_application(&record.id, AuditDecision::Approve, Some("granted".into()))
        .unwrap();
    let key = approved.app_key.unwrap();
    let secret = approved.app_secret.unwrap();
    assert!(key.starts_with("ak_") && key.len() == 19);
    assert!(secret.starts_with("sk_") && secret.len() == 29);

    assert!(store
        .audit_application(&record.id, AuditDecision::Reject, None)
        .is_err());
    assert_eq!(store.applications().stats().approved, before.approved + 1);
}
