//! Integration tests for the database, the roster service and the door store.
//!
//! Run with: cargo test --package guestgate-storage --test integration_database

use chrono::Utc;
use guestgate_storage::{Database, DatabaseConfig, GuestListStore, StorageError};
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_file_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("door.db");
    let path = path.to_string_lossy().to_string();

    let code = {
        let db = Database::open(DatabaseConfig::new(&path)).await.unwrap();
        let roster = db.roster();
        let event = roster.create_event("Fiesta", None, "4821").await.unwrap();
        roster
            .add_guest(event.id, "Ana", "Pérez", "12345678")
            .await
            .unwrap();
        db.close().await;
        event.event_code
    };

    let db = Database::open(DatabaseConfig::new(&path)).await.unwrap();
    let store = db.guest_list();
    let event = store.find_event_by_code(&code).await.unwrap().unwrap();
    let guest = store
        .find_guest_by_exact_ci(event.id, "12345678")
        .await
        .unwrap();

    assert!(guest.is_some());
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_prefix_lookups() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("door.db").to_string_lossy().to_string();
    let db = Database::open(DatabaseConfig::new(&path).pool_size(4))
        .await
        .unwrap();

    let roster = db.roster();
    let event = roster.create_event("Fiesta", None, "4821").await.unwrap();
    let text: String = (0..50)
        .map(|i| format!("Nombre{i};Apellido;{}\n", 1_000_000 + i))
        .collect();
    roster.import_csv(event.id, &text).await.unwrap();

    const NUM_CONCURRENT_TASKS: usize = 8;
    let store = Arc::new(db.guest_list());
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));

    let handles: Vec<_> = (0..NUM_CONCURRENT_TASKS)
        .map(|_| {
            let store = store.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                store.find_guests_by_prefix(event.id, "100001", 12).await
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;

    for result in results {
        let guests = result.unwrap().unwrap();
        let cis: Vec<_> = guests.iter().map(|g| g.ci.as_str()).collect();
        assert_eq!(cis.len(), 10);
        assert_eq!(cis.first(), Some(&"1000010"));
        assert!(cis.windows(2).all(|w| w[0] < w[1]));
    }

    db.close().await;
}

#[tokio::test]
async fn test_door_check_in_visible_to_roster() {
    let db = Database::in_memory().await.unwrap();
    let roster = db.roster();
    let store = db.guest_list();

    let event = roster.create_event("Fiesta", None, "4821").await.unwrap();
    roster
        .import_csv(event.id, "nombre,apellido,ci\nAna,Pérez,12345678\nLuis,Gómez,7654321")
        .await
        .unwrap();

    let guest = store
        .find_guest_by_exact_ci(event.id, "12345678")
        .await
        .unwrap()
        .unwrap();
    let at = Utc::now();
    let updated = store.mark_checked_in(guest.id, at).await.unwrap();
    assert!(updated.is_checked_in());

    let stats = roster.stats(event.id).await.unwrap();
    assert_eq!((stats.total, stats.entered, stats.pending), (2, 1, 1));
}

#[tokio::test]
async fn test_find_event_by_code_normalizes_input() {
    let db = Database::in_memory().await.unwrap();
    let roster = db.roster();
    let event = roster.create_event("Fiesta", None, "4821").await.unwrap();

    let found = roster
        .find_event_by_code(&format!("  {}  ", event.event_code.to_lowercase()))
        .await
        .unwrap();
    assert_eq!(found.id, event.id);

    assert!(matches!(
        roster.find_event_by_code("ZZZZZZ").await,
        Err(StorageError::NotFound { .. })
    ));
    assert!(matches!(
        roster.find_event_by_code("no code!").await,
        Err(StorageError::Validation(_))
    ));
}
