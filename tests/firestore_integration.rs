// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST` set); they are skipped otherwise.

use std::time::Duration;

use metals_tracker::db::RegionStore;
use metals_tracker::models::{Region, UserRecord};

mod common;
use common::{region_doc, test_db, test_db_offline};

/// Unique email for test isolation.
fn unique_email() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("user-{nanos}@example.com")
}

// ═══════════════════════════════════════════════════════════════════════════
// REGION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_region_create_replace_delete() {
    require_emulator!();

    let db = test_db().await;
    let doc = region_doc("Emulator quarry", &[("Pb", 6.0, 2.0)]);

    let id = db.create_region(&doc).await.unwrap();
    assert!(!id.is_empty());

    let stored = db.get_region(&id).await.unwrap().expect("region exists");
    let region = Region::from_document(stored).unwrap();
    assert_eq!(region.id, id);
    assert_eq!(region.name, "Emulator quarry");
    assert_eq!(region.points.len(), 3);

    let mut renamed = region.clone();
    renamed.name = "Renamed quarry".to_string();
    db.replace_region(&id, &renamed.to_document()).await.unwrap();
    let stored = db.get_region(&id).await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Renamed quarry"));

    db.delete_region(&id).await.unwrap();
    assert!(db.get_region(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_region_watch_pushes_changes() {
    require_emulator!();

    let db = test_db().await;
    let mut rx = db.watch_regions().await.unwrap();
    let initial = rx.recv().await.expect("initial snapshot");

    let id = db
        .create_region(&region_doc("Watched", &[("Cu", 1.0, 1.0)]))
        .await
        .unwrap();

    let pushed = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = rx.recv().await.expect("listener alive");
            if snapshot.iter().any(|d| d.id.as_deref() == Some(id.as_str())) {
                return snapshot;
            }
        }
    })
    .await
    .expect("change pushed within timeout");
    assert_eq!(pushed.len(), initial.len() + 1);

    db.delete_region(&id).await.unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_record_roundtrip() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email();

    assert!(db.get_user(&email).await.unwrap().is_none());
    db.create_user(&email, &UserRecord::unverified()).await.unwrap();

    let record = db.get_user(&email).await.unwrap().expect("user exists");
    assert_eq!(record.verified, Some(false));
    assert!(!record.is_verified());
}

// ═══════════════════════════════════════════════════════════════════════════
// OFFLINE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_offline_client_reports_transport_error() {
    let db = test_db_offline();
    let err = db.list_regions().await.unwrap_err();
    assert!(err.is_transient());
    assert!(db.watch_regions().await.is_err());
}
