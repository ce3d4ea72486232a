// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map session flows over the in-memory store.
//!
//! These cover the full loop: snapshot sync, edit mode gating, commit
//! writes, filtering, rendering and teardown.

use metals_tracker::db::{MemoryDb, StoreOp};
use metals_tracker::models::{GeoPoint, UserRecord};
use metals_tracker::services::{BoundSide, FilterMetric, Tier};
use metals_tracker::{MapEvent, MapSession};

mod common;
use common::{mounted_session, region_doc, FakeAuth, RecordingView};

const EMAIL: &str = "geologist@example.com";
const PASSWORD: &str = "tailings";

/// Session signed in as a verified account.
async fn verified_session(db: &MemoryDb) -> MapSession {
    db.seed_user(
        EMAIL,
        UserRecord {
            verified: Some(true),
        },
    );
    let mut session = mounted_session(db, FakeAuth::with_account(EMAIL, PASSWORD)).await;
    assert!(session.account_mut().sign_in(EMAIL, PASSWORD).await);
    session.poll();
    assert!(session.account().is_verified());
    session
}

fn p(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(lat, lon)
}

#[tokio::test]
async fn test_mount_syncs_existing_regions() {
    let db = MemoryDb::new();
    db.seed_region("r1", region_doc("Nickel smelter", &[("Ni", 30.0, 4.0)]));
    let session = mounted_session(&db, FakeAuth::default()).await;

    assert_eq!(session.regions().len(), 1);
    assert_eq!(session.regions()[0].id, "r1");
    assert_eq!(session.regions()[0].points.len(), 3);
}

#[tokio::test]
async fn test_unverified_account_gets_sign_in_prompt() {
    let db = MemoryDb::new();
    let mut session = mounted_session(&db, FakeAuth::default()).await;

    let err = session.enter_edit().unwrap_err();
    assert!(err.requires_sign_in());
    assert!(session.take_sign_in_prompt());
    assert!(!session.take_sign_in_prompt());
    assert!(!session.editor().is_editing());
}

#[tokio::test]
async fn test_drawn_region_is_created() {
    let db = MemoryDb::new();
    let mut session = verified_session(&db).await;

    session.enter_edit().unwrap();
    session.begin_append();
    for point in [p(67.6, 33.1), p(67.7, 33.2), p(67.6, 33.3)] {
        session.handle(MapEvent::Tap(point));
    }
    let writes = session.commit().expect("a create is needed");
    writes.await.unwrap();

    let ops = db.operations();
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], StoreOp::CreateRegion(_)));

    assert!(session.poll());
    assert_eq!(session.regions().len(), 1);
    assert!(session.regions()[0].is_persisted());
}

#[tokio::test]
async fn test_re_edit_after_create_updates_same_region() {
    let db = MemoryDb::new();
    let mut session = verified_session(&db).await;

    session.enter_edit().unwrap();
    session.begin_append();
    for point in [p(67.6, 33.1), p(67.7, 33.2), p(67.6, 33.3)] {
        session.handle(MapEvent::Tap(point));
    }
    session.commit().expect("a create is needed").await.unwrap();

    session.enter_edit().unwrap();
    assert!(session.regions()[0].is_persisted());
    session.handle(MapEvent::Tap(p(67.5, 33.2)));
    session.commit().expect("an update is needed").await.unwrap();

    let ops = db.operations();
    assert_eq!(ops.len(), 2);
    let StoreOp::CreateRegion(id) = &ops[0] else {
        panic!("expected a create first, got {:?}", ops[0]);
    };
    assert_eq!(ops[1], StoreOp::ReplaceRegion(id.clone()));
    assert_eq!(db.regions().len(), 1);
}

#[tokio::test]
async fn test_shrunk_region_is_deleted() {
    let db = MemoryDb::new();
    db.seed_region("abc", region_doc("Spoil tip", &[("Pb", 2.0, 1.0)]));
    let mut session = verified_session(&db).await;

    session.enter_edit().unwrap();
    session.undo_last_point();
    session.commit().expect("a delete is needed").await.unwrap();

    assert_eq!(db.operations(), vec![StoreOp::DeleteRegion("abc".to_string())]);
    session.poll();
    assert!(session.regions().is_empty());
}

#[tokio::test]
async fn test_small_unsaved_region_never_reaches_store() {
    let db = MemoryDb::new();
    let mut session = verified_session(&db).await;

    session.enter_edit().unwrap();
    session.begin_append();
    session.handle(MapEvent::Tap(p(1.0, 1.0)));
    session.handle(MapEvent::Tap(p(1.0, 2.0)));
    assert!(session.commit().is_none());
    assert!(db.operations().is_empty());
}

#[tokio::test]
async fn test_remote_changes_held_until_editing_ends() {
    let db = MemoryDb::new();
    db.seed_region("r1", region_doc("Quarry", &[("Cd", 1.0, 1.0)]));
    let mut session = verified_session(&db).await;

    session.enter_edit().unwrap();
    session.handle(MapEvent::Tap(p(67.0, 33.0)));
    db.seed_region("r2", region_doc("Dump", &[("Hg", 1.0, 1.0)]));

    assert!(!session.poll());
    assert_eq!(session.regions().len(), 1);
    assert_eq!(session.regions()[0].points.len(), 4);

    session.cancel_edit();
    assert_eq!(session.regions()[0].points.len(), 3);

    assert!(session.poll());
    assert_eq!(session.regions().len(), 2);
}

#[tokio::test]
async fn test_awaited_snapshot_applied_after_cancel() {
    let db = MemoryDb::new();
    db.seed_region("r1", region_doc("Quarry", &[("Cd", 1.0, 1.0)]));
    let mut session = verified_session(&db).await;

    session.enter_edit().unwrap();
    db.seed_region("r2", region_doc("Dump", &[("Hg", 1.0, 1.0)]));
    assert!(session.next_snapshot().await);
    assert_eq!(session.regions().len(), 1);

    session.cancel_edit();
    assert!(session.poll());
    assert_eq!(session.regions().len(), 2);
}

#[tokio::test]
async fn test_switching_to_unverified_account_blocks_editing() {
    let db = MemoryDb::new();
    let mut session = verified_session(&db).await;

    let other = "surveyor@example.com";
    assert!(session.account_mut().sign_up(other, PASSWORD).await);
    session.poll();
    assert_eq!(session.account().email(), Some(other));
    assert_eq!(session.account().verified(), Some(false));

    let err = session.enter_edit().unwrap_err();
    assert!(err.requires_sign_in());
    assert!(session.take_sign_in_prompt());
    assert_eq!(db.active_user_watchers(), 1);
}

#[tokio::test]
async fn test_details_edit_is_upserted() {
    let db = MemoryDb::new();
    db.seed_region("r1", region_doc("Quarry", &[("Cd", 1.0, 1.0)]));
    let mut session = verified_session(&db).await;

    session.enter_edit().unwrap();
    session.handle(MapEvent::LongPress);
    let draft = session.details_mut().expect("long press opens details");
    draft.rename("Flooded quarry");
    let key = draft.add_element();
    draft.rename_element(&key, "As");
    draft.set_containment("As", 8.0);
    draft.set_threshold("As", 2.0);
    assert!(session.apply_details());

    session.commit().expect("an update is needed").await.unwrap();
    assert_eq!(db.operations(), vec![StoreOp::ReplaceRegion("r1".to_string())]);

    let stored = &db.regions()[0];
    assert_eq!(stored.name.as_deref(), Some("Flooded quarry"));
    assert_eq!(stored.elements.as_ref().unwrap()["As"], vec![8.0, 2.0, 1.0]);
}

#[tokio::test]
async fn test_failed_writes_are_only_logged() {
    let db = MemoryDb::new();
    db.seed_region("abc", region_doc("Spoil tip", &[("Pb", 2.0, 1.0)]));
    let mut session = verified_session(&db).await;
    db.fail_writes(true);

    session.enter_edit().unwrap();
    session.undo_last_point();
    session.commit().expect("a delete is needed").await.unwrap();

    assert!(db.operations().is_empty());
    assert!(!session.editor().is_editing());
}

#[tokio::test]
async fn test_region_tap_while_viewing_selects() {
    let db = MemoryDb::new();
    db.seed_region("r1", region_doc("Quarry", &[("Cd", 1.0, 1.0)]));
    let mut session = mounted_session(&db, FakeAuth::default()).await;

    let index = session.visible_regions()[0].index;
    session.handle(MapEvent::RegionTap {
        index,
        point: p(67.6, 33.1),
    });
    let selection = session.selection().expect("region selected");
    assert_eq!(selection.region.id, "r1");
    assert_eq!(session.regions()[0].points.len(), 3);
}

#[tokio::test]
async fn test_filter_and_render() {
    let db = MemoryDb::new();
    // Zc = 1.5 and Zc = 40
    db.seed_region("clean", region_doc("Meadow", &[("Zn", 3.0, 2.0)]));
    db.seed_region("dirty", region_doc("Smelter", &[("Ni", 80.0, 2.0)]));
    let mut session = mounted_session(&db, FakeAuth::default()).await;

    let mut view = RecordingView::default();
    session.render(&mut view);
    assert_eq!(view.regions.len(), 2);
    let dirty = view.regions.iter().find(|r| r.contamination_index == 40.0).unwrap();
    assert_eq!(dirty.tier, Tier::High);

    session
        .set_filter(FilterMetric::ContaminationIndex, BoundSide::Start, "16")
        .unwrap();
    assert_eq!(session.filter_settings().zc_range_start, "16");
    session.render(&mut view);
    assert_eq!(view.regions.len(), 1);
    assert_eq!(session.regions()[view.regions[0].index].id, "dirty");

    let err = session
        .set_filter(FilterMetric::ContaminationIndex, BoundSide::Start, "lots")
        .unwrap_err();
    assert!(err.to_string().contains("lots"));
    assert_eq!(session.filter_settings().zc_range_start, "16");
    assert_eq!(session.visible_regions().len(), 1);
}

#[tokio::test]
async fn test_search_hit_moves_camera_and_marks() {
    let db = MemoryDb::new();
    let mut session = mounted_session(&db, FakeAuth::default()).await;
    let bounds = geo::Rect::new((30.0, 60.0), (40.0, 70.0));

    session.search("Monchegorsk", bounds);
    assert!(session.settle_search().await);
    assert_eq!(session.search_results()[0].name, "Monchegorsk");

    let point = session.choose_search_hit(0).unwrap();
    assert_eq!(session.camera().center, point);

    let mut view = RecordingView::default();
    session.render(&mut view);
    assert_eq!(view.marker, Some(point));

    session.clear_search_marker();
    session.render(&mut view);
    assert_eq!(view.marker, None);
    assert!(session.choose_search_hit(5).is_err());
}

#[tokio::test]
async fn test_unmount_and_drop_release_subscriptions() {
    let db = MemoryDb::new();
    let mut session = verified_session(&db).await;
    assert_eq!(db.active_region_watchers(), 1);
    assert_eq!(db.active_user_watchers(), 1);

    session.unmount();
    assert_eq!(db.active_region_watchers(), 0);
    assert_eq!(db.active_user_watchers(), 0);

    session.mount().await.unwrap();
    assert_eq!(db.active_region_watchers(), 1);
    drop(session);
    assert_eq!(db.active_region_watchers(), 0);
}
