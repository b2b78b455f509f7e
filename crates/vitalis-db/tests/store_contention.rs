//! A second process holding the write lock on a shared store file.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use vitalis_core::entities::NewTestResult;
use vitalis_core::enums::AuditAction;
use vitalis_core::identity::ActorId;
use vitalis_db::RecordDb;
use vitalis_db::service::RecordService;
use vitalis_db::updates::test_result::TestResultUpdateBuilder;

fn reading() -> NewTestResult {
    NewTestResult {
        test_name: "HbA1c".into(),
        value: 2.5,
        unit: "%".into(),
        taken_at: Utc.with_ymd_and_hms(2026, 5, 4, 7, 30, 0).unwrap(),
        notes: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn update_waits_for_peer_writer_then_commits() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.db").display().to_string();

    let svc = RecordService::from_db(RecordDb::open_local(&path).await.unwrap());
    let owner = ActorId::new("user_1");
    let r = svc.create_test_result(&owner, reading()).await.unwrap();

    let peer_db = libsql::Builder::new_local(&path).build().await.unwrap();
    let peer = peer_db.connect().unwrap();
    peer.execute("BEGIN IMMEDIATE", ()).await.unwrap();

    let release = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        peer.execute("COMMIT", ()).await.unwrap();
        drop(peer_db);
    });

    let updated = svc
        .submit_update(
            &r.public_id,
            TestResultUpdateBuilder::new().value(3.1).build(),
            &owner,
        )
        .await
        .unwrap();
    release.await.unwrap();

    assert!((updated.value - 3.1).abs() < f64::EPSILON);
    let trail = svc.get_audit_trail(&r.public_id).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, AuditAction::Update);
}
