//! Contract Test: Idempotency
//!
//! Syncing a record to the value it already holds must not mutate anything
//! in the panel, and an unchanged IP must not even open a browser.

mod common;

use common::*;
use std::sync::Arc;
use timeweb_ddns_core::state::MemoryStateStore;
use timeweb_ddns_core::{RecordSynchronizer, UpdateOutcome};

#[tokio::test]
async fn second_sync_with_same_ip_performs_no_mutation() {
    let panel = panel_with_records(&[("example.com", "1.1.1.1")]);
    let store = Arc::new(MemoryStateStore::new());
    let mut session = logged_in_session(&panel, store).await;

    let mut sync = RecordSynchronizer::new(&mut session);
    assert!(sync.sync_record("example.com", ip("2.2.2.2")).await.unwrap());
    assert_eq!(panel.lock().unwrap().mutations, 1);

    assert!(sync.sync_record("example.com", ip("2.2.2.2")).await.unwrap());
    assert_eq!(
        panel.lock().unwrap().mutations,
        1,
        "second sync must cancel instead of saving"
    );
    assert_eq!(panel.lock().unwrap().records["example.com"], "2.2.2.2");

    session.close().await.unwrap();
}

#[tokio::test]
async fn stuck_cancel_on_equal_value_is_a_failure() {
    let panel = panel_with_records(&[("example.com", "2.2.2.2")]);
    panel
        .lock()
        .unwrap()
        .stuck_cancel
        .insert("example.com".to_string());
    let store = Arc::new(MemoryStateStore::new());
    let mut session = logged_in_session(&panel, store).await;

    let ok = RecordSynchronizer::new(&mut session)
        .sync_record("example.com", ip("2.2.2.2"))
        .await
        .unwrap();

    assert!(!ok);
    assert_eq!(panel.lock().unwrap().mutations, 0);
    assert_eq!(
        panel.lock().unwrap().screenshots.last().unwrap(),
        &std::path::PathBuf::from("diag/error_dns_example.com.png")
    );
}

#[tokio::test]
async fn unchanged_ip_does_not_launch_browser() {
    let panel = panel_with_records(&[("example.com", "2.2.2.2")]);
    let store = Arc::new(MemoryStateStore::with_ip(ip("2.2.2.2")));
    let engine = build_engine(
        ScriptedResolver::always(ip("2.2.2.2")),
        &panel,
        store.clone(),
        config_for(&["example.com"]),
    );

    let outcome = engine.run_update(false).await.unwrap();

    assert_eq!(outcome, UpdateOutcome::Unchanged { ip: ip("2.2.2.2") });
    assert_eq!(panel.lock().unwrap().launches, 0);
    assert_eq!(store.ip_write_count().await, 0);
}

#[tokio::test]
async fn forced_update_syncs_even_when_unchanged() {
    let panel = panel_with_records(&[("example.com", "2.2.2.2")]);
    let store = Arc::new(MemoryStateStore::with_ip(ip("2.2.2.2")));
    let engine = build_engine(
        ScriptedResolver::always(ip("2.2.2.2")),
        &panel,
        store.clone(),
        config_for(&["example.com"]),
    );

    let outcome = tokio_test::assert_ok!(engine.run_update(true).await);

    assert!(outcome.is_success());
    let state = panel.lock().unwrap();
    assert_eq!(state.launches, 1);
    assert_eq!(state.modal_opens, vec!["example.com"]);
    assert_eq!(state.mutations, 0, "record already held the IP");
    assert_eq!(state.closes, 1);
}
