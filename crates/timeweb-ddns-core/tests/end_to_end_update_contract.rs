//! Contract Test: End-to-End Update
//!
//! A changed IP flows from the resolver through the panel into `ip.txt`,
//! using the real file store.

mod common;

use common::*;
use std::sync::Arc;
use tempfile::tempdir;
use timeweb_ddns_core::state::FileStateStore;
use timeweb_ddns_core::traits::StateStore;
use timeweb_ddns_core::{DataPaths, UpdateOutcome};

#[tokio::test]
async fn changed_ip_is_synced_and_written_to_disk() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    std::fs::write(paths.ip_file(), "1.1.1.1").unwrap();

    let store = Arc::new(FileStateStore::new(&paths).await.unwrap());
    let panel = panel_with_records(&[("example.com", "1.1.1.1")]);
    let engine = build_engine(
        ScriptedResolver::always(ip("2.2.2.2")),
        &panel,
        store,
        config_for(&["example.com"]),
    );

    let outcome = engine.run_update(false).await.unwrap();

    assert!(matches!(outcome, UpdateOutcome::Updated { .. }));
    assert_eq!(std::fs::read_to_string(paths.ip_file()).unwrap(), "2.2.2.2");
    assert!(paths.cookies_file().exists(), "login cookies persisted");

    let state = panel.lock().unwrap();
    assert_eq!(state.launches, 1);
    assert_eq!(state.modal_opens, vec!["example.com"]);
    assert_eq!(state.mutations, 1);
    assert_eq!(state.closes, 1);
}

#[tokio::test]
async fn second_run_reuses_cookies_and_skips_the_browser() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    let store = Arc::new(FileStateStore::new(&paths).await.unwrap());
    let panel = panel_with_records(&[("example.com", "1.1.1.1")]);
    let engine = build_engine(
        ScriptedResolver::script(vec![Some(ip("2.2.2.2")), Some(ip("2.2.2.2")), Some(ip("3.3.3.3"))]),
        &panel,
        store.clone(),
        config_for(&["example.com"]),
    );

    assert!(engine.run_update(false).await.unwrap().is_success());
    assert_eq!(
        engine.run_update(false).await.unwrap(),
        UpdateOutcome::Unchanged { ip: ip("2.2.2.2") }
    );
    assert!(engine.run_update(false).await.unwrap().is_success());

    let state = panel.lock().unwrap();
    assert_eq!(state.launches, 2);
    assert_eq!(state.credential_submissions, 1, "second login used cookies");
    assert_eq!(state.records["example.com"], "3.3.3.3");
    drop(state);
    assert_eq!(store.cached_ip().await.unwrap(), Some(ip("3.3.3.3")));
}

#[tokio::test]
async fn single_record_update_leaves_cache_alone() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    let store = Arc::new(FileStateStore::new(&paths).await.unwrap());
    let panel = panel_with_records(&[("example.com", "1.1.1.1"), ("api.example.com", "1.1.1.1")]);
    let engine = build_engine(
        ScriptedResolver::always(ip("2.2.2.2")),
        &panel,
        store.clone(),
        config_for(&["example.com", "api.example.com"]),
    );

    assert!(engine
        .update_single_record("api.example.com", ip("9.9.9.9"))
        .await
        .unwrap());

    let state = panel.lock().unwrap();
    assert_eq!(state.records["api.example.com"], "9.9.9.9");
    assert_eq!(state.records["example.com"], "1.1.1.1");
    assert_eq!(state.closes, 1);
    drop(state);
    assert_eq!(store.cached_ip().await.unwrap(), None);
}

#[tokio::test]
async fn reset_session_deletes_state_files() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    let store = Arc::new(FileStateStore::new(&paths).await.unwrap());
    let panel = panel_with_records(&[("example.com", "1.1.1.1")]);
    let engine = build_engine(
        ScriptedResolver::always(ip("2.2.2.2")),
        &panel,
        store,
        config_for(&["example.com"]),
    );

    engine.run_update(false).await.unwrap();
    assert!(paths.ip_file().exists());
    assert!(paths.cookies_file().exists());

    engine.reset_session().await.unwrap();
    assert!(!paths.ip_file().exists());
    assert!(!paths.cookies_file().exists());
}
