//! Contract Test: Auto Mode
//!
//! The periodic loop keeps going when a cycle fails, stops promptly on the
//! shutdown signal, and never abandons an open browser session.

mod common;

use async_trait::async_trait;
use common::*;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use timeweb_ddns_core::error::{Error, Result};
use timeweb_ddns_core::state::MemoryStateStore;
use timeweb_ddns_core::traits::{SessionCookie, StateStore};

/// Store whose cached-IP reads fail a fixed number of times
struct FlakyStore {
    inner: MemoryStateStore,
    failures_left: AtomicUsize,
}

impl FlakyStore {
    fn failing(times: usize) -> Self {
        Self {
            inner: MemoryStateStore::new(),
            failures_left: AtomicUsize::new(times),
        }
    }
}

#[async_trait]
impl StateStore for FlakyStore {
    async fn cached_ip(&self) -> Result<Option<Ipv4Addr>> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::state_store("ip.txt unreadable"));
        }
        self.inner.cached_ip().await
    }

    async fn set_cached_ip(&self, ip: Ipv4Addr) -> Result<()> {
        self.inner.set_cached_ip(ip).await
    }

    async fn clear_cached_ip(&self) -> Result<()> {
        self.inner.clear_cached_ip().await
    }

    async fn cookies(&self) -> Result<Option<Vec<SessionCookie>>> {
        self.inner.cookies().await
    }

    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<()> {
        self.inner.set_cookies(cookies).await
    }

    async fn clear_cookies(&self) -> Result<()> {
        self.inner.clear_cookies().await
    }
}

fn assert_send<T: Send>(_: T) {}

#[test]
fn engine_futures_can_be_spawned() {
    let panel = panel_with_records(&[("example.com", "1.1.1.1")]);
    let engine = build_engine(
        ScriptedResolver::always(ip("2.2.2.2")),
        &panel,
        Arc::new(MemoryStateStore::new()),
        config_for(&["example.com"]),
    );

    assert_send(engine.run_update(false));
    assert_send(engine.open_session());
    assert_send(engine.read_records());
    assert_send(engine.run_auto_mode_with_shutdown(Duration::from_secs(1), None));
}

#[tokio::test]
async fn loop_survives_failed_cycles() {
    let panel = panel_with_records(&[("example.com", "1.1.1.1")]);
    let store = Arc::new(MemoryStateStore::new());
    let resolver = ScriptedResolver::script(vec![None, None, Some(ip("2.2.2.2"))]);
    let calls = resolver.call_counter();
    let engine = build_engine(resolver, &panel, store.clone(), config_for(&["example.com"]));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move {
        engine
            .run_auto_mode_with_shutdown(Duration::from_millis(10), Some(shutdown_rx))
            .await
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while calls.load(Ordering::SeqCst) < 4 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("loop kept running after failures");

    shutdown_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop stops on shutdown")
        .unwrap();
    assert!(result.is_ok());

    assert_eq!(store.cached_ip().await.unwrap(), Some(ip("2.2.2.2")));
    let state = panel.lock().unwrap();
    assert_eq!(state.launches, 1, "later cycles saw an unchanged IP");
    assert_eq!(state.mutations, 1);
}

#[tokio::test]
async fn shutdown_during_sleep_returns_immediately() {
    let panel = panel_with_records(&[("example.com", "2.2.2.2")]);
    let store = Arc::new(MemoryStateStore::with_ip(ip("2.2.2.2")));
    let resolver = ScriptedResolver::always(ip("2.2.2.2"));
    let calls = resolver.call_counter();
    let engine = build_engine(resolver, &panel, store, config_for(&["example.com"]));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move {
        engine
            .run_auto_mode_with_shutdown(Duration::from_secs(3600), Some(shutdown_rx))
            .await
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while calls.load(Ordering::SeqCst) < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("hour-long sleep interrupted")
        .unwrap()
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(panel.lock().unwrap().launches, 0);
}

#[tokio::test]
async fn loop_survives_cycle_errors() {
    let panel = panel_with_records(&[("example.com", "1.1.1.1")]);
    let store = Arc::new(FlakyStore::failing(2));
    let resolver = ScriptedResolver::always(ip("2.2.2.2"));
    let calls = resolver.call_counter();
    let engine = build_engine(resolver, &panel, store.clone(), config_for(&["example.com"]));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move {
        engine
            .run_auto_mode_with_shutdown(Duration::from_millis(10), Some(shutdown_rx))
            .await
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while calls.load(Ordering::SeqCst) < 4 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("loop kept running after erroring cycles");

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop stops on shutdown")
        .unwrap()
        .unwrap();

    assert_eq!(store.inner.cached_ip().await.unwrap(), Some(ip("2.2.2.2")));
    let state = panel.lock().unwrap();
    assert_eq!(state.launches, 1, "only the first healthy cycle opened the panel");
    assert_eq!(state.mutations, 1);
}

#[tokio::test]
async fn shutdown_mid_run_lets_the_run_close_its_browser() {
    let panel = panel_with_records(&[("example.com", "1.1.1.1")]);
    panel.lock().unwrap().modal_delay = Duration::from_millis(300);
    let store = Arc::new(MemoryStateStore::new());
    let engine = build_engine(
        ScriptedResolver::always(ip("2.2.2.2")),
        &panel,
        store.clone(),
        config_for(&["example.com"]),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move {
        engine
            .run_auto_mode_with_shutdown(Duration::from_secs(3600), Some(shutdown_rx))
            .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop stops after the in-flight run")
        .unwrap()
        .unwrap();

    let state = panel.lock().unwrap();
    assert_eq!(state.launches, 1);
    assert_eq!(state.closes, 1, "browser session closed before the loop stopped");
    assert_eq!(state.records["example.com"], "2.2.2.2");
    drop(state);
    assert_eq!(store.cached_ip().await.unwrap(), Some(ip("2.2.2.2")));
}
