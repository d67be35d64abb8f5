// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart specs
//!
//! Verify run history survives a restart through the snapshot file.

use tokio_util::sync::CancellationToken;

use crate::prelude::*;

/// Run one failing execution of `1hour/flaky.sh` and stop the daemon.
async fn record_one_failure(tree: &JobTree) {
    let script = tree.script("1hour/flaky.sh", "exit 3");
    let runner = FakeRunner::new();
    runner.set_exit(&script, 3);

    let daemon = tree.start();
    let mut coordinator = daemon.coordinator(runner);
    coordinator.tick().await;
    tree.advance_minutes(61);
    coordinator.tick().await;
    assert_eq!(coordinator.wait_idle().await.len(), 1);
}

#[tokio::test]
async fn failure_history_survives_restart() {
    let tree = JobTree::new();
    record_one_failure(&tree).await;

    let daemon = tree.start();
    assert_eq!(daemon.load_outcome, LoadOutcome::Restored { jobs: 1, released: 0 });

    let store = daemon.store.lock();
    let job = store.get(&tree.path("1hour/flaky.sh")).unwrap();
    assert_eq!(job.consecutive_failures(), 1);
    assert_eq!(job.run_reason(), RunReason::RetryAfterFailure);
    assert_eq!(job.next_execution(store.retry_timeout()), at(2024, 3, 1, 11, 3));
}

#[tokio::test]
async fn reset_forgets_history() {
    let tree = JobTree::new();
    record_one_failure(&tree).await;

    let daemon = startup_with_clock(&tree.config_with(true), tree.clock.clone()).unwrap();
    assert_eq!(daemon.load_outcome, LoadOutcome::Fresh);
    assert!(daemon.store.lock().table().is_empty());

    // Rediscovered as a brand new job
    daemon.coordinator(FakeRunner::new()).tick().await;
    let store = daemon.store.lock();
    let job = store.get(&tree.path("1hour/flaky.sh")).unwrap();
    assert_eq!(job.consecutive_failures(), 0);
    assert_eq!(job.last_success_at(), at(2024, 3, 1, 11, 1));
}

#[tokio::test]
async fn job_interrupted_mid_run_is_unlocked_on_restart() {
    let tree = JobTree::new();
    let script = tree.script("1min/slow.sh", "sleep 60");
    let runner = FakeRunner::new();
    runner.hold(&script);

    {
        let daemon = tree.start();
        let mut coordinator = daemon.coordinator(runner.clone());
        coordinator.tick().await;
        tree.advance_minutes(2);
        assert_eq!(coordinator.tick().await.dispatched, 1);
        daemon.store.lock().persist().unwrap();
        // Coordinator and daemon drop here with the execution unfinished
    }

    let daemon = tree.start();
    assert_eq!(daemon.load_outcome, LoadOutcome::Restored { jobs: 1, released: 1 });
    let store = daemon.store.lock();
    assert!(!store.get(&script).unwrap().is_locked());
    assert_eq!(store.runnable(), vec![script]);
}

#[tokio::test]
async fn shutdown_writes_final_snapshot() {
    let tree = JobTree::new();
    tree.script("1day/at0600/backup.sh", "exit 0");
    let config = tree.config();

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    tree.start().run(FakeRunner::new(), shutdown).await;

    let saved = std::fs::read_to_string(&config.snapshot_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert!(saved.contains("1day/at0600/backup.sh"), "snapshot was: {value:#}");

    let daemon = tree.start();
    assert_eq!(daemon.load_outcome, LoadOutcome::Restored { jobs: 1, released: 0 });
}

#[test]
fn unreadable_snapshot_is_moved_aside() {
    let tree = JobTree::new();
    let config = tree.config();
    std::fs::create_dir_all(config.snapshot_path.parent().unwrap()).unwrap();
    std::fs::write(&config.snapshot_path, "{ not json").unwrap();

    let daemon = tree.start();
    let LoadOutcome::Quarantined { backup } = &daemon.load_outcome else {
        panic!("expected Quarantined, got {:?}", daemon.load_outcome);
    };
    assert_eq!(std::fs::read_to_string(backup).unwrap(), "{ not json");
    assert!(daemon.store.lock().table().is_empty());
}
