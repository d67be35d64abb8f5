// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery specs
//!
//! Verify the folder convention decides which files become jobs.

use crate::prelude::*;

#[test]
fn only_scripts_with_a_valid_schedule_are_registered() {
    let tree = JobTree::new();
    tree.script("1hour/at0050/test.sh", "exit 0");
    tree.script("2week/at1733/test.sh", "exit 0");
    tree.script("2week/at3000/test.sh", "exit 0");
    tree.script("166mins/test.sh", "exit 0");
    tree.script("hello.sh", "exit 0");

    let daemon = tree.start();
    let config = tree.config();
    let mut discovery =
        Discovery::new(config.jobs_dir.clone(), config.discovery_every, tree.clock.clone());
    let report = discovery.run(&daemon.store).unwrap();

    similar_asserts::assert_eq!(
        report,
        DiscoveryReport { scanned: 5, added: 2, removed: 0, invalid: 3, unreadable: 0 }
    );
    assert_eq!(JobTree::job_names(&daemon), vec!["1hour/at0050/test.sh", "2week/at1733/test.sh"]);
}

#[tokio::test]
async fn new_jobs_wait_for_their_next_slot() {
    let tree = JobTree::new();
    tree.script("1hour/at0050/test.sh", "exit 0");
    tree.script("2week/at1733/test.sh", "exit 0");

    let daemon = tree.start();
    let mut coordinator = daemon.coordinator(FakeRunner::new());
    coordinator.tick().await;

    let store = daemon.store.lock();
    assert_eq!(
        store.upcoming(),
        vec![
            ("1hour/at0050/test.sh".to_string(), at(2024, 3, 1, 10, 50)),
            ("2week/at1733/test.sh".to_string(), at(2024, 3, 1, 17, 33)),
        ]
    );
    assert!(store.runnable().is_empty());
}

#[tokio::test]
async fn deleted_script_is_purged_on_next_scan() {
    let tree = JobTree::new();
    tree.script("1hour/keep.sh", "exit 0");
    tree.script("1hour/drop.sh", "exit 0");

    let daemon = tree.start();
    let mut coordinator = daemon.coordinator(FakeRunner::new());
    coordinator.tick().await;
    assert_eq!(JobTree::job_names(&daemon), vec!["1hour/drop.sh", "1hour/keep.sh"]);

    tree.remove("1hour/drop.sh");
    // Default check interval is five minutes
    tree.advance_minutes(4);
    assert_eq!(coordinator.tick().await.discovery, None);

    tree.advance_minutes(2);
    let report = coordinator.tick().await.discovery.unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(JobTree::job_names(&daemon), vec!["1hour/keep.sh"]);
}

#[tokio::test]
async fn script_deleted_while_running_is_purged_after_it_finishes() {
    let tree = JobTree::new();
    let script = tree.script("1hour/slow.sh", "sleep 1");
    let runner = FakeRunner::new();
    runner.hold(&script);

    let daemon = tree.start();
    let mut coordinator = daemon.coordinator(runner.clone());
    coordinator.tick().await;
    tree.advance_minutes(61);
    assert_eq!(coordinator.tick().await.dispatched, 1);

    tree.remove("1hour/slow.sh");
    tree.advance_minutes(6);
    let report = coordinator.tick().await;
    assert_eq!(report.dispatched, 0);
    assert_eq!(report.discovery.unwrap().removed, 0);
    assert!(daemon.store.lock().get(&script).unwrap().is_locked());

    runner.release(&script);
    let finished = coordinator.wait_idle().await;
    assert_eq!(finished.len(), 1);

    tree.advance_minutes(6);
    let report = coordinator.tick().await;
    assert_eq!(report.discovery.unwrap().removed, 1);
    assert!(JobTree::job_names(&daemon).is_empty());
}

#[tokio::test]
async fn nested_folders_below_the_anchor_are_ignored() {
    let tree = JobTree::new();
    tree.script("1day/at0600/reports/nightly.sh", "exit 0");

    let daemon = tree.start();
    let mut coordinator = daemon.coordinator(FakeRunner::new());
    coordinator.tick().await;

    let store = daemon.store.lock();
    assert_eq!(
        store.upcoming(),
        vec![("1day/at0600/reports/nightly.sh".to_string(), at(2024, 3, 2, 6, 0))]
    );
}
