// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution specs
//!
//! Verify due jobs run, failures are retried after the retry timeout, and
//! a running job is never started twice.

use std::num::NonZeroUsize;

use crate::prelude::*;

/// Discover at 10:00, then move the clock forward.
async fn discover_then_advance<R: ProcessRunner>(
    coordinator: &mut Coordinator<R, FakeClock>,
    tree: &JobTree,
    minutes: i64,
) {
    coordinator.tick().await;
    tree.advance_minutes(minutes);
}

async fn wait_until_running(runner: &FakeRunner, count: usize) {
    while runner.running() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn due_script_runs_in_its_own_folder() {
    let tree = JobTree::new();
    let script = tree.script("1min/hello.sh", r#"echo "hello from $(pwd)""#);
    let daemon = tree.start();
    let mut coordinator = daemon.coordinator(ShellRunner);

    discover_then_advance(&mut coordinator, &tree, 2).await;
    assert_eq!(coordinator.tick().await.dispatched, 1);

    let statuses = coordinator.wait_idle().await;
    assert_eq!(statuses.len(), 1);
    let status = &statuses[0];
    assert!(status.succeeded());
    assert_eq!(status.name, "1min/hello.sh");
    assert_eq!(
        status.stdout.trim(),
        format!("hello from {}", script.parent().unwrap().display())
    );
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(status.run_reason, RunReason::Scheduled);
    assert_eq!(status.next_run, at(2024, 3, 1, 10, 3));
    assert_eq!(status.runtime.as_deref(), Some("0 hours, 0 minutes, 0 seconds"));
}

#[tokio::test]
async fn failed_script_is_retried_after_the_timeout() {
    let tree = JobTree::new();
    tree.script(
        "1hour/flaky.sh",
        "if [ -f ok ]; then echo fine; else echo broken >&2; touch ok; exit 3; fi",
    );
    let daemon = tree.start();
    let mut coordinator = daemon.coordinator(ShellRunner);

    // First slot is 11:00
    discover_then_advance(&mut coordinator, &tree, 61).await;
    assert_eq!(coordinator.tick().await.dispatched, 1);
    let failed = coordinator.wait_idle().await;
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].exit_code, 3);
    assert_eq!(failed[0].stderr.trim(), "broken");
    assert_eq!(failed[0].consecutive_failures, 1);
    assert_eq!(failed[0].run_reason, RunReason::RetryAfterFailure);
    assert_eq!(failed[0].next_run, at(2024, 3, 1, 11, 3));

    // Still inside the two minute retry timeout
    tree.advance_minutes(1);
    assert_eq!(coordinator.tick().await.dispatched, 0);

    tree.advance_minutes(2);
    assert_eq!(coordinator.tick().await.dispatched, 1);
    let recovered = coordinator.wait_idle().await;
    assert_eq!(recovered.len(), 1);
    assert!(recovered[0].succeeded());
    assert_eq!(recovered[0].stdout.trim(), "fine");
    assert_eq!(recovered[0].consecutive_failures, 0);
    assert_eq!(recovered[0].next_run, at(2024, 3, 1, 12, 4));
}

#[tokio::test]
async fn running_job_is_not_started_again() {
    let tree = JobTree::new();
    let script = tree.script("1min/slow.sh", "sleep 1");
    let runner = FakeRunner::new();
    runner.hold(&script);

    let daemon = tree.start();
    let mut coordinator = daemon.coordinator(runner.clone());
    discover_then_advance(&mut coordinator, &tree, 2).await;
    assert_eq!(coordinator.tick().await.dispatched, 1);
    wait_until_running(&runner, 1).await;

    tree.advance_minutes(5);
    assert_eq!(coordinator.tick().await.dispatched, 0);
    {
        let store = daemon.store.lock();
        assert!(store.get(&script).unwrap().is_locked());
        assert!(store.runnable().is_empty());
    }

    runner.release(&script);
    let statuses = coordinator.wait_idle().await;
    assert_eq!(statuses.len(), 1);
    assert_eq!(runner.calls().len(), 1);
    assert!(!daemon.store.lock().get(&script).unwrap().is_locked());
}

#[tokio::test]
async fn script_that_cannot_start_counts_as_failed() {
    let tree = JobTree::new();
    let script = tree.script("1min/broken.sh", "exit 0");
    let runner = FakeRunner::new();
    runner.fail_spawn(&script);

    let daemon = tree.start();
    let mut coordinator = daemon.coordinator(runner);
    discover_then_advance(&mut coordinator, &tree, 2).await;
    coordinator.tick().await;

    let statuses = coordinator.wait_idle().await;
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].exit_code, -1);
    assert!(statuses[0].stderr.contains("failed to start"));
    assert_eq!(statuses[0].consecutive_failures, 1);
}

#[tokio::test]
async fn concurrency_cap_queues_due_jobs() {
    let tree = JobTree::new();
    let scripts: Vec<_> =
        ["1min/a.sh", "1min/b.sh", "1min/c.sh"].iter().map(|s| tree.script(s, "exit 0")).collect();
    let runner = FakeRunner::new();
    for script in &scripts {
        runner.hold(script);
    }

    let mut daemon = tree.start();
    daemon.config.max_concurrent_runs = NonZeroUsize::new(1);
    let mut coordinator = daemon.coordinator(runner.clone());
    discover_then_advance(&mut coordinator, &tree, 2).await;
    assert_eq!(coordinator.tick().await.dispatched, 3);
    wait_until_running(&runner, 1).await;

    // Queued jobs keep their lock while waiting
    {
        let store = daemon.store.lock();
        assert!(scripts.iter().all(|s| store.get(s).unwrap().is_locked()));
    }

    for script in &scripts {
        runner.release(script);
    }
    let statuses = coordinator.wait_idle().await;
    assert_eq!(statuses.len(), 3);
    assert!(statuses.iter().all(JobStatus::succeeded));
    assert_eq!(runner.max_running(), 1);
}
