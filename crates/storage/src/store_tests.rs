// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fc_core::test_support::at;
use fc_core::{FakeClock, RunReason};
use tempfile::tempdir;

const ROOT: &str = "/srv/jobs";

fn script(relative: &str) -> PathBuf {
    Path::new(ROOT).join(relative)
}

fn clock() -> FakeClock {
    FakeClock::at(at(2024, 3, 1, 10, 0))
}

fn retry() -> TimeDelta {
    TimeDelta::minutes(2)
}

#[test]
fn open_without_snapshot_is_fresh() {
    let dir = tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("snapshot.json"));

    let (store, outcome) = JobStore::open(file, retry(), clock(), false).unwrap();

    assert_eq!(outcome, LoadOutcome::Fresh);
    assert!(store.table().is_empty());
}

#[test]
fn open_restores_jobs_and_releases_stale_locks() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let mut table = JobTable::default();
    table.insert(
        Job::builder()
            .identity(script("1min/a.sh"))
            .locked(true)
            .locked_at(Some(at(2024, 3, 1, 9, 59)))
            .build(),
    );
    table.insert(Job::builder().identity(script("1min/b.sh")).build());
    SnapshotFile::new(&path).save(&table).unwrap();

    let (store, outcome) = JobStore::open(SnapshotFile::new(&path), retry(), clock(), false).unwrap();

    assert_eq!(outcome, LoadOutcome::Restored { jobs: 2, released: 1 });
    let job = store.get(&script("1min/a.sh")).unwrap();
    assert!(!job.is_locked());
    assert_eq!(job.locked_at(), Some(at(2024, 3, 1, 9, 59)));
}

#[test]
fn open_with_reset_ignores_existing_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let mut table = JobTable::default();
    table.insert(Job::builder().identity(script("1min/a.sh")).build());
    SnapshotFile::new(&path).save(&table).unwrap();

    let (store, outcome) = JobStore::open(SnapshotFile::new(&path), retry(), clock(), true).unwrap();

    assert_eq!(outcome, LoadOutcome::Fresh);
    assert!(store.table().is_empty());
    assert!(!path.exists());
}

#[test]
fn open_quarantines_corrupt_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, b"{ truncated").unwrap();

    let (store, outcome) = JobStore::open(SnapshotFile::new(&path), retry(), clock(), false).unwrap();

    assert_eq!(outcome, LoadOutcome::Quarantined { backup: dir.path().join("snapshot.bak") });
    assert!(store.table().is_empty());
    assert!(!path.exists());
}

#[test]
fn open_fails_when_snapshot_is_unreadable() {
    let dir = tempdir().unwrap();
    // A directory where the file should be cannot be read as a file
    let path = dir.path().join("snapshot.json");
    std::fs::create_dir(&path).unwrap();

    let result = JobStore::open(SnapshotFile::new(&path), retry(), clock(), false);
    assert!(matches!(result, Err(SnapshotError::Io(_))));
}

#[test]
fn claim_runnable_locks_due_jobs_once() {
    let clock = clock();
    let mut store = JobStore::in_memory(retry(), clock.clone());
    store.fetch(Path::new(ROOT), &script("1min/a.sh")).unwrap();
    store.fetch(Path::new(ROOT), &script("1hour/b.sh")).unwrap();

    clock.advance(TimeDelta::minutes(2));
    let claimed = store.claim_runnable();

    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].name(), "1min/a.sh");
    assert!(claimed[0].is_locked());
    assert!(store.claim_runnable().is_empty());
}

#[test]
fn lock_twice_is_rejected() {
    let mut store = JobStore::in_memory(retry(), clock());
    store.fetch(Path::new(ROOT), &script("1min/a.sh")).unwrap();

    store.lock(&script("1min/a.sh")).unwrap();
    let err = store.lock(&script("1min/a.sh")).unwrap_err();

    assert!(matches!(err, StoreError::Job(JobError::AlreadyLocked(_))));
}

#[test]
fn unknown_job_is_reported() {
    let mut store = JobStore::in_memory(retry(), clock());
    let err = store.job_successful(&script("1min/missing.sh")).unwrap_err();
    assert!(matches!(err, StoreError::UnknownJob(_)));
}

#[test]
fn failure_then_success_round_trip() {
    let clock = clock();
    let mut store = JobStore::in_memory(retry(), clock.clone());
    let id = script("1min/a.sh");
    store.fetch(Path::new(ROOT), &id).unwrap();

    clock.advance(TimeDelta::minutes(2));
    store.lock(&id).unwrap();
    clock.advance(TimeDelta::seconds(5));
    let job = store.job_failed(&id).unwrap();
    assert_eq!(job.consecutive_failures(), 1);
    assert_eq!(job.run_reason(), RunReason::RetryAfterFailure);
    assert_eq!(job.runtime().unwrap(), "0 hours, 0 minutes, 5 seconds");

    clock.advance(TimeDelta::minutes(3));
    store.lock(&id).unwrap();
    let job = store.job_successful(&id).unwrap();
    assert_eq!(job.consecutive_failures(), 0);
    assert_eq!(job.run_reason(), RunReason::Scheduled);
    assert_eq!(job.last_success_at(), clock.now());
}

#[test]
fn outcomes_are_persisted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let clock = clock();
    let (mut store, _) =
        JobStore::open(SnapshotFile::new(&path), retry(), clock.clone(), false).unwrap();
    let id = script("1min/a.sh");
    store.fetch(Path::new(ROOT), &id).unwrap();
    store.lock(&id).unwrap();
    store.job_failed(&id).unwrap();

    let reloaded = SnapshotFile::new(&path).load().unwrap().unwrap();
    let job = reloaded.jobs.get(&id).unwrap();
    assert_eq!(job.consecutive_failures(), 1);
    assert!(!job.is_locked());
}

#[test]
fn purge_missing_persists_removal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let (mut store, _) =
        JobStore::open(SnapshotFile::new(&path), retry(), clock(), false).unwrap();
    store.fetch(Path::new(ROOT), &script("1min/a.sh")).unwrap();
    store.fetch(Path::new(ROOT), &script("1min/b.sh")).unwrap();

    let present: HashSet<PathBuf> = [script("1min/a.sh")].into();
    let removed = store.purge_missing(&present);

    assert_eq!(removed.len(), 1);
    let reloaded = SnapshotFile::new(&path).load().unwrap().unwrap();
    assert_eq!(reloaded.jobs.len(), 1);
    assert!(reloaded.jobs.contains(&script("1min/a.sh")));
}

#[test]
fn in_memory_persist_is_noop() {
    let store = JobStore::in_memory(retry(), clock());
    store.persist().unwrap();
}

#[test]
fn upcoming_lists_names_in_order() {
    let mut store = JobStore::in_memory(retry(), clock());
    store.fetch(Path::new(ROOT), &script("1hour/slow.sh")).unwrap();
    store.fetch(Path::new(ROOT), &script("1min/fast.sh")).unwrap();

    let upcoming = store.upcoming();
    assert_eq!(
        upcoming,
        vec![
            ("1min/fast.sh".to_string(), at(2024, 3, 1, 10, 1)),
            ("1hour/slow.sh".to_string(), at(2024, 3, 1, 11, 0)),
        ]
    );
}

#[test]
fn holds_claim_matches_the_lock_time() {
    let clock = clock();
    let mut store = JobStore::in_memory(retry(), clock.clone());
    let path = Path::new("/srv/jobs/1min/a.sh");
    store.fetch(Path::new("/srv/jobs"), path).unwrap();
    assert!(!store.holds_claim(path, None));

    let locked_at = store.lock(path).unwrap().locked_at();
    assert!(store.holds_claim(path, locked_at));
    assert!(!store.holds_claim(path, Some(at(2024, 3, 1, 9, 0))));

    store.job_successful(path).unwrap();
    assert!(!store.holds_claim(path, locked_at));
}
