// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for foldercron
//!
//! The job table is the only shared mutable state in the scheduler. It is
//! persisted as a full JSON snapshot after every mutation so a restart picks
//! up run history where it left off.

mod snapshot;
mod state;
mod store;

pub use snapshot::{Snapshot, SnapshotError, SnapshotFile, CURRENT_SNAPSHOT_VERSION};
pub use state::JobTable;
pub use store::{JobStore, LoadOutcome, StoreError};
