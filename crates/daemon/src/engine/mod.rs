// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! foldercron execution engine

mod coordinator;
mod executor;

pub use coordinator::{Coordinator, TickReport};
pub use executor::Executor;

use fc_storage::JobStore;
use parking_lot::Mutex;
use std::sync::Arc;

/// The job store behind the single guard every component shares
pub type SharedStore<C> = Arc<Mutex<JobStore<C>>>;
