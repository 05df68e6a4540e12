// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Test-only node types
//!
//! Instrumented vnodes that count delegated calls and can be told to fail,
//! so resolver tests can check reference balance without a real file system.

pub mod counting;

pub use counting::{CountingDir, CountingFile};
