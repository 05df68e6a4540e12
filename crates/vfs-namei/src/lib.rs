// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Path-name resolution for a virtual file system layer
//!
//! Translates slash-separated paths into reference-counted vnodes
//! ([`open_namev`], [`dir_namev`], [`lookup`]) and reconstructs paths from
//! vnodes ([`lookup_name`], [`lookup_dirpath`]). Node types plug in through
//! the [`Vnode`] trait; session state is passed explicitly as an
//! [`FsContext`].

pub mod config;
pub mod context;
pub mod dirpath;
pub mod error;
pub mod fault;
pub mod namev;
pub mod ramfs;
pub mod types;
pub mod vnode;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ResolverConfig;
pub use context::FsContext;
pub use dirpath::{lookup_dirpath, lookup_name};
pub use error::{FsError, FsResult};
pub use namev::{dir_namev, lookup, open_namev, DirName};
pub use ramfs::{RamFs, RamNode};
pub use types::{Dirent, Ino, OpenFlags, VnodeKind};
pub use vnode::{RefCount, Vnode, VnodeRef};
