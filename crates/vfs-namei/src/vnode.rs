// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Vnode contract and owned vnode references
//!
//! A node type implements [`Vnode`]. The resolver never holds a bare
//! `Arc<dyn Vnode>` across a call boundary: every reference it hands out is a
//! [`VnodeRef`], which bumps the node's VFS reference count when created and
//! drops it when released.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::error;

use crate::error::{FsError, FsResult};
use crate::{Dirent, Ino, VnodeKind};

/// Atomic VFS reference counter embedded in every node
#[derive(Debug, Default)]
pub struct RefCount(AtomicUsize);

impl RefCount {
    pub fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn get(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    /// Drop one reference. The counter saturates at zero; an over-release is
    /// a bug in the caller and is reported rather than wrapped.
    pub(crate) fn put(&self, ino: Ino) {
        let released = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if released.is_err() {
            error!(target: "vfs_namei::vnode", %ino, "vnode reference count underflow");
        }
        debug_assert!(
            released.is_ok(),
            "vnode {ino} released more often than acquired"
        );
    }
}

/// Operations a file-system node exposes to the resolver.
///
/// The capability methods (`lookup`, `create`, `readdir`) are optional: a node
/// type that does not support one keeps the default body, which reports
/// [`FsError::Unsupported`].
#[cfg_attr(test, mockall::automock)]
pub trait Vnode: Send + Sync {
    /// Inode number, used for identity comparison
    fn vno(&self) -> Ino;

    fn kind(&self) -> VnodeKind;

    /// Byte length of the node. For directories this bounds a readdir scan.
    fn size(&self) -> u64;

    fn refcount(&self) -> &RefCount;

    /// Look up `name` in this directory. `Ok(None)` means no such entry.
    /// The returned node carries no VFS reference; the resolver takes one.
    fn lookup(&self, _name: &str) -> FsResult<Option<Arc<dyn Vnode>>> {
        Err(FsError::Unsupported)
    }

    /// Create a regular file called `name` in this directory and return an
    /// owned reference to it.
    fn create(&self, _name: &str) -> FsResult<VnodeRef> {
        Err(FsError::Unsupported)
    }

    /// Read the entry at byte `offset`, returning the offset of the next entry
    /// together with the entry, or `Ok(None)` past the last entry.
    fn readdir(&self, _offset: u64) -> FsResult<Option<(u64, Dirent)>> {
        Err(FsError::Unsupported)
    }
}

/// An owned VFS reference to a node.
///
/// Creating one increments the node's [`RefCount`]; dropping it decrements the
/// count again. Cloning acquires an additional reference.
pub struct VnodeRef {
    node: Arc<dyn Vnode>,
}

impl VnodeRef {
    /// Take a new reference on `node`.
    pub fn acquire(node: Arc<dyn Vnode>) -> Self {
        node.refcount().get();
        Self { node }
    }

    pub fn node(&self) -> &Arc<dyn Vnode> {
        &self.node
    }

    /// Whether both references name the same node.
    pub fn same_node(&self, other: &VnodeRef) -> bool {
        self.node.vno() == other.node.vno()
    }
}

impl Clone for VnodeRef {
    fn clone(&self) -> Self {
        Self::acquire(Arc::clone(&self.node))
    }
}

impl Drop for VnodeRef {
    fn drop(&mut self) {
        self.node.refcount().put(self.node.vno());
    }
}

impl Deref for VnodeRef {
    type Target = dyn Vnode;

    fn deref(&self) -> &Self::Target {
        self.node.as_ref()
    }
}

impl fmt::Debug for VnodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VnodeRef")
            .field("vno", &self.node.vno())
            .field("kind", &self.node.kind())
            .field("refcount", &self.node.refcount().count())
            .finish()
    }
}
