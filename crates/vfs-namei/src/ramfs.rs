// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory file system implementing the vnode contract
//!
//! Directories list `.` and `..` first, then their children in insertion
//! order. Each entry occupies a fixed-size slot, so a directory's size is its
//! slot count times [`RAMFS_DIRENT_SIZE`] and readdir offsets are slot
//! boundaries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use crate::error::{FsError, FsResult};
use crate::fault::{FaultInjector, FaultOp};
use crate::vnode::{RefCount, Vnode, VnodeRef};
use crate::{Dirent, Ino, VnodeKind};

/// Bytes one directory entry occupies
pub const RAMFS_DIRENT_SIZE: u64 = 32;

/// Inode number of the root directory
pub const RAMFS_ROOT_INO: Ino = Ino(1);

struct Shared {
    next_ino: AtomicU64,
    faults: Option<Arc<FaultInjector>>,
}

impl Shared {
    fn allocate_ino(&self) -> Ino {
        Ino(self.next_ino.fetch_add(1, Ordering::Relaxed))
    }

    fn check(&self, op: FaultOp) -> FsResult<()> {
        match self.faults.as_ref().and_then(|faults| faults.should_fault(op)) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// A RAM-backed file system
pub struct RamFs {
    root: Arc<RamNode>,
}

impl Default for RamFs {
    fn default() -> Self {
        Self::new()
    }
}

impl RamFs {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A file system whose capability calls consult `faults` first.
    pub fn with_faults(faults: Arc<FaultInjector>) -> Self {
        Self::build(Some(faults))
    }

    fn build(faults: Option<Arc<FaultInjector>>) -> Self {
        let shared = Arc::new(Shared {
            next_ino: AtomicU64::new(RAMFS_ROOT_INO.0 + 1),
            faults,
        });
        let root = RamNode::new(shared, RAMFS_ROOT_INO, VnodeKind::Directory, None);
        Self { root }
    }

    /// Owned reference to the root directory
    pub fn root(&self) -> VnodeRef {
        VnodeRef::acquire(self.root.clone())
    }

    pub fn root_node(&self) -> &Arc<RamNode> {
        &self.root
    }
}

/// A RAM file system node: a directory or a regular file
pub struct RamNode {
    ino: Ino,
    kind: VnodeKind,
    refs: RefCount,
    shared: Arc<Shared>,
    this: Weak<RamNode>,
    /// Unset for the root, which is its own parent
    parent: Option<Weak<RamNode>>,
    children: Mutex<Vec<(String, Arc<RamNode>)>>,
}

impl RamNode {
    fn new(
        shared: Arc<Shared>,
        ino: Ino,
        kind: VnodeKind,
        parent: Option<Weak<RamNode>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            ino,
            kind,
            refs: RefCount::new(),
            shared,
            this: this.clone(),
            parent,
            children: Mutex::new(Vec::new()),
        })
    }

    fn this(&self) -> Arc<RamNode> {
        self.this.upgrade().unwrap_or_else(|| unreachable!("node used after drop"))
    }

    fn parent(&self) -> Arc<RamNode> {
        self.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .unwrap_or_else(|| self.this())
    }

    fn require_dir(&self) -> FsResult<()> {
        if self.kind == VnodeKind::Directory {
            Ok(())
        } else {
            Err(FsError::Unsupported)
        }
    }

    fn add_child(&self, name: &str, kind: VnodeKind) -> FsResult<Arc<RamNode>> {
        self.require_dir()?;
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
            return Err(FsError::InvalidArgument);
        }
        let mut children = self.children.lock().unwrap();
        if children.iter().any(|(existing, _)| existing == name) {
            return Err(FsError::AlreadyExists);
        }
        let node = RamNode::new(
            self.shared.clone(),
            self.shared.allocate_ino(),
            kind,
            Some(self.this.clone()),
        );
        children.push((name.to_string(), node.clone()));
        trace!(
            target: "vfs_namei::ramfs",
            parent = %self.ino,
            name,
            ino = %node.ino,
            %kind,
            "added entry"
        );
        Ok(node)
    }

    /// Create a subdirectory.
    pub fn mkdir(&self, name: &str) -> FsResult<Arc<RamNode>> {
        self.add_child(name, VnodeKind::Directory)
    }

    /// Create an empty regular file.
    pub fn mkfile(&self, name: &str) -> FsResult<Arc<RamNode>> {
        self.add_child(name, VnodeKind::Regular)
    }

    /// Snapshot of this directory's children, in listing order.
    pub fn children(&self) -> Vec<(String, Arc<RamNode>)> {
        self.children.lock().unwrap().clone()
    }
}

impl Vnode for RamNode {
    fn vno(&self) -> Ino {
        self.ino
    }

    fn kind(&self) -> VnodeKind {
        self.kind
    }

    fn size(&self) -> u64 {
        match self.kind {
            VnodeKind::Directory => {
                (self.children.lock().unwrap().len() as u64 + 2) * RAMFS_DIRENT_SIZE
            }
            _ => 0,
        }
    }

    fn refcount(&self) -> &RefCount {
        &self.refs
    }

    fn lookup(&self, name: &str) -> FsResult<Option<Arc<dyn Vnode>>> {
        self.require_dir()?;
        self.shared.check(FaultOp::Lookup)?;
        let found: Option<Arc<RamNode>> = match name {
            "." => Some(self.this()),
            ".." => Some(self.parent()),
            _ => self
                .children
                .lock()
                .unwrap()
                .iter()
                .find(|(entry, _)| entry == name)
                .map(|(_, node)| node.clone()),
        };
        Ok(found.map(|node| node as Arc<dyn Vnode>))
    }

    fn create(&self, name: &str) -> FsResult<VnodeRef> {
        self.require_dir()?;
        self.shared.check(FaultOp::Create)?;
        let node = self.add_child(name, VnodeKind::Regular)?;
        Ok(VnodeRef::acquire(node))
    }

    fn readdir(&self, offset: u64) -> FsResult<Option<(u64, Dirent)>> {
        self.require_dir()?;
        self.shared.check(FaultOp::Readdir)?;
        let slot = offset / RAMFS_DIRENT_SIZE;
        let next = (slot + 1) * RAMFS_DIRENT_SIZE;
        let dirent = match slot {
            0 => Dirent::new(self.ino, "."),
            1 => Dirent::new(self.parent().ino, ".."),
            n => {
                let children = self.children.lock().unwrap();
                match children.get((n - 2) as usize) {
                    Some((name, node)) => Dirent::new(node.ino, name.clone()),
                    None => return Ok(None),
                }
            }
        };
        Ok(Some((next, dirent)))
    }
}
