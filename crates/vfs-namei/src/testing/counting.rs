// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Instrumented directory and file vnodes

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::error::{FsError, FsResult};
use crate::vnode::{RefCount, Vnode, VnodeRef};
use crate::{Dirent, Ino, VnodeKind};

/// Bytes each entry occupies in a `CountingDir` scan
pub const SLOT: u64 = 16;

type ErrorFn = Box<dyn Fn() -> FsError + Send + Sync>;

/// Leaf node without any directory capability
pub struct CountingFile {
    ino: Ino,
    refs: RefCount,
}

impl CountingFile {
    pub fn new(ino: u64) -> Arc<Self> {
        Arc::new(Self {
            ino: Ino(ino),
            refs: RefCount::new(),
        })
    }
}

impl Vnode for CountingFile {
    fn vno(&self) -> Ino {
        self.ino
    }

    fn kind(&self) -> VnodeKind {
        VnodeKind::Regular
    }

    fn size(&self) -> u64 {
        0
    }

    fn refcount(&self) -> &RefCount {
        &self.refs
    }
}

/// Directory that records how often its capabilities are used.
///
/// `..` is answered from the parent link set by `insert`; a directory that was
/// never inserted anywhere is its own parent.
pub struct CountingDir {
    ino: Ino,
    refs: RefCount,
    this: Weak<CountingDir>,
    parent: Mutex<Option<Weak<CountingDir>>>,
    entries: Mutex<Vec<(String, Arc<dyn Vnode>)>>,
    can_create: bool,
    next_ino: AtomicU64,
    create_error: Mutex<Option<ErrorFn>>,
    readdir_error: Mutex<Option<ErrorFn>>,
    lookups: AtomicUsize,
    readdirs: AtomicUsize,
}

impl CountingDir {
    pub fn new(ino: u64) -> Arc<Self> {
        Self::build(ino, true)
    }

    pub fn without_create(ino: u64) -> Arc<Self> {
        Self::build(ino, false)
    }

    fn build(ino: u64, can_create: bool) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            ino: Ino(ino),
            refs: RefCount::new(),
            this: this.clone(),
            parent: Mutex::new(None),
            entries: Mutex::new(Vec::new()),
            can_create,
            next_ino: AtomicU64::new(ino * 1000),
            create_error: Mutex::new(None),
            readdir_error: Mutex::new(None),
            lookups: AtomicUsize::new(0),
            readdirs: AtomicUsize::new(0),
        })
    }

    pub fn insert(&self, name: &str, node: Arc<dyn Vnode>) {
        self.entries.lock().unwrap().push((name.to_string(), node));
    }

    /// Insert a child directory and point its `..` back at `self`.
    pub fn insert_dir(&self, name: &str, child: &Arc<CountingDir>) {
        *child.parent.lock().unwrap() = Some(self.this.clone());
        self.insert(name, child.clone());
    }

    pub fn fail_creates_with(&self, f: impl Fn() -> FsError + Send + Sync + 'static) {
        *self.create_error.lock().unwrap() = Some(Box::new(f));
    }

    pub fn fail_readdir_with(&self, f: impl Fn() -> FsError + Send + Sync + 'static) {
        *self.readdir_error.lock().unwrap() = Some(Box::new(f));
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn readdirs(&self) -> usize {
        self.readdirs.load(Ordering::SeqCst)
    }

    fn self_arc(&self) -> Arc<dyn Vnode> {
        self.this.upgrade().expect("directory alive while in use")
    }
}

impl Vnode for CountingDir {
    fn vno(&self) -> Ino {
        self.ino
    }

    fn kind(&self) -> VnodeKind {
        VnodeKind::Directory
    }

    fn size(&self) -> u64 {
        self.entries.lock().unwrap().len() as u64 * SLOT
    }

    fn refcount(&self) -> &RefCount {
        &self.refs
    }

    fn lookup(&self, name: &str) -> FsResult<Option<Arc<dyn Vnode>>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if name == ".." {
            let parent = self.parent.lock().unwrap().as_ref().and_then(Weak::upgrade);
            return Ok(Some(match parent {
                Some(parent) => parent as Arc<dyn Vnode>,
                None => self.self_arc(),
            }));
        }
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, node)| node.clone()))
    }

    fn create(&self, name: &str) -> FsResult<VnodeRef> {
        if !self.can_create {
            return Err(FsError::Unsupported);
        }
        if let Some(make_error) = self.create_error.lock().unwrap().as_ref() {
            return Err(make_error());
        }
        let ino = self.next_ino.fetch_add(1, Ordering::SeqCst);
        let file = CountingFile::new(ino);
        self.insert(name, file.clone());
        Ok(VnodeRef::acquire(file))
    }

    fn readdir(&self, offset: u64) -> FsResult<Option<(u64, Dirent)>> {
        self.readdirs.fetch_add(1, Ordering::SeqCst);
        if let Some(make_error) = self.readdir_error.lock().unwrap().as_ref() {
            return Err(make_error());
        }
        let entries = self.entries.lock().unwrap();
        let slot = (offset / SLOT) as usize;
        Ok(entries
            .get(slot)
            .map(|(name, node)| (offset + SLOT, Dirent::new(node.vno(), name.clone()))))
    }
}
