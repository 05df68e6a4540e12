// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-session resolution context

use tracing::debug;

use crate::config::ResolverConfig;
use crate::dirpath::lookup_dirpath;
use crate::error::FsResult;
use crate::namev::open_namev;
use crate::vnode::VnodeRef;
use crate::OpenFlags;

/// Root and working directory of one session, plus the limits its
/// resolutions run under. Holds one reference on each of the two nodes.
#[derive(Debug, Clone)]
pub struct FsContext {
    root: VnodeRef,
    cwd: VnodeRef,
    config: ResolverConfig,
}

impl FsContext {
    /// Create a context whose working directory is `root`.
    pub fn new(root: VnodeRef, config: ResolverConfig) -> Self {
        let cwd = root.clone();
        Self { root, cwd, config }
    }

    pub fn with_cwd(root: VnodeRef, cwd: VnodeRef, config: ResolverConfig) -> Self {
        Self { root, cwd, config }
    }

    pub fn root(&self) -> &VnodeRef {
        &self.root
    }

    pub fn cwd(&self) -> &VnodeRef {
        &self.cwd
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `path` relative to this context.
    pub fn open(&self, path: &str, flags: OpenFlags) -> FsResult<VnodeRef> {
        open_namev(self, path, flags, None)
    }

    /// Change the working directory. The path must name a directory.
    pub fn chdir(&mut self, path: &str) -> FsResult<()> {
        let dir = open_namev(self, path, OpenFlags::DIRECTORY, None)?;
        debug!(target: "vfs_namei::context", path, ino = %dir.vno(), "changed working directory");
        self.cwd = dir;
        Ok(())
    }

    /// Write the absolute path of the working directory into `buf`.
    pub fn getcwd(&self, buf: &mut [u8]) -> FsResult<usize> {
        lookup_dirpath(&self.cwd, buf)
    }
}
