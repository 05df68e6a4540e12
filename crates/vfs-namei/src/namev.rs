// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Forward path resolution: path string to vnode

use tracing::{debug, trace};

use crate::context::FsContext;
use crate::error::{FsError, FsResult};
use crate::vnode::VnodeRef;
use crate::{OpenFlags, VnodeKind};

/// Parent directory of a path together with the path's final component.
///
/// `name` borrows from the resolved path. It is empty when the path ends in a
/// separator (or is just `/`), in which case `dir` itself is what the path
/// names.
#[derive(Debug)]
pub struct DirName<'p> {
    pub dir: VnodeRef,
    pub name: &'p str,
}

/// Resolve a single component `name` inside `dir`.
///
/// `"."` is answered without consulting the node. Anything else is handed to
/// the node's own lookup. The returned reference is owned by the caller.
pub fn lookup(dir: &VnodeRef, name: &str) -> FsResult<VnodeRef> {
    if name.is_empty() || name.contains(['/', '\0']) {
        return Err(FsError::InvalidArgument);
    }
    if name == "." {
        return Ok(dir.clone());
    }

    match dir.node().lookup(name) {
        Ok(Some(node)) => Ok(VnodeRef::acquire(node)),
        Ok(None) => Err(FsError::NotFound),
        Err(FsError::Unsupported) => Err(FsError::NotADirectory),
        Err(err) => Err(err),
    }
}

/// Walk every component of `path` except the last one.
///
/// Absolute paths start at the context's root. Relative paths start at `base`
/// when given, otherwise at the context's working directory.
pub fn dir_namev<'p>(
    ctx: &FsContext,
    path: &'p str,
    base: Option<&VnodeRef>,
) -> FsResult<DirName<'p>> {
    if path.is_empty() {
        return Err(FsError::InvalidArgument);
    }
    let config = ctx.config();
    if path.len() > config.path_max {
        return Err(FsError::NameTooLong);
    }

    let (start, rest) = match path.strip_prefix('/') {
        Some(rest) => (ctx.root(), rest),
        None => (base.unwrap_or_else(|| ctx.cwd()), path),
    };

    let (parents, name) = match rest.rfind('/') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => ("", rest),
    };
    if name.len() > config.name_max {
        return Err(FsError::NameTooLong);
    }

    let mut dir = start.clone();
    for component in parents.split('/').filter(|c| !c.is_empty()) {
        if component.len() > config.name_max {
            return Err(FsError::NameTooLong);
        }
        let next = lookup(&dir, component)?;
        trace!(
            target: "vfs_namei::namev",
            component,
            from = %dir.vno(),
            to = %next.vno(),
            "resolved component"
        );
        dir = next;
    }

    Ok(DirName { dir, name })
}

/// Resolve `path` to a node, creating the final component when
/// `flags.create` is set and it does not exist yet.
pub fn open_namev(
    ctx: &FsContext,
    path: &str,
    flags: OpenFlags,
    base: Option<&VnodeRef>,
) -> FsResult<VnodeRef> {
    let DirName { dir, name } = dir_namev(ctx, path, base)?;

    let node = if name.is_empty() {
        if dir.kind() != VnodeKind::Directory {
            return Err(FsError::NotADirectory);
        }
        dir
    } else {
        match lookup(&dir, name) {
            Ok(node) => node,
            Err(FsError::NotFound) if flags.create => create(&dir, name)?,
            Err(err) => return Err(err),
        }
    };

    if flags.directory && node.kind() != VnodeKind::Directory {
        return Err(FsError::NotADirectory);
    }
    Ok(node)
}

fn create(dir: &VnodeRef, name: &str) -> FsResult<VnodeRef> {
    match dir.node().create(name) {
        Ok(node) => {
            debug!(
                target: "vfs_namei::namev",
                parent = %dir.vno(),
                name,
                ino = %node.vno(),
                "created entry"
            );
            Ok(node)
        }
        Err(err) => {
            debug!(target: "vfs_namei::namev", parent = %dir.vno(), name, %err, "create failed");
            Err(FsError::CreateFailed {
                source: Box::new(err),
            })
        }
    }
}
