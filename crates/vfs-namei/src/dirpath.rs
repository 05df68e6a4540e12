// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Reverse resolution: vnode back to a path string
//!
//! Both entry points write into a caller-supplied byte buffer and always leave
//! a NUL-terminated string in it, even when they fail.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::error::{FsError, FsResult};
use crate::namev::lookup;
use crate::vnode::VnodeRef;

/// Copy as much of `src` as fits into `buf` followed by a NUL. `buf` must not
/// be empty. Returns the number of bytes copied and whether `src` fit whole.
fn copy_terminated(buf: &mut [u8], src: &[u8]) -> (usize, bool) {
    let n = src.len().min(buf.len() - 1);
    buf[..n].copy_from_slice(&src[..n]);
    buf[n] = 0;
    (n, n == src.len())
}

/// Scan `dir` for the entry whose inode number is `entry`'s.
fn find_name(dir: &VnodeRef, entry: &VnodeRef) -> FsResult<String> {
    let target = entry.vno();
    let size = dir.size();
    let mut offset = 0;

    while offset < size {
        let step = match dir.node().readdir(offset) {
            Err(FsError::Unsupported) => return Err(FsError::NotADirectory),
            other => other?,
        };
        let Some((next, dirent)) = step else {
            break;
        };
        if next <= offset {
            warn!(
                target: "vfs_namei::dirpath",
                dir = %dir.vno(),
                offset,
                next,
                "readdir did not advance; abandoning scan"
            );
            break;
        }
        offset = next;

        if dirent.name == "." || dirent.name == ".." {
            continue;
        }
        if dirent.ino == target {
            return Ok(dirent.name);
        }
    }

    Err(FsError::NotFound)
}

/// Write the name under which `entry` appears in `dir` into `buf`.
///
/// If the name does not fit, as much of it as possible is written, followed
/// by a NUL, and [`FsError::RangeExceeded`] is returned.
pub fn lookup_name(dir: &VnodeRef, entry: &VnodeRef, buf: &mut [u8]) -> FsResult<usize> {
    let Some(first) = buf.first_mut() else {
        return Err(FsError::InvalidArgument);
    };
    *first = 0;

    let name = find_name(dir, entry)?;
    match copy_terminated(buf, name.as_bytes()) {
        (n, true) => Ok(n),
        (_, false) => Err(FsError::RangeExceeded),
    }
}

/// Write the absolute path of directory `dir` into `buf`.
///
/// The walk follows `..` until it reaches a node that is its own parent. On
/// any failure the buffer still holds a NUL-terminated prefix of what was
/// gathered: a truncated path for [`FsError::RangeExceeded`], the leaf-side
/// segments found so far for a failed lookup.
pub fn lookup_dirpath(dir: &VnodeRef, buf: &mut [u8]) -> FsResult<usize> {
    if buf.is_empty() {
        return Err(FsError::InvalidArgument);
    }

    let mut segments = VecDeque::new();
    let mut total = 0;
    let walked = collect_segments(dir, &mut segments, &mut total);
    if walked.is_ok() && segments.is_empty() {
        segments.push_back("/".to_string());
        total = 1;
    }
    // terminator
    total += 1;

    let written = assemble(buf, segments);
    walked?;

    if total > buf.len() {
        debug!(
            target: "vfs_namei::dirpath",
            dir = %dir.vno(),
            required = total,
            capacity = buf.len(),
            "path truncated"
        );
        return Err(FsError::RangeExceeded);
    }
    Ok(written)
}

/// Gather `/name` segments from `dir` up to the root, root-most first.
///
/// A parent chain that revisits a node never reaches the root; the walk
/// stops there with [`FsError::NameTooLong`].
fn collect_segments(
    dir: &VnodeRef,
    segments: &mut VecDeque<String>,
    total: &mut usize,
) -> FsResult<()> {
    let mut visited = HashSet::from([dir.vno()]);
    let mut current = dir.clone();
    let mut parent = lookup(&current, "..")?;

    while !parent.same_node(&current) {
        let name = find_name(&parent, &current)?;
        let segment = format!("/{name}");
        *total += segment.len();
        segments.push_front(segment);

        if !visited.insert(parent.vno()) {
            warn!(
                target: "vfs_namei::dirpath",
                dir = %dir.vno(),
                repeated = %parent.vno(),
                "parent chain loops; abandoning walk"
            );
            return Err(FsError::NameTooLong);
        }
        current = parent;
        parent = lookup(&current, "..")?;
    }
    Ok(())
}

/// Copy segments into `buf` in order, stopping at the first one that does not
/// fit whole. Returns the length of the NUL-terminated result.
fn assemble(buf: &mut [u8], segments: VecDeque<String>) -> usize {
    let mut offset = 0;
    for segment in segments {
        let (copied, complete) = copy_terminated(&mut buf[offset..], segment.as_bytes());
        offset += copied;
        if !complete {
            break;
        }
    }
    buf[offset] = 0;
    offset
}
