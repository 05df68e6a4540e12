// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Core type definitions for the resolver

use serde::{Deserialize, Serialize};

/// Inode number, unique within a file system
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ino(pub u64);

impl std::fmt::Display for Ino {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VnodeKind {
    Directory,
    Regular,
    Other,
}

impl std::fmt::Display for VnodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VnodeKind::Directory => write!(f, "dir"),
            VnodeKind::Regular => write!(f, "file"),
            VnodeKind::Other => write!(f, "other"),
        }
    }
}

/// Directory entry yielded by a directory scan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dirent {
    pub ino: Ino,
    pub name: String,
}

impl Dirent {
    pub fn new(ino: Ino, name: impl Into<String>) -> Self {
        Self {
            ino,
            name: name.into(),
        }
    }
}

/// Open flags understood by `open_namev`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpenFlags {
    /// Create the final component if it does not exist (O_CREAT)
    pub create: bool,
    /// Fail unless the result is a directory (O_DIRECTORY)
    pub directory: bool,
}

impl OpenFlags {
    pub const CREATE: OpenFlags = OpenFlags {
        create: true,
        directory: false,
    };

    pub const DIRECTORY: OpenFlags = OpenFlags {
        create: false,
        directory: true,
    };

    /// Decode the bits of an open(2) flag word. Access-mode and other bits
    /// are ignored at this layer.
    pub fn from_raw(flags: i32) -> Self {
        Self {
            create: flags & libc::O_CREAT != 0,
            directory: flags & libc::O_DIRECTORY != 0,
        }
    }
}
