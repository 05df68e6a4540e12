// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for path-name resolution

use std::io;

/// Resolver error type
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("not a directory")]
    NotADirectory,
    #[error("not found")]
    NotFound,
    #[error("create failed: {source}")]
    CreateFailed {
        #[source]
        source: Box<FsError>,
    },
    #[error("result does not fit in buffer")]
    RangeExceeded,
    #[error("name too long")]
    NameTooLong,
    #[error("already exists")]
    AlreadyExists,
    #[error("no space left")]
    NoSpace,
    #[error("unsupported")]
    Unsupported,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl FsError {
    /// The errno a syscall layer would report for this error.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::InvalidArgument => libc::EINVAL,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::NotFound => libc::ENOENT,
            FsError::CreateFailed { .. } => libc::EIO,
            FsError::RangeExceeded => libc::ERANGE,
            FsError::NameTooLong => libc::ENAMETOOLONG,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::NoSpace => libc::ENOSPC,
            FsError::Unsupported => libc::ENOSYS,
            FsError::Io(err) => err.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;
