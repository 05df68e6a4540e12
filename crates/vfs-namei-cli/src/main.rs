// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `namei`: run path-name resolution against an in-memory directory tree
//!
//! The tree comes from a JSON description (`--tree`) or a small built-in
//! demo. Each subcommand maps onto one resolver operation and prints its
//! result on stdout.

mod config;
mod tree;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use vfs_logging::CliLoggingArgs;
use vfs_namei::fault::{FaultInjector, FaultPolicy};
use vfs_namei::{dir_namev, lookup_name, DirName, FsContext, FsError, OpenFlags, RamFs};

use crate::config::{load_config, CliConfig};

const COMPONENT: &str = "vfs-namei";

#[derive(Parser, Debug)]
#[command(
    name = "namei",
    author,
    version,
    about = "Resolve paths against an in-memory directory tree"
)]
struct Cli {
    /// Directory tree description (JSON); a demo tree is used without it
    #[arg(long)]
    tree: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Working directory for relative paths
    #[arg(long)]
    cwd: Option<String>,

    /// Fault-injection policy (JSON) applied to the tree's nodes
    #[arg(long)]
    fault_policy: Option<PathBuf>,

    #[command(flatten)]
    logging: CliLoggingArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a path and print `ino kind path`
    Resolve {
        path: String,
        /// Create the final component if it is missing
        #[arg(long)]
        create: bool,
        /// Require the result to be a directory
        #[arg(long)]
        directory: bool,
    },
    /// Print the inode of a path's parent directory and its final component
    Parent { path: String },
    /// Print the name under which ENTRY appears in directory DIR
    Name {
        dir: String,
        entry: String,
        /// Output buffer size in bytes, terminator included
        #[arg(long)]
        size: Option<usize>,
    },
    /// Print the absolute path of the working directory
    Getcwd {
        /// Output buffer size in bytes, terminator included
        #[arg(long)]
        size: Option<usize>,
    },
    /// Print the loaded tree
    Tree,
}

/// A loaded tree plus the context resolutions run in
struct Session {
    ctx: FsContext,
    fs: RamFs,
}

impl Session {
    fn open(cli: &Cli, config: CliConfig) -> Result<Self> {
        let fs = match &cli.fault_policy {
            Some(path) => {
                let bytes = fs::read(path)
                    .with_context(|| format!("reading fault policy {}", path.display()))?;
                let policy = FaultPolicy::from_json_bytes(&bytes)
                    .with_context(|| format!("parsing fault policy {}", path.display()))?;
                info!(rules = policy.rules.len(), enabled = policy.enabled, "fault policy loaded");
                RamFs::with_faults(Arc::new(FaultInjector::with_policy(policy)))
            }
            None => RamFs::new(),
        };

        let description = match &cli.tree {
            Some(path) => tree::read_tree(path)?,
            None => tree::demo_tree(),
        };
        tree::populate(&fs, &description)?;

        let mut ctx = FsContext::new(fs.root(), config.resolver);
        if let Some(cwd) = &cli.cwd {
            ctx.chdir(cwd).map_err(|err| fs_error(format!("chdir {cwd}"), err))?;
        }
        debug!(tree = ?cli.tree, cwd = ?cli.cwd, "session ready");
        Ok(Self { ctx, fs })
    }
}

/// Attach the operation and errno to a resolver error.
fn fs_error(what: String, err: FsError) -> anyhow::Error {
    let errno = err.errno();
    anyhow::Error::new(err).context(format!("{what} (errno {errno})"))
}

/// Turn a buffer-filling result into the string it produced. On failure the
/// NUL-terminated partial output is reported alongside the error.
fn buffer_result(what: String, buf: &[u8], result: Result<usize, FsError>) -> Result<String> {
    match result {
        Ok(len) => Ok(String::from_utf8_lossy(&buf[..len]).into_owned()),
        Err(err) => {
            let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
            let partial = String::from_utf8_lossy(&buf[..end]);
            Err(fs_error(format!("{what}, partial result '{partial}'"), err))
        }
    }
}

fn run(session: &Session, command: &Command, out: &mut dyn Write) -> Result<()> {
    let ctx = &session.ctx;
    match command {
        Command::Resolve {
            path,
            create,
            directory,
        } => {
            let flags = OpenFlags {
                create: *create,
                directory: *directory,
            };
            let node = ctx
                .open(path, flags)
                .map_err(|err| fs_error(format!("resolve {path}"), err))?;
            writeln!(out, "{} {} {}", node.vno(), node.kind(), path)?;
        }
        Command::Parent { path } => {
            let DirName { dir, name } =
                dir_namev(ctx, path, None).map_err(|err| fs_error(format!("parent {path}"), err))?;
            writeln!(out, "{} {}", dir.vno(), name)?;
        }
        Command::Name { dir, entry, size } => {
            let dir_node = ctx
                .open(dir, OpenFlags::DIRECTORY)
                .map_err(|err| fs_error(format!("resolve {dir}"), err))?;
            let entry_node = ctx
                .open(entry, OpenFlags::default())
                .map_err(|err| fs_error(format!("resolve {entry}"), err))?;
            let mut buf = vec![0u8; size.unwrap_or(ctx.config().name_max + 1)];
            let result = lookup_name(&dir_node, &entry_node, &mut buf);
            let name = buffer_result(format!("name of {entry} in {dir}"), &buf, result)?;
            writeln!(out, "{name}")?;
        }
        Command::Getcwd { size } => {
            let mut buf = vec![0u8; size.unwrap_or(ctx.config().path_max)];
            let result = ctx.getcwd(&mut buf);
            let cwd = buffer_result("getcwd".to_string(), &buf, result)?;
            writeln!(out, "{cwd}")?;
        }
        Command::Tree => {
            out.write_all(tree::render(&session.fs).as_bytes())?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    cli.logging.clone().init(COMPONENT, &config.logging)?;

    let session = Session::open(&cli, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&session, &cli.command, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("namei").chain(args.iter().copied()))?;
        let config = load_config(cli.config.as_deref())?;
        let session = Session::open(&cli, config)?;
        let mut out = Vec::new();
        run(&session, &cli.command, &mut out)?;
        Ok(String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn resolve_prints_kind_and_path() {
        let out = exec(&["resolve", "/bin/ls"]).expect("resolve");
        let fields: Vec<&str> = out.split_whitespace().collect();
        assert_eq!(fields.len(), 3);
        assert!(fields[0].parse::<u64>().is_ok());
        assert_eq!(&fields[1..], ["file", "/bin/ls"]);

        let out = exec(&["resolve", "--create", "/tmp/new"]).expect("create");
        assert!(out.ends_with(" file /tmp/new\n"));

        let err = exec(&["resolve", "--directory", "/bin/ls"]).unwrap_err();
        assert!(matches!(err.downcast_ref::<FsError>(), Some(FsError::NotADirectory)));
    }

    #[test]
    fn relative_paths_use_the_working_directory() {
        let out = exec(&["--cwd", "/home", "resolve", "user"]).expect("resolve");
        assert!(out.ends_with(" dir user\n"));

        let out = exec(&["--cwd", "/home/user", "getcwd"]).expect("getcwd");
        assert_eq!(out, "/home/user\n");
    }

    #[test]
    fn parent_and_name_report_components() {
        let user = exec(&["resolve", "/home/user"]).expect("user");
        let user_ino = user.split_whitespace().next().expect("ino");

        let out = exec(&["parent", "/home/user/notes"]).expect("parent");
        assert_eq!(out, format!("{user_ino} notes\n"));

        let out = exec(&["name", "/home", "/home/user"]).expect("name");
        assert_eq!(out, "user\n");
    }

    #[test]
    fn small_buffers_report_partial_output() {
        let err = exec(&["--cwd", "/home/user", "getcwd", "--size", "4"]).unwrap_err();
        assert!(matches!(err.downcast_ref::<FsError>(), Some(FsError::RangeExceeded)));
        assert!(err.to_string().contains("partial result '/ho'"));

        let err = exec(&["name", "/home", "/home/user", "--size", "3"]).unwrap_err();
        assert!(err.to_string().contains("partial result 'us'"));
    }

    #[test]
    fn tree_file_and_config_are_honoured() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tree = dir.path().join("tree.json");
        fs::write(&tree, r#"{ "etc": { "hosts": null }, "abcdefgh": {} }"#).expect("write tree");
        let config = dir.path().join("config.json");
        fs::write(&config, r#"{ "resolver": { "name-max": 5 } }"#).expect("write config");
        let tree = tree.to_str().expect("utf8 path");
        let config = config.to_str().expect("utf8 path");

        let out = exec(&["--tree", tree, "tree"]).expect("tree");
        assert!(out.contains("etc/"));
        assert!(out.contains("hosts"));

        let out =
            exec(&["--tree", tree, "--config", config, "resolve", "/etc/hosts"]).expect("hosts");
        assert!(out.ends_with(" file /etc/hosts\n"));

        let err = exec(&["--tree", tree, "--config", config, "resolve", "/abcdefgh"]).unwrap_err();
        assert!(matches!(err.downcast_ref::<FsError>(), Some(FsError::NameTooLong)));
    }

    #[test]
    fn fault_policy_fails_lookups() {
        let dir = tempfile::tempdir().expect("tempdir");
        let policy = dir.path().join("faults.json");
        fs::write(
            &policy,
            r#"{ "enabled": true, "rules": [ { "op": "lookup", "errno": "enospc" } ] }"#,
        )
        .expect("write policy");

        let err = exec(&["--fault-policy", policy.to_str().expect("utf8"), "resolve", "/bin"])
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<FsError>(), Some(FsError::NoSpace)));
        assert!(err.to_string().contains(&format!("errno {}", FsError::NoSpace.errno())));
    }
}
