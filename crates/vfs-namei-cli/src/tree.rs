// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON directory tree descriptions
//!
//! A JSON object is a directory whose keys are its entries; `null` is an
//! empty regular file. The document itself must be an object: the root.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use vfs_namei::{RamFs, RamNode, Vnode, VnodeKind};

/// Tree used when no `--tree` file is given
pub fn demo_tree() -> Value {
    json!({
        "bin": { "ls": null },
        "tmp": {},
        "home": { "user": {} },
    })
}

pub fn read_tree(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading tree {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing tree {}", path.display()))
}

/// Create every entry described by `tree` under the root of `fs`.
pub fn populate(fs: &RamFs, tree: &Value) -> Result<()> {
    populate_dir(fs.root_node(), tree, "")
}

fn populate_dir(dir: &RamNode, tree: &Value, prefix: &str) -> Result<()> {
    let Value::Object(entries) = tree else {
        bail!("{}: expected a JSON object for a directory", display_path(prefix));
    };
    for (name, entry) in entries {
        let path = format!("{prefix}/{name}");
        match entry {
            Value::Object(_) => {
                let child = dir.mkdir(name).with_context(|| format!("creating {path}"))?;
                populate_dir(&child, entry, &path)?;
            }
            Value::Null => {
                dir.mkfile(name).with_context(|| format!("creating {path}"))?;
            }
            other => bail!("{path}: expected an object or null, found {other}"),
        }
    }
    Ok(())
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// One line per node, depth-first in listing order: inode number, then the
/// name indented by depth, with a trailing `/` on directories.
pub fn render(fs: &RamFs) -> String {
    let mut out = String::new();
    let root = fs.root_node();
    let _ = writeln!(out, "{:>6}  /", root.vno().0);
    render_dir(root, 1, &mut out);
    out
}

fn render_dir(dir: &RamNode, depth: usize, out: &mut String) {
    for (name, node) in dir.children() {
        let slash = if node.kind() == VnodeKind::Directory { "/" } else { "" };
        let indent = depth * 2;
        let _ = writeln!(out, "{:>6}  {:indent$}{name}{slash}", node.vno().0, "");
        render_dir(&node, depth + 1, out);
    }
}
