// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Synthetic failures for node capability calls
//!
//! A [`FaultPolicy`] is a list of rules, each naming a capability, the error
//! to raise and when to start. [`FaultInjector`] counts calls per rule and is
//! consulted by [`RamFs`](crate::RamFs) before every capability.

use std::io;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::FsError;

/// Capability a rule applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultOp {
    Lookup,
    Create,
    Readdir,
}

/// Error raised by a firing rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultErrno {
    Eio,
    Enospc,
}

impl From<FaultErrno> for FsError {
    fn from(errno: FaultErrno) -> Self {
        match errno {
            FaultErrno::Eio => FsError::Io(io::Error::from_raw_os_error(libc::EIO)),
            FaultErrno::Enospc => FsError::NoSpace,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FaultRule {
    pub op: FaultOp,
    pub errno: FaultErrno,
    /// Calls to `op` let through before the rule starts firing
    #[serde(default)]
    pub start_after: u64,
    /// Stop firing after this many failures; unlimited when unset
    #[serde(default)]
    pub max_faults: Option<u64>,
}

/// A set of rules, loadable from JSON. Nothing fires unless `enabled`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FaultPolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub rules: Vec<FaultRule>,
}

impl FaultPolicy {
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Fail every call to `op` after the first `start_after`.
    pub fn fail(op: FaultOp, errno: FaultErrno, start_after: u64) -> Self {
        Self {
            enabled: true,
            rules: vec![FaultRule {
                op,
                errno,
                start_after,
                max_faults: None,
            }],
        }
    }
}

struct ArmedRule {
    rule: FaultRule,
    calls: u64,
    fired: u64,
}

impl ArmedRule {
    /// Count one call and report whether this rule fails it.
    fn fires(&mut self) -> bool {
        self.calls += 1;
        let exhausted = self.rule.max_faults.is_some_and(|max| self.fired >= max);
        if self.calls <= self.rule.start_after || exhausted {
            return false;
        }
        self.fired += 1;
        true
    }
}

/// Thread-safe rule evaluator shared by every node of a file system
#[derive(Default)]
pub struct FaultInjector {
    armed: Mutex<Option<Vec<ArmedRule>>>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: FaultPolicy) -> Self {
        let injector = Self::new();
        injector.set_policy(policy);
        injector
    }

    /// Replace the active policy and reset all counters.
    pub fn set_policy(&self, policy: FaultPolicy) {
        let armed = policy.enabled.then(|| {
            policy
                .rules
                .into_iter()
                .map(|rule| ArmedRule {
                    rule,
                    calls: 0,
                    fired: 0,
                })
                .collect()
        });
        *self.armed.lock().unwrap() = armed;
    }

    pub fn clear(&self) {
        self.set_policy(FaultPolicy::default());
    }

    /// Failures injected since the policy was installed
    pub fn hits(&self) -> u64 {
        self.armed
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|armed| armed.fired)
            .sum()
    }

    /// Error to raise for this call to `op`, if any rule fires. The first
    /// matching rule that fires wins; every matching rule before it still
    /// counts the call.
    pub fn should_fault(&self, op: FaultOp) -> Option<FsError> {
        let mut guard = self.armed.lock().unwrap();
        let armed = guard.as_mut()?;
        let errno = armed
            .iter_mut()
            .filter(|armed| armed.rule.op == op)
            .find_map(|armed| armed.fires().then_some(armed.rule.errno))?;
        debug!(target: "vfs_namei::fault", ?op, ?errno, "injecting fault");
        Some(errno.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fault_policy_json() {
        let json = br#"{
            "enabled": true,
            "rules": [ { "op": "lookup", "errno": "eio", "max_faults": 2 } ]
        }"#;
        let policy = FaultPolicy::from_json_bytes(json).expect("policy");
        assert!(policy.enabled);
        assert_eq!(policy.rules.len(), 1);
        assert_eq!(policy.rules[0].op, FaultOp::Lookup);
        assert_eq!(policy.rules[0].max_faults, Some(2));
    }

    #[test]
    fn injector_respects_start_and_max_hits() {
        let injector = FaultInjector::with_policy(FaultPolicy {
            enabled: true,
            rules: vec![FaultRule {
                op: FaultOp::Readdir,
                errno: FaultErrno::Enospc,
                start_after: 1,
                max_faults: Some(2),
            }],
        });

        assert!(injector.should_fault(FaultOp::Readdir).is_none());
        assert!(injector.should_fault(FaultOp::Lookup).is_none());
        assert!(matches!(
            injector.should_fault(FaultOp::Readdir),
            Some(FsError::NoSpace)
        ));
        assert!(injector.should_fault(FaultOp::Readdir).is_some());
        // exhausted
        assert!(injector.should_fault(FaultOp::Readdir).is_none());
        assert_eq!(injector.hits(), 2);
    }

    #[test]
    fn disabled_policy_never_faults() {
        let injector = FaultInjector::new();
        injector.set_policy(FaultPolicy {
            enabled: false,
            ..FaultPolicy::fail(FaultOp::Create, FaultErrno::Eio, 0)
        });
        assert!(injector.should_fault(FaultOp::Create).is_none());
        injector.clear();
        assert!(injector.should_fault(FaultOp::Create).is_none());
    }
}
