// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Longest component name accepted by default (POSIX NAME_MAX)
pub const DEFAULT_NAME_MAX: usize = 255;
/// Longest path accepted by default (POSIX PATH_MAX)
pub const DEFAULT_PATH_MAX: usize = 4096;

/// Limits applied while resolving paths
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Longest accepted path component, in bytes
    #[serde(default = "default_name_max")]
    pub name_max: usize,
    /// Longest accepted path, in bytes
    #[serde(default = "default_path_max")]
    pub path_max: usize,
}

fn default_name_max() -> usize {
    DEFAULT_NAME_MAX
}

fn default_path_max() -> usize {
    DEFAULT_PATH_MAX
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            name_max: DEFAULT_NAME_MAX,
            path_max: DEFAULT_PATH_MAX,
        }
    }
}

impl ResolverConfig {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ResolverConfig::from_json_str(r#"{ "name-max": 14 }"#).expect("config");
        assert_eq!(config.name_max, 14);
        assert_eq!(config.path_max, DEFAULT_PATH_MAX);

        let config = ResolverConfig::from_json_str("{}").expect("config");
        assert_eq!(config, ResolverConfig::default());
    }
}
