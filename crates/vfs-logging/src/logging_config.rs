// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging section of a configuration file

use serde::{Deserialize, Serialize};

use crate::{CliLogLevel, LogFormat};

/// Logging settings read from a configuration file. Command-line flags take
/// precedence over every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<CliLogLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_case_keys() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{ "log-level": "debug", "log-format": "json" }"#)
                .expect("parse");
        assert_eq!(config.log_level, Some(CliLogLevel::Debug));
        assert_eq!(config.log_format, Some(LogFormat::Json));

        let empty: LoggingConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(empty, LoggingConfig::default());
    }
}
