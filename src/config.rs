//! Process configuration read from the environment.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `RECIPES_BIND` | `0.0.0.0:3000` | listen address |
//! | `RECIPES_LOG_JSON` | `false` | JSON log lines instead of text |
//! | `RECIPES_SEED` | `true` | start with the two sample recipes |
//! | `RECIPES_MAX_BODY_BYTES` | `1048576` | request bodies above this get `413` |
//! | `RECIPES_DRAIN_SECS` | `10` | grace period for open connections on shutdown |
//! | `RUST_LOG` | `info` | `tracing` filter directives |

use std::env;
use std::time::Duration;

use crate::server::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_MAX_BODY_BYTES};

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub bind: String,
    pub log_json: bool,
    pub seed: bool,
    pub max_body_bytes: usize,
    pub drain_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_owned(),
            log_json: false,
            seed: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes `std::env`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind: lookup("RECIPES_BIND").unwrap_or(defaults.bind),
            log_json: parse_bool(lookup("RECIPES_LOG_JSON")).unwrap_or(defaults.log_json),
            seed: parse_bool(lookup("RECIPES_SEED")).unwrap_or(defaults.seed),
            max_body_bytes: lookup("RECIPES_MAX_BODY_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            drain_timeout: lookup("RECIPES_DRAIN_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.drain_timeout),
        }
    }
}

fn parse_bool(raw: Option<String>) -> Option<bool> {
    match raw?.as_str() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(from(&[]), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = from(&[("RECIPES_BIND", "127.0.0.1:8080"), ("RECIPES_LOG_JSON", "yes"), ("RECIPES_SEED", "0")]);
        assert_eq!(cfg.bind, "127.0.0.1:8080");
        assert!(cfg.log_json);
        assert!(!cfg.seed);
    }

    #[test]
    fn unparseable_bool_falls_back() {
        assert!(from(&[("RECIPES_SEED", "maybe")]).seed);
    }

    #[test]
    fn reads_server_limits() {
        let cfg = from(&[("RECIPES_MAX_BODY_BYTES", "4096"), ("RECIPES_DRAIN_SECS", "3")]);
        assert_eq!(cfg.max_body_bytes, 4096);
        assert_eq!(cfg.drain_timeout, Duration::from_secs(3));

        let bad = from(&[("RECIPES_MAX_BODY_BYTES", "lots"), ("RECIPES_DRAIN_SECS", "-1")]);
        assert_eq!(bad.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(bad.drain_timeout, DEFAULT_DRAIN_TIMEOUT);
    }
}
