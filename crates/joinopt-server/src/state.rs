//! # Application State
//!
//! The state is created once at startup and shared via `Arc` by every request
//! handler. The optimizer itself keeps no state between queries, so the only shared
//! piece is configuration: each request builds its own catalog from the statistics
//! it carries.

use joinopt_core::search::SearchConfig;
use tracing::warn;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Server-level configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub addr: String,
    /// Limits applied to every optimization request.
    pub search: SearchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            search: SearchConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from `lookup`, falling back to defaults for unset or
    /// unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(addr) = lookup("JOINOPT_ADDR") {
            config.addr = addr;
        }
        if let Some(n) = parse_limit(&lookup, "JOINOPT_MAX_RELATIONS") {
            config.search.max_relations = n;
        }
        if let Some(n) = parse_limit(&lookup, "JOINOPT_MAX_SUBSETS") {
            config.search.max_subsets = n;
        }
        config
    }
}

fn parse_limit(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!("Ignoring {}={:?}: expected a positive integer", key, raw);
            None
        }
    }
}

/// Shared application state, accessible by all request handlers via Axum's State extractor.
pub struct AppState {
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.addr, "0.0.0.0:3000");
        assert_eq!(config.search.max_relations, SearchConfig::default().max_relations);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("JOINOPT_ADDR", "127.0.0.1:8080"),
            ("JOINOPT_MAX_RELATIONS", "8"),
            ("JOINOPT_MAX_SUBSETS", "not-a-number"),
        ]));
        assert_eq!(config.addr, "127.0.0.1:8080");
        assert_eq!(config.search.max_relations, 8);
        assert_eq!(config.search.max_subsets, SearchConfig::default().max_subsets);
    }

    #[test]
    fn test_zero_limit_is_ignored() {
        let config = ServerConfig::from_lookup(lookup(&[("JOINOPT_MAX_SUBSETS", "0")]));
        assert_eq!(config.search.max_subsets, SearchConfig::default().max_subsets);
    }
}
