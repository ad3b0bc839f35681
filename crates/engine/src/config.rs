//! Engine and collaborator configuration.
//!
//! Both structs deserialize from the `[engine]` and `[frappe]` tables of a
//! settings file; every key is optional.

use serde::Deserialize;

/// Default bound on nested dispatch. The standard rule set is a shallow
/// DAG (employee → currency → exchange rate, distance → amount → totals).
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 8;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "HRFORMS_FRAPPE_API_KEY";
/// Environment variable consulted when no API secret is configured.
pub const API_SECRET_ENV: &str = "HRFORMS_FRAPPE_API_SECRET";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_cascade_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
        }
    }
}

/// Connection settings for the host framework's RPC endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrappeConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl FrappeConfig {
    /// Key and secret from config, falling back to the environment.
    pub fn credentials(&self) -> Option<(String, String)> {
        let key = self
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())?;
        let secret = self
            .api_secret
            .clone()
            .or_else(|| std::env::var(API_SECRET_ENV).ok())?;
        Some((key, secret))
    }
}
