//! `--config` settings file.
//!
//! ```toml
//! [engine]
//! max_cascade_depth = 8
//!
//! [frappe]
//! base_url = "https://hr.example.org"
//! api_key = "..."      # or HRFORMS_FRAPPE_API_KEY
//! api_secret = "..."   # or HRFORMS_FRAPPE_API_SECRET
//! ```

use std::path::Path;

use hrforms_engine::{EngineConfig, FrappeConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub engine: EngineConfig,
    pub frappe: FrappeConfig,
}

impl Settings {
    /// Defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Settings, String> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
        Self::parse(&text).map_err(|e| format!("error parsing config '{}': {}", path.display(), e))
    }

    fn parse(text: &str) -> Result<Settings, toml::de::Error> {
        toml::from_str(text)
    }
}
