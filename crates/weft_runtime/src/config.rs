//! Settings management

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub demo: DemoSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoSettings {
    pub view_tag: i32,
    pub steps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            demo: DemoSettings { view_tag: 1, steps: 3 },
        }
    }
}

impl Settings {
    /// Read `weft.json` from the working directory when present, else
    /// fall back to defaults.
    pub fn load() -> Self {
        let path = Path::new("weft.json");
        if !path.exists() {
            return Self::default();
        }
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(%err, "could not read weft.json, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(%err, "invalid weft.json, using defaults");
                Self::default()
            }
        }
    }
}
