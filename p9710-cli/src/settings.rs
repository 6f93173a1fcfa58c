//! Persisted CLI settings

use std::path::PathBuf;

use p9710_driver::SessionConfig;
use serde::{Deserialize, Serialize};

/// Settings stored in `settings.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Session used when no flags override it
    #[serde(default)]
    pub session: SessionConfig,
    /// Talk to a simulated head by default
    #[serde(default)]
    pub simulate: bool,
}

/// Values given on the command line; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub read_timeout_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub simulate: bool,
}

impl Settings {
    /// Directory holding `settings.json`
    ///
    /// `$XDG_CONFIG_HOME/p9710` when that variable is an absolute path,
    /// `~/.config/p9710` otherwise, on every platform.
    fn config_dir() -> Option<PathBuf> {
        // Relative XDG paths are invalid and ignored
        let xdg = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute());

        // XDG default when unset
        xdg.or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|base| base.join("p9710"))
    }

    /// Path of the settings file, if a config directory can be found
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load stored settings; a missing file gives defaults
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                // Defaults stay in effect until the next save rewrites the file
                tracing::warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write the settings as pretty JSON and return where they went
    pub fn save(&self) -> Result<PathBuf, String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;

        // First save creates the directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        std::fs::write(&path, json)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

        Ok(path)
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(port) = &overrides.port {
            self.session.port = port.trim().to_string();
        }
        if let Some(baud_rate) = overrides.baud_rate {
            self.session.baud_rate = baud_rate;
        }
        if let Some(timeout) = overrides.read_timeout_ms {
            self.session.read_timeout_ms = timeout;
        }
        if let Some(settle) = overrides.settle_delay_ms {
            self.session.settle_delay_ms = settle;
        }
        self.simulate |= overrides.simulate;
        self
    }
}
