//! Application settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wifi_backend::{BackendConfig, VendorConfig};
use wifi_engine::ServiceConfig;

/// Default log filter covering every crate in the workspace
pub const DEFAULT_LOG_FILTER: &str =
    "wifiscope=info,wifi_model=info,wifi_decode=info,wifi_backend=info,wifi_engine=info";

/// Settings loaded from `settings.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Interface to poll; the first reported interface when unset
    pub interface: Option<String>,
    /// tracing filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    pub backend: BackendConfig,
    pub vendors: VendorConfig,
    pub service: ServiceConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let mut vendors = VendorConfig::default();
        if let Some(cache) = dirs::cache_dir() {
            vendors.cache_path = cache.join("wifiscope").join("oui.txt");
        }
        Self {
            interface: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            backend: BackendConfig::default(),
            vendors,
            service: ServiceConfig::default(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for wifiscope
    /// Uses $XDG_CONFIG_HOME/wifiscope when absolute, falls back to ~/.config/wifiscope
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("wifiscope"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("wifiscope"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, falling back to defaults on any error
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a specific file, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }
}
