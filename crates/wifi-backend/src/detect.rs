//! Backend detection
//!
//! Probes the host for supported upstream tools in priority order: `iw`
//! first, then the macOS tool set.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::iw::IwBackend;
use crate::mac::{MacBackend, MacTools};
use crate::runner::{CommandRunner, SystemRunner};
use crate::{Backend, BackendError};

/// Backend selection and command configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Deadline for any single upstream command, in milliseconds
    pub command_timeout_ms: u64,
    /// Locations to look for the macOS `airport` binary
    pub airport_paths: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 10_000,
            airport_paths: vec![
                "/System/Library/PrivateFrameworks/Apple80211.framework/Versions/Current/Resources/airport"
                    .to_string(),
                "/System/Library/PrivateFrameworks/Apple80211.framework/Resources/airport".to_string(),
            ],
        }
    }
}

impl BackendConfig {
    /// Per-command timeout as a [`Duration`]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// Pick a backend for the tools `runner` can reach
pub fn detect_backend(
    runner: Arc<dyn CommandRunner>,
    config: &BackendConfig,
) -> Result<Box<dyn Backend>, BackendError> {
    if IwBackend::probe(runner.as_ref()) {
        info!("Using iw backend");
        return Ok(Box::new(IwBackend::new(runner)));
    }

    let tools = MacTools::probe(runner.as_ref(), &config.airport_paths);
    if tools.any() {
        info!("Using macOS backend");
        return Ok(Box::new(MacBackend::new(runner, tools)));
    }

    warn!("No supported WiFi tool found (looked for iw, airport, wdutil, system_profiler, networksetup)");
    Err(BackendError::BackendUnavailable(
        "no supported WiFi tool found on this host".to_string(),
    ))
}

/// Pick a backend using real processes
pub fn detect_system_backend(config: &BackendConfig) -> Result<Box<dyn Backend>, BackendError> {
    detect_backend(Arc::new(SystemRunner::new(config.command_timeout())), config)
}
