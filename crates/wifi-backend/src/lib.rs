//! WiFi Backends
//!
//! A backend answers the same five questions on every platform:
//!
//! - which wireless interfaces exist
//! - which access points a scan can see
//! - what the interface is associated with
//! - how the link to that access point is performing
//! - and when to release resources
//!
//! Each concrete backend picks, at construction, among the upstream tools
//! available on the host and decodes their output with [`wifi_decode`].
//! Backends return decoder output as-is; normalization and vendor lookup are
//! applied by the caller.
//!
//! This crate also hosts the OUI vendor database ([`VendorLookup`]).
//!
//! # Example
//!
//! ```rust
//! use wifi_backend::{detect_backend, BackendConfig, CommandOutput, ScriptedRunner};
//! use std::sync::Arc;
//!
//! let runner = ScriptedRunner::new()
//!     .install("iw")
//!     .respond("iw", &["dev"], CommandOutput::ok("phy#0\n\tInterface wlan0\n"));
//!
//! let backend = detect_backend(Arc::new(runner), &BackendConfig::default()).unwrap();
//! assert_eq!(backend.name(), "iw");
//! assert_eq!(backend.list_interfaces().unwrap(), vec!["wlan0".to_string()]);
//! ```

pub mod detect;
pub mod error;
pub mod iw;
pub mod mac;
pub mod native;
pub mod oui;
pub mod runner;

pub use detect::{detect_backend, detect_system_backend, BackendConfig};
pub use error::BackendError;
pub use iw::IwBackend;
pub use mac::{MacBackend, MacTools};
pub use native::{BssSource, NativeBackend};
pub use oui::{HttpFetcher, LoadSource, OuiFetcher, VendorConfig, VendorLookup, UNKNOWN_VENDOR};
pub use runner::{CommandOutput, CommandRunner, ScriptedRunner, SystemRunner};

use std::sync::atomic::{AtomicBool, Ordering};

use wifi_model::{AccessPoint, ConnectionInfo, StationStats};

/// Platform WiFi backend
///
/// All methods take `&self` so one backend can be shared with blocking
/// worker threads. Not being associated is not an error: `link_info` and
/// `station_stats` then return a record with `connected == false`.
pub trait Backend: Send + Sync {
    /// Short name of the upstream tool family
    fn name(&self) -> &'static str;

    /// Wireless interfaces on this host
    fn list_interfaces(&self) -> Result<Vec<String>, BackendError>;

    /// Access points visible from `iface`
    fn scan(&self, iface: &str) -> Result<Vec<AccessPoint>, BackendError>;

    /// Current association of `iface`
    fn link_info(&self, iface: &str) -> Result<ConnectionInfo, BackendError>;

    /// Link statistics for the associated access point
    fn station_stats(&self, iface: &str) -> Result<StationStats, BackendError>;

    /// Release resources; idempotent
    fn close(&self);
}

/// Open/closed state shared by the concrete backends
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    closed: AtomicBool,
}

impl Lifecycle {
    pub(crate) fn ensure_open(&self, backend: &str) -> Result<(), BackendError> {
        if self.closed.load(Ordering::Acquire) {
            Err(BackendError::BackendUnavailable(format!("{} backend is closed", backend)))
        } else {
            Ok(())
        }
    }

    /// Returns true on the first call only
    pub(crate) fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }
}
