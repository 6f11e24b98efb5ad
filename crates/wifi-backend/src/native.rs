//! Backend over a native scan API
//!
//! The OS binding itself lives behind [`BssSource`]; this backend only
//! decodes the packed BSS entries it hands back.

use tracing::{debug, info};
use wifi_decode::{Decoder, NativeDecoder};
use wifi_model::{AccessPoint, ConnectionInfo, StationStats};

use crate::{Backend, BackendError, Lifecycle};

/// Supplier of raw native scan data
pub trait BssSource: Send + Sync {
    /// Wireless interfaces known to the native API
    fn interfaces(&self) -> Result<Vec<String>, BackendError>;

    /// Concatenated packed BSS entries from the latest scan of `iface`
    fn scan_entries(&self, iface: &str) -> Result<Vec<u8>, BackendError>;

    /// Current association of `iface`
    fn connection(&self, iface: &str) -> Result<ConnectionInfo, BackendError>;

    /// Link statistics for `iface`; sources without them report disconnected
    fn station(&self, iface: &str) -> Result<StationStats, BackendError> {
        let _ = iface;
        Ok(StationStats::disconnected())
    }
}

/// Backend decoding packed BSS entries from a [`BssSource`]
pub struct NativeBackend<S: BssSource> {
    source: S,
    decoder: NativeDecoder,
    lifecycle: Lifecycle,
}

impl<S: BssSource> NativeBackend<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            decoder: NativeDecoder::new(),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl<S: BssSource> Backend for NativeBackend<S> {
    fn name(&self) -> &'static str {
        "native"
    }

    fn list_interfaces(&self) -> Result<Vec<String>, BackendError> {
        self.lifecycle.ensure_open(self.name())?;
        let interfaces = self.source.interfaces()?;
        if interfaces.is_empty() {
            return Err(BackendError::NoInterfacesFound);
        }
        Ok(interfaces)
    }

    fn scan(&self, iface: &str) -> Result<Vec<AccessPoint>, BackendError> {
        self.lifecycle.ensure_open(self.name())?;
        let raw = self.source.scan_entries(iface)?;
        let aps = self.decoder.parse_scan(&raw)?;
        debug!("Native scan on {} decoded {} entries", iface, aps.len());
        Ok(aps)
    }

    fn link_info(&self, iface: &str) -> Result<ConnectionInfo, BackendError> {
        self.lifecycle.ensure_open(self.name())?;
        self.source.connection(iface)
    }

    fn station_stats(&self, iface: &str) -> Result<StationStats, BackendError> {
        self.lifecycle.ensure_open(self.name())?;
        self.source.station(iface)
    }

    fn close(&self) {
        if self.lifecycle.close() {
            info!("Native backend closed");
        }
    }
}
