//! WiFi Output Decoders
//!
//! Every upstream WiFi tool speaks its own dialect. This crate turns each of
//! them into the shared [`wifi_model`] records:
//!
//! - **iw**: line-oriented `iw dev` / `scan` / `link` / `station dump` text
//! - **airport**: `airport -I` key/value text and `airport -s -x` property lists
//! - **wdutil**: `wdutil info` key/value text
//! - **networksetup**: `networksetup -getairportnetwork` one-liners
//! - **system_profiler**: the `SPAirPortDataType` JSON tree
//! - **native**: fixed-format BSS entry buffers carrying raw 802.11 information elements
//!
//! Decoders only extract what the upstream output states explicitly. Derived
//! metrics are left for [`wifi_model::normalize`]. Malformed lines, fields and
//! records are skipped; a [`DecodeError`] is returned only when the payload as a
//! whole is unreadable.
//!
//! # Example
//!
//! ```rust
//! use wifi_decode::{create_decoder, DecoderKind};
//!
//! let decoder = create_decoder(DecoderKind::Iw);
//! let output = b"BSS 00:11:22:33:44:55(on wlan0)\n\tfreq: 2437\n\tsignal: -48.00 dBm\n\tSSID: Home\n";
//!
//! let aps = decoder.parse_scan(output).unwrap();
//! assert_eq!(aps.len(), 1);
//! assert_eq!(aps[0].ssid, "Home");
//! assert_eq!(aps[0].signal, -48);
//! ```

pub mod airport;
pub mod bss_entry;
pub mod error;
pub mod ie;
pub mod iw;
pub mod networksetup;
pub mod plist;
pub mod profiler;
pub mod text;
pub mod wdutil;

pub use airport::AirportDecoder;
pub use bss_entry::{parse_bss_entries, parse_bss_entry, BssEntry, NativeDecoder};
pub use error::DecodeError;
pub use ie::{apply_elements, parse_elements, InformationElement};
pub use iw::IwDecoder;
pub use networksetup::NetworkSetupDecoder;
pub use profiler::SystemProfilerDecoder;
pub use wdutil::WdutilDecoder;

use wifi_model::{AccessPoint, ConnectionInfo, StationStats};

/// Identifies an upstream output format family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    /// Linux `iw` text output
    Iw,
    /// macOS `airport` text and property-list output
    Airport,
    /// macOS `wdutil info` text output
    Wdutil,
    /// macOS `networksetup -getairportnetwork` output
    NetworkSetup,
    /// macOS `system_profiler -json SPAirPortDataType` output
    SystemProfiler,
    /// Binary BSS entries with raw information elements
    Native,
}

impl DecoderKind {
    /// Returns a human-readable name for the format family
    pub fn name(&self) -> &'static str {
        match self {
            DecoderKind::Iw => "iw",
            DecoderKind::Airport => "airport",
            DecoderKind::Wdutil => "wdutil",
            DecoderKind::NetworkSetup => "networksetup",
            DecoderKind::SystemProfiler => "system_profiler",
            DecoderKind::Native => "native",
        }
    }
}

/// Object-safe decoder for one upstream format family
///
/// Formats that carry no data for a query keep the default implementation,
/// which reports [`DecodeError::Unsupported`].
pub trait Decoder: Send + Sync {
    /// Which format family this decoder reads
    fn kind(&self) -> DecoderKind;

    /// Decode scan output into partially-populated access points
    fn parse_scan(&self, raw: &[u8]) -> Result<Vec<AccessPoint>, DecodeError> {
        let _ = raw;
        Err(self.unsupported("scan"))
    }

    /// Decode link output into a partial connection record
    fn parse_link(&self, raw: &[u8]) -> Result<ConnectionInfo, DecodeError> {
        let _ = raw;
        Err(self.unsupported("link"))
    }

    /// Decode station output into partial station statistics
    fn parse_station(&self, raw: &[u8]) -> Result<StationStats, DecodeError> {
        let _ = raw;
        Err(self.unsupported("station"))
    }

    /// Error for a query this decoder has no parser for
    fn unsupported(&self, operation: &'static str) -> DecodeError {
        DecodeError::Unsupported {
            decoder: self.kind().name(),
            operation,
        }
    }
}

/// Create a decoder for the given format family
pub fn create_decoder(kind: DecoderKind) -> Box<dyn Decoder> {
    match kind {
        DecoderKind::Iw => Box::new(IwDecoder::new()),
        DecoderKind::Airport => Box::new(AirportDecoder::new()),
        DecoderKind::Wdutil => Box::new(WdutilDecoder::new()),
        DecoderKind::NetworkSetup => Box::new(NetworkSetupDecoder::new()),
        DecoderKind::SystemProfiler => Box::new(SystemProfilerDecoder::new()),
        DecoderKind::Native => Box::new(NativeDecoder::new()),
    }
}

/// Raw output as text, replacing invalid UTF-8
pub(crate) fn as_text(raw: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_kinds() {
        for kind in [
            DecoderKind::Iw,
            DecoderKind::Airport,
            DecoderKind::Wdutil,
            DecoderKind::NetworkSetup,
            DecoderKind::SystemProfiler,
            DecoderKind::Native,
        ] {
            assert_eq!(create_decoder(kind).kind(), kind);
        }
    }

    #[test]
    fn test_unsupported_query() {
        let decoder = create_decoder(DecoderKind::NetworkSetup);
        let err = decoder.parse_scan(b"").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Unsupported {
                decoder: "networksetup",
                operation: "scan"
            }
        ));
    }
}
