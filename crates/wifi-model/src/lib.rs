//! WiFi Telemetry Data Model
//!
//! This crate holds the normalized data model shared by every part of the
//! telemetry engine, together with the pure functions that derive metrics
//! from it:
//!
//! - **Access points**: one observed BSSID per scan, partially populated by a
//!   decoder and completed by [`normalize`]
//! - **Networks and channels**: the aggregated view of a single scan
//! - **Client records**: decoded link/station records and the rolling
//!   [`ClientStats`] kept by the tracker
//! - **Channel math**: 2.4/5/6 GHz channel numbering and the DFS table
//!
//! # Example
//!
//! ```rust
//! use wifi_model::{normalize, AccessPoint, Band};
//!
//! let mut ap = AccessPoint::new("AA:BB:CC:00:11:22");
//! ap.frequency = 5180;
//! ap.signal = -55;
//!
//! let ap = normalize(ap);
//! assert_eq!(ap.channel, 36);
//! assert_eq!(ap.band, Band::Ghz5);
//! assert_eq!(ap.channel_width, 20);
//! ```

pub mod access_point;
pub mod channel;
pub mod client;
pub mod normalize;
pub mod scan;

pub use access_point::{canonical_mac, AccessPoint};
pub use channel::{
    channel_to_frequency, frequency_to_channel, guess_band, infer_frequency, is_dfs_channel,
    valid_channels, DFS_CHANNELS,
};
pub use client::{ClientStats, ConnectionInfo, RoamingEvent, SignalDataPoint, StationStats};
pub use normalize::{
    normalize, normalize_connection, normalize_station, parse_bitrate_info, signal_to_quality,
    LinkPhy,
};
pub use scan::{ChannelInfo, CongestionLevel, Network, ScanResult};

/// Radio band an access point operates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Band {
    /// 2.4 GHz ISM band (channels 1-14)
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "2.4GHz"))]
    Ghz2_4,
    /// 5 GHz UNII bands
    #[cfg_attr(feature = "serde", serde(rename = "5GHz"))]
    Ghz5,
    /// 6 GHz band (WiFi 6E / 7)
    #[cfg_attr(feature = "serde", serde(rename = "6GHz"))]
    Ghz6,
}

impl Band {
    /// Returns the display name of the band
    pub fn name(&self) -> &'static str {
        match self {
            Band::Ghz2_4 => "2.4GHz",
            Band::Ghz5 => "5GHz",
            Band::Ghz6 => "6GHz",
        }
    }

    /// Classify a center frequency in MHz
    ///
    /// Anything at or below 5000 MHz (including an unknown `0`) is 2.4 GHz.
    pub fn from_frequency(frequency: u32) -> Self {
        if frequency > 5900 {
            Band::Ghz6
        } else if frequency > 5000 {
            Band::Ghz5
        } else {
            Band::Ghz2_4
        }
    }
}

/// Security type advertised by an access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Security {
    /// No encryption
    Open,
    /// Legacy WEP (privacy bit set, no RSN/WPA element)
    #[cfg_attr(feature = "serde", serde(rename = "WEP"))]
    Wep,
    /// WPA (TKIP era, vendor-specific element)
    #[cfg_attr(feature = "serde", serde(rename = "WPA"))]
    Wpa,
    /// WPA2 (RSN with PSK or 802.1X)
    #[cfg_attr(feature = "serde", serde(rename = "WPA2"))]
    Wpa2,
    /// WPA3 personal (SAE) or OWE
    #[cfg_attr(feature = "serde", serde(rename = "WPA3"))]
    Wpa3,
    /// WPA3 enterprise (Suite-B AKMs)
    #[cfg_attr(feature = "serde", serde(rename = "WPA3-Enterprise"))]
    Wpa3Enterprise,
}

impl Security {
    /// Returns the display name of the security type
    pub fn name(&self) -> &'static str {
        match self {
            Security::Open => "Open",
            Security::Wep => "WEP",
            Security::Wpa => "WPA",
            Security::Wpa2 => "WPA2",
            Security::Wpa3 => "WPA3",
            Security::Wpa3Enterprise => "WPA3-Enterprise",
        }
    }

    /// Parse a display name back into a security type (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "OPEN" | "NONE" => Some(Security::Open),
            "WEP" => Some(Security::Wep),
            "WPA" => Some(Security::Wpa),
            "WPA2" => Some(Security::Wpa2),
            "WPA3" | "OWE" => Some(Security::Wpa3),
            "WPA3-ENTERPRISE" => Some(Security::Wpa3Enterprise),
            _ => None,
        }
    }
}

impl std::fmt::Display for Security {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Protected Management Frames (802.11w) mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pmf {
    /// PMF not supported
    Disabled,
    /// PMF capable (MFPC)
    Optional,
    /// PMF required (MFPR)
    Required,
}

impl Pmf {
    /// Returns the display name of the PMF mode
    pub fn name(&self) -> &'static str {
        match self {
            Pmf::Disabled => "Disabled",
            Pmf::Optional => "Optional",
            Pmf::Required => "Required",
        }
    }
}

/// A PHY capability advertised by an access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Capability {
    /// 802.11n High Throughput
    #[cfg_attr(feature = "serde", serde(rename = "HT"))]
    Ht,
    /// 802.11ac Very High Throughput
    #[cfg_attr(feature = "serde", serde(rename = "VHT"))]
    Vht,
    /// 802.11ax High Efficiency
    #[cfg_attr(feature = "serde", serde(rename = "HE"))]
    He,
    /// 802.11be Extremely High Throughput
    #[cfg_attr(feature = "serde", serde(rename = "EHT"))]
    Eht,
    /// WiFi 6 marketing label
    WiFi6,
    /// WiFi 7 marketing label
    WiFi7,
    /// Target Wake Time
    #[cfg_attr(feature = "serde", serde(rename = "TWT"))]
    Twt,
    /// Buffer Status Report
    #[cfg_attr(feature = "serde", serde(rename = "BSR"))]
    Bsr,
}

impl Capability {
    /// Returns the display name of the capability
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Ht => "HT",
            Capability::Vht => "VHT",
            Capability::He => "HE",
            Capability::Eht => "EHT",
            Capability::WiFi6 => "WiFi6",
            Capability::WiFi7 => "WiFi7",
            Capability::Twt => "TWT",
            Capability::Bsr => "BSR",
        }
    }
}

/// Highest PHY generation an access point supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Generation {
    /// 802.11a/b/g
    Legacy,
    /// 802.11n
    Ht,
    /// 802.11ac
    Vht,
    /// 802.11ax
    He,
    /// 802.11be
    Eht,
}

impl Generation {
    /// Per-stream PHY rate in Mbps used as the throughput base
    ///
    /// The rate is scaled by the channel-width multiplier and the number of
    /// spatial streams to produce the theoretical maximum.
    pub fn base_rate_mbps(&self) -> f64 {
        match self {
            Generation::Legacy => 54.0,
            Generation::Ht => 72.2,
            Generation::Vht => 433.3,
            Generation::He => 286.8,
            Generation::Eht => 344.1,
        }
    }
}
