//! Access point record

use std::collections::BTreeSet;
use std::time::SystemTime;

use crate::{Band, Capability, Generation, Pmf, Security};

/// One observed BSSID at scan time
///
/// Decoders create these partially populated; [`crate::normalize`] fills in
/// every derived field. Numeric fields use `0` for "not reported" unless noted.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessPoint {
    /// MAC address, lower-case colon-separated hex
    pub bssid: String,
    /// Network name (empty for hidden networks)
    pub ssid: String,
    /// Manufacturer derived from the BSSID OUI
    pub vendor: String,
    /// True when the BSSID was synthesized because the source omitted it
    pub synthetic_bssid: bool,
    /// Center frequency in MHz
    pub frequency: u32,
    /// Primary channel number
    pub channel: u32,
    /// Band derived from frequency
    pub band: Band,
    /// Channel width in MHz
    pub channel_width: u32,
    /// Signal strength in dBm
    pub signal: i32,
    /// Signal quality 0-100, derived from `signal`
    pub signal_quality: u8,
    /// Noise floor in dBm, when reported
    pub noise: Option<i32>,
    /// Signal-to-noise ratio in dB, derived when noise is known
    pub snr: Option<i32>,
    /// Transmit power in dBm from a TPC report
    pub tx_power: i32,
    /// Security type, `None` until decoded or defaulted
    pub security: Option<Security>,
    /// Encryption ciphers (CCMP, GCMP, TKIP ...)
    pub security_ciphers: BTreeSet<String>,
    /// Authentication methods (PSK, SAE, 802.1X ...)
    pub auth_methods: BTreeSet<String>,
    /// Protected Management Frames mode
    pub pmf: Option<Pmf>,
    /// PHY capabilities
    pub capabilities: BTreeSet<Capability>,
    /// Number of spatial streams
    pub mimo_streams: u32,
    /// Associated station count from BSS Load, -1 when not reported
    pub bss_load_stations: i32,
    /// Channel utilization (0-255) from BSS Load, -1 when not reported
    pub bss_load_utilization: i32,
    /// Channel requires DFS
    pub dfs: bool,
    /// Theoretical maximum throughput in Mbps
    pub max_theoretical_speed: u32,
    /// Expected real-world throughput in Mbps
    pub real_world_speed: u32,
    /// Estimated coverage radius in meters
    pub estimated_range: f64,
    /// Beacon interval in TUs
    pub beacon_interval: u32,
    /// DTIM period in beacons
    pub dtim: u32,
    /// 802.11v BSS Transition Management
    pub bss_transition: bool,
    /// Unscheduled Automatic Power Save Delivery
    pub uapsd: bool,
    /// 802.11r Fast BSS Transition
    pub fast_roaming: bool,
    /// WiFi Protected Setup advertised
    pub wps: bool,
    /// Target Wake Time
    pub twt_support: bool,
    /// 802.11k Neighbor Report
    pub neighbor_report: bool,
    /// HE BSS color (0-63)
    pub bss_color: u8,
    /// OBSS PD spatial reuse
    pub obss_pd: bool,
    /// Highest QAM order advertised (256, 1024, 4096), 0 if unknown
    pub qam_support: u32,
    /// Multi-user MIMO
    pub mu_mimo: bool,
    /// WMM / QoS
    pub qos_support: bool,
    /// Regulatory country code
    pub country_code: String,
    /// AP name advertised in a vendor element
    pub ap_name: String,
    /// Timestamp of the scan that produced this record
    pub last_seen: Option<SystemTime>,
}

impl AccessPoint {
    /// Create an empty record for a BSSID
    pub fn new(bssid: &str) -> Self {
        Self {
            bssid: canonical_mac(bssid),
            ..Default::default()
        }
    }

    /// Security type with the unset case treated as open
    pub fn security(&self) -> Security {
        self.security.unwrap_or(Security::Open)
    }

    /// PMF mode with the unset case treated as disabled
    pub fn pmf(&self) -> Pmf {
        self.pmf.unwrap_or(Pmf::Disabled)
    }

    /// Check whether a capability is present
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Highest PHY generation advertised
    pub fn generation(&self) -> Generation {
        if self.has_capability(Capability::Eht) || self.has_capability(Capability::WiFi7) {
            Generation::Eht
        } else if self.has_capability(Capability::He) || self.has_capability(Capability::WiFi6) {
            Generation::He
        } else if self.has_capability(Capability::Vht) {
            Generation::Vht
        } else if self.has_capability(Capability::Ht) {
            Generation::Ht
        } else {
            Generation::Legacy
        }
    }
}

/// Canonicalize a MAC address to lower-case colon-separated hex
///
/// Dashes are accepted as separators. Input that is not a MAC address is
/// returned lower-cased and otherwise unchanged.
pub fn canonical_mac(mac: &str) -> String {
    mac.trim().replace('-', ":").to_ascii_lowercase()
}
