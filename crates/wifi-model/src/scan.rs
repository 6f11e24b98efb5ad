//! Aggregated scan results

use std::time::SystemTime;

use crate::{AccessPoint, Band, Security};

/// Congestion verdict for a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CongestionLevel {
    /// Utilization at or below the medium threshold
    #[default]
    Low,
    /// Utilization above the medium threshold
    Medium,
    /// Utilization above the high threshold
    High,
}

impl CongestionLevel {
    /// Returns the display name of the level
    pub fn name(&self) -> &'static str {
        match self {
            CongestionLevel::Low => "low",
            CongestionLevel::Medium => "medium",
            CongestionLevel::High => "high",
        }
    }
}

/// Access points sharing one SSID within a scan
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Network {
    /// Network name
    pub ssid: String,
    /// Member access points in scan order
    pub access_points: Vec<AccessPoint>,
    /// Strongest member signal in dBm
    pub best_signal: i32,
    /// BSSID of the strongest member (first seen wins ties)
    pub best_signal_ap: String,
    /// Channel of the strongest member
    pub channel: u32,
    /// Band of the strongest member
    pub band: Band,
    /// Security of the strongest member
    pub security: Security,
    /// Number of member access points
    pub ap_count: usize,
    /// Whether any issue rule fired
    pub has_issues: bool,
    /// Issue descriptions in rule order
    pub issue_messages: Vec<String>,
}

/// One radio channel's aggregate state within a scan
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelInfo {
    /// Channel number
    pub channel: u32,
    /// Center frequency in MHz
    pub frequency: u32,
    /// Band of the channel
    pub band: Band,
    /// Access points observed on the channel
    pub network_count: usize,
    /// SSIDs on the channel (one entry per access point)
    pub networks: Vec<String>,
    /// Estimated utilization 0-100
    pub utilization: u8,
    /// Congestion verdict
    pub congestion_level: CongestionLevel,
    /// Other 2.4 GHz channels in use within the overlap distance
    pub overlapping_count: usize,
}

/// Immutable snapshot of one completed scan
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanResult {
    /// When the scan completed
    pub timestamp: SystemTime,
    /// Interface that was scanned
    pub interface: String,
    /// Networks, strongest first
    pub networks: Vec<Network>,
    /// Channels, ascending
    pub channels: Vec<ChannelInfo>,
    /// Total access points in the scan
    pub total_aps: usize,
    /// Total networks in the scan
    pub total_networks: usize,
}

impl ScanResult {
    /// An empty result for an interface
    pub fn empty(interface: &str, timestamp: SystemTime) -> Self {
        Self {
            timestamp,
            interface: interface.to_string(),
            networks: Vec::new(),
            channels: Vec::new(),
            total_aps: 0,
            total_networks: 0,
        }
    }
}
