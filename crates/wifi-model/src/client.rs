//! Client connection records
//!
//! [`ConnectionInfo`] and [`StationStats`] are what a decoder extracts from a
//! single link/station query. [`ClientStats`] is the tracker's rolling state,
//! mutated once per poll and carrying bounded history across polls.

use std::collections::VecDeque;
use std::time::SystemTime;

/// Decoded link record for the active connection
///
/// A record with `connected == false` is a normal result, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionInfo {
    /// Whether the interface is associated
    pub connected: bool,
    /// Network name
    pub ssid: String,
    /// Access point MAC address
    pub bssid: String,
    /// Center frequency in MHz
    pub frequency: u32,
    /// Primary channel
    pub channel: u32,
    /// Channel width in MHz
    pub channel_width: u32,
    /// Signal in dBm
    pub signal: i32,
    /// Noise floor in dBm, when reported
    pub noise: Option<i32>,
    /// Receive bitrate in Mbps
    pub rx_bitrate: f64,
    /// Transmit bitrate in Mbps
    pub tx_bitrate: f64,
    /// Trailing bitrate description (e.g. `80MHz HE-MCS 11 HE-NSS 2`)
    pub rx_bitrate_info: String,
    /// Trailing bitrate description for transmit
    pub tx_bitrate_info: String,
    /// Bytes received
    pub rx_bytes: u64,
    /// Bytes transmitted
    pub tx_bytes: u64,
    /// WiFi standard, derived from bitrate info when not reported
    pub wifi_standard: String,
    /// MIMO configuration such as `2x2`
    pub mimo_config: String,
}

impl ConnectionInfo {
    /// A record for an interface that is not associated
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// Decoded station statistics for the associated access point
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationStats {
    /// Whether the station entry was present
    pub connected: bool,
    /// Access point MAC address
    pub bssid: String,
    /// Last signal in dBm
    pub signal: i32,
    /// Averaged signal in dBm
    pub signal_avg: Option<i32>,
    /// Noise floor in dBm
    pub noise: Option<i32>,
    /// Signal-to-noise ratio, derived
    pub snr: Option<i32>,
    /// Transmit bitrate in Mbps
    pub tx_bitrate: f64,
    /// Receive bitrate in Mbps
    pub rx_bitrate: f64,
    /// Trailing transmit bitrate description
    pub tx_bitrate_info: String,
    /// Trailing receive bitrate description
    pub rx_bitrate_info: String,
    /// Bytes transmitted
    pub tx_bytes: u64,
    /// Bytes received
    pub rx_bytes: u64,
    /// Packets transmitted
    pub tx_packets: u64,
    /// Packets received
    pub rx_packets: u64,
    /// Transmit retries
    pub tx_retries: u64,
    /// Failed transmissions
    pub tx_failed: u64,
    /// Retry percentage (0-100), derived
    pub retry_rate: f64,
    /// Seconds since association
    pub connected_time: u64,
    /// Signal of the last ACK in dBm
    pub last_ack_signal: Option<i32>,
}

impl StationStats {
    /// A record for an interface with no station entry
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// One signal sample, recorded per poll tick
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalDataPoint {
    /// When the sample was taken
    pub timestamp: SystemTime,
    /// Signal in dBm
    pub signal: i32,
    /// Access point the sample belongs to
    pub bssid: String,
}

/// A transition of the client from one BSSID to another
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoamingEvent {
    /// When the transition was observed
    pub timestamp: SystemTime,
    /// BSSID before the transition
    pub previous_bssid: String,
    /// BSSID after the transition
    pub new_bssid: String,
    /// Last signal recorded against the previous BSSID (0 if none)
    pub previous_signal: i32,
    /// Signal on the new BSSID
    pub new_signal: i32,
    /// Channel before the transition
    pub previous_channel: u32,
    /// Channel after the transition
    pub new_channel: u32,
}

impl RoamingEvent {
    /// Signal change in dB caused by the roam
    pub fn signal_delta(&self) -> i32 {
        self.new_signal - self.previous_signal
    }
}

/// Rolling statistics for the monitored interface
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientStats {
    /// Whether the last poll found an association
    pub connected: bool,
    /// Interface being monitored
    pub interface: String,
    /// Network name
    pub ssid: String,
    /// Current access point
    pub bssid: String,
    /// Center frequency in MHz
    pub frequency: u32,
    /// Primary channel
    pub channel: u32,
    /// Channel width in MHz
    pub channel_width: u32,
    /// WiFi standard description
    pub wifi_standard: String,
    /// MIMO configuration such as `2x2`
    pub mimo_config: String,
    /// Current signal in dBm
    pub signal: i32,
    /// Averaged signal in dBm
    pub signal_avg: i32,
    /// Noise floor in dBm, when reported
    pub noise: Option<i32>,
    /// Signal-to-noise ratio
    pub snr: Option<i32>,
    /// Transmit bitrate in Mbps
    pub tx_bitrate: f64,
    /// Receive bitrate in Mbps
    pub rx_bitrate: f64,
    /// Bytes transmitted
    pub tx_bytes: u64,
    /// Bytes received
    pub rx_bytes: u64,
    /// Packets transmitted
    pub tx_packets: u64,
    /// Packets received
    pub rx_packets: u64,
    /// Transmit retries
    pub tx_retries: u64,
    /// Failed transmissions
    pub tx_failed: u64,
    /// Retry percentage
    pub retry_rate: f64,
    /// Seconds since association
    pub connected_time: u64,
    /// Signal of the last ACK in dBm
    pub last_ack_signal: Option<i32>,
    /// Signal samples, oldest first
    pub signal_history: VecDeque<SignalDataPoint>,
    /// Roaming transitions observed during this process lifetime
    pub roaming_history: Vec<RoamingEvent>,
}
