//! Client state tracker
//!
//! Folds one normalized link record (and, when available, a station record)
//! per poll tick into a rolling [`ClientStats`]. The stats are mutated in
//! place so the signal and roaming histories survive across ticks.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wifi_model::{
    parse_bitrate_info, ClientStats, ConnectionInfo, RoamingEvent, SignalDataPoint, StationStats,
};

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum number of signal samples kept (oldest evicted first)
    pub history_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        // Ten minutes at one sample per second
        Self {
            history_capacity: 600,
        }
    }
}

/// Rolling client state for one monitored interface
#[derive(Debug, Clone, Default)]
pub struct ClientTracker {
    config: TrackerConfig,
    stats: ClientStats,
    last_bssid: String,
}

impl ClientTracker {
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            config,
            stats: ClientStats::default(),
            last_bssid: String::new(),
        }
    }

    /// Current rolling statistics
    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// BSSID recorded by the most recent connected tick
    pub fn last_bssid(&self) -> &str {
        &self.last_bssid
    }

    /// Record a tick on which the link could not be queried or is down
    ///
    /// History is kept; only the connected flag changes.
    pub fn mark_disconnected(&mut self) {
        if self.stats.connected {
            info!("Client on {} disconnected", self.stats.interface);
        }
        self.stats.connected = false;
    }

    /// Fold one tick's records into the stats
    ///
    /// Returns the roaming event when the BSSID changed since the last
    /// connected tick.
    pub fn update(
        &mut self,
        iface: &str,
        link: &ConnectionInfo,
        station: Option<&StationStats>,
        now: SystemTime,
    ) -> Option<RoamingEvent> {
        if !link.connected {
            self.mark_disconnected();
            return None;
        }

        let previous_channel = self.stats.channel;
        self.apply_link(iface, link);
        match station.filter(|s| s.connected) {
            Some(station) => self.apply_station(station),
            None => self.stats.signal_avg = self.stats.signal,
        }

        let roamed = self.detect_roam(previous_channel, now);
        self.record_sample(now);
        self.last_bssid = self.stats.bssid.clone();
        roamed
    }

    fn apply_link(&mut self, iface: &str, link: &ConnectionInfo) {
        let stats = &mut self.stats;
        stats.connected = true;
        stats.interface = iface.to_string();
        stats.ssid = link.ssid.clone();
        stats.bssid = link.bssid.clone();
        stats.frequency = link.frequency;
        stats.channel = link.channel;
        stats.channel_width = link.channel_width;
        stats.wifi_standard = link.wifi_standard.clone();
        stats.mimo_config = link.mimo_config.clone();
        stats.signal = link.signal;
        stats.noise = link.noise;
        stats.snr = link.noise.map(|noise| link.signal.saturating_sub(noise));
        stats.tx_bitrate = link.tx_bitrate;
        stats.rx_bitrate = link.rx_bitrate;
        stats.tx_bytes = link.tx_bytes;
        stats.rx_bytes = link.rx_bytes;
    }

    fn apply_station(&mut self, station: &StationStats) {
        let stats = &mut self.stats;
        stats.signal_avg = station.signal_avg.unwrap_or(stats.signal);
        if station.tx_bitrate > 0.0 {
            stats.tx_bitrate = station.tx_bitrate;
        }
        if station.rx_bitrate > 0.0 {
            stats.rx_bitrate = station.rx_bitrate;
        }
        if !station.tx_bitrate_info.is_empty() {
            let phy = parse_bitrate_info(&station.tx_bitrate_info);
            stats.wifi_standard = phy.wifi_standard.to_string();
            stats.channel_width = phy.channel_width;
            stats.mimo_config = phy.mimo_config;
        }
        if station.noise.is_some() {
            stats.noise = station.noise;
            stats.snr = station.snr;
        }
        stats.tx_bytes = station.tx_bytes.max(stats.tx_bytes);
        stats.rx_bytes = station.rx_bytes.max(stats.rx_bytes);
        stats.tx_packets = station.tx_packets;
        stats.rx_packets = station.rx_packets;
        stats.tx_retries = station.tx_retries;
        stats.tx_failed = station.tx_failed;
        stats.retry_rate = station.retry_rate;
        stats.connected_time = station.connected_time;
        stats.last_ack_signal = station.last_ack_signal;
    }

    fn detect_roam(&mut self, previous_channel: u32, now: SystemTime) -> Option<RoamingEvent> {
        if self.last_bssid.is_empty() || self.last_bssid == self.stats.bssid {
            return None;
        }

        // The newest sample for the old BSSID, not simply the previous tick
        let previous_signal = self
            .stats
            .signal_history
            .iter()
            .rev()
            .find(|point| point.bssid == self.last_bssid)
            .map(|point| point.signal)
            .unwrap_or(0);

        let event = RoamingEvent {
            timestamp: now,
            previous_bssid: self.last_bssid.clone(),
            new_bssid: self.stats.bssid.clone(),
            previous_signal,
            new_signal: self.stats.signal,
            previous_channel,
            new_channel: self.stats.channel,
        };
        info!(
            "Roamed from {} ({} dBm) to {} ({} dBm)",
            event.previous_bssid, event.previous_signal, event.new_bssid, event.new_signal
        );
        self.stats.roaming_history.push(event.clone());
        Some(event)
    }

    fn record_sample(&mut self, now: SystemTime) {
        let history = &mut self.stats.signal_history;
        history.push_back(SignalDataPoint {
            timestamp: now,
            signal: self.stats.signal,
            bssid: self.stats.bssid.clone(),
        });
        while history.len() > self.config.history_capacity {
            history.pop_front();
        }
        debug!("Signal history holds {} samples", history.len());
    }
}
