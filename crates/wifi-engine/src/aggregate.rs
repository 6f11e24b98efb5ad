//! Scan aggregation
//!
//! Groups one scan's normalized access points by SSID and by channel, then
//! derives channel congestion and per-network issues. Utilization is a
//! count-based heuristic (`network_count * utilization_per_network`), not a
//! spectral measurement.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use wifi_model::{AccessPoint, Band, ChannelInfo, CongestionLevel, Network, ScanResult};

/// Highest channel number treated as 2.4 GHz
const MAX_2GHZ_CHANNEL: u32 = 14;

/// Thresholds used by [`aggregate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Networks whose best signal is below this (dBm) are flagged
    pub weak_signal_threshold_dbm: i32,
    /// Non-overlapping 2.4 GHz channels
    pub recommended_channels: Vec<u32>,
    /// Utilization points contributed by each access point on a channel
    pub utilization_per_network: u32,
    /// Utilization above which a channel is highly congested
    pub high_congestion_above: u8,
    /// Utilization above which a channel is moderately congested
    pub medium_congestion_above: u8,
    /// 2.4 GHz channels at most this far apart overlap
    pub overlap_distance: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            weak_signal_threshold_dbm: -80,
            recommended_channels: vec![1, 6, 11],
            utilization_per_network: 15,
            high_congestion_above: 80,
            medium_congestion_above: 50,
            overlap_distance: 4,
        }
    }
}

impl AggregationConfig {
    fn utilization(&self, network_count: usize) -> u8 {
        let points = (network_count as u64).saturating_mul(self.utilization_per_network as u64);
        points.min(100) as u8
    }

    fn congestion(&self, utilization: u8) -> CongestionLevel {
        if utilization > self.high_congestion_above {
            CongestionLevel::High
        } else if utilization > self.medium_congestion_above {
            CongestionLevel::Medium
        } else {
            CongestionLevel::Low
        }
    }

    /// Whether a 2.4 GHz channel is outside the recommended set
    pub fn is_overlap_prone(&self, channel: u32) -> bool {
        channel > 0 && channel <= MAX_2GHZ_CHANNEL && !self.recommended_channels.contains(&channel)
    }
}

/// Aggregate one scan's access points into networks and channels
///
/// Networks are sorted strongest first, channels by ascending number.
pub fn aggregate(access_points: Vec<AccessPoint>, iface: &str, config: &AggregationConfig) -> ScanResult {
    let total_aps = access_points.len();
    let mut order: Vec<String> = Vec::new();
    let mut by_ssid: HashMap<String, Network> = HashMap::new();
    let mut by_channel: BTreeMap<u32, ChannelInfo> = BTreeMap::new();

    for ap in access_points {
        let channel = by_channel.entry(ap.channel).or_insert_with(|| ChannelInfo {
            channel: ap.channel,
            frequency: ap.frequency,
            band: ap.band,
            network_count: 0,
            networks: Vec::new(),
            utilization: 0,
            congestion_level: CongestionLevel::Low,
            overlapping_count: 0,
        });
        channel.network_count += 1;
        channel.networks.push(ap.ssid.clone());

        match by_ssid.get_mut(&ap.ssid) {
            Some(network) => {
                if ap.signal > network.best_signal {
                    network.best_signal = ap.signal;
                    network.best_signal_ap = ap.bssid.clone();
                    network.channel = ap.channel;
                    network.band = ap.band;
                    network.security = ap.security();
                }
                network.access_points.push(ap);
                network.ap_count = network.access_points.len();
            }
            None => {
                order.push(ap.ssid.clone());
                by_ssid.insert(
                    ap.ssid.clone(),
                    Network {
                        ssid: ap.ssid.clone(),
                        best_signal: ap.signal,
                        best_signal_ap: ap.bssid.clone(),
                        channel: ap.channel,
                        band: ap.band,
                        security: ap.security(),
                        ap_count: 1,
                        has_issues: false,
                        issue_messages: Vec::new(),
                        access_points: vec![ap],
                    },
                );
            }
        }
    }

    let in_use_2ghz: Vec<u32> = by_channel
        .keys()
        .copied()
        .filter(|&c| c <= MAX_2GHZ_CHANNEL)
        .collect();
    let channels: Vec<ChannelInfo> = by_channel
        .into_values()
        .map(|mut info| {
            info.utilization = config.utilization(info.network_count);
            info.congestion_level = config.congestion(info.utilization);
            info.overlapping_count = overlapping_count(info.channel, &in_use_2ghz, config);
            info
        })
        .collect();

    // Ties keep first-seen order because the sort is stable
    let mut networks: Vec<Network> = order
        .into_iter()
        .filter_map(|ssid| by_ssid.remove(&ssid))
        .map(|mut network| {
            detect_issues(&mut network, config);
            network
        })
        .collect();
    networks.sort_by(|a, b| b.best_signal.cmp(&a.best_signal));

    ScanResult {
        timestamp: SystemTime::now(),
        interface: iface.to_string(),
        total_networks: networks.len(),
        networks,
        channels,
        total_aps,
    }
}

fn overlapping_count(channel: u32, in_use_2ghz: &[u32], config: &AggregationConfig) -> usize {
    if channel > MAX_2GHZ_CHANNEL {
        return 0;
    }
    in_use_2ghz
        .iter()
        .filter(|&&other| other != channel && other.abs_diff(channel) <= config.overlap_distance)
        .count()
}

/// Apply every issue rule to a network, in rule order
fn detect_issues(network: &mut Network, config: &AggregationConfig) {
    network.issue_messages.clear();

    let security_types: BTreeSet<_> = network
        .access_points
        .iter()
        .filter_map(|ap| ap.security)
        .collect();
    if security_types.len() > 1 {
        network
            .issue_messages
            .push("Multiple security types detected for same SSID".to_string());
    }

    if network.best_signal < config.weak_signal_threshold_dbm {
        network.issue_messages.push(format!(
            "Weak signal strength (below {} dBm)",
            config.weak_signal_threshold_dbm
        ));
    }

    if network.band == Band::Ghz2_4 && config.is_overlap_prone(network.channel) {
        network.issue_messages.push(format!(
            "Channel {} may overlap with adjacent channels",
            network.channel
        ));
    }

    network.has_issues = !network.issue_messages.is_empty();
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifi_model::{normalize, Security};

    fn ap(bssid: &str, ssid: &str, channel: u32, signal: i32) -> AccessPoint {
        let mut ap = AccessPoint::new(bssid);
        ap.ssid = ssid.to_string();
        ap.channel = channel;
        ap.signal = signal;
        normalize(ap)
    }

    #[test]
    fn test_empty_scan() {
        let result = aggregate(Vec::new(), "wlan0", &AggregationConfig::default());
        assert_eq!(result.interface, "wlan0");
        assert_eq!(result.total_aps, 0);
        assert!(result.networks.is_empty());
        assert!(result.channels.is_empty());
    }

    #[test]
    fn test_mixed_security_network() {
        let mut a = ap("AA:AA:AA:AA:AA:01", "Home", 36, -40);
        a.security = Some(Security::Wpa2);
        let mut b = ap("AA:AA:AA:AA:AA:02", "Home", 36, -65);
        b.security = Some(Security::Wpa3);

        let result = aggregate(vec![a, b], "wlan0", &AggregationConfig::default());
        assert_eq!(result.networks.len(), 1);
        let home = &result.networks[0];
        assert_eq!(home.ap_count, 2);
        assert_eq!(home.best_signal, -40);
        assert_eq!(home.best_signal_ap, "aa:aa:aa:aa:aa:01");
        assert_eq!(home.security, Security::Wpa2);
        assert!(home.has_issues);
        assert!(home.issue_messages[0].contains("Multiple security types"));
    }

    #[test]
    fn test_best_signal_tie_keeps_first() {
        let result = aggregate(
            vec![
                ap("00:00:00:00:00:01", "Lab", 1, -50),
                ap("00:00:00:00:00:02", "Lab", 6, -50),
            ],
            "wlan0",
            &AggregationConfig::default(),
        );
        assert_eq!(result.networks[0].best_signal_ap, "00:00:00:00:00:01");
        assert_eq!(result.networks[0].channel, 1);
    }

    #[test]
    fn test_channel_congestion() {
        let aps = (0..6)
            .map(|i| ap(&format!("00:00:00:00:00:{:02x}", i), &format!("Net{}", i), 6, -60))
            .collect();
        let result = aggregate(aps, "wlan0", &AggregationConfig::default());
        assert_eq!(result.channels.len(), 1);
        assert_eq!(result.channels[0].utilization, 90);
        assert_eq!(result.channels[0].congestion_level, CongestionLevel::High);

        let aps = (0..4)
            .map(|i| ap(&format!("00:00:00:00:00:{:02x}", i), "Same", 11, -60))
            .collect();
        let result = aggregate(aps, "wlan0", &AggregationConfig::default());
        assert_eq!(result.channels[0].utilization, 60);
        assert_eq!(result.channels[0].congestion_level, CongestionLevel::Medium);
        assert_eq!(result.channels[0].networks, vec!["Same"; 4]);
    }

    #[test]
    fn test_overlap_and_issues() {
        let result = aggregate(
            vec![
                ap("00:00:00:00:00:01", "A", 1, -50),
                ap("00:00:00:00:00:02", "B", 3, -85),
                ap("00:00:00:00:00:03", "C", 11, -60),
                ap("00:00:00:00:00:04", "D", 149, -60),
            ],
            "wlan0",
            &AggregationConfig::default(),
        );
        let overlap: Vec<(u32, usize)> = result
            .channels
            .iter()
            .map(|c| (c.channel, c.overlapping_count))
            .collect();
        assert_eq!(overlap, vec![(1, 1), (3, 1), (11, 0), (149, 0)]);

        let b = result.networks.iter().find(|n| n.ssid == "B").unwrap();
        assert_eq!(
            b.issue_messages,
            vec![
                "Weak signal strength (below -80 dBm)".to_string(),
                "Channel 3 may overlap with adjacent channels".to_string(),
            ]
        );
        let d = result.networks.iter().find(|n| n.ssid == "D").unwrap();
        assert!(!d.has_issues);
    }

    #[test]
    fn test_networks_sorted_by_signal() {
        let result = aggregate(
            vec![
                ap("00:00:00:00:00:01", "Far", 6, -75),
                ap("00:00:00:00:00:02", "Near", 6, -35),
                ap("00:00:00:00:00:03", "Mid", 6, -55),
            ],
            "wlan0",
            &AggregationConfig::default(),
        );
        let order: Vec<&str> = result.networks.iter().map(|n| n.ssid.as_str()).collect();
        assert_eq!(order, vec!["Near", "Mid", "Far"]);
        assert_eq!(result.total_networks, 3);
        assert_eq!(result.total_aps, 3);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = AggregationConfig {
            weak_signal_threshold_dbm: -60,
            recommended_channels: vec![1, 5, 9, 13],
            ..Default::default()
        };
        let result = aggregate(vec![ap("00:00:00:00:00:01", "Eu", 13, -65)], "wlan0", &config);
        assert_eq!(
            result.networks[0].issue_messages,
            vec!["Weak signal strength (below -60 dBm)".to_string()]
        );
    }
}
