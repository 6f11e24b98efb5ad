//! Metrics normalizer
//!
//! Decoders only extract what the upstream tool states explicitly. Every
//! derived field is computed here, once, in a fixed order:
//!
//! 1. channel/frequency reconciliation (frequency wins when both are known)
//! 2. band classification from frequency
//! 3. signal quality
//! 4. defaults for width, security, PMF, streams and the BSS load sentinel
//! 5. SNR
//! 6. DFS flag
//! 7. theoretical and real-world throughput
//! 8. estimated range
//!
//! All functions are pure and idempotent: normalizing an already-normalized
//! record returns it unchanged.

use crate::channel::{frequency_to_channel, infer_frequency, is_dfs_channel};
use crate::{AccessPoint, Band, Capability, ConnectionInfo, Pmf, Security, StationStats};

/// Signal at or above which quality is 100
const QUALITY_CEILING_DBM: i32 = -30;
/// Signal at or below which quality is 0
const QUALITY_FLOOR_DBM: i32 = -100;

/// Share of theoretical throughput achieved in practice
const REAL_WORLD_FACTOR: f64 = 0.65;

/// Reference frequency the path-loss adjustment is relative to
const RANGE_BASE_FREQUENCY_MHZ: f64 = 2437.0;
/// Minimum detectable signal for pre-HE radios
const MIN_SIGNAL_DBM: f64 = -82.0;
/// Minimum detectable signal for HE and later radios
const MIN_SIGNAL_HE_DBM: f64 = -87.0;
const MIN_RANGE_M: f64 = 10.0;
const MAX_RANGE_M: f64 = 500.0;

const VALID_WIDTHS: [u32; 5] = [20, 40, 80, 160, 320];

/// Map a signal in dBm linearly onto 0-100, clamped at both ends
pub fn signal_to_quality(signal: i32) -> u8 {
    if signal >= QUALITY_CEILING_DBM {
        100
    } else if signal <= QUALITY_FLOOR_DBM {
        0
    } else {
        let span = QUALITY_CEILING_DBM - QUALITY_FLOOR_DBM;
        ((signal - QUALITY_FLOOR_DBM) * 100 / span) as u8
    }
}

/// Fill every derived field of an access point
pub fn normalize(mut ap: AccessPoint) -> AccessPoint {
    reconcile_channel(&mut ap.frequency, &mut ap.channel);
    ap.band = Band::from_frequency(ap.frequency);
    ap.signal_quality = signal_to_quality(ap.signal);

    if !VALID_WIDTHS.contains(&ap.channel_width) {
        ap.channel_width = 20;
    }
    if ap.security.is_none() {
        ap.security = Some(Security::Open);
    }
    if ap.pmf.is_none() {
        ap.pmf = Some(Pmf::Disabled);
    }
    if ap.mimo_streams == 0 {
        ap.mimo_streams = 1;
    }
    let load_unreported = ap.bss_load_stations == 0 && ap.bss_load_utilization == 0;
    if load_unreported || ap.bss_load_stations < 0 || ap.bss_load_utilization < 0 {
        ap.bss_load_stations = -1;
        ap.bss_load_utilization = -1;
    }

    ap.noise = ap.noise.filter(|&noise| noise != 0);
    ap.snr = ap.noise.map(|noise| ap.signal.saturating_sub(noise));

    ap.dfs = ap.band == Band::Ghz5 && is_dfs_channel(ap.channel);

    ap.max_theoretical_speed = theoretical_speed(&ap);
    ap.real_world_speed = (ap.max_theoretical_speed as f64 * REAL_WORLD_FACTOR) as u32;

    let high_efficiency = ap.has_capability(Capability::He)
        || ap.has_capability(Capability::WiFi6)
        || ap.has_capability(Capability::Eht)
        || ap.has_capability(Capability::WiFi7);
    ap.estimated_range = estimate_range(ap.tx_power, ap.band, high_efficiency);

    ap
}

/// Fill derived fields of a decoded link record
///
/// A disconnected record is reduced to `connected == false` with every other
/// field cleared.
pub fn normalize_connection(mut info: ConnectionInfo) -> ConnectionInfo {
    if !info.connected {
        return ConnectionInfo::disconnected();
    }

    info.bssid = crate::canonical_mac(&info.bssid);
    reconcile_channel(&mut info.frequency, &mut info.channel);
    info.noise = info.noise.filter(|&noise| noise != 0);

    let bitrate_info = if info.tx_bitrate_info.is_empty() {
        info.rx_bitrate_info.as_str()
    } else {
        info.tx_bitrate_info.as_str()
    };
    if bitrate_info.is_empty() {
        if info.channel_width == 0 {
            info.channel_width = 20;
        }
        if info.mimo_config.is_empty() {
            info.mimo_config = "1x1".to_string();
        }
    } else {
        let phy = parse_bitrate_info(bitrate_info);
        if info.wifi_standard.is_empty() {
            info.wifi_standard = phy.wifi_standard.to_string();
        }
        if info.channel_width == 0 {
            info.channel_width = phy.channel_width;
        }
        if info.mimo_config.is_empty() {
            info.mimo_config = phy.mimo_config;
        }
    }

    info
}

/// Fill derived fields of a decoded station record
pub fn normalize_station(mut stats: StationStats) -> StationStats {
    if !stats.connected {
        return StationStats::disconnected();
    }

    stats.bssid = crate::canonical_mac(&stats.bssid);
    stats.noise = stats.noise.filter(|&noise| noise != 0);
    stats.snr = stats.noise.map(|noise| stats.signal.saturating_sub(noise));
    if stats.signal_avg.is_none() && stats.signal != 0 {
        stats.signal_avg = Some(stats.signal);
    }
    stats.retry_rate = if stats.tx_packets > 0 {
        (stats.tx_retries as f64 / stats.tx_packets as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    stats
}

/// PHY details recovered from an iw-style bitrate description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPhy {
    /// Human-readable WiFi standard
    pub wifi_standard: &'static str,
    /// Channel width in MHz
    pub channel_width: u32,
    /// MIMO configuration such as `2x2`
    pub mimo_config: String,
}

/// Parse the tail of an iw bitrate line, e.g. `80MHz HE-MCS 11 HE-NSS 2`
pub fn parse_bitrate_info(info: &str) -> LinkPhy {
    let wifi_standard = if info.contains("EHT") {
        "WiFi 7 (802.11be)"
    } else if info.contains("HE") {
        "WiFi 6 (802.11ax)"
    } else if info.contains("VHT") {
        "WiFi 5 (802.11ac)"
    } else if info.contains("HT") || info.contains("MCS") {
        "WiFi 4 (802.11n)"
    } else {
        "Legacy (802.11a/b/g)"
    };

    let channel_width = if info.contains("320MHz") {
        320
    } else if info.contains("160MHz") || info.contains("80+80") {
        160
    } else if info.contains("80MHz") {
        80
    } else if info.contains("40MHz") {
        40
    } else {
        20
    };

    let tokens: Vec<&str> = info.split_whitespace().collect();
    let mut streams = None;
    for pair in tokens.windows(2) {
        if pair[0].ends_with("-NSS") {
            streams = pair[1].parse::<u32>().ok();
            break;
        }
        // HT reports a combined MCS index, eight per stream
        if pair[0] == "MCS" && streams.is_none() {
            streams = pair[1].parse::<u32>().ok().map(|mcs| mcs / 8 + 1);
        }
    }
    let streams = streams.filter(|&n| n > 0).unwrap_or(1);

    LinkPhy {
        wifi_standard,
        channel_width,
        mimo_config: format!("{}x{}", streams, streams),
    }
}

fn reconcile_channel(frequency: &mut u32, channel: &mut u32) {
    if *frequency > 0 {
        if let Some(ch) = frequency_to_channel(*frequency) {
            *channel = ch;
        }
    } else if *channel > 0 {
        if let Some(freq) = infer_frequency(*channel) {
            *frequency = freq;
        }
    }
}

fn theoretical_speed(ap: &AccessPoint) -> u32 {
    let width_multiplier = match ap.channel_width {
        40 => 2.0,
        80 => 4.0,
        160 => 8.0,
        320 => 16.0,
        _ => 1.0,
    };
    let streams = ap.mimo_streams.max(1) as f64;
    (ap.generation().base_rate_mbps() * width_multiplier * streams) as u32
}

fn estimate_range(tx_power: i32, band: Band, high_efficiency: bool) -> f64 {
    let reference_mhz = match band {
        Band::Ghz2_4 => 2437.0,
        Band::Ghz5 => 5400.0,
        Band::Ghz6 => 6175.0,
    };
    let min_signal = if high_efficiency {
        MIN_SIGNAL_HE_DBM
    } else {
        MIN_SIGNAL_DBM
    };

    let margin = tx_power as f64 - min_signal;
    let adjustment = 20.0 * (reference_mhz / RANGE_BASE_FREQUENCY_MHZ).log10();
    10f64
        .powf((margin - adjustment) / 20.0)
        .clamp(MIN_RANGE_M, MAX_RANGE_M)
}
