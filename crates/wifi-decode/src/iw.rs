//! Linux `iw` text decoder
//!
//! `iw` output is indented key/value text. Scan output is a sequence of
//! records, each starting with a non-indented `BSS <mac>(on <iface>)` line;
//! every other line updates at most a few fields of the record in progress.
//! Unknown lines are ignored so newer `iw` releases keep decoding.

use tracing::trace;
use wifi_model::{AccessPoint, Capability, ConnectionInfo, Pmf, Security, StationStats};

use crate::text::{
    extend_tokens, is_mac, leading_float, leading_i32, leading_u64, parse_channel_width,
    parse_first_int, split_key_value,
};
use crate::{as_text, DecodeError, Decoder, DecoderKind};

/// Decoder for `iw` text output
#[derive(Debug, Default, Clone, Copy)]
pub struct IwDecoder;

impl IwDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for IwDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Iw
    }

    fn parse_scan(&self, raw: &[u8]) -> Result<Vec<AccessPoint>, DecodeError> {
        Ok(parse_scan(&as_text(raw)))
    }

    fn parse_link(&self, raw: &[u8]) -> Result<ConnectionInfo, DecodeError> {
        Ok(parse_link(&as_text(raw)))
    }

    fn parse_station(&self, raw: &[u8]) -> Result<StationStats, DecodeError> {
        Ok(parse_station(&as_text(raw)))
    }
}

/// Interface names listed by `iw dev`
pub fn parse_interfaces(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Interface "))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Whether `iw` output reports an authorization failure
pub fn is_permission_error(output: &str) -> bool {
    output.contains("Operation not permitted") || output.contains("Permission denied")
}

/// BSSID of a `BSS <mac>(on wlan0)` record start line
fn bss_start(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("BSS ")?;
    let mac = rest
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()?;
    is_mac(mac).then_some(mac)
}

#[derive(Default)]
struct ScanRecord {
    ap: AccessPoint,
    in_security_block: bool,
}

impl ScanRecord {
    fn new(bssid: &str) -> Self {
        Self {
            ap: AccessPoint::new(bssid),
            in_security_block: false,
        }
    }

    fn raise_security(&mut self, security: Security) {
        self.ap.security = Some(self.ap.security.map_or(security, |s| s.max(security)));
    }

    fn widen(&mut self, width: u32) {
        self.ap.channel_width = self.ap.channel_width.max(width);
    }

    fn update(&mut self, line: &str) {
        let trimmed = line.trim();

        if trimmed.starts_with("RSN:") {
            self.in_security_block = true;
            self.raise_security(Security::Wpa2);
            return;
        }
        if trimmed.starts_with("WPA:") {
            self.in_security_block = true;
            self.raise_security(Security::Wpa);
            return;
        }
        if trimmed.is_empty() {
            self.in_security_block = false;
            return;
        }

        if let Some((key, value)) = split_key_value(trimmed) {
            let ap = &mut self.ap;
            match key {
                "freq" => {
                    if let Some(freq) = leading_float(value) {
                        ap.frequency = freq.round() as u32;
                    }
                    return;
                }
                "signal" => {
                    if let Some(signal) = leading_float(value) {
                        ap.signal = signal as i32;
                    }
                    return;
                }
                "SSID" => {
                    ap.ssid = value.to_string();
                    return;
                }
                "* primary channel" => {
                    if let Some(ch) = leading_u64(value) {
                        ap.channel = ch as u32;
                    }
                    return;
                }
                "beacon interval" => {
                    if let Some(interval) = leading_u64(value) {
                        ap.beacon_interval = interval as u32;
                    }
                    return;
                }
                "* station count" => {
                    if let Some(stations) = leading_i32(value) {
                        ap.bss_load_stations = stations;
                    }
                    return;
                }
                "* channel utilisation" => {
                    if let Some(util) = value.split('/').next().and_then(leading_i32) {
                        ap.bss_load_utilization = util;
                    }
                    return;
                }
                "* channel width" | "* STA channel width" => {
                    if let Some(width) = parse_channel_width(value) {
                        self.widen(width);
                    }
                    return;
                }
                "Country" => {
                    if let Some(code) = value.split_whitespace().next() {
                        ap.country_code = code.to_ascii_uppercase();
                    }
                    return;
                }
                "AP name" | "* AP name" => {
                    ap.ap_name = value.to_string();
                    return;
                }
                "* Device name" if ap.ap_name.is_empty() => {
                    ap.ap_name = value.to_string();
                    return;
                }
                _ => {}
            }

            if self.in_security_block {
                match key {
                    "* Pairwise ciphers" | "* Group cipher" => {
                        extend_tokens(&mut ap.security_ciphers, value);
                    }
                    "* Authentication suites" => {
                        extend_tokens(&mut ap.auth_methods, value);
                        if value.contains("SuiteB") || value.contains("Suite-B") {
                            self.raise_security(Security::Wpa3Enterprise);
                        } else if value.contains("SAE") || value.contains("OWE") {
                            self.raise_security(Security::Wpa3);
                        }
                        if value.contains("FT/") || value.contains("FT-") {
                            self.ap.fast_roaming = true;
                        }
                        return;
                    }
                    _ => {}
                }
            }
        }

        self.update_flags(trimmed);
    }

    /// Substring-detected capabilities and flags
    fn update_flags(&mut self, trimmed: &str) {
        if trimmed.starts_with("capability:") && trimmed.contains("Privacy") {
            self.raise_security(Security::Wep);
        }

        if trimmed.starts_with("EHT capabilities") || trimmed.starts_with("EHT operation") {
            self.ap.capabilities.extend([Capability::Eht, Capability::WiFi7]);
        } else if trimmed.starts_with("HE capabilities") || trimmed.starts_with("HE operation") {
            self.ap.capabilities.extend([Capability::He, Capability::WiFi6]);
        } else if trimmed.starts_with("VHT capabilities") || trimmed.starts_with("VHT operation") {
            self.ap.capabilities.insert(Capability::Vht);
        } else if trimmed.starts_with("HT capabilities") || trimmed.starts_with("HT operation") {
            self.ap.capabilities.insert(Capability::Ht);
        }

        if trimmed.contains("320MHz") {
            self.widen(320);
        } else if trimmed.contains("VHT160") || trimmed.contains("HE160") {
            self.widen(160);
        } else if trimmed.contains("VHT80") || trimmed.contains("HE80") {
            self.widen(80);
        } else if trimmed.contains("HT40") {
            self.widen(40);
        } else if trimmed.contains("HT20") {
            self.widen(20);
        }

        if let Some(rest) = trimmed.find("TX power:").map(|i| &trimmed[i + 9..]) {
            if let Some(power) = leading_float(rest.trim()) {
                self.ap.tx_power = power as i32;
            }
        }
        if let Some(rest) = trimmed.find("DTIM Period").map(|i| &trimmed[i + 11..]) {
            if let Some(dtim) = parse_first_int(rest) {
                self.ap.dtim = dtim.max(0) as u32;
            }
        }
        if let Some(idx) = trimmed.find(" streams: MCS") {
            if let Some(streams) = parse_first_int(&trimmed[..idx]) {
                self.ap.mimo_streams = self.ap.mimo_streams.max(streams.max(0) as u32);
            }
        }
        if let Some(rest) = trimmed.find("BSS Color:").map(|i| &trimmed[i + 10..]) {
            if let Some(color) = parse_first_int(rest) {
                self.ap.bss_color = (color & 0x3F) as u8;
            }
        }

        if trimmed.contains("MFP-required") {
            self.ap.pmf = Some(Pmf::Required);
        } else if trimmed.contains("MFP-capable") && self.ap.pmf != Some(Pmf::Required) {
            self.ap.pmf = Some(Pmf::Optional);
        }

        if trimmed.contains("TWT") {
            self.ap.twt_support = true;
            self.ap.capabilities.insert(Capability::Twt);
        }
        if trimmed.contains("BSR") {
            self.ap.capabilities.insert(Capability::Bsr);
        }
        if trimmed.contains("4096-QAM") {
            self.ap.qam_support = self.ap.qam_support.max(4096);
        } else if trimmed.contains("1024-QAM") {
            self.ap.qam_support = self.ap.qam_support.max(1024);
        }

        let lower = trimmed.to_ascii_lowercase();
        self.ap.bss_transition |= trimmed.contains("BSS Transition");
        self.ap.uapsd |= lower.contains("u-apsd") || lower.contains("uapsd");
        self.ap.neighbor_report |= trimmed.contains("Neighbor Report");
        self.ap.wps |= trimmed.starts_with("WPS:");
        self.ap.qos_support |= trimmed.starts_with("WMM:");
        self.ap.obss_pd |= trimmed.contains("OBSS PD");
        self.ap.mu_mimo |= trimmed.contains("MU Beamformer");
        self.ap.fast_roaming |= trimmed.contains("FT/SAE") || trimmed.contains("FT/PSK");
    }
}

/// Decode `iw dev <iface> scan` output
pub fn parse_scan(output: &str) -> Vec<AccessPoint> {
    let mut aps = Vec::new();
    let mut current: Option<ScanRecord> = None;

    for line in output.lines() {
        if let Some(bssid) = bss_start(line) {
            if let Some(record) = current.take() {
                aps.push(record.ap);
            }
            current = Some(ScanRecord::new(bssid));
            continue;
        }
        match current.as_mut() {
            Some(record) => record.update(line),
            None => trace!("Ignoring line outside a BSS record: {}", line),
        }
    }
    if let Some(record) = current {
        aps.push(record.ap);
    }

    aps
}

/// Split `866.7 MBit/s VHT-MCS 9 80MHz VHT-NSS 2` into the rate and its tail
fn parse_bitrate(value: &str) -> (f64, String) {
    let rate = leading_float(value).unwrap_or(0.0);
    let info = value
        .split_once("MBit/s")
        .map(|(_, tail)| tail.trim().to_string())
        .unwrap_or_default();
    (rate, info)
}

/// Decode `iw dev <iface> link` output
pub fn parse_link(output: &str) -> ConnectionInfo {
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed.starts_with("Not connected") {
        return ConnectionInfo::disconnected();
    }

    let mut info = ConnectionInfo {
        connected: true,
        ..Default::default()
    };

    for line in output.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Connected to ") {
            if let Some(mac) = rest.split_whitespace().next() {
                info.bssid = wifi_model::canonical_mac(mac);
            }
            continue;
        }
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        match key {
            "SSID" => info.ssid = value.to_string(),
            "freq" => {
                info.frequency = leading_float(value).map_or(0, |f| f.round() as u32);
            }
            "signal" => info.signal = leading_i32(value).unwrap_or(0),
            "rx bitrate" => {
                (info.rx_bitrate, info.rx_bitrate_info) = parse_bitrate(value);
            }
            "tx bitrate" => {
                (info.tx_bitrate, info.tx_bitrate_info) = parse_bitrate(value);
            }
            "RX" => info.rx_bytes = leading_u64(value).unwrap_or(0),
            "TX" => info.tx_bytes = leading_u64(value).unwrap_or(0),
            _ => {}
        }
    }

    info
}

/// Decode `iw dev <iface> station dump` output
///
/// Only the first station entry is read; a client interface has one.
pub fn parse_station(output: &str) -> StationStats {
    let mut stats = StationStats::disconnected();
    let mut seen_station = false;

    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("Station ") {
            if seen_station {
                break;
            }
            seen_station = true;
            stats.connected = true;
            if let Some(mac) = rest.split_whitespace().next() {
                stats.bssid = wifi_model::canonical_mac(mac);
            }
            continue;
        }
        if !seen_station {
            continue;
        }
        let Some((key, value)) = split_key_value(trimmed) else {
            continue;
        };
        match key {
            "signal" => stats.signal = leading_i32(value).unwrap_or(0),
            "signal avg" => stats.signal_avg = leading_i32(value),
            "tx bitrate" => {
                (stats.tx_bitrate, stats.tx_bitrate_info) = parse_bitrate(value);
            }
            "rx bitrate" => {
                (stats.rx_bitrate, stats.rx_bitrate_info) = parse_bitrate(value);
            }
            "tx retries" => stats.tx_retries = leading_u64(value).unwrap_or(0),
            "tx failed" => stats.tx_failed = leading_u64(value).unwrap_or(0),
            "rx bytes" => stats.rx_bytes = leading_u64(value).unwrap_or(0),
            "tx bytes" => stats.tx_bytes = leading_u64(value).unwrap_or(0),
            "rx packets" => stats.rx_packets = leading_u64(value).unwrap_or(0),
            "tx packets" => stats.tx_packets = leading_u64(value).unwrap_or(0),
            "connected time" => stats.connected_time = leading_u64(value).unwrap_or(0),
            "last ack signal" => stats.last_ack_signal = leading_i32(value),
            _ => {}
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: &str = "\
BSS aa:bb:cc:00:00:01(on wlan0) -- associated
\tTSF: 1234 usec (0d, 00:00:00)
\tfreq: 5180
\tbeacon interval: 100 TUs
\tcapability: ESS Privacy SpectrumMgmt (0x0111)
\tsignal: -52.00 dBm
\tSSID: Office
\tRSN:\t * Version: 1
\t\t * Group cipher: CCMP
\t\t * Pairwise ciphers: CCMP
\t\t * Authentication suites: SAE FT/SAE
\t\t * Capabilities: 1-PTKSA-RC 1-GTKSA-RC MFP-required MFP-capable (0x00c0)
\tBSS Load:
\t\t * station count: 4
\t\t * channel utilisation: 37/255
\tHT capabilities:
\t\tCapabilities: 0x9ef
\t\t\tHT20/HT40
\tVHT capabilities:
\t\tVHT RX MCS set:
\t\t\t1 streams: MCS 0-9
\t\t\t2 streams: MCS 0-9
\tVHT operation:
\t\t * channel width: 1 (80 MHz)
\tHE capabilities:
\t\tHE MAC Capabilities (0x000000000000):
\t\t\tTWT Responder
\tExtended capabilities:
\t\t * BSS Transition
\tCountry: de\tEnvironment: Indoor/Outdoor
\tWMM:\t * Parameter version 1

BSS aa:bb:cc:00:00:02(on wlan0)
\tfreq: 2437
\tcapability: ESS Privacy ShortSlotTime (0x0411)
\tsignal: -71.00 dBm
\tSSID: Legacy
";

    #[test]
    fn test_parse_scan_records() {
        let aps = parse_scan(SCAN);
        assert_eq!(aps.len(), 2);

        let office = &aps[0];
        assert_eq!(office.bssid, "aa:bb:cc:00:00:01");
        assert_eq!(office.ssid, "Office");
        assert_eq!(office.frequency, 5180);
        assert_eq!(office.signal, -52);
        assert_eq!(office.beacon_interval, 100);
        assert_eq!(office.security, Some(Security::Wpa3));
        assert_eq!(office.pmf, Some(Pmf::Required));
        assert!(office.fast_roaming);
        assert!(office.security_ciphers.contains("CCMP"));
        assert!(office.auth_methods.contains("SAE"));
        assert_eq!(office.bss_load_stations, 4);
        assert_eq!(office.bss_load_utilization, 37);
        assert_eq!(office.channel_width, 80);
        assert_eq!(office.mimo_streams, 2);
        assert!(office.has_capability(Capability::Ht));
        assert!(office.has_capability(Capability::Vht));
        assert!(office.has_capability(Capability::WiFi6));
        assert!(office.twt_support);
        assert!(office.bss_transition);
        assert!(office.qos_support);
        assert_eq!(office.country_code, "DE");

        let legacy = &aps[1];
        assert_eq!(legacy.security, Some(Security::Wep));
        assert!(legacy.security_ciphers.is_empty());
        assert_eq!(legacy.bss_load_stations, 0);
    }

    #[test]
    fn test_security_lines_outside_block_ignored() {
        let scan = "\
BSS 00:11:22:33:44:55(on wlan0)
\tSSID: Cafe
\t * Pairwise ciphers: TKIP
\t * Authentication suites: PSK
";
        let aps = parse_scan(scan);
        assert_eq!(aps.len(), 1);
        assert!(aps[0].security_ciphers.is_empty());
        assert!(aps[0].auth_methods.is_empty());
        assert_eq!(aps[0].security, None);
    }

    #[test]
    fn test_parse_scan_empty() {
        assert!(parse_scan("").is_empty());
        assert!(parse_scan("command failed: Device or resource busy (-16)").is_empty());
    }

    #[test]
    fn test_parse_link() {
        let output = "\
Connected to aa:bb:cc:dd:ee:ff (on wlan0)
\tSSID: Home
\tfreq: 5180.0
\tRX: 123456 bytes (789 packets)
\tTX: 65432 bytes (321 packets)
\tsignal: -52 dBm
\trx bitrate: 866.7 MBit/s VHT-MCS 9 80MHz short GI VHT-NSS 2
\ttx bitrate: 780.0 MBit/s VHT-MCS 8 80MHz short GI VHT-NSS 2
";
        let info = parse_link(output);
        assert!(info.connected);
        assert_eq!(info.bssid, "aa:bb:cc:dd:ee:ff");
        assert_eq!(info.ssid, "Home");
        assert_eq!(info.frequency, 5180);
        assert_eq!(info.signal, -52);
        assert_eq!(info.rx_bitrate, 866.7);
        assert_eq!(info.tx_bitrate_info, "VHT-MCS 8 80MHz short GI VHT-NSS 2");
        assert_eq!(info.rx_bytes, 123456);
        assert_eq!(info.tx_bytes, 65432);
    }

    #[test]
    fn test_parse_link_not_connected() {
        assert_eq!(parse_link("Not connected.\n"), ConnectionInfo::disconnected());
    }

    #[test]
    fn test_parse_station() {
        let output = "\
Station aa:bb:cc:dd:ee:ff (on wlan0)
\tinactive time:\t10 ms
\trx bytes:\t1234
\trx packets:\t56
\ttx bytes:\t789
\ttx packets:\t40
\ttx retries:\t2
\ttx failed:\t1
\tsignal:  \t-48 [-50, -52] dBm
\tsignal avg:\t-47 [-49, -51] dBm
\ttx bitrate:\t866.7 MBit/s VHT-MCS 9 80MHz short GI VHT-NSS 2
\tlast ack signal:-50 dBm
\tconnected time:\t3600 seconds
";
        let stats = parse_station(output);
        assert!(stats.connected);
        assert_eq!(stats.bssid, "aa:bb:cc:dd:ee:ff");
        assert_eq!(stats.signal, -48);
        assert_eq!(stats.signal_avg, Some(-47));
        assert_eq!(stats.rx_bytes, 1234);
        assert_eq!(stats.tx_packets, 40);
        assert_eq!(stats.tx_retries, 2);
        assert_eq!(stats.tx_failed, 1);
        assert_eq!(stats.connected_time, 3600);
        assert_eq!(stats.last_ack_signal, Some(-50));
        assert_eq!(stats.tx_bitrate, 866.7);
    }

    #[test]
    fn test_parse_station_empty() {
        assert!(!parse_station("").connected);
    }

    #[test]
    fn test_parse_interfaces() {
        let output = "\
phy#0
\tInterface wlan0
\t\tifindex 3
\t\ttype managed
\tInterface wlan1
";
        assert_eq!(parse_interfaces(output), vec!["wlan0", "wlan1"]);
    }

    #[test]
    fn test_permission_error() {
        assert!(is_permission_error(
            "command failed: Operation not permitted (-1)"
        ));
        assert!(!is_permission_error("BSS 00:11:22:33:44:55"));
    }
}
