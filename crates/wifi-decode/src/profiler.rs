//! `system_profiler -json SPAirPortDataType` decoder
//!
//! The tree is `SPAirPortDataType[] -> spairport_airport_interfaces[]`, with
//! nearby networks under one of several keys depending on the OS release and
//! the current association under `spairport_current_network_information`.
//!
//! Recent releases redact BSSIDs for privacy. Such networks get a
//! pseudo-BSSID hashed from `ssid|channel|security` with the
//! locally-administered bit set, and are flagged with
//! [`AccessPoint::synthetic_bssid`]. Two networks that agree on all three
//! inputs collapse onto the same pseudo-BSSID.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};
use wifi_model::{AccessPoint, Capability, ConnectionInfo, StationStats};

use crate::plist::apply_security_text;
use crate::text::{
    extract_bssid, normalize_phy_mode, parse_channel_width, parse_first_float, parse_first_int,
};
use crate::{DecodeError, Decoder, DecoderKind};

type JsonMap = Map<String, Value>;

const NETWORK_LIST_KEYS: &[&str] = &[
    "spairport_airport_local_wireless_networks",
    "spairport_networks",
    "spairport_other_local_wireless_networks",
    "spairport_other_local_networks",
    "spairport_scan_results",
];

const NETWORK_MARKER_KEYS: &[&str] = &[
    "spairport_network_bssid",
    "spairport_network_name",
    "spairport_network_channel",
    "spairport_network_rssi",
    "spairport_network_signal",
    "spairport_network_security",
    "spairport_signal_noise",
    "spairport_security_mode",
    "_name",
    "SSID",
    "BSSID",
];

const SSID_KEYS: &[&str] = &["spairport_network_name", "_name", "SSID_STR", "SSID"];
const BSSID_KEYS: &[&str] = &[
    "spairport_network_bssid",
    "spairport_network_bssid_string",
    "BSSID",
];
const CHANNEL_KEYS: &[&str] = &["spairport_network_channel", "spairport_network_channel_string"];
const SIGNAL_KEYS: &[&str] = &["spairport_network_rssi", "spairport_network_signal", "RSSI"];
const NOISE_KEYS: &[&str] = &["spairport_network_noise", "NOISE"];
const SIGNAL_NOISE_KEY: &str = "spairport_signal_noise";

/// String form of the first non-empty scalar under any of `keys`
fn get_str(map: &JsonMap, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// First non-zero integer under any of `keys`, reading numbers or numeric text
fn get_int(map: &JsonMap, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .filter_map(|v| match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => parse_first_int(s),
            _ => None,
        })
        .find(|&v| v != 0)
}

/// `"-55 dBm / -92 dBm"` split into signal and noise
fn parse_signal_noise(value: &str) -> (Option<i64>, Option<i64>) {
    match value.split_once('/') {
        Some((signal, noise)) => (parse_first_int(signal), parse_first_int(noise)),
        None => (parse_first_int(value), None),
    }
}

/// Pseudo-BSSID for a network whose BSSID is redacted
pub fn synthesize_bssid(ssid: &str, channel: &str, security: &str) -> String {
    let digest = Sha256::digest(format!("{}|{}|{}", ssid, channel, security).as_bytes());
    let mut octets = [0u8; 6];
    octets.copy_from_slice(&digest[..6]);
    // Locally administered, unicast
    octets[0] = (octets[0] | 0x02) & 0xFE;
    octets
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn normalize_security_label(value: &str) -> String {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    if value.is_empty() {
        String::new()
    } else if lower.contains("wpa3") {
        "WPA3".to_string()
    } else if lower.contains("wpa2") {
        "WPA2".to_string()
    } else if lower.contains("wpa") {
        "WPA".to_string()
    } else if lower.contains("wep") {
        "WEP".to_string()
    } else if lower.contains("open") || lower.contains("none") {
        "Open".to_string()
    } else {
        value.to_ascii_uppercase().replace('_', " ")
    }
}

fn apply_phy_mode(ap: &mut AccessPoint, phy_mode: &str) {
    for token in phy_mode.to_ascii_lowercase().split(['/', ' ', ',']) {
        match token.trim_start_matches("802.11") {
            "n" => {
                ap.capabilities.insert(Capability::Ht);
            }
            "ac" => {
                ap.capabilities.insert(Capability::Vht);
            }
            "ax" => {
                ap.capabilities.extend([Capability::He, Capability::WiFi6]);
            }
            "be" => {
                ap.capabilities.extend([Capability::Eht, Capability::WiFi7]);
            }
            _ => {}
        }
    }
}

fn interfaces(root: &Value) -> Result<Vec<&JsonMap>, DecodeError> {
    let items = root
        .get("SPAirPortDataType")
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::InvalidFormat("missing SPAirPortDataType".to_string()))?;
    Ok(items
        .iter()
        .filter_map(|item| item.get("spairport_airport_interfaces"))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(Value::as_object)
        .collect())
}

/// Entries of a JSON array that carry at least one network marker key
fn as_networks(value: &Value) -> Vec<&JsonMap> {
    value
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(Value::as_object)
                .filter(|m| NETWORK_MARKER_KEYS.iter().any(|k| m.contains_key(*k)))
                .collect()
        })
        .unwrap_or_default()
}

fn network_entries(iface: &JsonMap) -> Vec<&JsonMap> {
    for key in NETWORK_LIST_KEYS {
        if let Some(entries) = iface.get(*key).map(as_networks) {
            if !entries.is_empty() {
                return entries;
            }
        }
    }

    // Unknown release: take the first list that looks like networks
    iface
        .values()
        .map(as_networks)
        .find(|entries| !entries.is_empty())
        .unwrap_or_default()
}

fn network_to_access_point(entry: &JsonMap) -> Option<AccessPoint> {
    let ssid = get_str(entry, SSID_KEYS);
    if ssid.is_empty() {
        trace!("Skipping system_profiler network without a name");
        return None;
    }
    let channel_text = get_str(entry, CHANNEL_KEYS);
    let security_raw = get_str(
        entry,
        &["spairport_network_security", "spairport_network_security_type", "spairport_security_mode"],
    );

    let (bssid, synthetic) = match extract_bssid(&get_str(entry, BSSID_KEYS)) {
        Some(bssid) => (bssid, false),
        None => (synthesize_bssid(&ssid, &channel_text, &security_raw), true),
    };

    let mut ap = AccessPoint::new(&bssid);
    ap.ssid = ssid;
    ap.synthetic_bssid = synthetic;

    let (pair_signal, pair_noise) = parse_signal_noise(&get_str(entry, &[SIGNAL_NOISE_KEY]));
    ap.signal = get_int(entry, SIGNAL_KEYS).or(pair_signal).unwrap_or(0) as i32;
    ap.noise = get_int(entry, NOISE_KEYS).or(pair_noise).map(|n| n as i32);

    ap.channel = get_int(entry, &["spairport_network_channel", "CHANNEL"])
        .or_else(|| parse_first_int(&channel_text))
        .and_then(|c| u32::try_from(c).ok())
        .unwrap_or(0);
    ap.channel_width = get_int(entry, &["spairport_network_channel_width", "CHANNEL_WIDTH"])
        .and_then(|w| u32::try_from(w).ok())
        .or_else(|| parse_channel_width(&channel_text))
        .unwrap_or(0);

    apply_security_text(&mut ap, &normalize_security_label(&security_raw));
    ap.country_code = get_str(
        entry,
        &["spairport_network_country_code", "spairport_network_country"],
    )
    .to_ascii_uppercase();
    apply_phy_mode(&mut ap, &get_str(entry, &["spairport_network_phymode"]));

    Some(ap)
}

fn current_network(raw: &[u8]) -> Result<Option<JsonMap>, DecodeError> {
    let root: Value = serde_json::from_slice(raw)?;
    let Ok(ifaces) = interfaces(&root) else {
        return Ok(None);
    };
    for iface in ifaces {
        let current = iface
            .get("spairport_current_network_information")
            .or_else(|| iface.get("spairport_current_network"))
            .and_then(Value::as_object);
        if let Some(current) = current {
            if !get_str(current, SSID_KEYS).is_empty() || !get_str(current, BSSID_KEYS).is_empty() {
                return Ok(Some(current.clone()));
            }
        }
    }
    Ok(None)
}

fn signal_and_noise(current: &JsonMap) -> (Option<i32>, Option<i32>) {
    let (pair_signal, pair_noise) = parse_signal_noise(&get_str(current, &[SIGNAL_NOISE_KEY]));
    let signal = get_int(current, SIGNAL_KEYS).or(pair_signal).map(|s| s as i32);
    let noise = get_int(current, NOISE_KEYS).or(pair_noise).map(|n| n as i32);
    (signal, noise)
}

fn rates(current: &JsonMap) -> (f64, f64) {
    let rate = |keys: &[&str]| parse_first_float(&get_str(current, keys)).unwrap_or(0.0);
    let rx = rate(&["spairport_network_last_rx_rate", "spairport_network_rx_rate", "RxRate"]);
    let tx = rate(&[
        "spairport_network_last_tx_rate",
        "spairport_network_tx_rate",
        "spairport_network_rate",
        "TxRate",
    ]);
    (rx, tx)
}

/// Interface names listed under `spairport_airport_interfaces`
pub fn parse_interfaces(raw: &[u8]) -> Result<Vec<String>, DecodeError> {
    let root: Value = serde_json::from_slice(raw)?;
    Ok(interfaces(&root)?
        .into_iter()
        .map(|iface| get_str(iface, &["_name"]))
        .filter(|name| !name.is_empty())
        .collect())
}

/// Decoder for `system_profiler -json SPAirPortDataType`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProfilerDecoder;

impl SystemProfilerDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for SystemProfilerDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::SystemProfiler
    }

    fn parse_scan(&self, raw: &[u8]) -> Result<Vec<AccessPoint>, DecodeError> {
        let root: Value = serde_json::from_slice(raw)?;
        let aps: Vec<AccessPoint> = interfaces(&root)?
            .into_iter()
            .flat_map(network_entries)
            .filter_map(network_to_access_point)
            .collect();
        if aps.is_empty() {
            debug!("system_profiler listed no nearby networks");
        }
        Ok(aps)
    }

    fn parse_link(&self, raw: &[u8]) -> Result<ConnectionInfo, DecodeError> {
        let Some(current) = current_network(raw)? else {
            return Ok(ConnectionInfo::disconnected());
        };

        let channel_text = get_str(&current, CHANNEL_KEYS);
        let (signal, noise) = signal_and_noise(&current);
        let (rx_bitrate, tx_bitrate) = rates(&current);
        let standard = get_str(&current, &["spairport_network_phy_mode", "spairport_network_phymode", "PHYMode"]);

        Ok(ConnectionInfo {
            connected: true,
            ssid: get_str(&current, SSID_KEYS),
            bssid: extract_bssid(&get_str(&current, BSSID_KEYS)).unwrap_or_default(),
            channel: parse_first_int(&channel_text)
                .and_then(|c| u32::try_from(c).ok())
                .unwrap_or(0),
            channel_width: parse_channel_width(&channel_text).unwrap_or(20),
            signal: signal.unwrap_or(0),
            noise,
            rx_bitrate,
            tx_bitrate,
            wifi_standard: if standard.is_empty() {
                "802.11ac/n".to_string()
            } else {
                normalize_phy_mode(&standard)
            },
            mimo_config: "1x1".to_string(),
            ..Default::default()
        })
    }

    fn parse_station(&self, raw: &[u8]) -> Result<StationStats, DecodeError> {
        let Some(current) = current_network(raw)? else {
            return Ok(StationStats::disconnected());
        };

        let (signal, noise) = signal_and_noise(&current);
        let (rx_bitrate, tx_bitrate) = rates(&current);
        Ok(StationStats {
            connected: true,
            bssid: extract_bssid(&get_str(&current, BSSID_KEYS)).unwrap_or_default(),
            signal: signal.unwrap_or(0),
            signal_avg: signal,
            noise,
            rx_bitrate,
            tx_bitrate,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifi_model::Security;

    const PROFILE: &str = r#"{
  "SPAirPortDataType": [
    {
      "spairport_airport_interfaces": [
        {
          "_name": "en0",
          "spairport_current_network_information": {
            "_name": "Home",
            "spairport_network_channel": "149 (5GHz, 80MHz)",
            "spairport_network_phymode": "802.11ax",
            "spairport_network_rate": 864,
            "spairport_security_mode": "spairport_security_mode_wpa2_personal",
            "spairport_signal_noise": "-52 dBm / -95 dBm"
          },
          "spairport_airport_other_local_wireless_networks": [],
          "spairport_airport_local_wireless_networks": [
            {
              "_name": "Neighbor",
              "spairport_network_channel": "6 (2GHz, 20MHz)",
              "spairport_network_phymode": "802.11b/g/n",
              "spairport_security_mode": "spairport_security_mode_wpa3_transition",
              "spairport_signal_noise": "-71 dBm / -90 dBm"
            },
            {
              "_name": "Lab",
              "spairport_network_bssid": "AA:BB:CC:00:00:09",
              "spairport_network_channel": 36,
              "spairport_network_rssi": -60,
              "spairport_security_mode": "spairport_security_mode_none"
            },
            {
              "spairport_network_channel": "11 (2GHz, 20MHz)"
            }
          ]
        },
        { "_name": "awdl0" }
      ]
    }
  ]
}"#;

    #[test]
    fn test_parse_scan() {
        let aps = SystemProfilerDecoder::new().parse_scan(PROFILE.as_bytes()).unwrap();
        assert_eq!(aps.len(), 2);

        let neighbor = &aps[0];
        assert_eq!(neighbor.ssid, "Neighbor");
        assert!(neighbor.synthetic_bssid);
        assert_eq!(neighbor.channel, 6);
        assert_eq!(neighbor.channel_width, 20);
        assert_eq!(neighbor.signal, -71);
        assert_eq!(neighbor.noise, Some(-90));
        assert_eq!(neighbor.security, Some(Security::Wpa3));
        assert!(neighbor.has_capability(Capability::Ht));

        let lab = &aps[1];
        assert_eq!(lab.bssid, "aa:bb:cc:00:00:09");
        assert!(!lab.synthetic_bssid);
        assert_eq!(lab.channel, 36);
        assert_eq!(lab.signal, -60);
        assert_eq!(lab.security, Some(Security::Open));
    }

    #[test]
    fn test_synthetic_bssid_is_local_and_stable() {
        let a = synthesize_bssid("Neighbor", "6 (2GHz, 20MHz)", "wpa2");
        let b = synthesize_bssid("Neighbor", "6 (2GHz, 20MHz)", "wpa2");
        let c = synthesize_bssid("Neighbor", "11 (2GHz, 20MHz)", "wpa2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 17);
        let first = u8::from_str_radix(&a[..2], 16).unwrap();
        assert_eq!(first & 0x02, 0x02);
        assert_eq!(first & 0x01, 0x00);
    }

    #[test]
    fn test_missing_root_is_invalid() {
        let err = SystemProfilerDecoder::new().parse_scan(br#"{"other": []}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFormat(_)));
        let err = SystemProfilerDecoder::new().parse_scan(b"not json").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_fallback_network_list() {
        let json = r#"{"SPAirPortDataType":[{"spairport_airport_interfaces":[{"_name":"en0",
            "some_future_key":[{"SSID":"Future","BSSID":"00:11:22:33:44:55","RSSI":-40}]}]}]}"#;
        let aps = SystemProfilerDecoder::new().parse_scan(json.as_bytes()).unwrap();
        assert_eq!(aps.len(), 1);
        assert_eq!(aps[0].ssid, "Future");
        assert_eq!(aps[0].signal, -40);
    }

    #[test]
    fn test_parse_link() {
        let conn = SystemProfilerDecoder::new().parse_link(PROFILE.as_bytes()).unwrap();
        assert!(conn.connected);
        assert_eq!(conn.ssid, "Home");
        assert_eq!(conn.bssid, "");
        assert_eq!(conn.channel, 149);
        assert_eq!(conn.channel_width, 80);
        assert_eq!(conn.signal, -52);
        assert_eq!(conn.noise, Some(-95));
        assert_eq!(conn.tx_bitrate, 864.0);
        assert_eq!(conn.wifi_standard, "802.11ax");
    }

    #[test]
    fn test_parse_link_without_current_network() {
        let json = br#"{"SPAirPortDataType":[{"spairport_airport_interfaces":[{"_name":"en0"}]}]}"#;
        let conn = SystemProfilerDecoder::new().parse_link(json).unwrap();
        assert!(!conn.connected);
        let stats = SystemProfilerDecoder::new().parse_station(json).unwrap();
        assert!(!stats.connected);
    }

    #[test]
    fn test_parse_interfaces() {
        assert_eq!(
            parse_interfaces(PROFILE.as_bytes()).unwrap(),
            vec!["en0".to_string(), "awdl0".to_string()]
        );
    }
}
