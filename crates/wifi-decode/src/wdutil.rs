//! `wdutil info` decoder
//!
//! `wdutil` prints loosely aligned `Key : Value` pairs across several
//! sections. Keys are matched case-insensitively and placeholder values
//! (`None`, `n/a`, `null`) are dropped.

use std::collections::HashMap;

use wifi_model::{ConnectionInfo, StationStats};

use crate::text::{
    extract_bssid, normalize_phy_mode, parse_channel_width, parse_first_float, parse_first_int,
};
use crate::{as_text, DecodeError, Decoder, DecoderKind};

const BSSID_KEYS: &[&str] = &["bssid", "ap bssid", "current bssid"];
const SIGNAL_KEYS: &[&str] = &["rssi", "signal", "agrctlrssi"];
const RX_RATE_KEYS: &[&str] = &["rx rate", "last rx rate", "rx bitrate"];
const TX_RATE_KEYS: &[&str] = &["tx rate", "last tx rate", "tx bitrate"];
const CHANNEL_KEYS: &[&str] = &["channel", "primary channel"];

/// Lower-cased key/value pairs of one dump; later sections win
struct WdutilValues(HashMap<String, String>);

impl WdutilValues {
    fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let Some((key, value)) = line.trim().split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            if key.is_empty() || is_placeholder(value) {
                continue;
            }
            values.insert(key, value.to_string());
        }
        Self(values)
    }

    fn first(&self, keys: &[&str]) -> &str {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .map(String::as_str)
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }

    fn connected(&self) -> bool {
        let state = self.first(&["state", "status", "link status"]).to_ascii_lowercase();
        matches!(state.as_str(), "running" | "connected" | "up" | "active")
            || !self.first(&["ssid"]).is_empty()
            || !self.first(&["bssid"]).is_empty()
    }

    fn int(&self, keys: &[&str]) -> Option<i64> {
        parse_first_int(self.first(keys)).filter(|&v| v != 0)
    }

    fn float(&self, keys: &[&str]) -> f64 {
        parse_first_float(self.first(keys)).unwrap_or(0.0)
    }

    /// Channel and width, accepting `149`, `149 (5GHz, 80MHz)` and `5g149/80`
    fn channel(&self) -> (u32, u32) {
        let value = self.first(CHANNEL_KEYS);
        let (mut channel, mut width) = parse_slash_channel(value).unwrap_or((0, 0));
        if channel == 0 {
            channel = parse_first_int(value)
                .and_then(|c| u32::try_from(c).ok())
                .unwrap_or(0);
        }
        if let Some(w) = parse_channel_width(self.first(&["channel width", "chan width"])) {
            width = w;
        } else if width == 0 {
            width = parse_channel_width(value).unwrap_or(0);
        }
        (channel, width)
    }
}

fn is_placeholder(value: &str) -> bool {
    value.is_empty()
        || value.eq_ignore_ascii_case("none")
        || value.eq_ignore_ascii_case("n/a")
        || value.eq_ignore_ascii_case("null")
}

/// `5g149/80` or `149/80` form
fn parse_slash_channel(value: &str) -> Option<(u32, u32)> {
    let (left, right) = value.split_once('/')?;
    let left = left.trim();
    let left = ["2g", "5g", "6g", "2G", "5G", "6G"]
        .iter()
        .find_map(|p| left.strip_prefix(p))
        .unwrap_or(left);
    let channel = left.trim().parse().ok()?;
    let width = right
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()?;
    Some((channel, width))
}

/// Decoder for macOS `wdutil info` output
#[derive(Debug, Default, Clone, Copy)]
pub struct WdutilDecoder;

impl WdutilDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for WdutilDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Wdutil
    }

    fn parse_link(&self, raw: &[u8]) -> Result<ConnectionInfo, DecodeError> {
        let values = WdutilValues::parse(&as_text(raw));
        if !values.connected() {
            return Ok(ConnectionInfo::disconnected());
        }

        let (channel, width) = values.channel();
        let standard = values.first(&["phy mode", "phy", "protocol"]);
        Ok(ConnectionInfo {
            connected: true,
            ssid: values.first(&["ssid"]).to_string(),
            bssid: extract_bssid(values.first(BSSID_KEYS)).unwrap_or_default(),
            channel,
            channel_width: if width == 0 { 20 } else { width },
            signal: values.int(SIGNAL_KEYS).unwrap_or(0) as i32,
            noise: values.int(&["noise"]).map(|n| n as i32),
            rx_bitrate: values.float(RX_RATE_KEYS),
            tx_bitrate: values.float(TX_RATE_KEYS),
            wifi_standard: if standard.is_empty() {
                "802.11ac/n".to_string()
            } else {
                normalize_phy_mode(standard)
            },
            mimo_config: "1x1".to_string(),
            ..Default::default()
        })
    }

    fn parse_station(&self, raw: &[u8]) -> Result<StationStats, DecodeError> {
        let values = WdutilValues::parse(&as_text(raw));
        if !values.connected() {
            return Ok(StationStats::disconnected());
        }

        let signal = values.int(SIGNAL_KEYS).map(|s| s as i32);
        Ok(StationStats {
            connected: true,
            bssid: extract_bssid(values.first(BSSID_KEYS)).unwrap_or_default(),
            signal: signal.unwrap_or(0),
            signal_avg: signal,
            noise: values.int(&["noise"]).map(|n| n as i32),
            rx_bitrate: values.float(RX_RATE_KEYS),
            tx_bitrate: values.float(TX_RATE_KEYS),
            ..Default::default()
        })
    }
}
