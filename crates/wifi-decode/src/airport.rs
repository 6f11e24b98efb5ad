//! `airport` decoder
//!
//! Scans come from `airport -s -x` (see [`crate::plist`]); link and station
//! queries both read the `airport -I` key/value dump:
//!
//! ```text
//!      agrCtlRSSI: -55
//!     agrCtlNoise: -92
//!           state: running
//!      lastTxRate: 866
//!           BSSID: aa:bb:cc:00:00:01
//!            SSID: Home
//!         channel: 149,80
//! ```

use tracing::debug;
use wifi_model::{AccessPoint, ConnectionInfo, StationStats};

use crate::text::{extract_bssid, leading_float, leading_i32, split_key_value};
use crate::{as_text, plist, DecodeError, Decoder, DecoderKind};

const DEFAULT_STANDARD: &str = "802.11ac/n";

/// Fields of one `airport -I` dump
#[derive(Debug, Default)]
struct AirportInfo {
    running: bool,
    ssid: String,
    bssid: String,
    signal: Option<i32>,
    noise: Option<i32>,
    tx_rate: f64,
    rx_rate: f64,
    channel: u32,
    channel_width: u32,
    streams: u32,
}

fn parse_info(text: &str) -> AirportInfo {
    let mut info = AirportInfo::default();
    for line in text.lines() {
        let Some((key, value)) = split_key_value(line.trim()) else {
            continue;
        };
        match key {
            "state" => info.running = value == "running",
            "SSID" => info.ssid = value.to_string(),
            "BSSID" => info.bssid = extract_bssid(value).unwrap_or_default(),
            "agrCtlRSSI" => info.signal = leading_i32(value),
            "agrCtlNoise" => info.noise = leading_i32(value),
            "lastTxRate" => info.tx_rate = leading_float(value).unwrap_or(0.0),
            "lastRxRate" => info.rx_rate = leading_float(value).unwrap_or(0.0),
            "NSS" => info.streams = value.parse().unwrap_or(0),
            "channel" => {
                let mut parts = value.split(',').map(str::trim);
                info.channel = parts.next().and_then(|c| c.parse().ok()).unwrap_or(0);
                info.channel_width = parts.next().and_then(|w| w.parse().ok()).unwrap_or(0);
            }
            _ => {}
        }
    }
    info
}

/// Decoder for macOS `airport` output
#[derive(Debug, Default, Clone, Copy)]
pub struct AirportDecoder;

impl AirportDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for AirportDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Airport
    }

    fn parse_scan(&self, raw: &[u8]) -> Result<Vec<AccessPoint>, DecodeError> {
        plist::parse_scan(&as_text(raw))
    }

    fn parse_link(&self, raw: &[u8]) -> Result<ConnectionInfo, DecodeError> {
        let info = parse_info(&as_text(raw));
        if !info.running {
            debug!("airport reports interface not running");
            return Ok(ConnectionInfo::disconnected());
        }

        Ok(ConnectionInfo {
            connected: true,
            ssid: info.ssid,
            bssid: info.bssid,
            channel: info.channel,
            channel_width: if info.channel_width == 0 {
                20
            } else {
                info.channel_width
            },
            signal: info.signal.unwrap_or(0),
            noise: info.noise,
            rx_bitrate: info.rx_rate,
            tx_bitrate: info.tx_rate,
            wifi_standard: DEFAULT_STANDARD.to_string(),
            mimo_config: match info.streams {
                0 => "1x1".to_string(),
                n => format!("{}x{}", n, n),
            },
            ..Default::default()
        })
    }

    fn parse_station(&self, raw: &[u8]) -> Result<StationStats, DecodeError> {
        let info = parse_info(&as_text(raw));
        if !info.running {
            return Ok(StationStats::disconnected());
        }

        Ok(StationStats {
            connected: true,
            bssid: info.bssid,
            signal: info.signal.unwrap_or(0),
            signal_avg: info.signal,
            noise: info.noise,
            rx_bitrate: info.rx_rate,
            tx_bitrate: info.tx_rate,
            ..Default::default()
        })
    }
}
