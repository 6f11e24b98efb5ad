//! `networksetup` decoder
//!
//! Only the SSID is available from `networksetup -getairportnetwork <if>`,
//! so it is the link source of last resort. `-listallhardwareports` is used
//! to find Wi-Fi interfaces when nothing better is installed.

use wifi_model::ConnectionInfo;

use crate::{as_text, DecodeError, Decoder, DecoderKind};

const NETWORK_PREFIX: &str = "Current Wi-Fi Network:";

/// Wi-Fi devices from `networksetup -listallhardwareports`
///
/// ```text
/// Hardware Port: Wi-Fi
/// Device: en0
/// Ethernet Address: 3c:22:fb:00:00:01
/// ```
pub fn parse_hardware_ports(raw: &[u8]) -> Vec<String> {
    let text = as_text(raw);
    let mut devices = Vec::new();
    let mut in_wifi_port = false;
    for line in text.lines().map(str::trim) {
        if let Some(port) = line.strip_prefix("Hardware Port:") {
            let port = port.trim();
            in_wifi_port = port.contains("Wi-Fi") || port.contains("AirPort");
        } else if let Some(device) = line.strip_prefix("Device:") {
            if in_wifi_port && !device.trim().is_empty() {
                devices.push(device.trim().to_string());
            }
            in_wifi_port = false;
        }
    }
    devices
}

/// Decoder for macOS `networksetup` output
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkSetupDecoder;

impl NetworkSetupDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for NetworkSetupDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::NetworkSetup
    }

    fn parse_link(&self, raw: &[u8]) -> Result<ConnectionInfo, DecodeError> {
        let text = as_text(raw);
        let line = text.trim();
        if line.to_ascii_lowercase().contains("not associated") || line.contains("Off") {
            return Ok(ConnectionInfo::disconnected());
        }

        let ssid = line
            .strip_prefix(NETWORK_PREFIX)
            .map(str::trim)
            .unwrap_or_default();
        if ssid.is_empty() {
            return Ok(ConnectionInfo::disconnected());
        }

        Ok(ConnectionInfo {
            connected: true,
            ssid: ssid.to_string(),
            ..Default::default()
        })
    }
}
