//! Fixed-format BSS entry buffers
//!
//! Native scan APIs hand back one packed record per BSS followed by its raw
//! information elements:
//!
//! ```text
//! [bssid:6][freq_khz:u32 LE][rssi:i32 LE][link_quality:u8]
//! [capability:u16 LE][beacon_period:u16 LE][ssid_len:u8][ssid:32]
//! [ie_len:u32 LE][ies...]
//! ```
//!
//! Entries are concatenated. A truncated header ends decoding; a truncated IE
//! blob decodes its complete prefix.

use tracing::debug;
use wifi_model::{AccessPoint, Security};

use crate::ie::{apply_elements, parse_elements};
use crate::{DecodeError, Decoder, DecoderKind};

/// Size of the fixed header preceding the IE blob
pub const HEADER_LEN: usize = 56;

const SSID_FIELD_LEN: usize = 32;

/// Privacy bit of the capability information field
const CAPABILITY_PRIVACY: u16 = 0x0010;

/// One decoded BSS entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BssEntry {
    pub bssid: [u8; 6],
    pub frequency_khz: u32,
    pub rssi: i32,
    pub link_quality: u8,
    pub capability: u16,
    pub beacon_period: u16,
    pub ssid: Vec<u8>,
    pub ies: Vec<u8>,
}

impl BssEntry {
    /// Decode the entry at the start of `buf`, returning it and the bytes consumed
    pub fn decode(buf: &[u8]) -> Option<(Self, usize)> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        let u32_at = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        let u16_at = |at: usize| u16::from_le_bytes([buf[at], buf[at + 1]]);

        let mut bssid = [0u8; 6];
        bssid.copy_from_slice(&buf[..6]);
        let ssid_len = (buf[19] as usize).min(SSID_FIELD_LEN);
        let ie_len = u32_at(52) as usize;
        let ie_end = HEADER_LEN + ie_len.min(buf.len() - HEADER_LEN);

        let entry = Self {
            bssid,
            frequency_khz: u32_at(6),
            rssi: u32_at(10) as i32,
            link_quality: buf[14],
            capability: u16_at(15),
            beacon_period: u16_at(17),
            ssid: buf[20..20 + ssid_len].to_vec(),
            ies: buf[HEADER_LEN..ie_end].to_vec(),
        };
        Some((entry, ie_end))
    }

    /// Encode to the packed wire layout
    pub fn encode(&self) -> Vec<u8> {
        let ssid_len = self.ssid.len().min(SSID_FIELD_LEN);
        let mut buf = Vec::with_capacity(HEADER_LEN + self.ies.len());
        buf.extend_from_slice(&self.bssid);
        buf.extend_from_slice(&self.frequency_khz.to_le_bytes());
        buf.extend_from_slice(&self.rssi.to_le_bytes());
        buf.push(self.link_quality);
        buf.extend_from_slice(&self.capability.to_le_bytes());
        buf.extend_from_slice(&self.beacon_period.to_le_bytes());
        buf.push(ssid_len as u8);
        let mut ssid = [0u8; SSID_FIELD_LEN];
        ssid[..ssid_len].copy_from_slice(&self.ssid[..ssid_len]);
        buf.extend_from_slice(&ssid);
        buf.extend_from_slice(&(self.ies.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.ies);
        buf
    }

    /// Convert to a partially-populated access point
    pub fn to_access_point(&self) -> AccessPoint {
        let bssid = self
            .bssid
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":");
        let mut ap = AccessPoint::new(&bssid);
        ap.ssid = String::from_utf8_lossy(&self.ssid).into_owned();
        ap.frequency = self.frequency_khz / 1000;
        ap.signal = self.rssi;
        ap.beacon_interval = self.beacon_period as u32;

        apply_elements(&mut ap, &parse_elements(&self.ies));

        if ap.security.is_none() && self.capability & CAPABILITY_PRIVACY != 0 {
            ap.security = Some(Security::Wep);
        }
        ap
    }
}

/// Decode a single packed entry into an access point
pub fn parse_bss_entry(buf: &[u8]) -> Option<AccessPoint> {
    BssEntry::decode(buf).map(|(entry, _)| entry.to_access_point())
}

/// Decode every complete entry in a buffer of concatenated entries
pub fn parse_bss_entries(mut buf: &[u8]) -> Vec<AccessPoint> {
    let mut aps = Vec::new();
    while !buf.is_empty() {
        let Some((entry, consumed)) = BssEntry::decode(buf) else {
            debug!("Dropping truncated BSS entry ({} bytes)", buf.len());
            break;
        };
        aps.push(entry.to_access_point());
        buf = &buf[consumed..];
    }
    aps
}

/// Decoder for packed BSS entry buffers
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDecoder;

impl NativeDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for NativeDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Native
    }

    fn parse_scan(&self, raw: &[u8]) -> Result<Vec<AccessPoint>, DecodeError> {
        Ok(parse_bss_entries(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BssEntry {
        BssEntry {
            bssid: [0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22],
            frequency_khz: 5_180_000,
            rssi: -58,
            link_quality: 70,
            capability: CAPABILITY_PRIVACY,
            beacon_period: 100,
            ssid: b"Lab".to_vec(),
            ies: vec![38, 2, 17, 0],
        }
    }

    #[test]
    fn test_header_layout() {
        let buf = sample().encode();
        assert_eq!(buf.len(), HEADER_LEN + 4);
        let (decoded, consumed) = BssEntry::decode(&buf).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn test_to_access_point() {
        let ap = parse_bss_entry(&sample().encode()).unwrap();
        assert_eq!(ap.bssid, "aa:bb:cc:00:11:22");
        assert_eq!(ap.ssid, "Lab");
        assert_eq!(ap.frequency, 5180);
        assert_eq!(ap.signal, -58);
        assert_eq!(ap.beacon_interval, 100);
        assert_eq!(ap.tx_power, 17);
        assert_eq!(ap.security, Some(Security::Wep));
    }

    #[test]
    fn test_truncated_header_yields_nothing() {
        let buf = sample().encode();
        assert!(parse_bss_entry(&buf[..HEADER_LEN - 1]).is_none());
        assert!(parse_bss_entries(&buf[..10]).is_empty());
    }

    #[test]
    fn test_truncated_ies_keep_prefix() {
        let mut entry = sample();
        entry.ies = vec![38, 2, 17, 0, 45, 26, 0x02];
        let buf = entry.encode();
        let ap = parse_bss_entry(&buf).unwrap();
        assert_eq!(ap.tx_power, 17);
        assert_eq!(ap.channel_width, 0);
    }

    #[test]
    fn test_concatenated_entries() {
        let mut second = sample();
        second.bssid[5] = 0x23;
        second.capability = 0;
        let mut buf = sample().encode();
        buf.extend(second.encode());
        let aps = parse_bss_entries(&buf);
        assert_eq!(aps.len(), 2);
        assert_eq!(aps[1].bssid, "aa:bb:cc:00:11:23");
        assert_eq!(aps[1].security, None);
    }
}
