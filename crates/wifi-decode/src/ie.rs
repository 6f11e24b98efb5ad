//! 802.11 information element decoder
//!
//! Information elements are `(id, length, payload)` triples. Each sub-parser
//! checks its own payload length before indexing and does nothing when the
//! payload is too short, so a malformed element never aborts a scan.
//!
//! Bit positions follow IEEE 802.11-2020 (HT, VHT, RSN, extended and RM
//! capabilities) and 802.11ax/be (HE and EHT elements).

use tracing::trace;
use wifi_model::{AccessPoint, Capability, Pmf, Security};

/// Element IDs decoded here
pub mod element_id {
    pub const COUNTRY: u8 = 7;
    pub const TPC_REPORT: u8 = 38;
    pub const HT_CAPABILITIES: u8 = 45;
    pub const RSN: u8 = 48;
    pub const HT_OPERATION: u8 = 61;
    pub const RM_CAPABILITIES: u8 = 70;
    pub const EXTENDED_CAPABILITIES: u8 = 127;
    pub const VHT_CAPABILITIES: u8 = 191;
    pub const VHT_OPERATION: u8 = 192;
    pub const VENDOR_SPECIFIC: u8 = 221;
    pub const EXTENSION: u8 = 255;
}

/// Extension element IDs (element 255, first payload octet)
pub mod extension_id {
    pub const HE_CAPABILITIES: u8 = 35;
    pub const HE_OPERATION: u8 = 36;
    pub const EHT_OPERATION: u8 = 106;
    pub const EHT_CAPABILITIES: u8 = 108;
}

const WFA_OUI: [u8; 3] = [0x00, 0x50, 0xF2];
const IEEE_OUI: [u8; 3] = [0x00, 0x0F, 0xAC];

/// One element borrowed from an IE blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InformationElement<'a> {
    pub id: u8,
    pub data: &'a [u8],
}

/// Split an IE blob into elements
///
/// A trailing element whose declared length runs past the end of the buffer
/// is dropped along with anything after it.
pub fn parse_elements(mut buf: &[u8]) -> Vec<InformationElement<'_>> {
    let mut elements = Vec::new();
    while buf.len() >= 2 {
        let id = buf[0];
        let len = buf[1] as usize;
        let rest = &buf[2..];
        if len > rest.len() {
            trace!("Dropping truncated element {} ({} > {} bytes)", id, len, rest.len());
            break;
        }
        elements.push(InformationElement {
            id,
            data: &rest[..len],
        });
        buf = &rest[len..];
    }
    elements
}

/// Apply every recognised element to an access point
pub fn apply_elements(ap: &mut AccessPoint, elements: &[InformationElement<'_>]) {
    for element in elements {
        let data = element.data;
        match element.id {
            element_id::HT_CAPABILITIES => parse_ht_capabilities(data, ap),
            element_id::HT_OPERATION => parse_ht_operation(data, ap),
            element_id::RM_CAPABILITIES => parse_rm_capabilities(data, ap),
            element_id::VHT_CAPABILITIES => parse_vht_capabilities(data, ap),
            element_id::VHT_OPERATION => parse_vht_operation(data, ap),
            element_id::EXTENSION => parse_extension(data, ap),
            element_id::TPC_REPORT => parse_tpc_report(data, ap),
            element_id::COUNTRY => parse_country(data, ap),
            element_id::EXTENDED_CAPABILITIES => parse_extended_capabilities(data, ap),
            element_id::VENDOR_SPECIFIC => parse_vendor_specific(data, ap),
            element_id::RSN => parse_rsn(data, ap),
            _ => {}
        }
    }
}

fn widen(ap: &mut AccessPoint, width: u32) {
    ap.channel_width = ap.channel_width.max(width);
}

/// Highest spatial stream whose 2-bit MCS map entry is not `0b11`
fn streams_from_mcs_map(map: u16) -> u32 {
    (0..8)
        .filter(|ss| (map >> (ss * 2)) & 0x03 != 0x03)
        .map(|ss| ss + 1)
        .max()
        .unwrap_or(0)
}

fn raise_streams(ap: &mut AccessPoint, streams: u32) {
    ap.mimo_streams = ap.mimo_streams.max(streams);
}

fn parse_ht_capabilities(data: &[u8], ap: &mut AccessPoint) {
    // Capability info (2) + A-MPDU params (1) + supported MCS set (16)
    if data.len() < 3 {
        return;
    }
    ap.capabilities.insert(Capability::Ht);

    let info = u16::from_le_bytes([data[0], data[1]]);
    if info & 0x0002 != 0 {
        widen(ap, 40);
    }

    // RX MCS bitmask, one octet (eight MCS indexes) per stream
    if data.len() >= 7 {
        let streams = data[3..7]
            .iter()
            .rposition(|&mask| mask != 0)
            .map_or(0, |idx| idx as u32 + 1);
        raise_streams(ap, streams);
    }
}

fn parse_ht_operation(data: &[u8], ap: &mut AccessPoint) {
    if data.len() < 2 {
        return;
    }
    // STA channel width, bit 2 of the second octet
    if data[1] & 0x04 != 0 {
        widen(ap, 40);
    }
}

fn parse_rm_capabilities(data: &[u8], ap: &mut AccessPoint) {
    if data.is_empty() {
        return;
    }
    if data[0] & 0x02 != 0 {
        ap.neighbor_report = true;
    }
}

fn parse_vht_capabilities(data: &[u8], ap: &mut AccessPoint) {
    // Capability info (4) + supported MCS set (8)
    if data.len() < 12 {
        return;
    }
    ap.capabilities.insert(Capability::Vht);

    let width_set = (data[0] >> 2) & 0x03;
    if width_set == 1 || width_set == 2 {
        widen(ap, 160);
    }
    // MU beamformer, bit 19
    if data[2] & 0x08 != 0 {
        ap.mu_mimo = true;
    }

    let rx_map = u16::from_le_bytes([data[4], data[5]]);
    raise_streams(ap, streams_from_mcs_map(rx_map));
}

fn parse_vht_operation(data: &[u8], ap: &mut AccessPoint) {
    if data.is_empty() {
        return;
    }
    match data[0] {
        1 => widen(ap, 80),
        2 | 3 => widen(ap, 160),
        _ => {}
    }
}

fn parse_extension(data: &[u8], ap: &mut AccessPoint) {
    let Some((&ext_id, payload)) = data.split_first() else {
        return;
    };
    match ext_id {
        extension_id::HE_CAPABILITIES => parse_he_capabilities(payload, ap),
        extension_id::HE_OPERATION => parse_he_operation(payload, ap),
        extension_id::EHT_CAPABILITIES => {
            ap.capabilities.extend([Capability::Eht, Capability::WiFi7]);
        }
        extension_id::EHT_OPERATION => parse_eht_operation(payload, ap),
        _ => {}
    }
}

fn parse_he_capabilities(data: &[u8], ap: &mut AccessPoint) {
    // MAC capabilities (6) + PHY capabilities (11) + MCS/NSS sets
    if data.len() < 17 {
        return;
    }
    ap.capabilities.extend([Capability::He, Capability::WiFi6]);

    // TWT responder, MAC capability bit 11
    if data[1] & 0x08 != 0 {
        ap.twt_support = true;
        ap.capabilities.insert(Capability::Twt);
    }

    let phy = &data[6..17];
    if phy[2] & 0x10 != 0 {
        ap.mu_mimo = true;
    }
    if phy[3] & 0x10 != 0 {
        ap.obss_pd = true;
    }
    if phy[4] & 0x18 != 0 {
        ap.qam_support = ap.qam_support.max(1024);
    }

    if data.len() >= 19 {
        let rx_map = u16::from_le_bytes([data[17], data[18]]);
        raise_streams(ap, streams_from_mcs_map(rx_map));
    }
}

fn parse_he_operation(data: &[u8], ap: &mut AccessPoint) {
    // Operation parameters (3) + BSS color information (1)
    if data.len() < 4 {
        return;
    }
    ap.bss_color = data[3] & 0x3F;
}

fn parse_eht_operation(data: &[u8], ap: &mut AccessPoint) {
    ap.capabilities.extend([Capability::Eht, Capability::WiFi7]);

    // Parameters (1) + basic MCS/NSS set (4) + optional operation information
    if data.len() < 6 || data[0] & 0x01 == 0 {
        return;
    }
    if data[5] & 0x07 == 4 {
        widen(ap, 320);
    }
}

fn parse_tpc_report(data: &[u8], ap: &mut AccessPoint) {
    if data.len() < 2 {
        return;
    }
    ap.tx_power = data[0] as i8 as i32;
}

fn parse_country(data: &[u8], ap: &mut AccessPoint) {
    if data.len() < 3 {
        return;
    }
    let code: String = data[..2]
        .iter()
        .filter(|b| b.is_ascii_graphic())
        .map(|&b| b as char)
        .collect();
    ap.country_code = code.trim().to_ascii_uppercase();
}

fn parse_extended_capabilities(data: &[u8], ap: &mut AccessPoint) {
    if let Some(&octet) = data.first() {
        if octet & 0x40 != 0 {
            ap.uapsd = true;
        }
    }
    // BSS transition, bit 19
    if data.len() >= 3 && data[2] & 0x08 != 0 {
        ap.bss_transition = true;
    }
}

fn parse_vendor_specific(data: &[u8], ap: &mut AccessPoint) {
    if data.len() < 4 {
        return;
    }
    let oui = [data[0], data[1], data[2]];
    if oui == WFA_OUI {
        match data[3] {
            0x01 if ap.security.is_none() => ap.security = Some(Security::Wpa),
            0x02 => ap.qos_support = true,
            0x04 => ap.wps = true,
            _ => {}
        }
    } else if oui == IEEE_OUI && data.len() >= 5 && data[4] == 0x13 {
        let name = String::from_utf8_lossy(&data[5..]);
        ap.ap_name = name.trim_matches(char::from(0)).trim().to_string();
    }
}

fn cipher_name(suite_type: u8) -> Option<&'static str> {
    match suite_type {
        1 => Some("WEP-40"),
        2 => Some("TKIP"),
        4 => Some("CCMP"),
        5 => Some("WEP-104"),
        8 => Some("GCMP"),
        9 => Some("GCMP-256"),
        10 => Some("CCMP-256"),
        _ => None,
    }
}

fn akm_name(suite_type: u8) -> Option<&'static str> {
    match suite_type {
        1 => Some("802.1X"),
        2 => Some("PSK"),
        3 => Some("FT/802.1X"),
        4 => Some("FT/PSK"),
        5 => Some("802.1X-SHA256"),
        6 => Some("PSK-SHA256"),
        8 => Some("SAE"),
        9 => Some("FT/SAE"),
        11 => Some("802.1X-SuiteB"),
        12 => Some("802.1X-SuiteB-192"),
        13 => Some("FT/802.1X-SHA384"),
        18 => Some("OWE"),
        19 => Some("FT/PSK-SHA384"),
        24 => Some("SAE-EXT-KEY"),
        25 => Some("FT/SAE-EXT-KEY"),
        _ => None,
    }
}

/// Reads little-endian fields off the front of a slice
struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.buf.len() < n {
            return None;
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Some(head)
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    /// Suite type of a suite selector carrying the IEEE OUI
    fn suite_list(&mut self) -> Option<Vec<u8>> {
        let count = self.u16()? as usize;
        let mut suites = Vec::with_capacity(count.min(16));
        for _ in 0..count {
            let suite = self.take(4)?;
            if suite[..3] == IEEE_OUI {
                suites.push(suite[3]);
            }
        }
        Some(suites)
    }
}

/// Decode an RSN element: version, group cipher, pairwise and AKM suite
/// lists, then the RSN capabilities field
///
/// Trailing fields are optional; a short payload still marks the BSS as WPA2.
fn parse_rsn(data: &[u8], ap: &mut AccessPoint) {
    let mut security = Security::Wpa2;
    let mut cursor = Cursor { buf: data };

    // Version
    if cursor.u16().is_some() {
        if let Some(group) = cursor.take(4) {
            if group[..3] == IEEE_OUI {
                if let Some(name) = cipher_name(group[3]) {
                    ap.security_ciphers.insert(name.to_string());
                }
            }
        }
        if let Some(pairwise) = cursor.suite_list() {
            ap.security_ciphers
                .extend(pairwise.into_iter().filter_map(cipher_name).map(String::from));
        }
        if let Some(akms) = cursor.suite_list() {
            if akms.iter().any(|&a| matches!(a, 8 | 9 | 18 | 24 | 25)) {
                security = Security::Wpa3;
            } else if akms.iter().any(|&a| matches!(a, 11 | 12)) {
                security = Security::Wpa3Enterprise;
            }
            if akms.iter().any(|&a| matches!(a, 3 | 4 | 9 | 13 | 19 | 25)) {
                ap.fast_roaming = true;
            }
            ap.auth_methods
                .extend(akms.into_iter().filter_map(akm_name).map(String::from));
        }
        if let Some(caps) = cursor.u16() {
            ap.pmf = Some(if caps & 0x0040 != 0 {
                Pmf::Required
            } else if caps & 0x0080 != 0 {
                Pmf::Optional
            } else {
                Pmf::Disabled
            });
        }
    }

    ap.security = Some(ap.security.map_or(security, |s| s.max(security)));
}
