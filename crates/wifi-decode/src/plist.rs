//! XML property-list scan decoder (`airport -s -x`)
//!
//! The scan is a top-level `<array>` of `<dict>` records. Scalars are keyed by
//! the `<key>` immediately preceding them; an `<array>` value is joined into
//! one space-separated string. Dictionaries nested inside a record (raw IE
//! dumps and the like) are skipped without ending the record.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, trace};
use wifi_model::{AccessPoint, Capability, Pmf, Security};

use crate::text::parse_first_int;
use crate::DecodeError;

/// Scalar value of a property-list record
#[derive(Debug, Clone, PartialEq)]
pub enum PlistValue {
    String(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl PlistValue {
    fn as_text(&self) -> String {
        match self {
            PlistValue::String(s) => s.clone(),
            PlistValue::Integer(i) => i.to_string(),
            PlistValue::Real(f) => f.to_string(),
            PlistValue::Bool(b) => b.to_string(),
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            PlistValue::Integer(i) => Some(*i),
            PlistValue::Real(f) => Some(*f as i64),
            PlistValue::String(s) => parse_first_int(s),
            PlistValue::Bool(_) => None,
        }
    }

    fn as_bool(&self) -> bool {
        match self {
            PlistValue::Bool(b) => *b,
            PlistValue::Integer(i) => *i != 0,
            PlistValue::String(s) => {
                s.eq_ignore_ascii_case("true") || s == "1" || s.eq_ignore_ascii_case("yes")
            }
            PlistValue::Real(_) => false,
        }
    }
}

/// One top-level `<dict>` of the scan array
pub type PlistRecord = BTreeMap<String, PlistValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Array,
    Dict,
}

/// Parse the top-level array of dictionaries
///
/// A scalar that fails to unescape is dropped along with its key. A syntax
/// error ends the parse; records completed before it are kept, and the error
/// is only returned when there are none.
pub fn parse_records(xml: &str) -> Result<Vec<PlistRecord>, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut records = Vec::new();
    let mut record: Option<PlistRecord> = None;
    let mut key: Option<String> = None;
    let mut list: Option<Vec<String>> = None;
    let mut scalar_tag: Option<String> = None;
    let mut text = String::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) if records.is_empty() => return Err(e.into()),
            Err(e) => {
                debug!("Plist ends after {} records: {}", records.len(), e);
                break;
            }
        };

        match event {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match tag.as_str() {
                    "array" => {
                        if record.is_some() && is_record_level(&stack) {
                            list = Some(Vec::new());
                        }
                        stack.push(Frame::Array);
                    }
                    "dict" => {
                        if record.is_none() && !stack.contains(&Frame::Dict) && !stack.is_empty() {
                            record = Some(PlistRecord::new());
                            key = None;
                        }
                        stack.push(Frame::Dict);
                    }
                    _ => {
                        scalar_tag = Some(tag);
                        text.clear();
                    }
                }
            }
            Event::Text(t) => {
                if let Some(tag) = scalar_tag.as_deref() {
                    match t.unescape() {
                        Ok(value) => text.push_str(&value),
                        Err(e) => {
                            trace!("Skipping {} value: {}", tag, e);
                            scalar_tag = None;
                            if is_record_level(&stack) {
                                key = None;
                            }
                        }
                    }
                }
            }
            Event::Empty(e) => {
                let value = match e.name().as_ref() {
                    b"true" => Some(PlistValue::Bool(true)),
                    b"false" => Some(PlistValue::Bool(false)),
                    b"string" => Some(PlistValue::String(String::new())),
                    _ => None,
                };
                if let (Some(value), Some(rec)) = (value, record.as_mut()) {
                    if is_record_level(&stack) {
                        if let Some(k) = key.take() {
                            rec.insert(k, value);
                        }
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"array" => {
                    stack.pop();
                    if let (Some(items), Some(rec)) = (list.take(), record.as_mut()) {
                        if is_record_level(&stack) {
                            if let Some(k) = key.take() {
                                rec.insert(k, PlistValue::String(items.join(" ")));
                            }
                        } else {
                            list = Some(items);
                        }
                    }
                }
                b"dict" => {
                    stack.pop();
                    if !stack.contains(&Frame::Dict) {
                        if let Some(rec) = record.take() {
                            records.push(rec);
                        }
                    } else if is_record_level(&stack) {
                        // Nested dictionary consumed its key
                        key = None;
                    }
                }
                _ => {
                    if let Some(tag) = scalar_tag.take() {
                        let raw = std::mem::take(&mut text);
                        handle_scalar(&tag, raw, &stack, &mut record, &mut key, &mut list);
                    }
                }
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

/// Inside a record dictionary and not inside anything nested in it
fn is_record_level(stack: &[Frame]) -> bool {
    stack.last() == Some(&Frame::Dict) && stack.iter().filter(|f| **f == Frame::Dict).count() == 1
}

/// Inside an array that is the direct value of a record key
fn is_record_list(stack: &[Frame]) -> bool {
    stack.last() == Some(&Frame::Array) && is_record_level(&stack[..stack.len() - 1])
}

fn handle_scalar(
    tag: &str,
    raw: String,
    stack: &[Frame],
    record: &mut Option<PlistRecord>,
    key: &mut Option<String>,
    list: &mut Option<Vec<String>>,
) {
    let Some(rec) = record.as_mut() else {
        return;
    };
    if tag == "key" {
        if is_record_level(stack) {
            *key = Some(raw);
        }
        return;
    }
    if is_record_list(stack) {
        if let Some(items) = list.as_mut() {
            items.push(raw);
        }
        return;
    }
    if !is_record_level(stack) {
        return;
    }
    let value = match tag {
        "integer" => raw.trim().parse().map(PlistValue::Integer).ok(),
        "real" => raw.trim().parse().map(PlistValue::Real).ok(),
        "string" | "date" | "data" => Some(PlistValue::String(raw)),
        _ => None,
    };
    match (key.take(), value) {
        (Some(k), Some(v)) => {
            rec.insert(k, v);
        }
        (Some(k), None) => trace!("Skipping unreadable {} value for {}", tag, k),
        _ => {}
    }
}

fn get_string(rec: &PlistRecord, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| rec.get(*k))
        .map(|v| v.as_text().trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn get_int(rec: &PlistRecord, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|k| rec.get(*k))
        .filter_map(PlistValue::as_int)
        .find(|&v| v != 0)
}

fn get_bool(rec: &PlistRecord, key: &str) -> bool {
    rec.get(key).is_some_and(PlistValue::as_bool)
}

/// Apply a free-form security description such as `"WPA2 Personal (AES/PSK)"`
pub fn apply_security_text(ap: &mut AccessPoint, text: &str) {
    let upper = text.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return;
    }

    ap.security = Some(if upper.contains("WPA3") || upper.contains("SAE") {
        Security::Wpa3
    } else if upper.contains("WPA2") {
        Security::Wpa2
    } else if upper.contains("WPA") {
        Security::Wpa
    } else if upper.contains("WEP") {
        Security::Wep
    } else {
        Security::Open
    });

    for (token, cipher) in [("AES", "CCMP"), ("CCMP", "CCMP"), ("TKIP", "TKIP"), ("GCMP", "GCMP")] {
        if upper.contains(token) {
            ap.security_ciphers.insert(cipher.to_string());
        }
    }
    for (token, auth) in [("PSK", "PSK"), ("SAE", "SAE"), ("EAP", "802.1X"), ("8021X", "802.1X"), ("802.1X", "802.1X")] {
        if upper.contains(token) {
            ap.auth_methods.insert(auth.to_string());
        }
    }

    if upper.contains("MFP") || upper.contains("PMF") {
        ap.pmf = Some(if upper.contains("REQUIRED") {
            Pmf::Required
        } else {
            Pmf::Optional
        });
    }
}

/// Convert one record to an access point, skipping records without identity
pub fn record_to_access_point(rec: &PlistRecord) -> Option<AccessPoint> {
    let ssid = get_string(rec, &["SSID_STR", "SSID"]);
    let bssid = get_string(rec, &["BSSID"]);
    if ssid.is_empty() || bssid.is_empty() {
        trace!("Skipping plist record without SSID or BSSID");
        return None;
    }

    let mut ap = AccessPoint::new(&bssid);
    ap.ssid = ssid;
    ap.signal = get_int(rec, &["RSSI"]).unwrap_or(0) as i32;
    ap.channel = get_int(rec, &["CHANNEL"]).unwrap_or(0).max(0) as u32;
    ap.channel_width = get_int(rec, &["CHANNEL_WIDTH"]).unwrap_or(0).max(0) as u32;
    ap.noise = get_int(rec, &["NOISE"]).map(|n| n as i32);
    ap.dtim = get_int(rec, &["DTIM", "DTIM_PERIOD", "DTIM_INTERVAL"])
        .unwrap_or(0)
        .max(0) as u32;
    ap.country_code = get_string(rec, &["COUNTRY_CODE", "CC"]).to_ascii_uppercase();
    apply_security_text(&mut ap, &get_string(rec, &["SECURITY", "SECURITY_TYPE"]));

    if get_bool(rec, "HT") {
        ap.capabilities.insert(Capability::Ht);
    }
    if get_bool(rec, "VHT") {
        ap.capabilities.insert(Capability::Vht);
    }
    if get_bool(rec, "HE") {
        ap.capabilities.extend([Capability::He, Capability::WiFi6]);
    }

    Some(ap)
}

/// Decode an `airport -s -x` scan
pub fn parse_scan(xml: &str) -> Result<Vec<AccessPoint>, DecodeError> {
    Ok(parse_records(xml)?
        .iter()
        .filter_map(record_to_access_point)
        .collect())
}
