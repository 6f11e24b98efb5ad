//! Small helpers shared by the line-oriented decoders

/// First (optionally negative) integer appearing anywhere in `s`
///
/// `"36 (5GHz, 80MHz)"` yields `36`, `"-55 dBm"` yields `-55`.
pub fn parse_first_int(s: &str) -> Option<i64> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let end = bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(bytes.len(), |n| start + n);
    let value: i64 = s[start..end].parse().ok()?;
    if start > 0 && bytes[start - 1] == b'-' {
        Some(-value)
    } else {
        Some(value)
    }
}

/// First decimal number appearing anywhere in `s`
pub fn parse_first_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let end = bytes[start..]
        .iter()
        .position(|b| !(b.is_ascii_digit() || *b == b'.'))
        .map_or(bytes.len(), |n| start + n);
    let value: f64 = s[start..end].trim_end_matches('.').parse().ok()?;
    if start > 0 && bytes[start - 1] == b'-' {
        Some(-value)
    } else {
        Some(value)
    }
}

/// Leading number of a value such as `"-61.00 dBm"` or `"2437.0"`
pub fn leading_float(s: &str) -> Option<f64> {
    s.split_whitespace().next()?.parse().ok()
}

/// Leading integer of a value such as `"12345 bytes"`
pub fn leading_u64(s: &str) -> Option<u64> {
    s.split_whitespace().next()?.parse().ok()
}

/// Leading signed integer of a value such as `"-48 [-50, -52] dBm"`
pub fn leading_i32(s: &str) -> Option<i32> {
    let token = s.split_whitespace().next()?;
    token
        .parse::<i32>()
        .ok()
        .or_else(|| token.parse::<f64>().ok().map(|f| f as i32))
}

/// Channel width in MHz from a description such as `"36 (5GHz, 80MHz)"`,
/// `"149/80"` or `"80 MHz"`
pub fn parse_channel_width(s: &str) -> Option<u32> {
    if let Some(idx) = s.find("MHz") {
        let digits: String = s[..idx]
            .trim_end()
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let width: String = digits.chars().rev().collect();
        if let Ok(width) = width.parse() {
            return Some(width);
        }
    }
    if let Some((_, rest)) = s.split_once('/') {
        return parse_first_int(rest).and_then(|w| u32::try_from(w).ok());
    }
    None
}

/// Whether `s` is six colon- or dash-separated hex octets
pub fn is_mac(s: &str) -> bool {
    let parts: Vec<&str> = s.split([':', '-']).collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

/// First MAC address found in `s`, canonicalized
pub fn extract_bssid(s: &str) -> Option<String> {
    s.split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ',' | ';' | '"'))
        .find(|token| is_mac(token))
        .map(wifi_model::canonical_mac)
}

/// Split a `key: value` line, trimming both sides
pub fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Append each comma- or space-separated token of `list` to `out`
pub fn extend_tokens(out: &mut std::collections::BTreeSet<String>, list: &str) {
    out.extend(
        list.split([',', ' '])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    );
}

/// Normalize a PHY mode label (`ax`, `11ac`, `802.11n`) to 802.11 naming
pub fn normalize_phy_mode(value: &str) -> String {
    let value = value.trim();
    if value.contains("802.11") {
        return value.to_string();
    }
    let lower = value.to_ascii_lowercase();
    if lower.contains("be") {
        "802.11be".to_string()
    } else if lower.contains("ax") {
        "802.11ax".to_string()
    } else if lower.contains("ac") {
        "802.11ac".to_string()
    } else if lower.contains('n') {
        "802.11n".to_string()
    } else {
        value.to_string()
    }
}
