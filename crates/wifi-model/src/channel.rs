//! Channel numbering and frequency mapping
//!
//! Channel numbers are only unique within a band, so conversion towards a
//! frequency needs the band while conversion from a frequency does not.
//!
//! | Band    | Channels                  | Center frequency (MHz)        |
//! |---------|---------------------------|-------------------------------|
//! | 2.4 GHz | 1-13, 14                  | 2407 + 5*ch, 2484             |
//! | 5 GHz   | 32-177                    | 5000 + 5*ch                   |
//! | 6 GHz   | 1, 5, 9 ... 233 and 2, 6  | 5950 + 5*ch, 5935, 5965       |

use crate::Band;

/// 5 GHz channels that require Dynamic Frequency Selection (radar avoidance)
pub const DFS_CHANNELS: [u32; 16] = [
    52, 56, 60, 64, 100, 104, 108, 112, 116, 120, 124, 128, 132, 136, 140, 144,
];

/// 6 GHz channels whose frequency does not follow the 5950 + 5*ch rule
const SIX_GHZ_SPECIAL: [(u32, u32); 2] = [(2, 5935), (6, 5965)];

/// Convert a channel number within a band to its center frequency
pub fn channel_to_frequency(channel: u32, band: Band) -> Option<u32> {
    match band {
        Band::Ghz2_4 => match channel {
            1..=13 => Some(2407 + 5 * channel),
            14 => Some(2484),
            _ => None,
        },
        Band::Ghz5 => match channel {
            32..=177 => Some(5000 + 5 * channel),
            _ => None,
        },
        Band::Ghz6 => {
            if let Some(&(_, freq)) = SIX_GHZ_SPECIAL.iter().find(|(ch, _)| *ch == channel) {
                return Some(freq);
            }
            if (1..=233).contains(&channel) && channel % 4 == 1 {
                Some(5950 + 5 * channel)
            } else {
                None
            }
        }
    }
}

/// Convert a center frequency in MHz to its channel number
pub fn frequency_to_channel(frequency: u32) -> Option<u32> {
    match frequency {
        2484 => Some(14),
        2412..=2472 => Some((frequency - 2407) / 5),
        5160..=5885 => Some((frequency - 5000) / 5),
        5935 => Some(2),
        // Some drivers report channel 6 at its 20 MHz neighbour
        5965 | 5985 => Some(6),
        5955..=7115 => Some((frequency - 5950) / 5),
        _ => None,
    }
}

/// Best-effort band for a bare channel number
///
/// Used when an upstream tool reports a channel without a frequency.
/// Numbers shared between 2.4 GHz and 6 GHz resolve to 2.4 GHz.
pub fn guess_band(channel: u32) -> Option<Band> {
    match channel {
        1..=14 => Some(Band::Ghz2_4),
        32..=177 => Some(Band::Ghz5),
        _ if channel_to_frequency(channel, Band::Ghz6).is_some() => Some(Band::Ghz6),
        _ => None,
    }
}

/// Frequency for a bare channel number, using [`guess_band`]
pub fn infer_frequency(channel: u32) -> Option<u32> {
    guess_band(channel).and_then(|band| channel_to_frequency(channel, band))
}

/// Whether a 5 GHz channel requires DFS
pub fn is_dfs_channel(channel: u32) -> bool {
    DFS_CHANNELS.contains(&channel)
}

/// Every valid channel number in a band, ascending
pub fn valid_channels(band: Band) -> Vec<u32> {
    let range = match band {
        Band::Ghz2_4 => 1..=14,
        Band::Ghz5 => 32..=177,
        Band::Ghz6 => 1..=233,
    };
    range
        .filter(|&ch| channel_to_frequency(ch, band).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_2ghz_channels() {
        assert_eq!(channel_to_frequency(1, Band::Ghz2_4), Some(2412));
        assert_eq!(channel_to_frequency(6, Band::Ghz2_4), Some(2437));
        assert_eq!(channel_to_frequency(13, Band::Ghz2_4), Some(2472));
        assert_eq!(channel_to_frequency(14, Band::Ghz2_4), Some(2484));
        assert_eq!(channel_to_frequency(15, Band::Ghz2_4), None);
        assert_eq!(frequency_to_channel(2484), Some(14));
        assert_eq!(frequency_to_channel(2437), Some(6));
    }

    #[test]
    fn test_5ghz_channels() {
        assert_eq!(channel_to_frequency(36, Band::Ghz5), Some(5180));
        assert_eq!(channel_to_frequency(165, Band::Ghz5), Some(5825));
        assert_eq!(frequency_to_channel(5500), Some(100));
        assert_eq!(channel_to_frequency(14, Band::Ghz5), None);
    }

    #[test]
    fn test_6ghz_special_channels() {
        assert_eq!(channel_to_frequency(2, Band::Ghz6), Some(5935));
        assert_eq!(channel_to_frequency(6, Band::Ghz6), Some(5965));
        assert_eq!(channel_to_frequency(1, Band::Ghz6), Some(5955));
        assert_eq!(channel_to_frequency(37, Band::Ghz6), Some(6135));
        assert_eq!(channel_to_frequency(3, Band::Ghz6), None);
        assert_eq!(frequency_to_channel(5935), Some(2));
        assert_eq!(frequency_to_channel(5965), Some(6));
        assert_eq!(frequency_to_channel(5985), Some(6));
        assert_eq!(frequency_to_channel(6135), Some(37));
    }

    #[test]
    fn test_round_trip_all_bands() {
        for band in [Band::Ghz2_4, Band::Ghz5, Band::Ghz6] {
            for ch in valid_channels(band) {
                let freq = channel_to_frequency(ch, band).unwrap();
                assert_eq!(frequency_to_channel(freq), Some(ch), "{:?} channel {}", band, ch);
                assert_eq!(Band::from_frequency(freq), band, "band of {} MHz", freq);
            }
        }
    }

    #[test]
    fn test_unknown_frequency() {
        assert_eq!(frequency_to_channel(0), None);
        assert_eq!(frequency_to_channel(900), None);
        assert_eq!(frequency_to_channel(60_000), None);
    }

    #[test]
    fn test_gaps_between_bands() {
        for freq in [2411, 2473, 2483, 5159, 5890, 5934, 5945, 5949, 5950, 5954, 7120, 7125] {
            assert_eq!(frequency_to_channel(freq), None, "{} MHz", freq);
        }
        assert_eq!(frequency_to_channel(5955), Some(1));
        assert_eq!(frequency_to_channel(7115), Some(233));

        for freq in 0..=8000 {
            if let Some(ch) = frequency_to_channel(freq) {
                assert!((1..=233).contains(&ch), "{} MHz gave channel {}", freq, ch);
            }
        }
    }

    #[test]
    fn test_guess_band() {
        assert_eq!(guess_band(11), Some(Band::Ghz2_4));
        assert_eq!(guess_band(149), Some(Band::Ghz5));
        assert_eq!(guess_band(197), Some(Band::Ghz6));
        assert_eq!(guess_band(0), None);
        assert_eq!(infer_frequency(197), Some(6935));
    }

    #[test]
    fn test_dfs_table() {
        assert!(is_dfs_channel(52));
        assert!(is_dfs_channel(144));
        assert!(!is_dfs_channel(36));
        assert!(!is_dfs_channel(149));
    }
}
