//! Property tests for the data model
//!
//! These tests verify the invariants every consumer relies on:
//! - Channel numbering round-trips through frequency in every band
//! - Channel math is total over every reported frequency
//! - Normalization is idempotent and fills derived fields consistently
//! - Signal quality is monotonic with fixed end points

use proptest::prelude::*;
use wifi_model::{
    channel_to_frequency, frequency_to_channel, normalize, signal_to_quality, valid_channels,
    AccessPoint, Band, Capability,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub fn arb_band() -> impl Strategy<Value = Band> {
        prop_oneof![Just(Band::Ghz2_4), Just(Band::Ghz5), Just(Band::Ghz6)]
    }

    pub fn arb_capabilities() -> impl Strategy<Value = Vec<Capability>> {
        prop::collection::vec(
            prop::sample::select(vec![
                Capability::Ht,
                Capability::Vht,
                Capability::He,
                Capability::Eht,
                Capability::WiFi6,
                Capability::WiFi7,
            ]),
            0..4,
        )
    }

    /// Partially populated access point, as a decoder might hand it over
    pub fn arb_access_point() -> impl Strategy<Value = AccessPoint> {
        (
            prop_oneof![Just(0u32), 2400u32..7200],
            0u32..240,
            prop::sample::select(vec![0u32, 20, 40, 80, 160, 320, 30]),
            -110i32..0,
            prop::option::of(-110i32..0),
            (-1i32..30, -1i32..256),
            0u32..5,
            -10i32..30,
            arb_capabilities(),
        )
            .prop_map(
                |(frequency, channel, width, signal, noise, load, streams, tx_power, caps)| {
                    let mut ap = AccessPoint::new("02:00:00:00:00:01");
                    ap.frequency = frequency;
                    ap.channel = channel;
                    ap.channel_width = width;
                    ap.signal = signal;
                    ap.noise = noise;
                    ap.bss_load_stations = load.0;
                    ap.bss_load_utilization = load.1;
                    ap.mimo_streams = streams;
                    ap.tx_power = tx_power;
                    ap.capabilities.extend(caps);
                    ap
                },
            )
    }
}

use helpers::*;

// ============================================================================
// Scenario Tests
// ============================================================================

mod scenario_tests {
    use super::*;

    #[test]
    fn test_quality_end_points() {
        assert_eq!(signal_to_quality(-30), 100);
        assert_eq!(signal_to_quality(-100), 0);
        let mid = signal_to_quality(-65);
        assert!(mid > 0 && mid < 100);
    }

    #[test]
    fn test_every_band_has_channels() {
        assert_eq!(valid_channels(Band::Ghz2_4).len(), 14);
        assert!(valid_channels(Band::Ghz5).contains(&36));
        assert!(valid_channels(Band::Ghz6).contains(&37));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;

    proptest! {
        #[test]
        fn channel_round_trip(band in arb_band()) {
            for channel in valid_channels(band) {
                let frequency = channel_to_frequency(channel, band);
                prop_assert!(frequency.is_some());
                prop_assert_eq!(frequency.and_then(frequency_to_channel), Some(channel));
            }
        }

        #[test]
        fn normalize_is_idempotent(ap in arb_access_point()) {
            let once = normalize(ap);
            prop_assert_eq!(normalize(once.clone()), once);
        }

        #[test]
        fn normalize_is_total_over_frequencies(
            ap in arb_access_point(),
            frequency in any::<u32>(),
            channel in any::<u32>(),
        ) {
            let mut ap = ap;
            ap.frequency = frequency;
            ap.channel = channel;
            let once = normalize(ap);
            prop_assert_eq!(normalize(once.clone()), once);
        }

        #[test]
        fn band_edges_are_total(frequency in 0u32..8000) {
            if let Some(channel) = frequency_to_channel(frequency) {
                prop_assert!((1..=233).contains(&channel));
            }
            let mut ap = AccessPoint::new("02:00:00:00:00:01");
            ap.frequency = frequency;
            let ap = normalize(ap);
            prop_assert_eq!(ap.frequency, frequency);
        }

        #[test]
        fn quality_is_monotonic(a in -150i32..50, b in -150i32..50) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(signal_to_quality(low) <= signal_to_quality(high));
            prop_assert!(signal_to_quality(high) <= 100);
        }

        #[test]
        fn load_sentinels_agree(ap in arb_access_point()) {
            let ap = normalize(ap);
            prop_assert_eq!(ap.bss_load_stations == -1, ap.bss_load_utilization == -1);
        }

        #[test]
        fn derived_fields_are_consistent(ap in arb_access_point()) {
            let ap = normalize(ap);
            prop_assert_eq!(ap.band, Band::from_frequency(ap.frequency));
            prop_assert!([20, 40, 80, 160, 320].contains(&ap.channel_width));
            prop_assert!(ap.mimo_streams >= 1);
            prop_assert!((10.0..=500.0).contains(&ap.estimated_range));
            prop_assert_eq!(ap.snr, ap.noise.map(|noise| ap.signal - noise));
            prop_assert!(ap.security.is_some());
            if let Some(channel) = frequency_to_channel(ap.frequency) {
                prop_assert_eq!(ap.channel, channel);
            }
        }
    }
}
