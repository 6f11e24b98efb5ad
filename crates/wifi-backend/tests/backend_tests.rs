//! Integration tests for the WiFi backends
//!
//! These tests verify end-to-end behavior of backend selection including:
//! - Probing order between the iw and macOS tool families
//! - Fallthrough between macOS tools when one refuses to answer
//! - Error classification for permission and availability failures
//! - Vendor lookup totality over arbitrary MAC strings

use std::sync::Arc;
use std::time::Duration;

use wifi_backend::{
    detect_backend, BackendConfig, BackendError, CommandOutput, LoadSource, OuiFetcher,
    ScriptedRunner, VendorConfig, VendorLookup, UNKNOWN_VENDOR,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub const AIRPORT: &str =
        "/System/Library/PrivateFrameworks/Apple80211.framework/Versions/Current/Resources/airport";

    pub const PLIST_SCAN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<array>
  <dict>
    <key>BSSID</key><string>00:0c:42:aa:bb:01</string>
    <key>SSID_STR</key><string>Studio</string>
    <key>RSSI</key><integer>-48</integer>
    <key>CHANNEL</key><integer>149</integer>
    <key>SECURITY</key><string>WPA2 Personal</string>
  </dict>
  <dict>
    <key>BSSID</key><string>00:0c:42:aa:bb:02</string>
    <key>SSID_STR</key><string>Studio</string>
    <key>RSSI</key><integer>-71</integer>
    <key>CHANNEL</key><integer>6</integer>
    <key>SECURITY</key><string>WPA3 Personal</string>
  </dict>
</array>
</plist>
"#;

    pub struct FixedFetcher(pub &'static str);

    impl OuiFetcher for FixedFetcher {
        fn fetch(&self, _url: &str, _timeout: Duration) -> Result<Vec<u8>, BackendError> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    pub struct Offline;

    impl OuiFetcher for Offline {
        fn fetch(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, BackendError> {
            Err(BackendError::Download {
                url: url.to_string(),
                reason: "offline".to_string(),
            })
        }
    }
}

use helpers::*;

// ============================================================================
// Detection Tests
// ============================================================================

mod detection_tests {
    use super::*;

    #[test]
    fn test_macos_scan_via_airport() {
        let runner = ScriptedRunner::new()
            .install(AIRPORT)
            .respond(AIRPORT, &["-s", "-x"], CommandOutput::ok(PLIST_SCAN));
        let backend = detect_backend(Arc::new(runner), &BackendConfig::default()).unwrap();
        assert_eq!(backend.name(), "macos");

        let aps = backend.scan("en0").unwrap();
        assert_eq!(aps.len(), 2);
        assert_eq!(aps[0].bssid, "00:0c:42:aa:bb:01");
        assert_eq!(aps[0].ssid, "Studio");
        assert_eq!(aps[0].signal, -48);
        assert_eq!(aps[0].channel, 149);
        assert_eq!(aps[1].security.map(|s| s.name()), Some("WPA3"));
    }

    #[test]
    fn test_macos_link_falls_through_to_wdutil() {
        let wdutil = "\
WIFI
    MAC Address          : 3c:22:fb:00:00:01 (hw=3c:22:fb:00:00:01)
    Interface Name       : en0
    Power                : On [On]
    Op Mode              : STA
    SSID                 : Studio
    BSSID                : 00:0c:42:aa:bb:01
    RSSI                 : -52 dBm
    Noise                : -94 dBm
    Tx Rate              : 864.0 Mbps
    Channel              : 5g149/80
";
        let runner = ScriptedRunner::new()
            .install(AIRPORT)
            .install("wdutil")
            .respond(AIRPORT, &["-I"], CommandOutput::failed("airport: command removed"))
            .respond("wdutil", &["info"], CommandOutput::ok(wdutil));
        let backend = detect_backend(Arc::new(runner), &BackendConfig::default()).unwrap();

        let link = backend.link_info("en0").unwrap();
        assert!(link.connected);
        assert_eq!(link.ssid, "Studio");
        assert_eq!(link.bssid, "00:0c:42:aa:bb:01");
        assert_eq!(link.signal, -52);
        assert_eq!(link.channel, 149);
        assert_eq!(link.channel_width, 80);
    }

    #[test]
    fn test_iw_permission_denied() {
        let runner = ScriptedRunner::new().install("iw").respond(
            "iw",
            &["dev", "wlan0", "scan"],
            CommandOutput::failed("command failed: Operation not permitted (-1)"),
        );
        let backend = detect_backend(Arc::new(runner), &BackendConfig::default()).unwrap();
        let err = backend.scan("wlan0").unwrap_err();
        assert!(matches!(err, BackendError::PermissionDenied { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_iw_not_connected_is_not_an_error() {
        let runner = ScriptedRunner::new().install("iw").respond(
            "iw",
            &["dev", "wlan0", "link"],
            CommandOutput::ok("Not connected.\n"),
        );
        let backend = detect_backend(Arc::new(runner), &BackendConfig::default()).unwrap();
        assert!(!backend.link_info("wlan0").unwrap().connected);
    }

    #[test]
    fn test_close_is_idempotent() {
        let runner = ScriptedRunner::new().install("iw");
        let backend = detect_backend(Arc::new(runner), &BackendConfig::default()).unwrap();
        backend.close();
        backend.close();
        assert!(matches!(
            backend.list_interfaces(),
            Err(BackendError::BackendUnavailable(_))
        ));
    }
}

// ============================================================================
// Vendor Lookup Tests
// ============================================================================

mod vendor_tests {
    use super::*;

    #[test]
    fn test_download_then_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = VendorConfig {
            cache_path: dir.path().join("oui.txt"),
            ..Default::default()
        };
        let fetched = "00-0C-42   (hex)\t\tRouterboard.com\n";

        let first = VendorLookup::with_fetcher(config.clone(), Box::new(FixedFetcher(fetched)));
        assert_eq!(first.load(), LoadSource::Download);
        assert_eq!(first.lookup("00:0c:42:aa:bb:01"), "Routerboard.com");

        let second = VendorLookup::with_fetcher(config, Box::new(FixedFetcher("")));
        assert_eq!(second.load(), LoadSource::Cache);
        assert_eq!(second.len(), 1);
        assert_eq!(second.lookup("00-0C-42-AA-BB-01"), "Routerboard.com");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn embedded() -> VendorLookup {
        let config = VendorConfig {
            cache_path: std::env::temp_dir().join("wifi-backend-no-such-dir").join("oui.txt"),
            ..Default::default()
        };
        let vendors = VendorLookup::with_fetcher(config, Box::new(Offline));
        assert_eq!(vendors.load(), LoadSource::Embedded);
        vendors
    }

    proptest! {
        #[test]
        fn lookup_is_total(mac in ".{0,24}") {
            let vendors = embedded();
            prop_assert!(!vendors.lookup(&mac).is_empty());
        }

        #[test]
        fn lookup_ignores_case_and_separator(bytes in prop::array::uniform6(any::<u8>())) {
            let vendors = embedded();
            let colon = bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(":");
            let dash = bytes.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join("-");
            prop_assert_eq!(vendors.lookup(&colon), vendors.lookup(&dash));
        }

        #[test]
        fn unknown_prefix_is_unknown(low in 0u8..=255) {
            let vendors = embedded();
            // 02:xx is locally administered and never assigned
            let mac = format!("02:00:{:02x}:00:00:01", low);
            prop_assert_eq!(vendors.lookup(&mac), UNKNOWN_VENDOR);
        }
    }
}
