//! OUI vendor database
//!
//! Maps the first three octets of a MAC address to the manufacturer that
//! registered them. [`VendorLookup::load`] tries, in order:
//!
//! 1. the cached IEEE `oui.txt` on disk
//! 2. a fresh download of `oui.txt`, written to the cache path first
//! 3. a small embedded table of common WiFi equipment vendors
//!
//! The table is built completely before being published, so concurrent
//! lookups see either the previous table or the new one.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::BackendError;

/// Vendor reported for unknown or unloaded prefixes
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// IEEE registry export
pub const IEEE_OUI_URL: &str = "http://standards-oui.ieee.org/oui/oui.txt";

/// Vendor database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Where the downloaded `oui.txt` is cached
    pub cache_path: PathBuf,
    pub download_url: String,
    pub download_timeout_ms: u64,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            cache_path: std::env::temp_dir().join("oui.txt"),
            download_url: IEEE_OUI_URL.to_string(),
            download_timeout_ms: 30_000,
        }
    }
}

/// Which stage of [`VendorLookup::load`] produced the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Cache,
    Download,
    Embedded,
}

impl LoadSource {
    pub fn name(&self) -> &'static str {
        match self {
            LoadSource::Cache => "cache",
            LoadSource::Download => "download",
            LoadSource::Embedded => "embedded",
        }
    }
}

/// Retrieves the raw OUI registry
pub trait OuiFetcher: Send + Sync {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, BackendError>;
}

/// Fetcher using a blocking HTTP client
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

impl OuiFetcher for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, BackendError> {
        let download_error = |e: reqwest::Error| BackendError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(download_error)?;
        let response = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(download_error)?;
        Ok(response.bytes().map_err(download_error)?.to_vec())
    }
}

/// Thread-safe MAC prefix to vendor lookup
pub struct VendorLookup {
    config: VendorConfig,
    fetcher: Box<dyn OuiFetcher>,
    table: RwLock<Arc<HashMap<String, String>>>,
    loaded: AtomicBool,
}

impl VendorLookup {
    /// Create an unloaded lookup with the default configuration
    pub fn new() -> Self {
        Self::with_config(VendorConfig::default())
    }

    /// Create an unloaded lookup downloading over HTTP
    pub fn with_config(config: VendorConfig) -> Self {
        Self::with_fetcher(config, Box::new(HttpFetcher))
    }

    /// Create an unloaded lookup with a custom fetcher
    pub fn with_fetcher(config: VendorConfig, fetcher: Box<dyn OuiFetcher>) -> Self {
        Self {
            config,
            fetcher,
            table: RwLock::new(Arc::new(HashMap::new())),
            loaded: AtomicBool::new(false),
        }
    }

    /// Load the table from the first stage that yields entries
    ///
    /// Never fails: the embedded table is always available.
    pub fn load(&self) -> LoadSource {
        let (table, source) = match self.load_cache() {
            Some(table) => (table, LoadSource::Cache),
            None => match self.download() {
                Ok(table) => (table, LoadSource::Download),
                Err(e) => {
                    warn!("OUI download failed, using embedded table: {}", e);
                    (embedded_table(), LoadSource::Embedded)
                }
            },
        };

        info!("Loaded {} OUI prefixes from {}", table.len(), source.name());
        *self.table.write() = Arc::new(table);
        self.loaded.store(true, Ordering::Release);
        source
    }

    fn load_cache(&self) -> Option<HashMap<String, String>> {
        let data = fs::read(&self.config.cache_path).ok()?;
        let table = parse_oui_text(&String::from_utf8_lossy(&data));
        if table.is_empty() {
            debug!("OUI cache at {} is empty or unreadable", self.config.cache_path.display());
            return None;
        }
        Some(table)
    }

    fn download(&self) -> Result<HashMap<String, String>, BackendError> {
        let timeout = Duration::from_millis(self.config.download_timeout_ms);
        let data = self.fetcher.fetch(&self.config.download_url, timeout)?;

        if let Some(parent) = self.config.cache_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config.cache_path, &data)?;

        let table = parse_oui_text(&String::from_utf8_lossy(&data));
        if table.is_empty() {
            return Err(BackendError::Download {
                url: self.config.download_url.clone(),
                reason: "no OUI entries in response".to_string(),
            });
        }
        Ok(table)
    }

    /// Vendor registered for the prefix of `mac`, or [`UNKNOWN_VENDOR`]
    pub fn lookup(&self, mac: &str) -> String {
        if !self.is_loaded() {
            return UNKNOWN_VENDOR.to_string();
        }
        let Some(prefix) = oui_prefix(mac) else {
            return UNKNOWN_VENDOR.to_string();
        };
        let table = Arc::clone(&self.table.read());
        table
            .get(&prefix)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_VENDOR.to_string())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Number of prefixes in the published table
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VendorLookup {
    fn default() -> Self {
        Self::new()
    }
}

/// Upper-case `XX:XX:XX` prefix of a MAC address
fn oui_prefix(mac: &str) -> Option<String> {
    let normalized = mac.trim().replace('-', ":").to_ascii_uppercase();
    let parts: Vec<&str> = normalized.split(':').take(3).collect();
    (parts.len() == 3).then(|| parts.join(":"))
}

/// Parse IEEE `oui.txt` lines of the form `XX-XX-XX   (hex)\t\tVendor Name`
pub fn parse_oui_text(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (prefix, vendor) = line.split_once("(hex)")?;
            let prefix = prefix.trim();
            let vendor = vendor.trim();
            if vendor.is_empty() || prefix.len() != 8 {
                return None;
            }
            Some((prefix.replace('-', ":").to_ascii_uppercase(), vendor.to_string()))
        })
        .collect()
}

fn embedded_table() -> HashMap<String, String> {
    embedded::ALL
        .iter()
        .flat_map(|v| v.prefixes.iter().map(|p| (p.to_string(), v.vendor.to_string())))
        .collect()
}

/// Prefixes of common WiFi equipment vendors
pub mod embedded {
    /// One vendor and its registered prefixes
    #[derive(Debug, Clone, Copy)]
    pub struct VendorPrefixes {
        pub vendor: &'static str,
        pub prefixes: &'static [&'static str],
    }

    pub const UBIQUITI: VendorPrefixes = VendorPrefixes {
        vendor: "Ubiquiti Networks",
        prefixes: &[
            "00:27:22", "24:5A:4C", "68:D7:9A", "70:A7:41", "74:83:C2", "78:8A:20", "80:2A:A8",
            "B4:FB:E4", "DC:9F:DB", "F0:9F:C2", "FC:EC:DA", "1E:6A:1B",
        ],
    };

    pub const CISCO: VendorPrefixes = VendorPrefixes {
        vendor: "Cisco Systems",
        prefixes: &[
            "00:00:0C", "00:01:42", "00:01:43", "00:01:96", "00:01:97", "00:01:C7", "00:02:3D",
            "00:02:4A", "00:02:4B", "00:02:B9", "00:02:BA", "00:02:FC", "00:02:FD", "00:03:6B",
            "00:03:6C", "00:03:9F", "00:03:A0", "00:03:E3", "00:03:E4", "00:03:FD", "00:03:FE",
        ],
    };

    pub const TP_LINK: VendorPrefixes = VendorPrefixes {
        vendor: "TP-Link",
        prefixes: &[
            "00:27:19", "10:FE:ED", "14:CF:92", "1C:3B:F3", "50:C7:BF", "54:A5:1B", "60:E3:27",
            "98:DE:D0", "A0:F3:C1", "AC:84:C6", "C0:4A:00", "E8:94:F6", "EC:08:6B",
        ],
    };

    pub const NETGEAR: VendorPrefixes = VendorPrefixes {
        vendor: "Netgear",
        prefixes: &[
            "00:09:5B", "00:0F:B5", "00:14:6C", "00:18:4D", "00:1B:2F", "00:1E:2A", "00:22:3F",
            "00:24:B2", "00:26:F2", "20:E5:2A", "28:C6:8E", "30:46:9A", "A0:21:B7", "C0:3F:0E",
            "E0:46:9A",
        ],
    };

    pub const ARUBA: VendorPrefixes = VendorPrefixes {
        vendor: "Aruba Networks",
        prefixes: &[
            "00:0B:86", "00:1A:1E", "00:24:6C", "20:4C:03", "24:DE:C6", "6C:F3:7F", "70:3A:0E",
            "94:B4:0F", "D8:C7:C8",
        ],
    };

    pub const RUCKUS: VendorPrefixes = VendorPrefixes {
        vendor: "Ruckus Wireless",
        prefixes: &["00:24:A8", "24:C9:A1", "2C:30:33", "58:93:96", "88:DC:96", "C4:10:8A"],
    };

    pub const MERAKI: VendorPrefixes = VendorPrefixes {
        vendor: "Cisco Meraki",
        prefixes: &["00:18:0A", "88:15:44", "E0:55:3D", "E0:CB:BC"],
    };

    pub const MIKROTIK: VendorPrefixes = VendorPrefixes {
        vendor: "MikroTik",
        prefixes: &["00:0C:42", "4C:5E:0C", "6C:3B:6B", "D4:CA:6D", "E6:8D:8C"],
    };

    pub const APPLE: VendorPrefixes = VendorPrefixes {
        vendor: "Apple",
        prefixes: &[
            "00:03:93", "00:0A:27", "00:0A:95", "00:0D:93", "00:10:FA", "00:11:24", "00:14:51",
            "00:16:CB", "00:17:F2", "00:19:E3", "00:1B:63", "00:1C:B3", "00:1D:4F", "00:1E:52",
            "00:1E:C2", "00:1F:5B", "00:1F:F3", "00:21:E9", "00:22:41", "00:23:12", "00:23:32",
            "00:23:6C", "00:23:DF", "00:24:36", "00:25:00", "00:25:4B", "00:25:BC", "00:26:08",
            "00:26:4A", "00:26:B0", "00:26:BB",
        ],
    };

    /// Every embedded vendor
    pub const ALL: &[VendorPrefixes] = &[
        UBIQUITI, CISCO, TP_LINK, NETGEAR, ARUBA, RUCKUS, MERAKI, MIKROTIK, APPLE,
    ];
}
