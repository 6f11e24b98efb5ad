//! WiFi Telemetry Engine
//!
//! This crate turns raw backend output into the state a presentation layer
//! reads:
//!
//! - **Aggregation**: groups one scan's access points into networks and
//!   channels, with congestion and issue heuristics ([`aggregate`])
//! - **Client tracking**: rolling link statistics with bounded signal history
//!   and roaming detection ([`ClientTracker`])
//! - **Service**: the cancellable poll loop that drives both and publishes
//!   [`ServiceEvent`]s ([`WifiService`])
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wifi_backend::{detect_system_backend, BackendConfig, VendorLookup};
//! use wifi_engine::{ServiceConfig, ServiceEvent, WifiService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = detect_system_backend(&BackendConfig::default())?;
//! let vendors = Arc::new(VendorLookup::new());
//! vendors.load();
//!
//! let service = WifiService::new(Arc::from(backend), vendors, ServiceConfig::default());
//! let mut events = service.subscribe();
//! service.start_scan("wlan0")?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let ServiceEvent::ScanCompleted(scan) = event {
//!         println!("{} networks", scan.total_networks);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod analysis;
pub mod error;
pub mod events;
pub mod service;
pub mod tracker;

pub use aggregate::{aggregate, AggregationConfig};
pub use analysis::{
    analyze_roaming, placement_recommendations, RoamingAnalysis, RoamingStatus, WEAK_COVERAGE_DBM,
};
pub use error::EngineError;
pub use events::{ServiceEvent, TickStage};
pub use service::{ServiceConfig, WifiService};
pub use tracker::{ClientTracker, TrackerConfig};
