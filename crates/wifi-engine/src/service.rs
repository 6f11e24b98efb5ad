//! WiFi service
//!
//! Owns the backend, the vendor database and the published engine state,
//! and runs the poll loop:
//!
//! ```text
//! Idle --start_scan(iface)--> Polling --stop_scan()--> Idle
//! ```
//!
//! Each tick scans, normalizes and aggregates outside the state lock, then
//! takes the write lock only to publish. Backend calls run on the blocking
//! pool under a deadline; a failed or timed-out step is reported as
//! [`ServiceEvent::TickFailed`] and retried on the next interval.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wifi_backend::{Backend, BackendError, VendorLookup};
use wifi_model::{
    normalize, normalize_connection, normalize_station, AccessPoint, ChannelInfo, ClientStats,
    Network, ScanResult,
};

use crate::aggregate::{aggregate, AggregationConfig};
use crate::analysis::{analyze_roaming, placement_recommendations, RoamingAnalysis};
use crate::error::EngineError;
use crate::events::{ServiceEvent, TickStage};
use crate::tracker::{ClientTracker, TrackerConfig};

/// Capacity of the event channel; slow subscribers lag rather than block
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Time between poll ticks in milliseconds
    pub poll_interval_ms: u64,
    /// Deadline for each backend call in milliseconds
    pub scan_timeout_ms: u64,
    pub aggregation: AggregationConfig,
    pub tracker: TrackerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            scan_timeout_ms: 10_000,
            aggregation: AggregationConfig::default(),
            tracker: TrackerConfig::default(),
        }
    }
}

/// State published by the poll loop
struct EngineState {
    last_scan: Option<Arc<ScanResult>>,
    tracker: ClientTracker,
}

/// Everything the poll task shares with the service
struct Shared {
    backend: Arc<dyn Backend>,
    vendors: Arc<VendorLookup>,
    config: ServiceConfig,
    state: RwLock<EngineState>,
    events: broadcast::Sender<ServiceEvent>,
}

/// Handle to a running poll loop
struct PollTask {
    interface: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Polling WiFi telemetry service
pub struct WifiService {
    shared: Arc<Shared>,
    poll: Mutex<Option<PollTask>>,
}

impl WifiService {
    /// Create an idle service
    pub fn new(backend: Arc<dyn Backend>, vendors: Arc<VendorLookup>, config: ServiceConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let tracker = ClientTracker::with_config(config.tracker.clone());
        Self {
            shared: Arc::new(Shared {
                backend,
                vendors,
                config,
                state: RwLock::new(EngineState {
                    last_scan: None,
                    tracker,
                }),
                events,
            }),
            poll: Mutex::new(None),
        }
    }

    /// Service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.shared.config
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &'static str {
        self.shared.backend.name()
    }

    /// Wireless interfaces reported by the backend
    pub async fn list_interfaces(&self) -> Result<Vec<String>, EngineError> {
        self.shared.call(|backend| backend.list_interfaces()).await
    }

    /// Start polling `iface`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_scan(&self, iface: &str) -> Result<(), EngineError> {
        let mut poll = self.poll.lock();
        if poll.is_some() {
            return Err(EngineError::AlreadyScanning);
        }
        let runtime = Handle::try_current().map_err(|e| EngineError::Worker(e.to_string()))?;

        let cancel = CancellationToken::new();
        let task = runtime.spawn(run_poll_loop(
            Arc::clone(&self.shared),
            iface.to_string(),
            cancel.clone(),
        ));
        *poll = Some(PollTask {
            interface: iface.to_string(),
            cancel,
            task,
        });

        info!("Started scanning on {}", iface);
        self.shared.emit(ServiceEvent::Started {
            interface: iface.to_string(),
        });
        Ok(())
    }

    /// Stop polling; a no-op when idle
    ///
    /// Cancels an in-flight tick at its next await point. Safe to call from
    /// any thread.
    pub fn stop_scan(&self) {
        if let Some(poll) = self.poll.lock().take() {
            poll.cancel.cancel();
            info!("Stopped scanning on {}", poll.interface);
            self.shared.emit(ServiceEvent::Stopped);
        }
    }

    /// Stop polling, wait for the loop to exit and close the backend
    pub async fn shutdown(&self) {
        let poll = self.poll.lock().take();
        if let Some(poll) = poll {
            poll.cancel.cancel();
            if let Err(e) = poll.task.await {
                warn!("Poll task ended abnormally: {}", e);
            }
            self.shared.emit(ServiceEvent::Stopped);
        }
        self.shared.backend.close();
    }

    pub fn is_scanning(&self) -> bool {
        self.poll.lock().is_some()
    }

    /// Interface being polled, if any
    pub fn current_interface(&self) -> Option<String> {
        self.poll.lock().as_ref().map(|p| p.interface.clone())
    }

    /// Networks from the latest scan, strongest first
    pub fn get_networks(&self) -> Vec<Network> {
        self.get_last_scan()
            .map(|scan| scan.networks.clone())
            .unwrap_or_default()
    }

    /// Channels from the latest scan, ascending
    pub fn get_channel_analysis(&self) -> Vec<ChannelInfo> {
        self.get_last_scan()
            .map(|scan| scan.channels.clone())
            .unwrap_or_default()
    }

    pub fn get_last_scan(&self) -> Option<Arc<ScanResult>> {
        self.shared.state.read().last_scan.clone()
    }

    pub fn get_client_stats(&self) -> ClientStats {
        self.shared.state.read().tracker.stats().clone()
    }

    pub fn get_roaming_analysis(&self) -> RoamingAnalysis {
        analyze_roaming(&self.shared.state.read().tracker.stats().roaming_history)
    }

    pub fn get_ap_placement_recommendations(&self) -> Vec<String> {
        let scan = self.get_last_scan();
        let (channels, networks) = match scan.as_deref() {
            Some(scan) => (scan.channels.as_slice(), scan.networks.as_slice()),
            None => (&[][..], &[][..]),
        };
        placement_recommendations(channels, networks, &self.shared.config.aggregation)
    }

    /// Subscribe to service events
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.shared.events.subscribe()
    }
}

impl Drop for WifiService {
    fn drop(&mut self) {
        if let Some(poll) = self.poll.get_mut().take() {
            poll.cancel.cancel();
        }
    }
}

async fn run_poll_loop(shared: Arc<Shared>, iface: String, cancel: CancellationToken) {
    let mut timer = interval(Duration::from_millis(shared.config.poll_interval_ms.max(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!("Poll loop running on {}", iface);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = shared.tick(&iface) => {}
                }
            }
        }
    }

    debug!("Poll loop on {} exited", iface);
}

impl Shared {
    fn emit(&self, event: ServiceEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Run a backend call on the blocking pool under the configured deadline
    async fn call<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Backend) -> Result<T, BackendError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let timeout_ms = self.config.scan_timeout_ms;
        let task = tokio::task::spawn_blocking(move || f(backend.as_ref()));

        match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(e)) => Err(EngineError::Worker(e.to_string())),
            Err(_) => Err(EngineError::ScanTimeout { timeout_ms }),
        }
    }

    async fn tick(&self, iface: &str) {
        match self.scan_step(iface).await {
            Ok(scan) => {
                debug!(
                    "Scan on {}: {} networks, {} access points",
                    iface, scan.total_networks, scan.total_aps
                );
                self.emit(ServiceEvent::ScanCompleted(scan));
            }
            Err(e) => {
                warn!("Scan on {} failed: {}", iface, e);
                self.emit(ServiceEvent::TickFailed {
                    stage: TickStage::Scan,
                    message: e.to_string(),
                });
            }
        }

        self.client_step(iface).await;
    }

    async fn scan_step(&self, iface: &str) -> Result<Arc<ScanResult>, EngineError> {
        let owned = iface.to_string();
        let access_points = match self.call(move |backend| backend.scan(&owned)).await {
            Ok(aps) => aps,
            Err(EngineError::Backend(BackendError::Decode(e))) => {
                warn!("Scan output on {} could not be decoded: {}", iface, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let now = SystemTime::now();
        let access_points: Vec<AccessPoint> = access_points
            .into_iter()
            .map(|ap| {
                let mut ap = normalize(ap);
                if ap.vendor.is_empty() {
                    ap.vendor = self.vendors.lookup(&ap.bssid);
                }
                ap.last_seen = Some(now);
                ap
            })
            .collect();

        let scan = Arc::new(aggregate(access_points, iface, &self.config.aggregation));
        self.state.write().last_scan = Some(Arc::clone(&scan));
        Ok(scan)
    }

    async fn client_step(&self, iface: &str) {
        let owned = iface.to_string();
        let link = match self.call(move |backend| backend.link_info(&owned)).await {
            Ok(link) => normalize_connection(link),
            Err(e) => {
                warn!("Link query on {} failed: {}", iface, e);
                self.state.write().tracker.mark_disconnected();
                self.emit(ServiceEvent::TickFailed {
                    stage: TickStage::Link,
                    message: e.to_string(),
                });
                return;
            }
        };

        let station = if link.connected {
            let owned = iface.to_string();
            match self.call(move |backend| backend.station_stats(&owned)).await {
                Ok(station) => Some(normalize_station(station)),
                Err(e) => {
                    debug!("Station query on {} failed: {}", iface, e);
                    None
                }
            }
        } else {
            None
        };

        let want_snapshot = self.events.receiver_count() > 0;
        let (roamed, snapshot) = {
            let mut state = self.state.write();
            let roamed = state
                .tracker
                .update(iface, &link, station.as_ref(), SystemTime::now());
            let snapshot = want_snapshot.then(|| Arc::new(state.tracker.stats().clone()));
            (roamed, snapshot)
        };

        if let Some(stats) = snapshot {
            self.emit(ServiceEvent::ClientUpdated(stats));
        }
        if let Some(event) = roamed {
            self.emit(ServiceEvent::Roamed(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifi_model::{ConnectionInfo, StationStats};

    struct IdleBackend;

    impl Backend for IdleBackend {
        fn name(&self) -> &'static str {
            "idle"
        }

        fn list_interfaces(&self) -> Result<Vec<String>, BackendError> {
            Ok(vec!["wlan0".to_string()])
        }

        fn scan(&self, _iface: &str) -> Result<Vec<AccessPoint>, BackendError> {
            Ok(Vec::new())
        }

        fn link_info(&self, _iface: &str) -> Result<ConnectionInfo, BackendError> {
            Ok(ConnectionInfo::disconnected())
        }

        fn station_stats(&self, _iface: &str) -> Result<StationStats, BackendError> {
            Ok(StationStats::disconnected())
        }

        fn close(&self) {}
    }

    fn service() -> WifiService {
        WifiService::new(
            Arc::new(IdleBackend),
            Arc::new(VendorLookup::new()),
            ServiceConfig {
                poll_interval_ms: 10,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_start_twice() {
        let service = service();
        service.start_scan("wlan0").unwrap();
        assert!(service.is_scanning());
        assert_eq!(service.current_interface().as_deref(), Some("wlan0"));
        assert!(matches!(service.start_scan("wlan0"), Err(EngineError::AlreadyScanning)));

        service.stop_scan();
        assert!(!service.is_scanning());
        service.stop_scan();
        service.start_scan("wlan1").unwrap();
        service.shutdown().await;
        assert!(!service.is_scanning());
    }

    #[test]
    fn test_start_without_runtime() {
        assert!(matches!(service().start_scan("wlan0"), Err(EngineError::Worker(_))));
    }

    #[test]
    fn test_idle_getters() {
        let service = service();
        assert!(service.get_networks().is_empty());
        assert!(service.get_channel_analysis().is_empty());
        assert!(service.get_last_scan().is_none());
        assert!(!service.get_client_stats().connected);
        assert_eq!(service.get_roaming_analysis().status.name(), "no_data");
        assert_eq!(service.get_ap_placement_recommendations().len(), 1);
    }

    #[tokio::test]
    async fn test_list_interfaces() {
        assert_eq!(service().list_interfaces().await.unwrap(), vec!["wlan0".to_string()]);
    }

    #[test]
    fn test_partial_config() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"poll_interval_ms": 1000, "tracker": {}}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.scan_timeout_ms, 10_000);
        assert_eq!(config.tracker.history_capacity, 600);
    }
}
