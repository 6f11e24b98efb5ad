//! WiFi Telemetry Monitor
//!
//! Polls the local wireless interface and logs scan, link and roaming
//! summaries until interrupted.
//!
//! Usage: `wifiscope [interface]`

mod settings;

use std::sync::Arc;

use anyhow::Context;
use settings::{Settings, DEFAULT_LOG_FILTER};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wifi_backend::{detect_system_backend, Backend, VendorLookup};
use wifi_engine::{ServiceEvent, WifiService};
use wifi_model::{ClientStats, ScanResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&settings.log_filter))
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting wifiscope");

    let backend: Arc<dyn Backend> = Arc::from(
        detect_system_backend(&settings.backend).context("no usable WiFi backend on this host")?,
    );

    let vendors = Arc::new(VendorLookup::with_config(settings.vendors.clone()));
    let loader = Arc::clone(&vendors);
    let source = tokio::task::spawn_blocking(move || loader.load())
        .await
        .context("vendor database loader panicked")?;
    info!("Vendor database: {} prefixes ({})", vendors.len(), source.name());

    let service = WifiService::new(backend, vendors, settings.service.clone());
    info!("Using {} backend", service.backend_name());

    let iface = match std::env::args().nth(1).or(settings.interface) {
        Some(iface) if !iface.is_empty() => iface,
        _ => service
            .list_interfaces()
            .await?
            .into_iter()
            .next()
            .context("no wireless interface found")?,
    };

    let mut events = service.subscribe();
    service.start_scan(&iface)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    service.shutdown().await;

    let roaming = service.get_roaming_analysis();
    info!(
        "Roaming: {} ({} roams, average change {} dB)",
        roaming.status.name(),
        roaming.total_roams,
        roaming.average_signal_change
    );
    for recommendation in service.get_ap_placement_recommendations() {
        info!("Recommendation: {}", recommendation);
    }

    Ok(())
}

fn log_event(event: &ServiceEvent) {
    match event {
        ServiceEvent::Started { interface } => info!("Scanning on {}", interface),
        ServiceEvent::Stopped => debug!("Scanning stopped"),
        ServiceEvent::ScanCompleted(scan) => log_scan(scan),
        ServiceEvent::ClientUpdated(stats) => log_client(stats),
        ServiceEvent::Roamed(roam) => info!(
            "Roamed {} -> {} ({} -> {} dBm, channel {} -> {})",
            roam.previous_bssid,
            roam.new_bssid,
            roam.previous_signal,
            roam.new_signal,
            roam.previous_channel,
            roam.new_channel
        ),
        ServiceEvent::TickFailed { stage, message } => {
            warn!("{} failed: {}", stage.name(), message)
        }
    }
}

fn log_scan(scan: &ScanResult) {
    info!(
        "Scan on {}: {} networks, {} access points, {} channels",
        scan.interface,
        scan.total_networks,
        scan.total_aps,
        scan.channels.len()
    );
    for network in &scan.networks {
        debug!(
            "  {:<32} {:>4} dBm  ch {:<3} {:<15} {} AP(s)",
            network.ssid,
            network.best_signal,
            network.channel,
            network.security.name(),
            network.ap_count
        );
        for issue in &network.issue_messages {
            debug!("    ! {}", issue);
        }
    }
}

fn log_client(stats: &ClientStats) {
    if !stats.connected {
        info!("Not connected");
        return;
    }
    info!(
        "Connected to {} ({}) ch {} {} MHz, {} dBm (avg {}), tx {:.1} / rx {:.1} Mbps, {} {}",
        stats.ssid,
        stats.bssid,
        stats.channel,
        stats.channel_width,
        stats.signal,
        stats.signal_avg,
        stats.tx_bitrate,
        stats.rx_bitrate,
        stats.wifi_standard,
        stats.mimo_config
    );
}
