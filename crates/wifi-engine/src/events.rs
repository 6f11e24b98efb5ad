//! Service event stream
//!
//! Every observable change made by the poll loop is published on one
//! broadcast channel, so observers see scans, client updates and roams in
//! the order the loop produced them.

use std::sync::Arc;

use wifi_model::{ClientStats, RoamingEvent, ScanResult};

/// Step of a poll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStage {
    Scan,
    Link,
}

impl TickStage {
    /// Returns the display name of the stage
    pub fn name(&self) -> &'static str {
        match self {
            TickStage::Scan => "scan",
            TickStage::Link => "link",
        }
    }
}

/// Event emitted by [`WifiService`](crate::WifiService)
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    /// The poll loop started on an interface
    Started {
        /// Interface being polled
        interface: String,
    },

    /// The poll loop was stopped
    Stopped,

    /// A scan was aggregated and published
    ScanCompleted(Arc<ScanResult>),

    /// Client stats were updated for this tick
    ClientUpdated(Arc<ClientStats>),

    /// The client moved to a different BSSID
    Roamed(RoamingEvent),

    /// One step of a tick failed; the loop continues on the next interval
    TickFailed {
        /// Step that failed
        stage: TickStage,
        /// Error description
        message: String,
    },
}
