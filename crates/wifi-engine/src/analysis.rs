//! Presentation-facing summaries
//!
//! Heuristic verdicts built on top of the aggregated scan and the roaming
//! history. None of these feed back into the engine state.

use serde::{Deserialize, Serialize};
use wifi_model::{Band, ChannelInfo, CongestionLevel, Network, RoamingEvent};

use crate::aggregate::AggregationConfig;

/// Single-AP networks weaker than this (dBm) get a coverage recommendation
pub const WEAK_COVERAGE_DBM: i32 = -70;

/// Verdict on how roaming affected signal quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoamingStatus {
    /// No roaming events recorded
    NoData,
    /// Mean signal gain above 10 dB
    Excellent,
    /// Mean signal gain above 0 dB
    Good,
    /// Mean signal change above -10 dB
    Fair,
    /// Roaming loses 10 dB or more on average
    Poor,
}

impl RoamingStatus {
    /// Returns the display name of the status
    pub fn name(&self) -> &'static str {
        match self {
            RoamingStatus::NoData => "no_data",
            RoamingStatus::Excellent => "excellent",
            RoamingStatus::Good => "good",
            RoamingStatus::Fair => "fair",
            RoamingStatus::Poor => "poor",
        }
    }

    fn from_average(average: i32) -> Self {
        if average > 10 {
            RoamingStatus::Excellent
        } else if average > 0 {
            RoamingStatus::Good
        } else if average > -10 {
            RoamingStatus::Fair
        } else {
            RoamingStatus::Poor
        }
    }

    fn description(&self) -> &'static str {
        match self {
            RoamingStatus::NoData => "No roaming events recorded",
            RoamingStatus::Excellent => "Roaming is improving signal quality significantly",
            RoamingStatus::Good => "Roaming is improving signal quality",
            RoamingStatus::Fair => "Roaming maintains similar signal quality",
            RoamingStatus::Poor => "Roaming is degrading signal quality",
        }
    }
}

/// Aggregate roaming quality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoamingAnalysis {
    pub status: RoamingStatus,
    pub total_roams: usize,
    /// Integer mean of `new_signal - previous_signal` in dB
    pub average_signal_change: i32,
    pub description: String,
}

/// Summarize a roaming history
pub fn analyze_roaming(events: &[RoamingEvent]) -> RoamingAnalysis {
    if events.is_empty() {
        let status = RoamingStatus::NoData;
        return RoamingAnalysis {
            status,
            total_roams: 0,
            average_signal_change: 0,
            description: status.description().to_string(),
        };
    }

    let total: i64 = events.iter().map(|e| e.signal_delta() as i64).sum();
    let average = (total / events.len() as i64) as i32;
    let status = RoamingStatus::from_average(average);
    RoamingAnalysis {
        status,
        total_roams: events.len(),
        average_signal_change: average,
        description: status.description().to_string(),
    }
}

/// Static access point placement advice for the latest scan
pub fn placement_recommendations(
    channels: &[ChannelInfo],
    networks: &[Network],
    config: &AggregationConfig,
) -> Vec<String> {
    let mut recommendations: Vec<String> = channels
        .iter()
        .filter(|c| c.congestion_level == CongestionLevel::High)
        .map(|c| {
            format!(
                "Consider switching from channel {} to a less congested channel",
                c.channel
            )
        })
        .collect();

    recommendations.extend(
        networks
            .iter()
            .filter(|n| n.best_signal < WEAK_COVERAGE_DBM && n.access_points.len() == 1)
            .map(|n| {
                format!(
                    "Network '{}' has weak signal coverage. Consider adding additional access points",
                    n.ssid
                )
            }),
    );

    let overlapping = channels
        .iter()
        .any(|c| c.band == Band::Ghz2_4 && config.is_overlap_prone(c.channel));
    if overlapping {
        recommendations.push(format!(
            "Detected overlapping 2.4GHz channels. Use channels {} for optimal performance",
            channel_list(&config.recommended_channels)
        ));
    }

    if recommendations.is_empty() {
        recommendations
            .push("No immediate issues detected. Current configuration appears optimal".to_string());
    }
    recommendations
}

/// `1, 6, or 11`
fn channel_list(channels: &[u32]) -> String {
    match channels {
        [] => String::new(),
        [only] => only.to_string(),
        [head @ .., last] => {
            let head: Vec<String> = head.iter().map(u32::to_string).collect();
            format!("{}, or {}", head.join(", "), last)
        }
    }
}
