//! macOS backend
//!
//! No single macOS tool answers every query, and Apple has been retiring
//! them one release at a time (`airport` is gone from recent systems). The
//! backend records which tools exist at construction and queries them in
//! priority order until one succeeds:
//!
//! | Query      | Priority                                              |
//! |------------|-------------------------------------------------------|
//! | scan       | airport, system_profiler                              |
//! | link       | airport, wdutil, system_profiler, networksetup        |
//! | station    | airport, wdutil, system_profiler                      |
//! | interfaces | networksetup, system_profiler                         |

use std::sync::Arc;

use tracing::{debug, info, warn};
use wifi_decode::{create_decoder, networksetup, profiler, DecodeError, Decoder, DecoderKind};
use wifi_model::{AccessPoint, ConnectionInfo, StationStats};

use crate::runner::{CommandOutput, CommandRunner};
use crate::{Backend, BackendError, Lifecycle};

const WDUTIL: &str = "wdutil";
const SYSTEM_PROFILER: &str = "system_profiler";
const NETWORKSETUP: &str = "/usr/sbin/networksetup";

/// One macOS tool the backend can query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    Airport,
    Wdutil,
    SystemProfiler,
    NetworkSetup,
}

impl Tool {
    fn decoder_kind(&self) -> DecoderKind {
        match self {
            Tool::Airport => DecoderKind::Airport,
            Tool::Wdutil => DecoderKind::Wdutil,
            Tool::SystemProfiler => DecoderKind::SystemProfiler,
            Tool::NetworkSetup => DecoderKind::NetworkSetup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Query {
    Scan,
    Link,
    Station,
}

impl Query {
    fn name(&self) -> &'static str {
        match self {
            Query::Scan => "scan",
            Query::Link => "link",
            Query::Station => "station",
        }
    }

    fn priority(&self) -> &'static [Tool] {
        match self {
            Query::Scan => &[Tool::Airport, Tool::SystemProfiler],
            Query::Link => &[Tool::Airport, Tool::Wdutil, Tool::SystemProfiler, Tool::NetworkSetup],
            Query::Station => &[Tool::Airport, Tool::Wdutil, Tool::SystemProfiler],
        }
    }
}

/// macOS tools found on this host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacTools {
    /// Path of the `airport` binary, if present
    pub airport: Option<String>,
    pub wdutil: bool,
    pub system_profiler: bool,
    pub networksetup: bool,
}

impl MacTools {
    /// Probe for each tool, trying `airport_paths` before a `PATH` lookup
    pub fn probe(runner: &dyn CommandRunner, airport_paths: &[String]) -> Self {
        let airport = airport_paths
            .iter()
            .find(|path| runner.exists(path))
            .cloned()
            .or_else(|| runner.exists("airport").then(|| "airport".to_string()));
        Self {
            airport,
            wdutil: runner.exists(WDUTIL),
            system_profiler: runner.exists(SYSTEM_PROFILER),
            networksetup: runner.exists(NETWORKSETUP),
        }
    }

    /// Whether any supported tool was found
    pub fn any(&self) -> bool {
        self.airport.is_some() || self.wdutil || self.system_profiler || self.networksetup
    }

    fn has(&self, tool: Tool) -> bool {
        match tool {
            Tool::Airport => self.airport.is_some(),
            Tool::Wdutil => self.wdutil,
            Tool::SystemProfiler => self.system_profiler,
            Tool::NetworkSetup => self.networksetup,
        }
    }
}

/// Backend for macOS hosts
pub struct MacBackend {
    runner: Arc<dyn CommandRunner>,
    tools: MacTools,
    lifecycle: Lifecycle,
}

impl MacBackend {
    /// Create a backend over the tools found by [`MacTools::probe`]
    pub fn new(runner: Arc<dyn CommandRunner>, tools: MacTools) -> Self {
        info!(
            "macOS tools: airport={} wdutil={} system_profiler={} networksetup={}",
            tools.airport.is_some(),
            tools.wdutil,
            tools.system_profiler,
            tools.networksetup
        );
        Self {
            runner,
            tools,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Tools this backend will query
    pub fn tools(&self) -> &MacTools {
        &self.tools
    }

    fn invoke(&self, tool: Tool, query: Query, iface: &str) -> Result<CommandOutput, BackendError> {
        let (program, args): (&str, Vec<&str>) = match (tool, query) {
            (Tool::Airport, Query::Scan) => (self.airport_path(), vec!["-s", "-x"]),
            (Tool::Airport, _) => (self.airport_path(), vec!["-I"]),
            (Tool::Wdutil, _) => (WDUTIL, vec!["info"]),
            (Tool::SystemProfiler, _) => (SYSTEM_PROFILER, vec!["-json", "SPAirPortDataType"]),
            (Tool::NetworkSetup, _) => (NETWORKSETUP, vec!["-getairportnetwork", iface]),
        };

        let output = self.runner.run(program, &args)?;
        if output.success {
            Ok(output)
        } else {
            Err(BackendError::CommandFailed {
                command: format!("{} {}", program, args.join(" ")),
                reason: output.combined().trim().to_string(),
            })
        }
    }

    fn airport_path(&self) -> &str {
        self.tools.airport.as_deref().unwrap_or("airport")
    }

    /// Run `query` against each available tool in priority order
    fn query<T>(
        &self,
        query: Query,
        iface: &str,
        decode: impl Fn(&dyn Decoder, &[u8]) -> Result<T, DecodeError>,
    ) -> Result<T, BackendError> {
        self.lifecycle.ensure_open(self.name())?;

        let mut last_error = None;
        for &tool in query.priority().iter().filter(|t| self.tools.has(**t)) {
            let decoder = create_decoder(tool.decoder_kind());
            let attempt = self
                .invoke(tool, query, iface)
                .and_then(|output| Ok(decode(decoder.as_ref(), &output.stdout)?));
            match attempt {
                Ok(value) => {
                    debug!("{} answered by {}", query.name(), decoder.kind().name());
                    return Ok(value);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("{} via {} failed: {}", query.name(), decoder.kind().name(), e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BackendError::BackendUnavailable(format!(
                "no macOS tool available for {}",
                query.name()
            ))
        }))
    }
}

impl Backend for MacBackend {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn list_interfaces(&self) -> Result<Vec<String>, BackendError> {
        self.lifecycle.ensure_open(self.name())?;

        if self.tools.networksetup {
            let output = self.runner.run(NETWORKSETUP, &["-listallhardwareports"])?;
            let interfaces = networksetup::parse_hardware_ports(&output.stdout);
            if !interfaces.is_empty() {
                return Ok(interfaces);
            }
        }
        if self.tools.system_profiler {
            let output = self.runner.run(SYSTEM_PROFILER, &["-json", "SPAirPortDataType"])?;
            let interfaces = profiler::parse_interfaces(&output.stdout)?;
            if !interfaces.is_empty() {
                return Ok(interfaces);
            }
        }
        Err(BackendError::NoInterfacesFound)
    }

    fn scan(&self, iface: &str) -> Result<Vec<AccessPoint>, BackendError> {
        self.query(Query::Scan, iface, |decoder, raw| decoder.parse_scan(raw))
    }

    fn link_info(&self, iface: &str) -> Result<ConnectionInfo, BackendError> {
        self.query(Query::Link, iface, |decoder, raw| decoder.parse_link(raw))
    }

    fn station_stats(&self, iface: &str) -> Result<StationStats, BackendError> {
        self.query(Query::Station, iface, |decoder, raw| decoder.parse_station(raw))
    }

    fn close(&self) {
        if self.lifecycle.close() {
            info!("macOS backend closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScriptedRunner;

    const AIRPORT: &str = "/System/Library/PrivateFrameworks/Apple80211.framework/Resources/airport";

    const PROFILE: &str = r#"{"SPAirPortDataType":[{"spairport_airport_interfaces":[{"_name":"en0",
        "spairport_current_network_information":{"_name":"Home","spairport_network_channel":"36 (5GHz, 80MHz)",
            "spairport_signal_noise":"-50 dBm / -90 dBm"},
        "spairport_airport_local_wireless_networks":[{"_name":"Home","spairport_network_channel":"36 (5GHz, 80MHz)",
            "spairport_signal_noise":"-50 dBm / -90 dBm","spairport_security_mode":"spairport_security_mode_wpa2_personal"}]}]}]}"#;

    fn mac(runner: ScriptedRunner) -> MacBackend {
        let tools = MacTools::probe(&runner, &[AIRPORT.to_string()]);
        MacBackend::new(Arc::new(runner), tools)
    }

    #[test]
    fn test_probe() {
        let runner = ScriptedRunner::new().install(AIRPORT).install(WDUTIL);
        let tools = MacTools::probe(&runner, &[AIRPORT.to_string()]);
        assert_eq!(tools.airport.as_deref(), Some(AIRPORT));
        assert!(tools.wdutil);
        assert!(!tools.system_profiler);
        assert!(tools.any());
        assert!(!MacTools::probe(&ScriptedRunner::new(), &[]).any());
    }

    #[test]
    fn test_scan_falls_back_to_system_profiler() {
        let b = mac(ScriptedRunner::new()
            .install(AIRPORT)
            .install(SYSTEM_PROFILER)
            .respond(AIRPORT, &["-s", "-x"], CommandOutput::failed("WARNING: airport is deprecated"))
            .respond(SYSTEM_PROFILER, &["-json", "SPAirPortDataType"], CommandOutput::ok(PROFILE)));
        let aps = b.scan("en0").unwrap();
        assert_eq!(aps.len(), 1);
        assert!(aps[0].synthetic_bssid);
    }

    #[test]
    fn test_link_priority() {
        let runner = ScriptedRunner::new()
            .install(WDUTIL)
            .install(NETWORKSETUP)
            .respond(WDUTIL, &["info"], CommandOutput::failed("wdutil: must be run as root"))
            .respond(
                NETWORKSETUP,
                &["-getairportnetwork", "en0"],
                CommandOutput::ok("Current Wi-Fi Network: Home\n"),
            );
        let b = mac(runner);
        let link = b.link_info("en0").unwrap();
        assert!(link.connected);
        assert_eq!(link.ssid, "Home");
    }

    #[test]
    fn test_station_skips_networksetup() {
        let b = mac(ScriptedRunner::new().install(NETWORKSETUP));
        assert!(matches!(
            b.station_stats("en0"),
            Err(BackendError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_list_interfaces() {
        let b = mac(ScriptedRunner::new().install(NETWORKSETUP).respond(
            NETWORKSETUP,
            &["-listallhardwareports"],
            CommandOutput::ok("Hardware Port: Wi-Fi\nDevice: en0\n"),
        ));
        assert_eq!(b.list_interfaces().unwrap(), vec!["en0".to_string()]);

        let empty = mac(ScriptedRunner::new());
        assert!(matches!(empty.list_interfaces(), Err(BackendError::NoInterfacesFound)));
    }

    #[test]
    fn test_closed() {
        let b = mac(ScriptedRunner::new().install(SYSTEM_PROFILER));
        b.close();
        assert!(matches!(b.scan("en0"), Err(BackendError::BackendUnavailable(_))));
    }
}
