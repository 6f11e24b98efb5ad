//! Linux backend driving the `iw` tool

use std::sync::Arc;

use tracing::{debug, info, warn};
use wifi_decode::iw::{is_permission_error, parse_interfaces};
use wifi_decode::{Decoder, IwDecoder};
use wifi_model::{AccessPoint, ConnectionInfo, StationStats};

use crate::runner::{CommandOutput, CommandRunner};
use crate::{Backend, BackendError, Lifecycle};

const IW: &str = "iw";

/// Backend for Linux hosts with `iw` installed
pub struct IwBackend {
    runner: Arc<dyn CommandRunner>,
    decoder: IwDecoder,
    lifecycle: Lifecycle,
}

impl IwBackend {
    /// Create a backend that runs `iw` through `runner`
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            decoder: IwDecoder::new(),
            lifecycle: Lifecycle::default(),
        }
    }

    /// Whether `iw` is available through `runner`
    pub fn probe(runner: &dyn CommandRunner) -> bool {
        runner.exists(IW)
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput, BackendError> {
        self.lifecycle.ensure_open(self.name())?;
        let output = self.runner.run(IW, args)?;
        if output.success {
            return Ok(output);
        }

        let text = output.combined();
        if is_permission_error(&text) {
            warn!("iw {} was refused: {}", args.join(" "), text.trim());
            return Err(BackendError::PermissionDenied {
                tool: IW.to_string(),
            });
        }
        Err(BackendError::CommandFailed {
            command: format!("iw {}", args.join(" ")),
            reason: text.trim().to_string(),
        })
    }

    /// `iface` or, when empty, the first interface `iw dev` reports
    fn resolve(&self, iface: &str) -> Result<String, BackendError> {
        if !iface.is_empty() {
            return Ok(iface.to_string());
        }
        self.list_interfaces()?
            .into_iter()
            .next()
            .ok_or(BackendError::NoInterfacesFound)
    }
}

impl Backend for IwBackend {
    fn name(&self) -> &'static str {
        IW
    }

    fn list_interfaces(&self) -> Result<Vec<String>, BackendError> {
        let output = self.run(&["dev"])?;
        let interfaces = parse_interfaces(&String::from_utf8_lossy(&output.stdout));
        if interfaces.is_empty() {
            return Err(BackendError::NoInterfacesFound);
        }
        debug!("iw reports interfaces: {}", interfaces.join(", "));
        Ok(interfaces)
    }

    fn scan(&self, iface: &str) -> Result<Vec<AccessPoint>, BackendError> {
        let iface = self.resolve(iface)?;
        let output = self.run(&["dev", &iface, "scan"])?;
        let aps = self.decoder.parse_scan(&output.stdout)?;
        debug!("iw scan on {} found {} BSS", iface, aps.len());
        Ok(aps)
    }

    fn link_info(&self, iface: &str) -> Result<ConnectionInfo, BackendError> {
        let iface = self.resolve(iface)?;
        let output = self.run(&["dev", &iface, "link"])?;
        Ok(self.decoder.parse_link(&output.stdout)?)
    }

    fn station_stats(&self, iface: &str) -> Result<StationStats, BackendError> {
        let iface = self.resolve(iface)?;
        let output = self.run(&["dev", &iface, "station", "dump"])?;
        Ok(self.decoder.parse_station(&output.stdout)?)
    }

    fn close(&self) {
        if self.lifecycle.close() {
            info!("iw backend closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScriptedRunner;

    const DEV: &str = "phy#0\n\tInterface wlan0\n\t\tifindex 3\n\t\ttype managed\n";

    fn backend(runner: ScriptedRunner) -> IwBackend {
        IwBackend::new(Arc::new(runner.install("iw")))
    }

    #[test]
    fn test_list_interfaces() {
        let b = backend(ScriptedRunner::new().respond("iw", &["dev"], CommandOutput::ok(DEV)));
        assert_eq!(b.list_interfaces().unwrap(), vec!["wlan0".to_string()]);
    }

    #[test]
    fn test_no_interfaces() {
        let b = backend(ScriptedRunner::new().respond("iw", &["dev"], CommandOutput::ok("")));
        assert!(matches!(b.list_interfaces(), Err(BackendError::NoInterfacesFound)));
        assert!(matches!(b.scan(""), Err(BackendError::NoInterfacesFound)));
    }

    #[test]
    fn test_scan_resolves_default_interface() {
        let scan = "BSS 00:11:22:33:44:55(on wlan0)\n\tfreq: 2412\n\tsignal: -40.00 dBm\n\tSSID: A\n";
        let b = backend(
            ScriptedRunner::new()
                .respond("iw", &["dev"], CommandOutput::ok(DEV))
                .respond("iw", &["dev", "wlan0", "scan"], CommandOutput::ok(scan)),
        );
        let aps = b.scan("").unwrap();
        assert_eq!(aps.len(), 1);
        assert_eq!(aps[0].frequency, 2412);
    }

    #[test]
    fn test_scan_permission_denied() {
        let b = backend(ScriptedRunner::new().respond(
            "iw",
            &["dev", "wlan0", "scan"],
            CommandOutput::failed("command failed: Operation not permitted (-1)"),
        ));
        match b.scan("wlan0") {
            Err(BackendError::PermissionDenied { tool }) => assert_eq!(tool, "iw"),
            other => panic!("expected PermissionDenied, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_other_failure() {
        let b = backend(ScriptedRunner::new().respond(
            "iw",
            &["dev", "wlan9", "scan"],
            CommandOutput::failed("command failed: No such device (-19)"),
        ));
        assert!(matches!(b.scan("wlan9"), Err(BackendError::CommandFailed { .. })));
    }

    #[test]
    fn test_not_connected_is_not_an_error() {
        let b = backend(ScriptedRunner::new().respond(
            "iw",
            &["dev", "wlan0", "link"],
            CommandOutput::ok("Not connected.\n"),
        ));
        let link = b.link_info("wlan0").unwrap();
        assert!(!link.connected);
        assert!(link.ssid.is_empty());
    }

    #[test]
    fn test_closed_backend_is_unavailable() {
        let b = backend(ScriptedRunner::new().respond("iw", &["dev"], CommandOutput::ok(DEV)));
        b.close();
        b.close();
        assert!(matches!(b.list_interfaces(), Err(BackendError::BackendUnavailable(_))));
        assert!(matches!(b.link_info("wlan0"), Err(BackendError::BackendUnavailable(_))));
    }
}
