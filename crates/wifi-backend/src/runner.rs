//! Process spawning seam
//!
//! Backends never spawn processes directly. They go through a
//! [`CommandRunner`] so tests can substitute scripted output for each tool.

use std::path::Path;
use std::process::{Output, Stdio};
use std::thread;
use std::time::Duration;

use tokio::process::Command;

use tracing::{debug, warn};

use crate::error::BackendError;

/// Captured result of one command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Failed output with the given stderr
    pub fn failed(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr, as text
    pub fn combined(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text
    }
}

/// Runs external programs on behalf of a backend
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion
    ///
    /// A non-zero exit is reported through [`CommandOutput::success`], not as
    /// an error; errors are reserved for failing to run the program at all.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, BackendError>;

    /// Whether `program` can be run on this host
    fn exists(&self, program: &str) -> bool;
}

/// Runner backed by real processes, killing any that outlive the timeout
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    /// Create a runner with the given per-command timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run_with_timeout(
        &self,
        mut command: Command,
        program: &str,
    ) -> Result<CommandOutput, BackendError> {
        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(output) => Ok(output?.into()),
            Err(_) => {
                warn!("{} exceeded {:?}, killing", program, self.timeout);
                Err(BackendError::ScanTimeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(Duration::from_millis(10_000))
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, BackendError> {
        debug!("Running {} {}", program, args.join(" "));
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);

        // block_on needs a thread outside any caller's runtime
        thread::scope(|scope| {
            scope
                .spawn(|| {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()?;
                    runtime.block_on(self.run_with_timeout(command, program))
                })
                .join()
                .unwrap_or_else(|_| {
                    Err(BackendError::CommandFailed {
                        command: program.to_string(),
                        reason: "runner thread panicked".to_string(),
                    })
                })
        })
    }

    fn exists(&self, program: &str) -> bool {
        let path = Path::new(program);
        if path.is_absolute() || program.contains('/') {
            return path.is_file();
        }
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
            .unwrap_or(false)
    }
}

/// Runner replaying canned output, for exercising backends without the real tools
///
/// Responses are matched on the program and the full argument list; the
/// programs registered with [`ScriptedRunner::install`] are the only ones
/// [`CommandRunner::exists`] reports.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    installed: Vec<String>,
    responses: parking_lot::Mutex<Vec<(String, Vec<String>, CommandOutput)>>,
    calls: parking_lot::Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a program as present on this host
    pub fn install(mut self, program: &str) -> Self {
        self.installed.push(program.to_string());
        self
    }

    /// Register the output for one invocation
    pub fn respond(self, program: &str, args: &[&str], output: CommandOutput) -> Self {
        self.responses.lock().push((
            program.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
            output,
        ));
        self
    }

    /// Command lines run so far, space-joined
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, BackendError> {
        let mut line = vec![program];
        line.extend_from_slice(args);
        self.calls.lock().push(line.join(" "));

        self.responses
            .lock()
            .iter()
            .find(|(p, a, _)| p == program && a.iter().map(String::as_str).eq(args.iter().copied()))
            .map(|(_, _, output)| output.clone())
            .ok_or_else(|| {
                BackendError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no scripted output for {}", line.join(" ")),
                ))
            })
    }

    fn exists(&self, program: &str) -> bool {
        self.installed.iter().any(|p| p == program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_runner() {
        let runner = ScriptedRunner::new()
            .install("iw")
            .respond("iw", &["dev"], CommandOutput::ok("Interface wlan0\n"));
        assert!(runner.exists("iw"));
        assert!(!runner.exists("airport"));
        assert_eq!(runner.run("iw", &["dev"]).unwrap().stdout, b"Interface wlan0\n");
        assert!(runner.run("iw", &["dev", "wlan0", "link"]).is_err());
        assert_eq!(runner.calls(), vec!["iw dev", "iw dev wlan0 link"]);
    }

    #[test]
    fn test_combined_output() {
        let out = CommandOutput {
            success: false,
            stdout: b"partial\n".to_vec(),
            stderr: b"Operation not permitted".to_vec(),
        };
        assert_eq!(out.combined(), "partial\nOperation not permitted");
    }

    #[test]
    fn test_exists_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("airport");
        std::fs::write(&tool, b"").unwrap();
        let runner = SystemRunner::default();
        assert!(runner.exists(tool.to_str().unwrap()));
        assert!(!runner.exists(dir.path().join("missing").to_str().unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn test_slow_program_times_out() {
        let runner = SystemRunner::new(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let err = runner.run("sleep", &["5"]).unwrap_err();
        assert!(matches!(err, BackendError::ScanTimeout { timeout_ms: 100 }));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_from_async_context() {
        let runner = SystemRunner::new(Duration::from_secs(5));
        let out = runner.run("sh", &["-c", "echo out; echo err >&2; exit 3"]).unwrap();
        assert!(!out.success);
        assert_eq!(out.stdout, b"out\n");
        assert_eq!(out.stderr, b"err\n");
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let runner = SystemRunner::new(Duration::from_millis(500));
        let err = runner
            .run("definitely-not-a-real-wifi-tool", &[])
            .unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
    }
}
