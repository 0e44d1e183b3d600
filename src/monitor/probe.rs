use crate::monitor::constants::PROBE_GRACE_MS;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Result of a single probe attempt against one target
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub sent: u64,
    pub received: u64,
    pub latency_ms: Option<f64>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// A reply was received. An unparsed latency is reported as 0.0 ms.
    pub fn reply(latency_ms: Option<f64>) -> Self {
        Self {
            sent: 1,
            received: 1,
            latency_ms: Some(latency_ms.unwrap_or(0.0)),
            error: None,
        }
    }

    /// No reply was received
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            sent: 1,
            received: 0,
            latency_ms: None,
            error: Some(reason.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.received > 0 && self.error.is_none()
    }
}

/// Executes one reachability probe for one address.
///
/// Implementations must not fail for an unreachable target (that is a
/// non-success outcome) and must complete within a bounded time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: &str) -> ProbeOutcome;
}

/// Probes targets by running the platform `ping` executable once per attempt
#[derive(Debug, Clone)]
pub struct SystemPinger {
    program: String,
    timeout: Duration,
}

impl SystemPinger {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "ping".to_string(),
            timeout,
        }
    }

    /// Use a different executable in place of `ping`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

/// Builds the ping arguments for a single echo request on the given OS.
///
/// Returns `None` for platforms without a known ping invocation.
pub fn build_ping_args(os: &str, address: &str, timeout: Duration) -> Option<Vec<String>> {
    let timeout_ms = timeout.as_millis().max(1);
    let args: Vec<String> = match os {
        "windows" => vec!["-n".into(), "1".into(), "-w".into(), timeout_ms.to_string()],
        "macos" => vec!["-c".into(), "1".into(), "-W".into(), timeout_ms.to_string()],
        "linux" | "freebsd" => {
            let secs = ((timeout_ms + 999) / 1000).max(1);
            vec!["-c".into(), "1".into(), "-W".into(), secs.to_string()]
        }
        _ => return None,
    };
    Some(args.into_iter().chain(std::iter::once(address.to_string())).collect())
}

/// Extracts a round-trip time in milliseconds from raw ping output.
///
/// Looks for `time=<n> ms` / `time<<n>ms` first, then the Windows
/// summary `Average = <n>ms`.
pub fn parse_latency_ms(output: &str) -> Option<f64> {
    let lower = output.to_ascii_lowercase();

    for (idx, _) in lower.match_indices("time") {
        let rest = &lower[idx + "time".len()..];
        let rest = match rest.strip_prefix('=').or_else(|| rest.strip_prefix('<')) {
            Some(rest) => rest,
            None => continue,
        };
        if let Some(value) = leading_millis(rest) {
            return Some(value);
        }
    }

    let idx = lower.find("average = ")?;
    leading_millis(&lower[idx + "average = ".len()..])
}

fn leading_millis(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    let value = text[..end].parse::<f64>().ok()?;
    text[end..].trim_start().starts_with("ms").then_some(value)
}

#[async_trait]
impl Prober for SystemPinger {
    async fn probe(&self, address: &str) -> ProbeOutcome {
        let args = match build_ping_args(std::env::consts::OS, address, self.timeout) {
            Some(args) => args,
            None => return ProbeOutcome::failure("Unsupported OS"),
        };

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(program = %self.program, "Ping executable not found");
                return ProbeOutcome::failure(format!("'{}' command not found", self.program));
            }
            Err(e) => {
                warn!(error = %e, address = %address, "Failed to spawn ping");
                return ProbeOutcome::failure(e.to_string());
            }
        };

        // The child is killed on drop if the limit expires
        let limit = self.timeout + Duration::from_millis(PROBE_GRACE_MS);
        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(error = %e, address = %address, "Failed to collect ping output");
                return ProbeOutcome::failure(e.to_string());
            }
            Err(_) => {
                debug!(address = %address, limit_ms = limit.as_millis() as u64, "Ping timed out");
                return ProbeOutcome::failure("Timed out");
            }
        };

        let text = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let latency = parse_latency_ms(&text);

        if output.status.success() {
            if latency.is_none() {
                debug!(address = %address, "Reply without parsable latency, reporting 0.0 ms");
            }
            ProbeOutcome::reply(latency)
        } else {
            debug!(address = %address, status = ?output.status.code(), "No reply");
            ProbeOutcome {
                latency_ms: latency,
                ..ProbeOutcome::failure("No reply")
            }
        }
    }
}
