//! Orchestrator: starts the workers and the keyboard listener, applies
//! delay adjustments, and drives the shutdown sequence.

use crate::monitor::constants::*;
use crate::monitor::delay::DelayController;
use crate::monitor::display::{Display, DisplayStyle};
use crate::monitor::error::{MonitorError, Result};
use crate::monitor::gate::ConcurrencyGate;
use crate::monitor::input::ControlInput;
use crate::monitor::probe::Prober;
use crate::monitor::stats::{StatsBoard, TargetStats};
use crate::monitor::stop::StopSignal;
use crate::monitor::worker::{Worker, WorkerReport};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Why the control loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The operator pressed Esc
    Escape,
    /// Ctrl+C, either as a process signal or as a raw keystroke
    Interrupt,
    /// The stop signal was raised programmatically
    Requested,
}

/// A worker that ended abnormally instead of returning a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    pub message: String,
}

/// Outcome of a complete monitoring run
#[derive(Debug, Clone)]
pub struct MonitorReport {
    pub reason: StopReason,
    /// Reports of workers that stopped cleanly, in target order
    pub workers: Vec<WorkerReport>,
    pub failures: Vec<WorkerFailure>,
    /// Final statistics, in target order
    pub stats: Vec<TargetStats>,
}

/// Concurrent probing engine for a fixed, ordered set of targets
pub struct Monitor {
    targets: Vec<String>,
    board: StatsBoard,
    delay: Arc<DelayController>,
    gate: ConcurrencyGate,
    stop: StopSignal,
    display: Arc<Display>,
    prober: Arc<dyn Prober>,
    poll_interval: Duration,
}

impl Monitor {
    /// Create a monitor writing frames to `sink`.
    ///
    /// Fails with `NoTargets` for an empty list; no worker is ever created then.
    pub fn new(
        targets: Vec<String>,
        prober: Arc<dyn Prober>,
        initial_delay: f64,
        style: DisplayStyle,
        sink: Box<dyn Write + Send>,
    ) -> Result<Self> {
        if targets.is_empty() {
            return Err(MonitorError::NoTargets);
        }
        if targets.len() > MAX_TARGETS {
            return Err(MonitorError::Config(format!(
                "{} targets given, at most {} supported",
                targets.len(),
                MAX_TARGETS
            )));
        }

        let board = StatsBoard::new(&targets);
        let delay = Arc::new(DelayController::new(initial_delay));
        let display = Arc::new(Display::new(board.clone(), Arc::clone(&delay), style, sink));

        Ok(Self {
            targets,
            board,
            delay,
            gate: ConcurrencyGate::new(GATE_CAPACITY),
            stop: StopSignal::new(),
            display,
            prober,
            poll_interval: Duration::from_millis(CONTROL_POLL_INTERVAL_MS),
        })
    }

    /// Create a monitor rendering to stdout with the detected style
    pub fn with_stdout(
        targets: Vec<String>,
        prober: Arc<dyn Prober>,
        initial_delay: f64,
    ) -> Result<Self> {
        Self::new(
            targets,
            prober,
            initial_delay,
            DisplayStyle::detect(),
            Box::new(std::io::stdout()),
        )
    }

    pub fn board(&self) -> &StatsBoard {
        &self.board
    }

    pub fn delay(&self) -> &DelayController {
        &self.delay
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Handle that stops the run when triggered
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Monitor until escape, interrupt, or a programmatic stop.
    ///
    /// `interrupt` resolves when the process receives an operator abort.
    /// Every worker is awaited before this returns; a panicking worker is
    /// reported in `failures` and does not affect the others.
    pub async fn run<I, F>(&self, input: &I, interrupt: F) -> Result<MonitorReport>
    where
        I: ControlInput + ?Sized,
        F: Future<Output = ()>,
    {
        input.start();
        if let Err(e) = self.display.refresh(true) {
            warn!(error = %e, "Initial render failed");
        }

        let mut workers = JoinSet::new();
        for (index, (address, slot)) in self.targets.iter().zip(self.board.iter()).enumerate() {
            let worker = Worker::new(
                address.clone(),
                Arc::clone(slot),
                Arc::clone(&self.prober),
                self.gate.clone(),
                Arc::clone(&self.delay),
                self.stop.clone(),
                Arc::clone(&self.display),
            );
            workers.spawn(async move { (index, worker.run().await) });
        }
        info!(
            targets = self.targets.len(),
            gate_capacity = self.gate.capacity(),
            delay_secs = self.delay.current(),
            "Monitoring started"
        );

        let reason = self.control_loop(input, interrupt).await;
        info!(reason = ?reason, "Stopping monitoring");

        self.stop.trigger();
        input.stop();

        let (workers, failures) = join_workers(workers).await;
        info!(
            stopped = workers.len(),
            failed = failures.len(),
            "All workers finished"
        );

        Ok(MonitorReport {
            reason,
            workers,
            failures,
            stats: self.board.snapshot(),
        })
    }

    async fn control_loop<I, F>(&self, input: &I, interrupt: F) -> StopReason
    where
        I: ControlInput + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        loop {
            let mut adjusted = false;
            while let Some(direction) = input.consume_adjustment() {
                self.delay.adjust(f64::from(direction) * DELAY_STEP_SECS);
                adjusted = true;
            }
            if adjusted {
                info!(delay_secs = self.delay.current(), "Delay changed");
                if let Err(e) = self.display.refresh(false) {
                    warn!(error = %e, "Display refresh failed");
                }
            }

            if input.pressed() {
                return StopReason::Escape;
            }
            if input.interrupted() {
                return StopReason::Interrupt;
            }

            tokio::select! {
                _ = &mut interrupt => return StopReason::Interrupt,
                _ = self.stop.wait() => return StopReason::Requested,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

async fn join_workers(
    mut workers: JoinSet<(usize, WorkerReport)>,
) -> (Vec<WorkerReport>, Vec<WorkerFailure>) {
    let mut reports = Vec::new();
    let mut failures = Vec::new();

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((index, report)) => {
                debug!(address = %report.address, attempts = report.attempts, "Worker stopped");
                reports.push((index, report));
            }
            Err(e) => {
                let message = describe_join_error(e);
                error!(error = %message, "Worker failed");
                failures.push(WorkerFailure { message });
            }
        }
    }

    reports.sort_by_key(|(index, _)| *index);
    (reports.into_iter().map(|(_, report)| report).collect(), failures)
}

fn describe_join_error(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", message)
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::probe::MockProber;

    fn monitor(targets: Vec<String>) -> Result<Monitor> {
        Monitor::new(
            targets,
            Arc::new(MockProber::new()),
            DEFAULT_DELAY_SECS,
            DisplayStyle::plain(),
            Box::new(std::io::sink()),
        )
    }

    #[test]
    fn test_empty_target_list_is_fatal() {
        assert!(matches!(monitor(Vec::new()), Err(MonitorError::NoTargets)));
    }

    #[test]
    fn test_too_many_targets_rejected() {
        let targets = (0..=MAX_TARGETS).map(|i| format!("10.0.0.{}", i)).collect();
        assert!(matches!(monitor(targets), Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_new_monitor_starts_clean() -> Result<()> {
        let monitor = monitor(vec!["a".to_string(), "b".to_string()])?;
        assert_eq!(monitor.board().len(), 2);
        assert_eq!(monitor.delay().current(), DEFAULT_DELAY_SECS);
        assert_eq!(monitor.gate().capacity(), GATE_CAPACITY);
        assert!(!monitor.stop_signal().is_set());
        Ok(())
    }
}
