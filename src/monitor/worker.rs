use crate::monitor::delay::DelayController;
use crate::monitor::display::Display;
use crate::monitor::gate::ConcurrencyGate;
use crate::monitor::probe::Prober;
use crate::monitor::stats::TargetSlot;
use crate::monitor::stop::StopSignal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Position of a worker in its probe cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Probing,
    Updating,
    Sleeping,
    Stopped,
}

/// Summary returned by a worker once it has stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub address: String,
    pub attempts: u64,
    pub final_state: WorkerState,
}

/// Drives the probe, update, sleep cycle for a single target.
///
/// The worker is the only writer of its target's slot. It shares the gate,
/// the delay and the display with every other worker, nothing else.
pub struct Worker {
    address: String,
    slot: Arc<TargetSlot>,
    prober: Arc<dyn Prober>,
    gate: ConcurrencyGate,
    delay: Arc<DelayController>,
    stop: StopSignal,
    display: Arc<Display>,
    state: WorkerState,
}

impl Worker {
    pub fn new(
        address: impl Into<String>,
        slot: Arc<TargetSlot>,
        prober: Arc<dyn Prober>,
        gate: ConcurrencyGate,
        delay: Arc<DelayController>,
        stop: StopSignal,
        display: Arc<Display>,
    ) -> Self {
        Self {
            address: address.into(),
            slot,
            prober,
            gate,
            delay,
            stop,
            display,
            state: WorkerState::Idle,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn transition(&mut self, next: WorkerState) {
        debug!(address = %self.address, from = ?self.state, to = ?next, "Worker transition");
        self.state = next;
    }

    /// Run cycles until the stop signal is observed.
    ///
    /// Gate waits and sleeps are abandoned as soon as the signal is raised;
    /// a probe already admitted through the gate runs to completion.
    pub async fn run(mut self) -> WorkerReport {
        let mut attempts = 0u64;

        loop {
            if self.stop.is_set() {
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = self.stop.wait() => break,
                permit = self.gate.acquire() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        warn!(address = %self.address, error = %e, "Gate unavailable, stopping worker");
                        break;
                    }
                },
            };
            if self.stop.is_set() {
                permit.release();
                break;
            }

            self.transition(WorkerState::Probing);
            self.slot.record_attempt();
            attempts += 1;
            let outcome = self.prober.probe(&self.address).await;
            permit.release();

            self.transition(WorkerState::Updating);
            self.slot.apply(&outcome);
            if let Err(e) = self.display.refresh(false) {
                warn!(address = %self.address, error = %e, "Display refresh failed");
            }

            if self.stop.is_set() {
                break;
            }

            self.transition(WorkerState::Sleeping);
            // Re-read every cycle so an adjustment applies to the next sleep
            let pause = self.delay.current_duration();
            tokio::select! {
                biased;
                _ = self.stop.wait() => break,
                _ = tokio::time::sleep(pause) => {}
            }
            self.transition(WorkerState::Idle);
        }

        self.transition(WorkerState::Stopped);
        WorkerReport {
            address: self.address,
            attempts,
            final_state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::display::DisplayStyle;
    use crate::monitor::probe::{MockProber, ProbeOutcome};
    use crate::monitor::stats::StatsBoard;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    struct Harness {
        worker: Worker,
        slot: Arc<TargetSlot>,
        stop: StopSignal,
        delay: Arc<DelayController>,
    }

    fn harness(prober: MockProber, gate: ConcurrencyGate) -> Harness {
        let board = StatsBoard::new(&["10.0.0.1"]);
        let slot = board.slot(0).unwrap();
        let delay = Arc::new(DelayController::default());
        let stop = StopSignal::new();
        let display = Arc::new(Display::new(
            board,
            Arc::clone(&delay),
            DisplayStyle::plain(),
            Box::new(std::io::sink()),
        ));
        let worker = Worker::new(
            "10.0.0.1",
            Arc::clone(&slot),
            Arc::new(prober),
            gate,
            Arc::clone(&delay),
            stop.clone(),
            display,
        );
        Harness {
            worker,
            slot,
            stop,
            delay,
        }
    }

    fn assert_close(actual: Duration, expected: Duration) {
        let diff = if actual > expected { actual - expected } else { expected - actual };
        assert!(diff <= Duration::from_millis(5), "{:?} != {:?}", actual, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_probes_nothing() {
        let mut prober = MockProber::new();
        prober.expect_probe().never();
        let h = harness(prober, ConcurrencyGate::new(5));
        assert_eq!(h.worker.state(), WorkerState::Idle);

        h.stop.trigger();
        let report = h.worker.run().await;
        assert_eq!(report.attempts, 0);
        assert_eq!(report.final_state, WorkerState::Stopped);
        assert_eq!(h.slot.snapshot().sent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_target_stays_at_zero_percent() {
        let mut prober = MockProber::new();
        prober
            .expect_probe()
            .returning(|_| ProbeOutcome::failure("No reply"));
        let h = harness(prober, ConcurrencyGate::new(5));

        let task = tokio::spawn(h.worker.run());
        tokio::time::sleep(Duration::from_millis(2100)).await;
        h.stop.trigger();
        let report = task.await.unwrap();

        let stats = h.slot.snapshot();
        assert_eq!(stats.sent, report.attempts);
        assert!(stats.sent >= 4);
        assert_eq!(stats.received, 0);
        assert_eq!(stats.latency_ms, None);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_waiting_for_gate() {
        let mut prober = MockProber::new();
        prober.expect_probe().never();
        let gate = ConcurrencyGate::new(1);
        let held = gate.acquire().await.unwrap();
        let h = harness(prober, gate);

        let task = tokio::spawn(h.worker.run());
        tokio::time::sleep(Duration::from_millis(300)).await;
        h.stop.trigger();
        let report = tokio::time::timeout(Duration::from_millis(10), task)
            .await
            .expect("worker should leave the gate queue")
            .unwrap();

        assert_eq!(report.attempts, 0);
        assert_eq!(h.slot.snapshot().sent, 0);
        held.release();
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_change_applies_to_next_sleep() {
        let times = Arc::new(Mutex::new(Vec::new()));
        let mut prober = MockProber::new();
        {
            let times = Arc::clone(&times);
            prober.expect_probe().returning(move |_| {
                times.lock().unwrap().push(Instant::now());
                ProbeOutcome::reply(Some(10.0))
            });
        }
        let h = harness(prober, ConcurrencyGate::new(5));

        let task = tokio::spawn(h.worker.run());
        tokio::time::sleep(Duration::from_millis(250)).await;
        h.delay.adjust(0.5);
        tokio::time::sleep(Duration::from_millis(1350)).await;
        h.stop.trigger();
        task.await.unwrap();

        let times = times.lock().unwrap();
        assert_eq!(times.len(), 3);
        assert_close(times[1] - times[0], Duration::from_millis(500));
        assert_close(times[2] - times[1], Duration::from_millis(1000));

        let stats = h.slot.snapshot();
        assert_eq!(stats.success_rate(), 100.0);
        assert_eq!(stats.latency_ms, Some(10.0));
    }
}
