use crate::monitor::probe::ProbeOutcome;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Running aggregate for one target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetStats {
    pub address: String,
    pub sent: u64,
    pub received: u64,
    /// Latency of the most recent attempt, overwritten every time
    pub latency_ms: Option<f64>,
    pub last_success: bool,
}

impl TargetStats {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            sent: 0,
            received: 0,
            latency_ms: None,
            last_success: false,
        }
    }

    /// Percentage of attempts that got a reply, 0 before the first attempt
    pub fn success_rate(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        (self.received as f64 / self.sent as f64) * 100.0
    }
}

/// Shared cell holding one target's statistics.
///
/// Only the owning worker writes through it; the renderer takes whole-row
/// snapshots so latency and success flag always come from the same attempt.
#[derive(Debug)]
pub struct TargetSlot {
    stats: Mutex<TargetStats>,
}

impl TargetSlot {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            stats: Mutex::new(TargetStats::new(address)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TargetStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count an attempt that has been admitted through the gate
    pub fn record_attempt(&self) {
        self.lock().sent += 1;
    }

    /// Fold a finished probe into the aggregate
    pub fn apply(&self, outcome: &ProbeOutcome) {
        let mut stats = self.lock();
        stats.received = (stats.received + outcome.received).min(stats.sent);
        stats.latency_ms = outcome.latency_ms;
        stats.last_success = outcome.success();
    }

    pub fn snapshot(&self) -> TargetStats {
        self.lock().clone()
    }
}

/// Ordered view over every target's slot; display order is input order
#[derive(Debug, Clone)]
pub struct StatsBoard {
    slots: Arc<[Arc<TargetSlot>]>,
}

impl StatsBoard {
    pub fn new<S: AsRef<str>>(targets: &[S]) -> Self {
        let slots: Vec<Arc<TargetSlot>> = targets
            .iter()
            .map(|t| Arc::new(TargetSlot::new(t.as_ref())))
            .collect();
        Self {
            slots: slots.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<Arc<TargetSlot>> {
        self.slots.get(index).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TargetSlot>> {
        self.slots.iter()
    }

    pub fn snapshot(&self) -> Vec<TargetStats> {
        self.slots.iter().map(|slot| slot.snapshot()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_success_rate_zero_before_first_attempt() {
        let stats = TargetStats::new("10.0.0.1");
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_apply_overwrites_latency() {
        let slot = TargetSlot::new("10.0.0.1");
        slot.record_attempt();
        slot.apply(&ProbeOutcome::reply(Some(12.5)));
        slot.record_attempt();
        slot.apply(&ProbeOutcome::failure("No reply"));

        let stats = slot.snapshot();
        assert_eq!(stats.sent, 2);
        assert_eq!(stats.received, 1);
        assert_eq!(stats.latency_ms, None);
        assert!(!stats.last_success);
        assert_eq!(stats.success_rate(), 50.0);
    }

    #[test]
    fn test_board_keeps_input_order() {
        let board = StatsBoard::new(&["b", "a", "c"]);
        let order: Vec<String> = board.snapshot().into_iter().map(|s| s.address).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(board.len(), 3);
        assert!(board.slot(3).is_none());
    }

    proptest! {
        #[test]
        fn prop_received_never_exceeds_sent(replies in proptest::collection::vec(any::<bool>(), 0..64)) {
            let slot = TargetSlot::new("host");
            for reply in replies {
                slot.record_attempt();
                let outcome = if reply {
                    ProbeOutcome::reply(Some(1.0))
                } else {
                    ProbeOutcome::failure("No reply")
                };
                slot.apply(&outcome);
                let stats = slot.snapshot();
                prop_assert!(stats.received <= stats.sent);
                let rate = stats.success_rate();
                prop_assert!((0.0..=100.0).contains(&rate));
            }
        }
    }
}
