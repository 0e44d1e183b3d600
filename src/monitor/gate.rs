use crate::monitor::error::{MonitorError, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Counting admission gate bounding how many probes are in flight at once
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Admission to probe; the slot is returned when the permit is dropped
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Return the slot to the gate
    pub fn release(self) {}
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait until a permit is free.
    ///
    /// Cancel-safe: dropping the future while it waits takes no permit.
    pub async fn acquire(&self) -> Result<GatePermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| MonitorError::GateClosed)?;
        debug!(available = self.available(), "Gate permit acquired");
        Ok(GatePermit { _permit: permit })
    }

    /// Refuse all further admissions and wake every waiter with an error
    pub fn close(&self) {
        self.semaphore.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_capacity_is_enforced() -> Result<()> {
        let gate = ConcurrencyGate::new(2);
        let first = gate.acquire().await?;
        let _second = gate.acquire().await?;
        assert_eq!(gate.available(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(20), gate.acquire()).await;
        assert!(blocked.is_err());

        first.release();
        assert_eq!(gate.available(), 1);
        let _third = gate.acquire().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_gate_rejects_waiters() -> Result<()> {
        let gate = ConcurrencyGate::new(1);
        let _held = gate.acquire().await?;

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire().await })
        };
        tokio::task::yield_now().await;
        gate.close();

        let result = waiter.await.map_err(|e| MonitorError::Config(e.to_string()))?;
        assert!(matches!(result, Err(MonitorError::GateClosed)));
        Ok(())
    }
}
