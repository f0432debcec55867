use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_JOB_LIMIT: usize = 2;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Admission control for aggregation jobs.
///
/// At most `limit` permits are outstanding at once. Waiters poll on a fixed
/// interval rather than queueing, so admission order is not fair: whichever
/// waiter checks first after a release gets the slot.
#[derive(Debug)]
pub struct ConcurrencyGate {
    active: AtomicUsize,
    limit: usize,
    poll_interval: Duration,
}

/// Held for the lifetime of an admitted job; the slot is released on drop.
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<ConcurrencyGate>,
}

impl ConcurrencyGate {
    pub fn new(limit: usize, poll_interval: Duration) -> Self {
        Self {
            active: AtomicUsize::new(0),
            limit: limit.max(1),
            poll_interval,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(self: &Arc<Self>) -> Option<GatePermit> {
        let mut current = self.active.load(Ordering::Acquire);
        loop {
            if current >= self.limit {
                return None;
            }
            match self.active.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(GatePermit {
                        gate: Arc::clone(self),
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Wait until a slot frees up. `label` only feeds the waiting log line.
    pub async fn acquire(self: &Arc<Self>, label: &str) -> GatePermit {
        loop {
            if let Some(permit) = self.try_acquire() {
                return permit;
            }
            tokio::time::sleep(self.poll_interval).await;
            info!("Waiting for active processes to finish... to process {}", label);
        }
    }

    fn release(&self) {
        // never underflow even if release is called against an idle gate
        let _ = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_JOB_LIMIT, DEFAULT_POLL_INTERVAL)
    }
}

impl GatePermit {
    /// Give the slot back early. Dropping the permit does the same.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
