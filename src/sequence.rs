use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic ticket for one fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CycleTicket(u64);

impl CycleTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Lets only the newest completed fetch cycle reach the map.
#[derive(Debug, Default)]
pub struct FeedSequencer {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl FeedSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new cycle. Tickets begin at 1.
    pub fn begin(&self) -> CycleTicket {
        CycleTicket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Marks `ticket` applied if it is newer than anything applied so far.
    ///
    /// Returns `false` for a superseded ticket, whose data must be dropped.
    pub fn try_apply(&self, ticket: CycleTicket) -> bool {
        let previous = self.applied.fetch_max(ticket.0, Ordering::AcqRel);
        previous < ticket.0
    }

    pub fn last_applied(&self) -> u64 {
        self.applied.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn newer_cycles_win() {
        let seq = FeedSequencer::new();
        let first = seq.begin();
        let second = seq.begin();
        assert!(first < second);

        assert!(seq.try_apply(second));
        assert!(!seq.try_apply(first));
        assert_eq!(seq.last_applied(), second.get());
    }

    #[test]
    fn a_ticket_applies_once() {
        let seq = FeedSequencer::new();
        let t = seq.begin();
        assert!(seq.try_apply(t));
        assert!(!seq.try_apply(t));
    }

    #[tokio::test]
    async fn slow_early_fetch_is_discarded() {
        let seq = Arc::new(FeedSequencer::new());
        let applied = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (label, delay_ms) in [("slow", 50u64), ("fast", 0)] {
            let seq = seq.clone();
            let applied = applied.clone();
            let ticket = seq.begin();
            handles.push(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                let mut applied = applied.lock().await;
                if seq.try_apply(ticket) {
                    applied.push(label);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*applied.lock().await, vec!["fast"]);
    }
}
