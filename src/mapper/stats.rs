use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Orchestrator statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapperStats {
    pub calls: u64,
    pub failures: u64,
    pub total_elapsed: Duration,
}

impl MapperStats {
    pub fn successes(&self) -> u64 {
        self.calls.saturating_sub(self.failures)
    }
}

impl fmt::Display for MapperStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mapper Stats: {} calls, {} failed, {:?} total",
            self.calls, self.failures, self.total_elapsed
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    calls: AtomicU64,
    failures: AtomicU64,
    elapsed_nanos: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn record(&self, elapsed: Duration, failed: bool) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MapperStats {
        MapperStats {
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            total_elapsed: Duration::from_nanos(self.elapsed_nanos.load(Ordering::Relaxed)),
        }
    }

    pub(crate) fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.elapsed_nanos.store(0, Ordering::Relaxed);
    }
}
