use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Accumulate call counts and elapsed mapping time
    pub collect_stats: bool,

    /// Warn about top-level calls slower than this
    pub slow_call_threshold: Option<Duration>,
}

impl MapperConfig {
    pub fn new() -> Self {
        Self {
            collect_stats: true,
            slow_call_threshold: None,
        }
    }

    /// Enable or disable stats collection
    pub fn collect_stats(mut self, enabled: bool) -> Self {
        self.collect_stats = enabled;
        self
    }

    /// Set the slow call threshold
    pub fn slow_call_threshold(mut self, threshold: Duration) -> Self {
        self.slow_call_threshold = Some(threshold);
        self
    }

    pub(crate) fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_call_threshold.is_some_and(|limit| elapsed > limit)
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::new()
    }
}
