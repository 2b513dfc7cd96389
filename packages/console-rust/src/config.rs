use std::time::Duration;

use serde::{Deserialize, Serialize};
use shopdesk_core::SelectionPolicy;

/// Timing of the simulated upload progress ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Interval between progress ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Percentage points added per tick.
    pub step_percent: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 200,
            step_percent: 10,
        }
    }
}

impl ProgressConfig {
    /// Tick interval as a [`Duration`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Console runtime configuration.
///
/// Controls collaborator latency, selection behaviour across filter
/// changes, list paging and upload progress timing. Missing keys take
/// their defaults when loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Upload progress ticker settings.
    pub progress: ProgressConfig,
    /// Artificial latency added by `DelayedSink`, in milliseconds.
    pub collaborator_latency_ms: u64,
    /// What happens to selected rows that a filter hides.
    pub selection_policy: SelectionPolicy,
    /// Rows per page when a page does not ask for a size.
    pub default_page_size: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            progress: ProgressConfig::default(),
            collaborator_latency_ms: 500,
            selection_policy: SelectionPolicy::Retain,
            default_page_size: 25,
        }
    }
}

impl ConsoleConfig {
    /// Latency for `DelayedSink` as a [`Duration`].
    #[must_use]
    pub fn collaborator_latency(&self) -> Duration {
        Duration::from_millis(self.collaborator_latency_ms)
    }
}
