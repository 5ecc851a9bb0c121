//! Observer tuning knobs.

use std::time::Duration;

/// Log files whose session started longer ago than this are ignored.
pub const DEFAULT_RECENCY_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Same author and text within this interval counts as a duplicate line.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(2);

/// How long handled messages are remembered.
pub const DEFAULT_HISTORY_RETENTION: Duration = DEFAULT_RECENCY_WINDOW;

/// Minimum interval between two history pruning passes.
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverConfig {
    pub recency_window: Duration,
    pub dedup_window: Duration,
    /// Lines older than this are skipped when a file is read. Shorter than
    /// `recency_window` means part of a newly followed file's backlog is
    /// never delivered.
    pub history_retention: Duration,
    pub prune_interval: Duration,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            recency_window: DEFAULT_RECENCY_WINDOW,
            dedup_window: DEFAULT_DEDUP_WINDOW,
            history_retention: DEFAULT_HISTORY_RETENTION,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

impl ObserverConfig {
    /// Config with a custom recency window; retention follows it.
    pub fn with_recency_window(mut self, window: Duration) -> Self {
        self.recency_window = window;
        self.history_retention = self.history_retention.max(window);
        self
    }

    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }
}
