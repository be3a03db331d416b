//! Per-harvester configuration.

use std::collections::BTreeMap;
use std::time::Duration;

/// Where to start reading a file the harvester has no tracked offset for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartAt {
    /// Replay the file from its first byte.
    #[default]
    Beginning,
    /// Skip existing content and only emit lines appended afterwards.
    End,
}

/// Configuration for a single harvester.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// How long the file may stay quiet before the harvester gives up on it.
    pub dead_time: Duration,
    /// Initial position policy when no offset is tracked yet.
    pub start_at: StartAt,
    /// Static tags attached to every emitted event.
    pub fields: BTreeMap<String, String>,
    /// How long one line read waits at end-of-file before reporting it.
    pub eof_timeout: Duration,
    /// Back-off between reads while waiting for a line to complete.
    pub eof_poll_interval: Duration,
    /// Back-off between attempts to open a missing or unreadable file.
    pub open_retry_interval: Duration,
    /// Wake up early from the end-of-file back-off on filesystem change events.
    pub watch_changes: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            dead_time: Duration::from_secs(24 * 60 * 60),
            start_at: StartAt::default(),
            fields: BTreeMap::new(),
            eof_timeout: Duration::from_secs(10),
            eof_poll_interval: Duration::from_secs(1),
            open_retry_interval: Duration::from_secs(5),
            watch_changes: true,
        }
    }
}

impl HarvestConfig {
    pub fn with_dead_time(mut self, dead_time: Duration) -> Self {
        self.dead_time = dead_time;
        self
    }

    pub fn with_start_at(mut self, start_at: StartAt) -> Self {
        self.start_at = start_at;
        self
    }

    /// Adds a tag that will be copied onto every event.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_eof_timeout(mut self, eof_timeout: Duration) -> Self {
        self.eof_timeout = eof_timeout;
        self
    }

    pub fn with_eof_poll_interval(mut self, interval: Duration) -> Self {
        self.eof_poll_interval = interval;
        self
    }

    pub fn with_open_retry_interval(mut self, interval: Duration) -> Self {
        self.open_retry_interval = interval;
        self
    }

    /// Filesystem notifications only cut the end-of-file back-off short;
    /// without them the reader still polls at `eof_poll_interval`.
    pub fn with_watch_changes(mut self, watch_changes: bool) -> Self {
        self.watch_changes = watch_changes;
        self
    }
}
