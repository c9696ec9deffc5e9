//! Keyed interval timers.

use catlog_types::{CatlogError, Result, TimeUnit, TimerKey};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::time::pretty_duration;

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    unit: TimeUnit,
    started: Instant,
}

/// A finished interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elapsed {
    /// Unit declared when the timer started
    pub unit: TimeUnit,
    /// Monotonic time between start and end
    pub duration: Duration,
}

impl Elapsed {
    /// The elapsed time expressed in the declared unit.
    pub fn value(&self) -> f64 {
        self.unit.duration_in(self.duration)
    }
}

/// Tracks start instants for in-flight timers.
///
/// Keys are sharded, so timers on different keys started and ended from
/// different threads do not contend.
#[derive(Debug, Default)]
pub struct TimeTracker {
    entries: DashMap<TimerKey, TimerEntry>,
}

impl TimeTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer for `key`.
    pub fn start(&self, key: TimerKey, unit: TimeUnit) {
        debug!("Timer '{}' started ({})", key, unit.suffix());
        self.entries.insert(
            key,
            TimerEntry {
                unit,
                started: Instant::now(),
            },
        );
    }

    /// Stop the timer for `key` and return how long it ran.
    ///
    /// # Errors
    ///
    /// `UnknownKey` if `key` was never started or has already ended.
    pub fn end(&self, key: &TimerKey) -> Result<Elapsed> {
        let ended = Instant::now();
        let (_, entry) = self
            .entries
            .remove(key)
            .ok_or_else(|| CatlogError::UnknownKey(key.to_string()))?;
        let duration = ended.saturating_duration_since(entry.started);
        debug!("Timer '{}' ended after {}", key, pretty_duration(duration));
        Ok(Elapsed {
            unit: entry.unit,
            duration,
        })
    }

    /// Whether a timer is running for `key`.
    pub fn is_tracking(&self, key: &TimerKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of running timers.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}
