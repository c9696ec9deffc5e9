//! Common enumerations used throughout catlog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use crate::errors::{CatlogError, Result};

/// Time unit granularity for duration logging.
///
/// Each unit maps to an exact whole number of nanoseconds, so conversions
/// go through a single integer scale factor per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// 1 ns
    Nanoseconds,
    /// 10^6 ns
    Milliseconds,
    /// 10^9 ns
    Seconds,
    /// 60 * 10^9 ns
    Minutes,
    /// 3600 * 10^9 ns
    Hours,
}

impl TimeUnit {
    /// All units, finest first.
    pub const ALL: [TimeUnit; 5] = [
        TimeUnit::Nanoseconds,
        TimeUnit::Milliseconds,
        TimeUnit::Seconds,
        TimeUnit::Minutes,
        TimeUnit::Hours,
    ];

    /// Number of nanoseconds in one of this unit.
    pub const fn nanos_per_unit(self) -> u64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 3_600 * 1_000_000_000,
        }
    }

    /// Short suffix used when printing a value in this unit.
    pub const fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
        }
    }

    /// Express a `Duration` as a (possibly fractional) count of this unit.
    pub fn duration_in(self, duration: Duration) -> f64 {
        duration.as_nanos() as f64 / self.nanos_per_unit() as f64
    }
}

impl FromStr for TimeUnit {
    type Err = CatlogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ns" | "nanos" | "nanosecond" | "nanoseconds" => Ok(TimeUnit::Nanoseconds),
            "ms" | "millis" | "millisecond" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(TimeUnit::Seconds),
            "min" | "mins" | "minute" | "minutes" => Ok(TimeUnit::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Ok(TimeUnit::Hours),
            _ => Err(CatlogError::UnsupportedUnit(s.to_string())),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Nanoseconds => write!(f, "NANOSECONDS"),
            TimeUnit::Milliseconds => write!(f, "MILLISECONDS"),
            TimeUnit::Seconds => write!(f, "SECONDS"),
            TimeUnit::Minutes => write!(f, "MINUTES"),
            TimeUnit::Hours => write!(f, "HOURS"),
        }
    }
}
