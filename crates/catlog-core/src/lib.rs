//! # catlog core
//!
//! A hierarchical category logger. Messages are logged against named
//! categories arranged in a parent/child tree; each line goes to a primary
//! stream and to every file sink and listener registered on the category or
//! any of its ancestors, unless something on that chain is explicitly
//! disabled.
//!
//! This crate provides:
//!
//! - **Units**: conversion between nanoseconds, milliseconds, seconds,
//!   minutes and hours
//! - **Registry**: category hierarchy, enabled flags, sinks and listeners
//! - **Rendering**: printf-style templates, category labels, timestamps
//! - **Dispatch**: serialized fanout of each line to every output
//! - **Timing**: keyed interval timers logged in a chosen unit
//! - **Configuration**: YAML category trees with environment overrides
//!
//! ## Example
//!
//! ```rust
//! use catlog_core::{CategoryLogger, TimeUnit};
//!
//! let logger = CategoryLogger::stdout();
//! logger.add_category_children("app", ["db", "http"])?;
//! logger.disable_categories(["http"])?;
//!
//! logger.log_in("db", "connected")?;
//! logger.log_in("http", "not printed")?;
//!
//! logger.log_time_start("startup", TimeUnit::Milliseconds);
//! logger.log_time_end_in("startup", "app", "started in %.1f ms")?;
//! # Ok::<(), catlog_core::CatlogError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatch;
pub mod log;
pub mod logger;
pub mod registry;
pub mod render;
pub mod testing;
pub mod time;
pub mod timing;
pub mod units;
pub mod util;

// Re-export commonly used items
pub use catlog_types::{
    params, CatlogError, CategoryName, LogListener, LogParam, Result, TimeUnit, TimerKey,
};
pub use config::LoggerConfig;
pub use logger::CategoryLogger;
pub use units::{convert, DurationValue};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
