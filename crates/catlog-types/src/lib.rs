//! # catlog Types
//!
//! Core types, traits, and enums shared across the catlog crates.
//!
//! This crate provides the vocabulary of the category logger:
//!
//! - Type-safe identifiers for category names and timer keys
//! - The closed set of time units used for duration logging
//! - Positional message parameters
//! - The listener capability trait
//! - Error types and result aliases
//!
//! ## Example
//!
//! ```
//! use catlog_types::{CategoryName, TimeUnit, params};
//!
//! let cat = CategoryName::new("http").unwrap();
//! assert_eq!(cat.as_str(), "http");
//!
//! let unit: TimeUnit = "ms".parse().unwrap();
//! assert_eq!(unit.nanos_per_unit(), 1_000_000);
//!
//! let p = params!["GET", 200];
//! assert_eq!(p.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod identifiers;
pub mod enums;
pub mod params;
pub mod traits;

// Re-export common types for convenience
pub use errors::{CatlogError, Result, SinkFailure, SinkTarget};
pub use identifiers::{CategoryName, TimerKey};
pub use enums::TimeUnit;
pub use params::LogParam;
pub use traits::LogListener;
