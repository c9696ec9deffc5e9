//! Error types for catlog operations.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for catlog operations.
///
/// Caller-contract violations (`InvalidArgument`, `UnknownKey`,
/// `CyclicHierarchy`) are raised synchronously by the offending call.
/// `SinkWrite` is only produced after a dispatch has attempted every
/// output of the category closure.
#[derive(Error, Debug)]
pub enum CatlogError {
    /// A required input was empty, missing, or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A timer was ended without a matching start
    #[error("Never started logging time with key: {0}")]
    UnknownKey(String),

    /// One or more outputs of a dispatch could not be written
    #[error("Failed to write {} log sink(s): {}", .failures.len(), SinkFailure::join(.failures))]
    SinkWrite {
        /// Every output that failed during the dispatch, in attempt order
        failures: Vec<SinkFailure>,
    },

    /// A time unit name outside the supported set
    #[error("Time unit {0} not supported")]
    UnsupportedUnit(String),

    /// The parent chain of a category loops back on itself
    #[error("Cyclic category hierarchy: {}", .0.join(" -> "))]
    CyclicHierarchy(Vec<String>),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Internal bug - should never happen in production
    #[error("Bug detected: {0}\n\nThis is an internal error. Please report this issue at:\nhttps://github.com/catlog-rs/catlog/issues")]
    Bug(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl CatlogError {
    /// Shorthand for building an `InvalidArgument` error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        CatlogError::InvalidArgument(msg.into())
    }

    /// Returns the sink failures carried by a `SinkWrite` error.
    pub fn sink_failures(&self) -> &[SinkFailure] {
        match self {
            CatlogError::SinkWrite { failures } => failures,
            _ => &[],
        }
    }
}

/// The output a failed write was aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    /// The logger's injected primary stream
    Primary,
    /// A file sink registered on a category
    File {
        /// Category the sink was registered on
        category: String,
        /// Path of the file sink
        path: PathBuf,
    },
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Primary => write!(f, "primary stream"),
            SinkTarget::File { category, path } => {
                write!(f, "{} (category {})", path.display(), category)
            }
        }
    }
}

/// A single failed write recorded during a dispatch.
#[derive(Debug)]
pub struct SinkFailure {
    /// Where the line was going
    pub target: SinkTarget,
    /// What went wrong
    pub source: io::Error,
}

impl SinkFailure {
    /// Create a new sink failure record.
    pub fn new(target: SinkTarget, source: io::Error) -> Self {
        Self { target, source }
    }

    fn join(failures: &[SinkFailure]) -> String {
        failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for SinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.source)
    }
}

/// A specialized Result type for catlog operations.
pub type Result<T> = std::result::Result<T, CatlogError>;

/// Helper macro to create and return a CatlogError::Bug
///
/// This should be used for conditions that should never occur
/// in normal operation and indicate a bug in catlog itself.
///
/// # Example
///
/// ```ignore
/// if some_impossible_condition {
///     bug!("This should never happen: {:?}", condition);
/// }
/// ```
#[macro_export]
macro_rules! bug {
    ($msg:expr) => {
        return Err($crate::CatlogError::Bug($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::CatlogError::Bug(format!($fmt, $($arg)*)))
    };
}

/// Helper macro to bail out with a CatlogError
///
/// This is used for expected error conditions.
///
/// # Example
///
/// ```ignore
/// if children.is_empty() {
///     bail!(InvalidArgument, "children is empty for {}", parent);
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $msg:expr) => {
        return Err($crate::CatlogError::$variant($msg.to_string()))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::CatlogError::$variant(format!($fmt, $($arg)*)))
    };
    ($msg:expr) => {
        return Err($crate::CatlogError::Other($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::CatlogError::Other(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_write_message_lists_every_failure() {
        let err = CatlogError::SinkWrite {
            failures: vec![
                SinkFailure::new(
                    SinkTarget::Primary,
                    io::Error::new(io::ErrorKind::BrokenPipe, "closed"),
                ),
                SinkFailure::new(
                    SinkTarget::File {
                        category: "db".to_string(),
                        path: PathBuf::from("/nope/db.log"),
                    },
                    io::Error::new(io::ErrorKind::NotFound, "missing"),
                ),
            ],
        };

        let msg = err.to_string();
        assert!(msg.starts_with("Failed to write 2 log sink(s)"));
        assert!(msg.contains("primary stream: closed"));
        assert!(msg.contains("/nope/db.log (category db): missing"));
        assert_eq!(err.sink_failures().len(), 2);
    }

    #[test]
    fn test_cyclic_hierarchy_message() {
        let err = CatlogError::CyclicHierarchy(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "Cyclic category hierarchy: a -> b -> a");
    }

    fn bails(flag: bool) -> Result<()> {
        if flag {
            bail!(InvalidArgument, "flag was {}", flag);
        }
        Ok(())
    }

    #[test]
    fn test_bail_macro() {
        assert!(bails(false).is_ok());
        match bails(true) {
            Err(CatlogError::InvalidArgument(msg)) => assert_eq!(msg, "flag was true"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
