//! Fanout of rendered lines to every output of a category closure.

use catlog_types::{CatlogError, CategoryName, Result, SinkFailure, SinkTarget};
use chrono::Local;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, trace, warn};

use crate::registry::{CategoryRegistry, FanoutTargets, Resolution};
use crate::render::PreparedLine;
use crate::util;

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An explicit disable on the closure suppressed the line
    Suppressed,
    /// The line went out
    Delivered {
        /// File sinks written successfully
        files_written: usize,
        /// Listeners that returned normally
        listeners_notified: usize,
    },
}

/// Serializes fanout so that each line reaches every output before the
/// next line starts.
///
/// The lock is re-entrant: a listener that logs through the same logger
/// completes its nested dispatch instead of deadlocking.
pub struct FanoutDispatcher {
    primary: ReentrantMutex<RefCell<Box<dyn Write + Send>>>,
}

impl fmt::Debug for FanoutDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutDispatcher").finish_non_exhaustive()
    }
}

impl FanoutDispatcher {
    /// Create a dispatcher writing to `primary`.
    pub fn new(primary: Box<dyn Write + Send>) -> Self {
        Self {
            primary: ReentrantMutex::new(RefCell::new(primary)),
        }
    }

    /// Stamp `message` and send it to the primary stream and every file
    /// sink and listener on the closure of `category`.
    ///
    /// The timestamp is taken under the dispatch lock, so lines reach each
    /// output in timestamp order. Every output is attempted even when an
    /// earlier one fails.
    ///
    /// # Errors
    ///
    /// `CyclicHierarchy` if the closure cannot be resolved (nothing is
    /// written). `SinkWrite` listing every failed write, returned after the
    /// whole fanout ran. Listener panics are contained and never surface.
    pub fn dispatch(
        &self,
        registry: &CategoryRegistry,
        category: Option<&CategoryName>,
        message: &PreparedLine,
    ) -> Result<DispatchOutcome> {
        let targets = match registry.resolve(category)? {
            Resolution::Gated => {
                trace!(
                    "Suppressed line for disabled category '{}'",
                    category.map_or("", CategoryName::as_str)
                );
                return Ok(DispatchOutcome::Suppressed);
            }
            Resolution::Deliver(targets) => targets,
        };

        let primary = self.primary.lock();
        let line = message.stamp(&Local::now());
        let mut failures = Vec::new();

        if let Err(e) = write_primary(&primary, &line) {
            warn!("Failed to write log line to primary stream: {}", e);
            failures.push(SinkFailure::new(SinkTarget::Primary, e));
        }

        let files_written = write_files(&targets, &line, &mut failures);
        let listeners_notified = notify_listeners(&targets, category, &line);

        if failures.is_empty() {
            Ok(DispatchOutcome::Delivered {
                files_written,
                listeners_notified,
            })
        } else {
            Err(CatlogError::SinkWrite { failures })
        }
    }
}

fn write_primary(primary: &RefCell<Box<dyn Write + Send>>, line: &str) -> io::Result<()> {
    let mut out = primary.try_borrow_mut().map_err(|_| {
        io::Error::new(io::ErrorKind::WouldBlock, "primary stream is already in use")
    })?;
    out.write_all(line.as_bytes())?;
    out.flush()
}

fn write_files(targets: &FanoutTargets, line: &str, failures: &mut Vec<SinkFailure>) -> usize {
    let mut written = 0;
    for (category, path) in &targets.file_sinks {
        match util::append(path, line) {
            Ok(()) => written += 1,
            Err(e) => {
                warn!(
                    "Failed to write log file {} for category '{}': {}",
                    path.display(),
                    category,
                    e
                );
                failures.push(SinkFailure::new(
                    SinkTarget::File {
                        category: category.to_string(),
                        path: path.clone(),
                    },
                    e,
                ));
            }
        }
    }
    written
}

fn notify_listeners(targets: &FanoutTargets, category: Option<&CategoryName>, line: &str) -> usize {
    let resolved = category.map_or("", CategoryName::as_str);
    let mut notified = 0;
    for listener in &targets.listeners {
        let result = panic::catch_unwind(AssertUnwindSafe(|| listener.on_log(resolved, line)));
        match result {
            Ok(()) => notified += 1,
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!("Log listener for category '{}' panicked: {}", resolved, reason);
            }
        }
    }
    notified
}
