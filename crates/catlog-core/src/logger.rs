//! The category logger.
//!
//! `CategoryLogger` ties the registry, renderer, dispatcher and timers
//! together behind one call surface. Every method takes `&self`; share a
//! logger between threads with an `Arc`.
//!
//! ## Example
//!
//! ```rust
//! use catlog_core::{testing::SharedBuffer, CategoryLogger};
//! use catlog_types::params;
//!
//! let out = SharedBuffer::new();
//! let logger = CategoryLogger::new(out.clone());
//!
//! logger.add_category_children("app", ["db"])?;
//! logger.set_category_format("[%s] ")?;
//! logger.log_with(Some("db"), "%d rows", &params![42])?;
//!
//! assert!(out.contents().ends_with(": [db] 42 rows\r\n"));
//! # Ok::<(), catlog_types::CatlogError>(())
//! ```

use catlog_types::{bail, CategoryName, LogListener, LogParam, Result, TimeUnit, TimerKey};
use parking_lot::RwLock;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::dispatch::FanoutDispatcher;
use crate::registry::CategoryRegistry;
use crate::render::{format_template, MessageRenderer};
use crate::timing::TimeTracker;
use crate::units::{self, DurationValue};

/// Hierarchical category logger.
#[derive(Debug)]
pub struct CategoryLogger {
    registry: CategoryRegistry,
    dispatcher: FanoutDispatcher,
    renderer: MessageRenderer,
    timers: TimeTracker,
    default_category: RwLock<Option<CategoryName>>,
}

impl CategoryLogger {
    /// Create a logger whose primary stream is `out`.
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self::with_boxed(Box::new(out))
    }

    /// Create a logger from an already boxed primary stream.
    pub fn with_boxed(out: Box<dyn Write + Send>) -> Self {
        Self {
            registry: CategoryRegistry::new(),
            dispatcher: FanoutDispatcher::new(out),
            renderer: MessageRenderer::new(),
            timers: TimeTracker::new(),
            default_category: RwLock::new(None),
        }
    }

    /// A logger writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// A logger writing to standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Read access to the category registry.
    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Running timers.
    pub fn timers(&self) -> &TimeTracker {
        &self.timers
    }

    /// Register a listener on `category`.
    pub fn add_listener(
        &self,
        category: impl AsRef<str>,
        listener: impl LogListener + 'static,
    ) -> Result<()> {
        self.add_shared_listener(category, Arc::new(listener))
    }

    /// Register a listener that is also held elsewhere.
    pub fn add_shared_listener(
        &self,
        category: impl AsRef<str>,
        listener: Arc<dyn LogListener>,
    ) -> Result<()> {
        let category = CategoryName::new(category)?;
        debug!("Added listener to category '{}'", category);
        self.registry.add_listener(&category, listener);
        Ok(())
    }

    /// Append every line logged on `category` or its descendants to the
    /// file at `path`.
    pub fn add_file_log(&self, category: impl AsRef<str>, path: impl AsRef<Path>) -> Result<()> {
        let category = CategoryName::new(category)?;
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            bail!(InvalidArgument, "file log path is empty");
        }
        self.registry.add_file_sink(&category, path);
        Ok(())
    }

    /// Declare `children` as children of `category`.
    pub fn add_category_children<I, S>(&self, category: impl AsRef<str>, children: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parent = CategoryName::new(category)?;
        let children = names(children)?;
        self.registry.add_children(&parent, &children)
    }

    /// Explicitly enable each category.
    pub fn enable_categories<I, S>(&self, categories: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.set_enabled(&names(categories)?, true);
        Ok(())
    }

    /// Explicitly disable each category, silencing it and its descendants.
    pub fn disable_categories<I, S>(&self, categories: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.set_enabled(&names(categories)?, false);
        Ok(())
    }

    /// Category used by calls that do not name one.
    pub fn set_default_category(&self, category: impl AsRef<str>) -> Result<&Self> {
        let category = CategoryName::new(category)?;
        debug!("Default category set to '{}'", category);
        *self.default_category.write() = Some(category);
        Ok(self)
    }

    /// Forget the default category.
    pub fn clear_default_category(&self) -> &Self {
        *self.default_category.write() = None;
        self
    }

    /// The current default category.
    pub fn default_category(&self) -> Option<CategoryName> {
        self.default_category.read().clone()
    }

    /// Template for the category label placed in front of each message,
    /// e.g. `"[%s] "`.
    pub fn set_category_format(&self, format: &str) -> Result<&Self> {
        self.renderer.set_label_format(format)?;
        debug!("Category format set to '{}'", format);
        Ok(self)
    }

    /// Stop labelling lines with their category.
    pub fn clear_category_format(&self) -> &Self {
        self.renderer.clear_label_format();
        self
    }

    /// The current category label format.
    pub fn category_format(&self) -> Option<String> {
        self.renderer.label_format()
    }

    /// Log `message` on the default category.
    pub fn log(&self, message: &str) -> Result<()> {
        self.log_with(None, message, &[])
    }

    /// Log `message` on `category`.
    pub fn log_in(&self, category: impl AsRef<str>, message: &str) -> Result<()> {
        self.log_with(Some(category.as_ref()), message, &[])
    }

    /// Render `template` with `params` and send it out on `category`, or on
    /// the default category when `category` is `None`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty category, an empty template or a
    /// template that does not match `params`, including parameters that no
    /// placeholder consumes; nothing is written in that case. `CyclicHierarchy` if the category's parent chain loops.
    /// `SinkWrite` if any output failed after the full fanout ran.
    pub fn log_with(
        &self,
        category: Option<&str>,
        template: &str,
        params: &[LogParam],
    ) -> Result<()> {
        let category = self.resolve_category(category)?;
        self.emit(category.as_ref(), template, params)
    }

    /// Start (or restart) the timer for `key`.
    pub fn log_time_start(&self, key: impl Into<TimerKey>, unit: TimeUnit) {
        self.timers.start(key.into(), unit);
    }

    /// Stop the timer for `key` and log its elapsed time on the default
    /// category. `template` receives the elapsed value, in the unit the
    /// timer was started with, as its only parameter.
    ///
    /// # Errors
    ///
    /// `UnknownKey` if `key` was never started or has already ended, plus
    /// everything `log_with` returns. A template that cannot render the
    /// elapsed value fails before the timer is stopped.
    pub fn log_time_end(&self, key: impl Into<TimerKey>, template: &str) -> Result<()> {
        self.end_timer(key.into(), None, template)
    }

    /// Like [`log_time_end`](Self::log_time_end) on an explicit category.
    pub fn log_time_end_in(
        &self,
        key: impl Into<TimerKey>,
        category: impl AsRef<str>,
        template: &str,
    ) -> Result<()> {
        self.end_timer(key.into(), Some(category.as_ref()), template)
    }

    /// Convert `value` from `src` to `dst` and log it with `template`.
    pub fn log_time(
        &self,
        category: Option<&str>,
        template: &str,
        value: impl DurationValue,
        src: TimeUnit,
        dst: TimeUnit,
    ) -> Result<()> {
        let converted = units::convert(value.as_f64(), src, dst);
        self.log_with(category, template, &[LogParam::Float(converted)])
    }

    fn end_timer(&self, key: TimerKey, category: Option<&str>, template: &str) -> Result<()> {
        let category = self.resolve_category(category)?;
        // a template that cannot take the elapsed value leaves the timer running
        format_template(template, &[LogParam::Float(0.0)])?;
        let elapsed = self.timers.end(&key)?;
        self.emit(category.as_ref(), template, &[LogParam::Float(elapsed.value())])
    }

    fn resolve_category(&self, category: Option<&str>) -> Result<Option<CategoryName>> {
        match category {
            Some(name) => CategoryName::new(name).map(Some),
            None => Ok(self.default_category()),
        }
    }

    fn emit(
        &self,
        category: Option<&CategoryName>,
        template: &str,
        params: &[LogParam],
    ) -> Result<()> {
        let message = self.renderer.prepare(category, template, params)?;
        self.dispatcher.dispatch(&self.registry, category, &message)?;
        Ok(())
    }
}

fn names<I, S>(categories: I) -> Result<Vec<CategoryName>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    categories.into_iter().map(CategoryName::new).collect()
}
