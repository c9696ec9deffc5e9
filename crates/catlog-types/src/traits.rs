//! Core trait definitions for catlog abstractions.

/// Trait for programmatic log listeners.
///
/// A listener is registered against a category and is called synchronously
/// for every line dispatched to that category or any of its descendants.
/// It receives the category the message was logged under (not the category
/// it was registered on) and the fully rendered line, including the
/// timestamp, label and line terminator.
///
/// A listener that panics is contained by the dispatcher: the panic is
/// reported through diagnostics and the remaining outputs still run.
///
/// Any `Fn(&str, &str) + Send + Sync` closure is a listener.
///
/// # Example
///
/// ```
/// use catlog_types::LogListener;
///
/// let listener = |category: &str, line: &str| {
///     assert!(!category.is_empty());
///     assert!(line.ends_with("\r\n"));
/// };
/// listener.on_log("db", "2024-01-01T00:00:00: hi\r\n");
/// ```
pub trait LogListener: Send + Sync {
    /// Called with the resolved category and the rendered line.
    fn on_log(&self, category: &str, line: &str);
}

impl<F> LogListener for F
where
    F: Fn(&str, &str) + Send + Sync,
{
    fn on_log(&self, category: &str, line: &str) {
        self(category, line)
    }
}
