//! Category registry.
//!
//! Holds everything known about each category: its explicit enabled flag,
//! its declared parent, and the file sinks and listeners attached to it.
//! Categories spring into existence the first time any of these is set.
//!
//! All state lives behind a single reader-writer lock. Resolution (closure,
//! gating, fanout targets) only takes the read side, so concurrent log calls
//! never block each other here.

use catlog_types::{bail, CatlogError, CategoryName, LogListener, Result};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::util::expand_path;

/// Everything registered against one category.
#[derive(Clone, Default)]
pub struct CategoryEntry {
    /// Explicit enabled flag; `None` inherits
    pub enabled: Option<bool>,
    /// Declared parent category
    pub parent: Option<CategoryName>,
    /// File sinks in registration order
    pub file_sinks: Vec<PathBuf>,
    /// Listeners in registration order
    pub listeners: Vec<Arc<dyn LogListener>>,
}

impl fmt::Debug for CategoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryEntry")
            .field("enabled", &self.enabled)
            .field("parent", &self.parent)
            .field("file_sinks", &self.file_sinks)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Outputs reachable from a resolved category.
#[derive(Clone, Default)]
pub struct FanoutTargets {
    /// Ancestor closure, root first, ending with the category itself
    pub closure: Vec<CategoryName>,
    /// File sinks with the category they were registered on
    pub file_sinks: Vec<(CategoryName, PathBuf)>,
    /// Listeners in closure order, then registration order
    pub listeners: Vec<Arc<dyn LogListener>>,
}

impl fmt::Debug for FanoutTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutTargets")
            .field("closure", &self.closure)
            .field("file_sinks", &self.file_sinks)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Result of resolving a category for dispatch.
#[derive(Debug)]
pub enum Resolution {
    /// An explicit disable on the closure suppresses the message
    Gated,
    /// The message goes out to these targets
    Deliver(FanoutTargets),
}

/// Thread-safe store of category state.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    entries: RwLock<IndexMap<CategoryName, CategoryEntry>>,
}

impl CategoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `children` as children of `parent`.
    ///
    /// A child that already has a parent is silently re-parented.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `children` is empty; `CyclicHierarchy` if a
    /// child is the parent itself.
    pub fn add_children(&self, parent: &CategoryName, children: &[CategoryName]) -> Result<()> {
        if children.is_empty() {
            bail!(InvalidArgument, "children of '{}' is empty", parent);
        }
        if let Some(child) = children.iter().find(|c| *c == parent) {
            return Err(CatlogError::CyclicHierarchy(vec![
                child.to_string(),
                parent.to_string(),
            ]));
        }

        let mut entries = self.entries.write();
        entries.entry(parent.clone()).or_default();
        for child in children {
            let entry = entries.entry(child.clone()).or_default();
            if let Some(previous) = entry.parent.replace(parent.clone()) {
                if previous != *parent {
                    debug!("Category '{}' re-parented from '{}' to '{}'", child, previous, parent);
                }
            }
        }
        Ok(())
    }

    /// Set the explicit enabled flag on each category.
    pub fn set_enabled(&self, categories: &[CategoryName], value: bool) {
        if categories.is_empty() {
            return;
        }
        let mut entries = self.entries.write();
        for category in categories {
            entries.entry(category.clone()).or_default().enabled = Some(value);
        }
        debug!(
            "{} categories: {}",
            if value { "Enabled" } else { "Disabled" },
            join(categories)
        );
    }

    /// Append a file sink to a category. A leading `~` is expanded.
    pub fn add_file_sink(&self, category: &CategoryName, path: impl Into<PathBuf>) {
        let path = expand_path(path.into());
        debug!("Added file log {} to category '{}'", path.display(), category);
        self.entries
            .write()
            .entry(category.clone())
            .or_default()
            .file_sinks
            .push(path);
    }

    /// Append a listener to a category.
    pub fn add_listener(&self, category: &CategoryName, listener: Arc<dyn LogListener>) {
        self.entries
            .write()
            .entry(category.clone())
            .or_default()
            .listeners
            .push(listener);
    }

    /// Remove every listener registered on `category`, returning how many
    /// were removed.
    pub fn remove_listeners(&self, category: &CategoryName) -> usize {
        self.entries
            .write()
            .get_mut(category)
            .map_or(0, |e| std::mem::take(&mut e.listeners).len())
    }

    /// Remove every file sink registered on `category`, returning the paths.
    pub fn clear_file_sinks(&self, category: &CategoryName) -> Vec<PathBuf> {
        self.entries
            .write()
            .get_mut(category)
            .map(|e| std::mem::take(&mut e.file_sinks))
            .unwrap_or_default()
    }

    /// The declared parent of `category`.
    pub fn parent_of(&self, category: &CategoryName) -> Option<CategoryName> {
        self.entries.read().get(category).and_then(|e| e.parent.clone())
    }

    /// The explicit enabled flag of `category`, if set.
    pub fn enabled_flag(&self, category: &CategoryName) -> Option<bool> {
        self.entries.read().get(category).and_then(|e| e.enabled)
    }

    /// Every known category, in first-reference order.
    pub fn categories(&self) -> Vec<CategoryName> {
        self.entries.read().keys().cloned().collect()
    }

    /// A copy of the state registered against `category`.
    pub fn entry(&self, category: &CategoryName) -> Option<CategoryEntry> {
        self.entries.read().get(category).cloned()
    }

    /// The ancestor chain of `category`, root first and ending with
    /// `category` itself. `None` yields an empty chain.
    ///
    /// # Errors
    ///
    /// `CyclicHierarchy` if following parents revisits a category.
    pub fn ancestor_closure(&self, category: Option<&CategoryName>) -> Result<Vec<CategoryName>> {
        let entries = self.entries.read();
        closure_of(&entries, category)
    }

    /// Whether any category in `closure` is explicitly disabled.
    ///
    /// A member is also disabled when its dotted path from the root (for
    /// the closure `[root, child]`, the path of `child` is `root.child`)
    /// carries an explicit `false`. Categories with no flag, or with an
    /// explicit `true`, never gate.
    pub fn is_gated(&self, closure: &[CategoryName]) -> bool {
        let entries = self.entries.read();
        gated(&entries, closure)
    }

    /// Resolve `category` for dispatch in one consistent read: closure,
    /// gating decision and the outputs to write to.
    pub fn resolve(&self, category: Option<&CategoryName>) -> Result<Resolution> {
        let entries = self.entries.read();
        let closure = closure_of(&entries, category)?;
        if gated(&entries, &closure) {
            return Ok(Resolution::Gated);
        }

        let mut targets = FanoutTargets::default();
        for name in &closure {
            if let Some(entry) = entries.get(name) {
                targets
                    .file_sinks
                    .extend(entry.file_sinks.iter().map(|p| (name.clone(), p.clone())));
                targets.listeners.extend(entry.listeners.iter().cloned());
            }
        }
        targets.closure = closure;
        Ok(Resolution::Deliver(targets))
    }
}

fn closure_of(
    entries: &IndexMap<CategoryName, CategoryEntry>,
    category: Option<&CategoryName>,
) -> Result<Vec<CategoryName>> {
    let mut chain: IndexSet<CategoryName> = IndexSet::new();
    let mut current = category.cloned();

    while let Some(name) = current {
        let parent = entries.get(&name).and_then(|e| e.parent.clone());
        if !chain.insert(name.clone()) {
            let mut cycle: Vec<String> = chain.iter().map(ToString::to_string).collect();
            cycle.push(name.to_string());
            return Err(CatlogError::CyclicHierarchy(cycle));
        }
        current = parent;
    }

    let mut closure: Vec<CategoryName> = chain.into_iter().collect();
    closure.reverse();
    Ok(closure)
}

fn gated(entries: &IndexMap<CategoryName, CategoryEntry>, closure: &[CategoryName]) -> bool {
    let disabled = |name: &str| entries.get(name).and_then(|e| e.enabled) == Some(false);
    let mut path = String::new();
    closure.iter().any(|name| {
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(name.as_str());
        disabled(name.as_str()) || (path.len() > name.as_str().len() && disabled(path.as_str()))
    })
}

fn join(categories: &[CategoryName]) -> String {
    categories
        .iter()
        .map(CategoryName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(name: &str) -> CategoryName {
        CategoryName::new(name).unwrap()
    }

    fn cats(names: &[&str]) -> Vec<CategoryName> {
        names.iter().map(|n| cat(n)).collect()
    }

    #[test]
    fn test_closure_of_unknown_category_is_itself() {
        let registry = CategoryRegistry::new();
        let closure = registry.ancestor_closure(Some(&cat("lonely"))).unwrap();
        assert_eq!(closure, cats(&["lonely"]));
    }

    #[test]
    fn test_closure_of_none_is_empty() {
        let registry = CategoryRegistry::new();
        assert!(registry.ancestor_closure(None).unwrap().is_empty());
    }

    #[test]
    fn test_closure_root_first() {
        let registry = CategoryRegistry::new();
        registry.add_children(&cat("root"), &cats(&["mid"])).unwrap();
        registry.add_children(&cat("mid"), &cats(&["leaf", "other"])).unwrap();

        let closure = registry.ancestor_closure(Some(&cat("leaf"))).unwrap();
        assert_eq!(closure, cats(&["root", "mid", "leaf"]));

        let again = registry.ancestor_closure(Some(&cat("leaf"))).unwrap();
        assert_eq!(closure, again);
    }

    #[test]
    fn test_add_children_requires_children() {
        let registry = CategoryRegistry::new();
        match registry.add_children(&cat("root"), &[]) {
            Err(CatlogError::InvalidArgument(msg)) => assert!(msg.contains("empty")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_reparenting_last_write_wins() {
        let registry = CategoryRegistry::new();
        registry.add_children(&cat("a"), &cats(&["child"])).unwrap();
        registry.add_children(&cat("b"), &cats(&["child"])).unwrap();

        assert_eq!(registry.parent_of(&cat("child")), Some(cat("b")));
        assert_eq!(
            registry.ancestor_closure(Some(&cat("child"))).unwrap(),
            cats(&["b", "child"])
        );
    }

    #[test]
    fn test_self_parent_rejected() {
        let registry = CategoryRegistry::new();
        assert!(matches!(
            registry.add_children(&cat("a"), &cats(&["b", "a"])),
            Err(CatlogError::CyclicHierarchy(_))
        ));
        assert_eq!(registry.parent_of(&cat("b")), None);
    }

    #[test]
    fn test_cycle_detected_on_resolution() {
        let registry = CategoryRegistry::new();
        registry.add_children(&cat("a"), &cats(&["b"])).unwrap();
        registry.add_children(&cat("b"), &cats(&["c"])).unwrap();
        registry.add_children(&cat("c"), &cats(&["a"])).unwrap();

        match registry.ancestor_closure(Some(&cat("c"))) {
            Err(CatlogError::CyclicHierarchy(path)) => {
                assert_eq!(path, vec!["c", "b", "a", "c"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(registry.resolve(Some(&cat("a"))).is_err());
    }

    #[test]
    fn test_gating_only_on_explicit_false() {
        let registry = CategoryRegistry::new();
        registry.add_children(&cat("root"), &cats(&["child"])).unwrap();
        let closure = registry.ancestor_closure(Some(&cat("child"))).unwrap();

        assert!(!registry.is_gated(&closure));

        registry.set_enabled(&cats(&["root"]), true);
        assert!(!registry.is_gated(&closure));

        registry.set_enabled(&cats(&["child"]), false);
        assert!(registry.is_gated(&closure));

        registry.set_enabled(&cats(&["child"]), true);
        registry.set_enabled(&cats(&["root"]), false);
        assert!(registry.is_gated(&closure));
    }

    #[test]
    fn test_disable_by_dotted_path() {
        let registry = CategoryRegistry::new();
        registry.set_enabled(&cats(&["root"]), true);
        registry.set_enabled(&cats(&["root.child"]), false);
        registry.add_children(&cat("root"), &cats(&["child", "sibling"])).unwrap();

        let child = registry.ancestor_closure(Some(&cat("child"))).unwrap();
        let sibling = registry.ancestor_closure(Some(&cat("sibling"))).unwrap();
        assert!(registry.is_gated(&child));
        assert!(!registry.is_gated(&sibling));
        assert!(!registry.is_gated(&cats(&["root"])));
    }

    #[test]
    fn test_dotted_path_covers_descendants() {
        let registry = CategoryRegistry::new();
        registry.add_children(&cat("a"), &cats(&["b"])).unwrap();
        registry.add_children(&cat("b"), &cats(&["c"])).unwrap();
        registry.set_enabled(&cats(&["a.b"]), false);

        let closure = registry.ancestor_closure(Some(&cat("c"))).unwrap();
        assert!(registry.is_gated(&closure));

        registry.set_enabled(&cats(&["a.b"]), true);
        assert!(!registry.is_gated(&closure));
    }

    #[test]
    fn test_set_enabled_with_no_categories_is_noop() {
        let registry = CategoryRegistry::new();
        registry.set_enabled(&[], true);
        assert!(registry.categories().is_empty());
    }

    #[test]
    fn test_resolve_collects_targets_in_closure_order() {
        let registry = CategoryRegistry::new();
        registry.add_children(&cat("root"), &cats(&["child"])).unwrap();
        registry.add_file_sink(&cat("child"), "/tmp/child.log");
        registry.add_file_sink(&cat("root"), "/tmp/root-1.log");
        registry.add_file_sink(&cat("root"), "/tmp/root-2.log");
        registry.add_listener(&cat("child"), Arc::new(|_: &str, _: &str| {}));

        let targets = match registry.resolve(Some(&cat("child"))).unwrap() {
            Resolution::Deliver(targets) => targets,
            Resolution::Gated => panic!("unexpectedly gated"),
        };
        let paths: Vec<_> = targets
            .file_sinks
            .iter()
            .map(|(c, p)| (c.as_str(), p.to_str().unwrap()))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("root", "/tmp/root-1.log"),
                ("root", "/tmp/root-2.log"),
                ("child", "/tmp/child.log"),
            ]
        );
        assert_eq!(targets.listeners.len(), 1);
    }

    #[test]
    fn test_resolve_gated() {
        let registry = CategoryRegistry::new();
        registry.add_file_sink(&cat("quiet"), "/tmp/quiet.log");
        registry.set_enabled(&cats(&["quiet"]), false);
        assert!(matches!(
            registry.resolve(Some(&cat("quiet"))).unwrap(),
            Resolution::Gated
        ));
    }

    #[test]
    fn test_teardown() {
        let registry = CategoryRegistry::new();
        registry.add_file_sink(&cat("a"), "/tmp/a.log");
        registry.add_listener(&cat("a"), Arc::new(|_: &str, _: &str| {}));
        registry.add_listener(&cat("a"), Arc::new(|_: &str, _: &str| {}));

        assert_eq!(registry.remove_listeners(&cat("a")), 2);
        assert_eq!(registry.clear_file_sinks(&cat("a")), vec![PathBuf::from("/tmp/a.log")]);
        assert_eq!(registry.remove_listeners(&cat("missing")), 0);

        let entry = registry.entry(&cat("a")).unwrap();
        assert!(entry.file_sinks.is_empty());
        assert!(entry.listeners.is_empty());
    }

    #[test]
    fn test_categories_in_first_reference_order() {
        let registry = CategoryRegistry::new();
        registry.set_enabled(&cats(&["z"]), true);
        registry.add_children(&cat("a"), &cats(&["m"])).unwrap();
        assert_eq!(registry.categories(), cats(&["z", "a", "m"]));
        assert_eq!(registry.enabled_flag(&cat("z")), Some(true));
        assert_eq!(registry.enabled_flag(&cat("a")), None);
    }
}
