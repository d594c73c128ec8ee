use super::category::{CategoryRegistry, DEFAULT_CATEGORY, task_category};
use super::task::Task;

/// Prefix for generated task IDs (`T-001`, `T-002`, ...)
pub const ID_PREFIX: &str = "T";

/// The persisted unit: active tasks, archived tasks and category names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub archived: Vec<Task>,
    pub categories: Vec<String>,
}

/// Owned in-memory state for one session.
///
/// Fields are crate-private: all mutation goes through `ops::*`, which keep
/// the category-reference invariant and the dirty flag in step.
#[derive(Debug, Clone)]
pub struct TodoStore {
    pub(crate) tasks: Vec<Task>,
    pub(crate) archived: Vec<Task>,
    pub(crate) categories: CategoryRegistry,
    pub(crate) active_tab: String,
    pub(crate) dirty: bool,
    /// Highest ID number ever handed out or loaded; only grows
    pub(crate) id_high_water: usize,
}

impl Default for TodoStore {
    fn default() -> Self {
        TodoStore {
            tasks: Vec::new(),
            archived: Vec::new(),
            categories: CategoryRegistry::default(),
            active_tab: DEFAULT_CATEGORY.to_string(),
            dirty: false,
            id_high_water: 0,
        }
    }
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a clean store from a decoded snapshot.
    ///
    /// Tasks without an ID (or with a duplicate one) are given a fresh ID,
    /// and every category referenced by an active task is registered. If
    /// either repair happened the store starts dirty so the fix is written
    /// back.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = TodoStore::new();
        store.replace_contents(snapshot, true);
        store
    }

    /// Replace the whole state with `snapshot`. When `with_categories` is
    /// false the current registry is kept and only extended.
    pub(crate) fn replace_contents(&mut self, snapshot: Snapshot, with_categories: bool) {
        let Snapshot {
            tasks,
            archived,
            categories,
        } = snapshot;
        if with_categories {
            self.categories = CategoryRegistry::from_names(&categories);
        }
        self.tasks = tasks;
        self.archived = archived;
        let repaired_ids = self.repair_ids();
        let repaired_categories = self.register_referenced_categories();
        if !self.categories.contains(&self.active_tab) {
            self.active_tab = DEFAULT_CATEGORY.to_string();
        }
        self.dirty = repaired_ids || repaired_categories;
    }

    /// Copy out the persisted triple
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            archived: self.archived.clone(),
            categories: self.categories.names().to_vec(),
        }
    }

    /// Active (non-archived) tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Archived tasks in archival order; indices are restore handles
    pub fn archived(&self) -> &[Task] {
        &self.archived
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    /// Currently selected tab: a category name or the archived view
    pub fn active_tab(&self) -> &str {
        &self.active_tab
    }

    /// True when there are changes not yet flushed to storage
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Called after a successful flush or export
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub(crate) fn find_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Hand out the next unused ID
    pub(crate) fn next_id(&mut self) -> String {
        self.id_high_water += 1;
        format_id(self.id_high_water)
    }

    fn repair_ids(&mut self) -> bool {
        let max = self
            .tasks
            .iter()
            .chain(self.archived.iter())
            .filter_map(|t| parse_id_number(&t.id))
            .max()
            .unwrap_or(0);
        self.id_high_water = self.id_high_water.max(max);

        let mut seen = std::collections::HashSet::new();
        let mut repaired = false;
        let mut next = self.id_high_water;
        for task in self.tasks.iter_mut().chain(self.archived.iter_mut()) {
            if task.id.trim().is_empty() || !seen.insert(task.id.clone()) {
                next += 1;
                task.id = format_id(next);
                seen.insert(task.id.clone());
                repaired = true;
            }
        }
        self.id_high_water = next;
        repaired
    }

    /// Register every category an active task points at. Blank categories
    /// and the archived view name are moved to the default.
    pub(crate) fn register_referenced_categories(&mut self) -> bool {
        let mut changed = false;
        for task in &mut self.tasks {
            let resolved = task_category(&task.category);
            if resolved != task.category {
                task.category = resolved.to_string();
                changed = true;
            }
            if self.categories.insert(&task.category) {
                changed = true;
            }
        }
        changed
    }
}

fn format_id(n: usize) -> String {
    format!("{}-{:03}", ID_PREFIX, n)
}

/// Numeric part of a generated ID (`T-012` → 12)
pub(crate) fn parse_id_number(id: &str) -> Option<usize> {
    id.strip_prefix(ID_PREFIX)?.strip_prefix('-')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, category: &str) -> Task {
        Task::new(id.into(), format!("task {}", id), category.into())
    }

    #[test]
    fn new_store_is_clean_with_default_tab() {
        let store = TodoStore::new();
        assert!(!store.is_dirty());
        assert_eq!(store.active_tab(), "unsorted");
        assert_eq!(store.categories().names(), &["unsorted"]);
    }

    #[test]
    fn next_id_continues_after_loaded_max() {
        let mut store = TodoStore::from_snapshot(Snapshot {
            tasks: vec![task("T-004", "unsorted")],
            archived: vec![task("T-009", "unsorted")],
            categories: vec!["unsorted".into()],
        });
        assert!(!store.is_dirty());
        assert_eq!(store.next_id(), "T-010");
        assert_eq!(store.next_id(), "T-011");
    }

    #[test]
    fn from_snapshot_assigns_missing_and_duplicate_ids() {
        let store = TodoStore::from_snapshot(Snapshot {
            tasks: vec![task("T-002", "unsorted"), task("", "unsorted"), task("T-002", "unsorted")],
            archived: vec![],
            categories: vec![],
        });
        let ids: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T-002", "T-003", "T-004"]);
        assert!(store.is_dirty());
    }

    #[test]
    fn from_snapshot_registers_referenced_categories() {
        let store = TodoStore::from_snapshot(Snapshot {
            tasks: vec![task("T-001", "work"), task("T-002", "  ")],
            archived: vec![task("T-003", "gone")],
            categories: vec!["unsorted".into()],
        });
        assert_eq!(store.categories().names(), &["unsorted", "work"]);
        assert_eq!(store.tasks()[1].category, "unsorted");
        // Archived tasks do not pull their category back in until restored
        assert!(!store.categories().contains("gone"));
        assert!(store.is_dirty());
    }

    #[test]
    fn from_snapshot_never_registers_archived_view() {
        let store = TodoStore::from_snapshot(Snapshot {
            tasks: vec![task("T-001", "archived"), task("T-002", " archived ")],
            archived: vec![],
            categories: vec!["unsorted".into(), "archived".into()],
        });
        assert_eq!(store.categories().names(), &["unsorted"]);
        assert!(store.tasks().iter().all(|t| t.category == "unsorted"));
        assert!(store.is_dirty());
    }

    #[test]
    fn parse_id_number_handles_foreign_ids() {
        assert_eq!(parse_id_number("T-012"), Some(12));
        assert_eq!(parse_id_number("1712345678"), None);
        assert_eq!(parse_id_number("X-001"), None);
    }

    #[test]
    fn snapshot_round_trips_through_store() {
        let snap = Snapshot {
            tasks: vec![task("T-001", "work")],
            archived: vec![task("T-002", "home")],
            categories: vec!["unsorted".into(), "work".into(), "home".into()],
        };
        let store = TodoStore::from_snapshot(snap.clone());
        assert_eq!(store.snapshot(), snap);
    }
}
