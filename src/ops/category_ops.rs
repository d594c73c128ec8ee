use crate::model::category::{ARCHIVED_VIEW, DEFAULT_CATEGORY, is_reserved};
use crate::model::store::TodoStore;

/// Error type for category operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryError {
    #[error("category name must not be empty")]
    Empty,
    #[error("category already exists: {0}")]
    Duplicate(String),
    #[error("no category selected")]
    NoneSelected,
    #[error("category '{0}' is reserved and cannot be deleted")]
    Reserved(String),
    #[error("category not found: {0}")]
    NotFound(String),
}

/// Append a new category.
pub fn add_category(store: &mut TodoStore, name: &str) -> Result<String, CategoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CategoryError::Empty);
    }
    if name == ARCHIVED_VIEW || store.categories.contains(name) {
        return Err(CategoryError::Duplicate(name.to_string()));
    }
    store.categories.insert(name);
    store.mark_dirty();
    Ok(name.to_string())
}

/// Rename a category and every task that references it.
///
/// Silently does nothing (returns false) when the new name is blank, taken,
/// or reserved, or when the old name is the default or unknown.
pub fn rename_category(store: &mut TodoStore, old: &str, new: &str) -> bool {
    let new = new.trim();
    if new.is_empty() || is_reserved(new) || store.categories.contains(new) {
        return false;
    }
    if old == DEFAULT_CATEGORY || !store.categories.replace(old, new) {
        return false;
    }

    for task in store.tasks.iter_mut().chain(store.archived.iter_mut()) {
        if task.category == old {
            task.category = new.to_string();
        }
    }
    if store.active_tab == old {
        store.active_tab = new.to_string();
    }
    store.mark_dirty();
    tracing::debug!(from = %old, to = %new, "category renamed");
    true
}

/// Number of active tasks in `name`. Callers use this to ask for
/// confirmation before deleting a non-empty category.
pub fn tasks_in_category(store: &TodoStore, name: &str) -> usize {
    store.tasks.iter().filter(|t| t.category == name).count()
}

/// Delete a category, moving its active tasks to the default category and
/// resetting the active tab. Returns how many tasks were reassigned.
pub fn delete_category(store: &mut TodoStore, name: &str) -> Result<usize, CategoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CategoryError::NoneSelected);
    }
    if is_reserved(name) {
        return Err(CategoryError::Reserved(name.to_string()));
    }
    if !store.categories.contains(name) {
        return Err(CategoryError::NotFound(name.to_string()));
    }

    let mut moved = 0;
    for task in store.tasks.iter_mut().filter(|t| t.category == name) {
        task.category = DEFAULT_CATEGORY.to_string();
        moved += 1;
    }
    store.categories.remove(name);
    store.active_tab = DEFAULT_CATEGORY.to_string();
    store.mark_dirty();
    tracing::debug!(category = %name, reassigned = moved, "category deleted");
    Ok(moved)
}

/// Switch the active tab to a category or the archived view.
pub fn select_tab(store: &mut TodoStore, name: &str) -> Result<(), CategoryError> {
    let name = name.trim();
    if name != ARCHIVED_VIEW && !store.categories.contains(name) {
        return Err(CategoryError::NotFound(name.to_string()));
    }
    store.active_tab = name.to_string();
    Ok(())
}
