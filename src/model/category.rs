use serde::{Deserialize, Serialize};

/// The always-present fallback category. Cannot be deleted or renamed.
pub const DEFAULT_CATEGORY: &str = "unsorted";

/// Name of the virtual tab showing the archived list. Never a real category.
pub const ARCHIVED_VIEW: &str = "archived";

/// Whether `name` is one of the two reserved names
pub fn is_reserved(name: &str) -> bool {
    name == DEFAULT_CATEGORY || name == ARCHIVED_VIEW
}

/// The category a task actually lands in for a free-text name: trimmed, with
/// blanks and the archived view name sent to the default.
pub fn task_category(raw: &str) -> &str {
    let name = raw.trim();
    if name.is_empty() || name == ARCHIVED_VIEW {
        DEFAULT_CATEGORY
    } else {
        name
    }
}

/// Ordered set of category names.
///
/// The default category is always present; names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRegistry {
    names: Vec<String>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        CategoryRegistry {
            names: vec![DEFAULT_CATEGORY.to_string()],
        }
    }
}

impl CategoryRegistry {
    /// Build a registry from persisted names: blanks, duplicates and the
    /// archived view name are dropped, and the default is prepended when
    /// missing.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = CategoryRegistry { names: Vec::new() };
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || name == ARCHIVED_VIEW || registry.contains(name) {
                continue;
            }
            registry.names.push(name.to_string());
        }
        if !registry.contains(DEFAULT_CATEGORY) {
            registry.names.insert(0, DEFAULT_CATEGORY.to_string());
        }
        registry
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append `name` if it is not already present. Returns true if added.
    pub(crate) fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Replace `old` with `new` in place, keeping its position.
    pub(crate) fn replace(&mut self, old: &str, new: &str) -> bool {
        match self.names.iter_mut().find(|n| *n == old) {
            Some(slot) => {
                *slot = new.to_string();
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }
}
