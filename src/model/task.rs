use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task urgency. Declaration order is the display/sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Unspecified,
    Low,
}

impl Priority {
    /// Lowercase name used in the workbook and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Unspecified => "unspecified",
            Priority::Low => "low",
        }
    }

    /// Sort rank: High < Unspecified < Low
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Unspecified => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid priority: {0} (expected high, unspecified or low)")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "unspecified" | "none" | "" => Ok(Priority::Unspecified),
            "low" | "l" => Ok(Priority::Low),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque ID like `T-007`, assigned by the store
    pub id: String,
    /// Task title text (trimmed, never empty once committed)
    pub title: String,
    /// Soft deadline; drives the upcoming-alert view
    pub provisional_due: Option<NaiveDateTime>,
    /// Hard deadline; drives the overdue sweep
    pub final_due: Option<NaiveDateTime>,
    pub priority: Priority,
    /// Category name (always a registry entry while the task is active)
    pub category: String,
    pub completed: bool,
}

impl Task {
    /// Create an incomplete task with no due dates
    pub fn new(id: String, title: String, category: String) -> Self {
        Task {
            id,
            title,
            provisional_due: None,
            final_due: None,
            priority: Priority::Unspecified,
            category,
            completed: false,
        }
    }

    /// Incomplete with a final due date strictly before `cutoff`
    pub fn is_overdue(&self, cutoff: &NaiveDateTime) -> bool {
        !self.completed && self.final_due.is_some_and(|due| due < *cutoff)
    }
}

/// Input form state for a task that has not been created yet.
///
/// `add_task` consumes the draft on success (leaving it empty) and leaves it
/// untouched on rejection so the caller can correct it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub provisional_due: Option<NaiveDateTime>,
    pub final_due: Option<NaiveDateTime>,
    pub priority: Priority,
    /// Free text; blank means the default category
    pub category: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Reset the form state
    pub fn clear(&mut self) {
        *self = TaskDraft::default();
    }
}
