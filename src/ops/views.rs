use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::model::store::TodoStore;
use crate::model::task::Task;
use crate::util::datetime::days_until;

/// Default look-ahead for provisional due date alerts, in days
pub const DEFAULT_ALERT_WINDOW_DAYS: i64 = 7;

/// Which half of a category tab to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionFilter {
    #[default]
    Open,
    Done,
}

impl fmt::Display for CompletionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionFilter::Open => write!(f, "open"),
            CompletionFilter::Done => write!(f, "done"),
        }
    }
}

impl FromStr for CompletionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" | "todo" => Ok(CompletionFilter::Open),
            "done" | "completed" => Ok(CompletionFilter::Done),
            other => Err(format!("invalid filter: {} (expected open or done)", other)),
        }
    }
}

/// Active tasks in `category` matching `filter`, ordered by priority
/// (high first) then final due date (undated first). Ties keep insertion
/// order.
pub fn visible_tasks<'a>(
    store: &'a TodoStore,
    category: &str,
    filter: CompletionFilter,
) -> Vec<&'a Task> {
    let want_done = filter == CompletionFilter::Done;
    let mut tasks: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.category == category && t.completed == want_done)
        .collect();
    // sort_by is stable
    tasks.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| a.final_due.cmp(&b.final_due))
    });
    tasks
}

/// Incomplete active tasks whose provisional due date is at most
/// `window_days` whole days away. Already-passed dates are included.
pub fn upcoming_alerts<'a>(
    store: &'a TodoStore,
    now: &NaiveDateTime,
    window_days: i64,
) -> Vec<&'a Task> {
    store
        .tasks()
        .iter()
        .filter(|t| !t.completed)
        .filter(|t| {
            t.provisional_due
                .as_ref()
                .is_some_and(|due| days_until(due, now) <= window_days)
        })
        .collect()
}
