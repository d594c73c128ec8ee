use chrono::{Duration, NaiveDateTime};

use crate::model::store::TodoStore;

/// Default grace period after the final due date, in days
pub const DEFAULT_GRACE_DAYS: i64 = 1;

/// Archive every incomplete task whose final due date is more than
/// `grace_days` before `now`. Tasks without a final due date never move.
///
/// Relative order is preserved on both lists. Re-running with the same `now`
/// is a no-op. Returns the IDs that were archived.
///
/// A negative grace period counts as zero. A grace period reaching past the
/// start of the calendar archives nothing.
pub fn sweep_overdue(store: &mut TodoStore, now: &NaiveDateTime, grace_days: i64) -> Vec<String> {
    let Some(cutoff) = Duration::try_days(grace_days.max(0)).and_then(|g| now.checked_sub_signed(g))
    else {
        tracing::debug!(grace_days, "grace period out of range, nothing to sweep");
        return Vec::new();
    };

    let (overdue, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut store.tasks)
        .into_iter()
        .partition(|t| t.is_overdue(&cutoff));
    store.tasks = keep;

    if overdue.is_empty() {
        return Vec::new();
    }

    let ids: Vec<String> = overdue.iter().map(|t| t.id.clone()).collect();
    store.archived.extend(overdue);
    store.mark_dirty();
    tracing::info!(count = ids.len(), cutoff = %cutoff, "archived overdue tasks");
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::Snapshot;
    use crate::model::task::Task;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn task(id: &str, final_due: Option<NaiveDateTime>, completed: bool) -> Task {
        let mut t = Task::new(id.into(), format!("task {}", id), "unsorted".into());
        t.final_due = final_due;
        t.completed = completed;
        t
    }

    fn store(tasks: Vec<Task>) -> TodoStore {
        TodoStore::from_snapshot(Snapshot {
            tasks,
            archived: vec![],
            categories: vec![],
        })
    }

    #[test]
    fn archives_only_overdue_incomplete_tasks() {
        let now = dt(2025, 6, 10, 12);
        let mut store = store(vec![
            task("T-001", Some(dt(2025, 6, 1, 0)), false),  // overdue
            task("T-002", Some(dt(2025, 6, 1, 0)), true),   // completed
            task("T-003", None, false),                     // no final due
            task("T-004", Some(dt(2025, 6, 9, 13)), false), // within grace
            task("T-005", Some(dt(2025, 6, 9, 11)), false), // just past grace
        ]);

        let moved = sweep_overdue(&mut store, &now, DEFAULT_GRACE_DAYS);
        assert_eq!(moved, vec!["T-001", "T-005"]);

        let active: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(active, vec!["T-002", "T-003", "T-004"]);
        let archived: Vec<&str> = store.archived().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(archived, vec!["T-001", "T-005"]);
        assert!(store.is_dirty());
    }

    #[test]
    fn boundary_exactly_one_day_is_kept() {
        let now = dt(2025, 6, 10, 12);
        let mut store = store(vec![task("T-001", Some(dt(2025, 6, 9, 12)), false)]);
        assert!(sweep_overdue(&mut store, &now, 1).is_empty());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn tasks_without_final_due_never_move() {
        let far_future = dt(2099, 1, 1, 0);
        let mut t = task("T-001", None, false);
        t.provisional_due = Some(dt(2000, 1, 1, 0));
        let mut store = store(vec![t]);
        assert!(sweep_overdue(&mut store, &far_future, 1).is_empty());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn sweep_is_idempotent() {
        let now = dt(2025, 6, 10, 12);
        let mut store = store(vec![
            task("T-001", Some(dt(2025, 6, 1, 0)), false),
            task("T-002", Some(dt(2025, 7, 1, 0)), false),
        ]);
        sweep_overdue(&mut store, &now, 1);
        let after_first = store.snapshot();
        store.mark_clean();

        assert!(sweep_overdue(&mut store, &now, 1).is_empty());
        assert_eq!(store.snapshot(), after_first);
        assert!(!store.is_dirty());
    }

    #[test]
    fn huge_grace_period_archives_nothing() {
        let now = dt(2025, 6, 10, 12);
        let mut store = store(vec![task("T-001", Some(dt(2000, 1, 1, 0)), false)]);
        assert!(sweep_overdue(&mut store, &now, 10_000_000_000_000).is_empty());
        assert!(sweep_overdue(&mut store, &now, i64::MAX).is_empty());
        assert_eq!(store.tasks().len(), 1);
        assert!(!store.is_dirty());
    }

    #[test]
    fn negative_grace_period_counts_as_zero() {
        let now = dt(2025, 6, 10, 12);
        let mut store = store(vec![
            task("T-001", Some(dt(2025, 6, 10, 18)), false), // later today
            task("T-002", Some(dt(2025, 6, 10, 6)), false),  // earlier today
        ]);
        assert_eq!(sweep_overdue(&mut store, &now, -5), vec!["T-002"]);
        assert_eq!(store.tasks()[0].id, "T-001");
    }

    #[test]
    fn nothing_to_do_leaves_store_clean() {
        let mut store = store(vec![task("T-001", Some(dt(2030, 1, 1, 0)), false)]);
        assert!(sweep_overdue(&mut store, &dt(2025, 1, 1, 0), 1).is_empty());
        assert!(!store.is_dirty());
    }
}
