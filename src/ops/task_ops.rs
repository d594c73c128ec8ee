use std::fmt;

use chrono::NaiveDateTime;

use crate::model::category::task_category;
use crate::model::store::TodoStore;
use crate::model::task::{Priority, Task, TaskDraft};
use crate::util::datetime::start_of_day;

/// A single failed check on a task's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("provisional due date cannot be in the past")]
    ProvisionalInPast,
    #[error("final due date cannot be in the past")]
    FinalInPast,
    #[error("provisional due date must not be after the final due date")]
    ProvisionalAfterFinal,
}

/// Every check that failed, in check order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn contains(&self, err: ValidationError) -> bool {
        self.0.contains(&err)
    }

    /// One human-readable message per failed check
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.to_string()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

/// Error type for task operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("no archived task at index {0}")]
    NoArchivedTask(usize),
    #[error("{0}")]
    Invalid(ValidationErrors),
}

impl TaskError {
    /// The failed checks, if this is a validation rejection
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            TaskError::Invalid(errs) => Some(errs),
            _ => None,
        }
    }
}

/// Which due date an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueField {
    Provisional,
    Final,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check title and due dates. Every failing check is reported.
///
/// `past_checks` selects which due dates get the not-before-today check;
/// edits only re-check the field being set, since a date that was valid when
/// entered is not invalidated by time passing.
fn validate(
    title: &str,
    provisional: Option<&NaiveDateTime>,
    final_due: Option<&NaiveDateTime>,
    past_checks: &[DueField],
    now: &NaiveDateTime,
) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push(ValidationError::EmptyTitle);
    }

    let floor = start_of_day(now);
    if past_checks.contains(&DueField::Provisional) && provisional.is_some_and(|p| *p < floor) {
        errors.push(ValidationError::ProvisionalInPast);
    }
    if past_checks.contains(&DueField::Final) && final_due.is_some_and(|f| *f < floor) {
        errors.push(ValidationError::FinalInPast);
    }

    if let (Some(p), Some(f)) = (provisional, final_due)
        && p > f
    {
        errors.push(ValidationError::ProvisionalAfterFinal);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Validate a draft without creating anything
pub fn validate_draft(draft: &TaskDraft, now: &NaiveDateTime) -> Result<(), ValidationErrors> {
    validate(
        &draft.title,
        draft.provisional_due.as_ref(),
        draft.final_due.as_ref(),
        &[DueField::Provisional, DueField::Final],
        now,
    )
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Create a task from `draft` and append it to the active list.
///
/// On success the draft is cleared and the new ID returned. On rejection the
/// draft and the store are left as they were.
pub fn add_task(
    store: &mut TodoStore,
    draft: &mut TaskDraft,
    now: &NaiveDateTime,
) -> Result<String, TaskError> {
    validate_draft(draft, now).map_err(TaskError::Invalid)?;

    let category = resolve_category(store, &draft.category);
    let id = store.next_id();
    let mut task = Task::new(id.clone(), draft.title.trim().to_string(), category);
    task.provisional_due = draft.provisional_due;
    task.final_due = draft.final_due;
    task.priority = draft.priority;

    tracing::debug!(id = %task.id, category = %task.category, "task added");
    store.tasks.push(task);
    store.mark_dirty();
    draft.clear();
    Ok(id)
}

/// Resolve a free-text category (blank and the archived view name go to the
/// default) and register it if new.
fn resolve_category(store: &mut TodoStore, raw: &str) -> String {
    let name = task_category(raw);
    if store.categories.insert(name) {
        tracing::debug!(category = %name, "category auto-registered");
    }
    name.to_string()
}

// ---------------------------------------------------------------------------
// Field edits
// ---------------------------------------------------------------------------

/// Commit a new title. A blank title is rejected and the old one kept.
pub fn edit_title(store: &mut TodoStore, task_id: &str, title: &str) -> Result<(), TaskError> {
    let task = store
        .find_task_mut(task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::Invalid(ValidationErrors(vec![
            ValidationError::EmptyTitle,
        ])));
    }
    if task.title != title {
        task.title = title.to_string();
        store.mark_dirty();
    }
    Ok(())
}

pub fn set_priority(store: &mut TodoStore, task_id: &str, priority: Priority) -> Result<(), TaskError> {
    let task = store
        .find_task_mut(task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    if task.priority != priority {
        task.priority = priority;
        store.mark_dirty();
    }
    Ok(())
}

/// Move a task to another category. Blank means the default; a new name is
/// registered.
pub fn set_category(store: &mut TodoStore, task_id: &str, category: &str) -> Result<(), TaskError> {
    if store.find_task(task_id).is_none() {
        return Err(TaskError::NotFound(task_id.to_string()));
    }
    let category = resolve_category(store, category);
    let mut changed = false;
    if let Some(task) = store.find_task_mut(task_id)
        && task.category != category
    {
        task.category = category;
        changed = true;
    }
    if changed {
        store.mark_dirty();
    }
    Ok(())
}

pub fn set_provisional_due(
    store: &mut TodoStore,
    task_id: &str,
    due: Option<NaiveDateTime>,
    now: &NaiveDateTime,
) -> Result<(), TaskError> {
    set_due(store, task_id, DueField::Provisional, due, now)
}

pub fn set_final_due(
    store: &mut TodoStore,
    task_id: &str,
    due: Option<NaiveDateTime>,
    now: &NaiveDateTime,
) -> Result<(), TaskError> {
    set_due(store, task_id, DueField::Final, due, now)
}

/// Re-validate the whole task with the prospective date, then commit.
pub fn set_due(
    store: &mut TodoStore,
    task_id: &str,
    field: DueField,
    due: Option<NaiveDateTime>,
    now: &NaiveDateTime,
) -> Result<(), TaskError> {
    let edit = match field {
        DueField::Provisional => DueEdit {
            provisional: Some(due),
            ..DueEdit::default()
        },
        DueField::Final => DueEdit {
            final_due: Some(due),
            ..DueEdit::default()
        },
    };
    set_dues(store, task_id, edit, now)
}

/// Due-date changes applied as one edit. `None` leaves a field alone and
/// `Some(None)` clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueEdit {
    pub provisional: Option<Option<NaiveDateTime>>,
    pub final_due: Option<Option<NaiveDateTime>>,
}

/// Validate the task as it would be after `edit`, then commit both dates or
/// neither. Only the fields being set get the past-date check.
pub fn set_dues(
    store: &mut TodoStore,
    task_id: &str,
    edit: DueEdit,
    now: &NaiveDateTime,
) -> Result<(), TaskError> {
    let task = store
        .find_task_mut(task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

    let provisional = edit.provisional.unwrap_or(task.provisional_due);
    let final_due = edit.final_due.unwrap_or(task.final_due);
    let mut checked = Vec::with_capacity(2);
    if edit.provisional.is_some() {
        checked.push(DueField::Provisional);
    }
    if edit.final_due.is_some() {
        checked.push(DueField::Final);
    }
    validate(&task.title, provisional.as_ref(), final_due.as_ref(), &checked, now)
        .map_err(TaskError::Invalid)?;

    if task.provisional_due != provisional || task.final_due != final_due {
        task.provisional_due = provisional;
        task.final_due = final_due;
        store.mark_dirty();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Flip the completed flag. Returns the new value.
pub fn toggle_complete(store: &mut TodoStore, task_id: &str) -> Result<bool, TaskError> {
    let task = store
        .find_task_mut(task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    task.completed = !task.completed;
    let completed = task.completed;
    store.mark_dirty();
    Ok(completed)
}

/// One-way completion. Returns false if the task was already complete.
pub fn complete_task(store: &mut TodoStore, task_id: &str) -> Result<bool, TaskError> {
    let task = store
        .find_task_mut(task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    if task.completed {
        return Ok(false);
    }
    task.completed = true;
    store.mark_dirty();
    Ok(true)
}

// ---------------------------------------------------------------------------
// Archive / restore
// ---------------------------------------------------------------------------

/// Move a task from the active list to the archive.
pub fn delete_task(store: &mut TodoStore, task_id: &str) -> Result<Task, TaskError> {
    let idx = store
        .tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    let task = store.tasks.remove(idx);
    store.archived.push(task.clone());
    store.mark_dirty();
    tracing::debug!(id = %task.id, "task archived");
    Ok(task)
}

/// Bring an archived task back, incomplete. Its category is re-registered if
/// it was deleted in the meantime. Returns the task ID.
pub fn restore_task(store: &mut TodoStore, archive_index: usize) -> Result<String, TaskError> {
    if archive_index >= store.archived.len() {
        return Err(TaskError::NoArchivedTask(archive_index));
    }
    let mut task = store.archived.remove(archive_index);
    task.completed = false;
    task.category = resolve_category(store, &task.category);
    let id = task.id.clone();
    store.tasks.push(task);
    store.mark_dirty();
    tracing::debug!(id = %id, "task restored");
    Ok(id)
}
