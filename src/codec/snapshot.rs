use crate::codec::workbook::{Cell, CodecError, Record, Sheet, Workbook};
use crate::model::category::DEFAULT_CATEGORY;
use crate::model::store::Snapshot;
use crate::model::task::{Priority, Task};
use crate::util::datetime::{format_due, parse_due};

/// Sheet names
pub const TASKS_SHEET: &str = "tasks";
pub const ARCHIVED_SHEET: &str = "archived";
pub const CATEGORIES_SHEET: &str = "categories";

// Column names. Decoding looks these up by name only.
const COL_ID: &str = "id";
const COL_TITLE: &str = "title";
const COL_PROVISIONAL: &str = "provisionalDue";
const COL_FINAL: &str = "finalDue";
const COL_PRIORITY: &str = "priority";
const COL_CATEGORY: &str = "category";
const COL_COMPLETED: &str = "completed";
const COL_NAME: &str = "name";

/// Build the three-sheet workbook for a snapshot
pub fn to_workbook(tasks: &[Task], archived: &[Task], categories: &[String]) -> Workbook {
    let mut wb = Workbook::new();
    wb.append_sheet(TASKS_SHEET, task_sheet(tasks));
    wb.append_sheet(ARCHIVED_SHEET, task_sheet(archived));
    let category_records: Vec<Record> = categories
        .iter()
        .map(|name| Record::from([(COL_NAME.to_string(), Cell::from(name.as_str()))]))
        .collect();
    wb.append_sheet(CATEGORIES_SHEET, sheet_with_header(&category_records, &[COL_NAME]));
    wb
}

/// Encode (active, archived, categories) into workbook text
pub fn encode(tasks: &[Task], archived: &[Task], categories: &[String]) -> Result<String, CodecError> {
    to_workbook(tasks, archived, categories).to_text()
}

/// Decode workbook text. Missing task sheets are empty; a missing or empty
/// categories sheet yields just the default category.
pub fn decode(text: &str) -> Result<Snapshot, CodecError> {
    let wb = Workbook::from_text(text)?;
    Ok(from_workbook(&wb))
}

pub fn from_workbook(wb: &Workbook) -> Snapshot {
    let tasks = wb.sheet(TASKS_SHEET).map(read_tasks).unwrap_or_default();
    let archived = wb.sheet(ARCHIVED_SHEET).map(read_tasks).unwrap_or_default();
    let mut categories: Vec<String> = wb
        .sheet(CATEGORIES_SHEET)
        .map(|sheet| {
            sheet
                .records()
                .iter()
                .filter_map(|r| r.get(COL_NAME).map(Cell::as_text))
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();
    if categories.is_empty() {
        categories.push(DEFAULT_CATEGORY.to_string());
    }
    Snapshot {
        tasks,
        archived,
        categories,
    }
}

// ---------------------------------------------------------------------------
// Task rows
// ---------------------------------------------------------------------------

const TASK_COLUMNS: &[&str] = &[
    COL_TITLE,
    COL_PROVISIONAL,
    COL_FINAL,
    COL_PRIORITY,
    COL_CATEGORY,
    COL_COMPLETED,
    COL_ID,
];

fn task_sheet(tasks: &[Task]) -> Sheet {
    let records: Vec<Record> = tasks.iter().map(task_to_record).collect();
    sheet_with_header(&records, TASK_COLUMNS)
}

/// Like `Sheet::from_records`, but the header is fixed so an empty list
/// still produces a labelled table.
fn sheet_with_header(records: &[Record], header: &[&str]) -> Sheet {
    let mut sheet = Sheet::from_records(records);
    if sheet.columns.is_empty() {
        sheet.columns = header.iter().map(|c| c.to_string()).collect();
    }
    sheet
}

fn task_to_record(task: &Task) -> Record {
    let mut r = Record::new();
    r.insert(COL_TITLE.into(), task.title.as_str().into());
    if let Some(due) = &task.provisional_due {
        r.insert(COL_PROVISIONAL.into(), format_due(due).into());
    }
    if let Some(due) = &task.final_due {
        r.insert(COL_FINAL.into(), format_due(due).into());
    }
    r.insert(COL_PRIORITY.into(), task.priority.as_str().into());
    r.insert(COL_CATEGORY.into(), task.category.as_str().into());
    r.insert(COL_COMPLETED.into(), task.completed.into());
    r.insert(COL_ID.into(), task.id.as_str().into());
    r
}

fn read_tasks(sheet: &Sheet) -> Vec<Task> {
    sheet
        .records()
        .iter()
        .enumerate()
        .filter_map(|(row, record)| match record_to_task(record) {
            Some(task) => Some(task),
            None => {
                tracing::warn!(row, "skipping workbook row without a title");
                None
            }
        })
        .collect()
}

/// Lenient row reader: unknown priorities fall back to unspecified and
/// unparseable dates to "no date". A row without a title is not a task.
fn record_to_task(record: &Record) -> Option<Task> {
    let text = |col: &str| record.get(col).map(Cell::as_text);

    let title = text(COL_TITLE)?.trim().to_string();
    if title.is_empty() {
        return None;
    }
    let id = text(COL_ID).map(|s| s.trim().to_string()).unwrap_or_default();
    let category = text(COL_CATEGORY)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let mut task = Task::new(id, title, category);
    task.provisional_due = text(COL_PROVISIONAL).and_then(|s| read_due(&s, COL_PROVISIONAL));
    task.final_due = text(COL_FINAL).and_then(|s| read_due(&s, COL_FINAL));
    task.priority = text(COL_PRIORITY)
        .and_then(|s| s.parse::<Priority>().ok())
        .unwrap_or_default();
    task.completed = record
        .get(COL_COMPLETED)
        .and_then(Cell::as_bool)
        .unwrap_or(false);
    Some(task)
}

fn read_due(s: &str, column: &str) -> Option<chrono::NaiveDateTime> {
    if s.trim().is_empty() {
        return None;
    }
    match parse_due(s) {
        Ok(dt) => Some(dt),
        Err(e) => {
            tracing::warn!(column, error = %e, "dropping unreadable date cell");
            None
        }
    }
}
