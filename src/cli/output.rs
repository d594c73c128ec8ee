use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::task::{Priority, Task};
use crate::util::datetime::{days_until, display_due, format_due};
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

/// Titles longer than this are cut with an ellipsis in tables
const TITLE_MAX_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisional_due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_due: Option<String>,
    pub priority: Priority,
    pub category: String,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct TaskListJson {
    pub category: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ArchivedTaskJson {
    /// 1-based restore number
    pub index: usize,
    #[serde(flatten)]
    pub task: TaskJson,
}

#[derive(Serialize)]
pub struct AlertJson {
    pub days_left: i64,
    #[serde(flatten)]
    pub task: TaskJson,
}

#[derive(Serialize)]
pub struct CategoryJson {
    pub name: String,
    pub open: usize,
    pub done: usize,
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        title: task.title.clone(),
        provisional_due: task.provisional_due.as_ref().map(format_due),
        final_due: task.final_due.as_ref().map(format_due),
        priority: task.priority,
        category: task.category.clone(),
        completed: task.completed,
    }
}

pub fn alert_to_json(task: &Task, now: &NaiveDateTime) -> AlertJson {
    AlertJson {
        days_left: task
            .provisional_due
            .as_ref()
            .map(|due| days_until(due, now))
            .unwrap_or_default(),
        task: task_to_json(task),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn priority_mark(priority: Priority) -> char {
    match priority {
        Priority::High => '!',
        Priority::Unspecified => ' ',
        Priority::Low => '.',
    }
}

/// Column table of tasks. `lead` is an optional first column (archive
/// numbers), already formatted.
pub fn format_task_table(tasks: &[&Task], lead: Option<&[String]>) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["(no tasks)".to_string()];
    }
    let titles: Vec<String> = tasks
        .iter()
        .map(|t| truncate_to_width(&t.title, TITLE_MAX_WIDTH))
        .collect();
    let lead_w = lead
        .map(|l| l.iter().map(|s| display_width(s)).max().unwrap_or(0))
        .unwrap_or(0);
    let id_w = tasks.iter().map(|t| t.id.len()).max().unwrap_or(0).max(2);
    let title_w = titles
        .iter()
        .map(|t| display_width(t))
        .max()
        .unwrap_or(0)
        .max(5);
    let cat_w = tasks
        .iter()
        .map(|t| display_width(&t.category))
        .max()
        .unwrap_or(0)
        .max(8);

    let mut lines = Vec::with_capacity(tasks.len() + 1);
    let mut header = String::new();
    if lead.is_some() {
        header.push_str(&pad_to_width("#", lead_w));
        header.push_str("  ");
    }
    header.push_str(&format!(
        "    {}  P  {}  {}  {:<16}  {}",
        pad_to_width("id", id_w),
        pad_to_width("title", title_w),
        pad_to_width("category", cat_w),
        "provisional",
        "due"
    ));
    lines.push(header.trim_end().to_string());

    for (i, task) in tasks.iter().enumerate() {
        let mut line = String::new();
        if let Some(lead) = lead {
            let cell = lead.get(i).map(String::as_str).unwrap_or("");
            line.push_str(&pad_to_width(cell, lead_w));
            line.push_str("  ");
        }
        line.push_str(&format!(
            "[{}] {}  {}  {}  {}  {:<16}  {}",
            if task.completed { 'x' } else { ' ' },
            pad_to_width(&task.id, id_w),
            priority_mark(task.priority),
            pad_to_width(&titles[i], title_w),
            pad_to_width(&task.category, cat_w),
            display_due(task.provisional_due.as_ref()),
            display_due(task.final_due.as_ref()),
        ));
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// Header for a category listing
pub fn format_tab_header(name: &str, active: bool) -> String {
    if active {
        format!("== {} * ==", name)
    } else {
        format!("== {} ==", name)
    }
}

/// Alert line: `T-003 in 2 days: Renew passport (2025-06-01 09:00)`
pub fn format_alert_line(task: &Task, now: &NaiveDateTime) -> String {
    let when = match task.provisional_due.as_ref().map(|due| days_until(due, now)) {
        Some(d) if d < 0 => format!("{} day(s) ago", -d),
        Some(0) => "today".to_string(),
        Some(1) => "in 1 day".to_string(),
        Some(d) => format!("in {} days", d),
        None => "-".to_string(),
    };
    format!(
        "{} {}: {} ({})",
        task.id,
        when,
        task.title,
        display_due(task.provisional_due.as_ref())
    )
}
