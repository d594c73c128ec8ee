mod init;
pub use init::cmd_init;

use std::path::Path;

use chrono::NaiveDateTime;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::FileLock;
use crate::io::session::{self, Session};
use crate::model::category::{ARCHIVED_VIEW, DEFAULT_CATEGORY, is_reserved};
use crate::model::task::TaskDraft;
use crate::ops::category_ops;
use crate::ops::task_ops::{self, DueEdit, TaskError};
use crate::ops::views::{self, CompletionFilter};
use crate::util::datetime::{now_local, parse_optional_due};
use crate::util::unicode::{display_width, pad_to_width};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(session::default_data_dir);
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    match cli.command {
        // Setup (no session)
        Commands::Init(args) => cmd_init(args, &data_dir),
        Commands::Config(args) => cmd_config(args, &data_dir, json),

        // Read commands
        Commands::List(args) => cmd_list(args, &data_dir, json),
        Commands::Archived => cmd_archived(&data_dir, json),
        Commands::Alerts(args) => cmd_alerts(args, &data_dir, json),
        Commands::Tab(args) => cmd_tab(args, &data_dir, json),

        // Write commands
        Commands::Add(args) => cmd_add(args, &data_dir),
        Commands::Edit(args) => cmd_edit(args, &data_dir),
        Commands::Toggle(args) => cmd_toggle(args, &data_dir),
        Commands::Done(args) => cmd_done(args, &data_dir),
        Commands::Delete(args) => cmd_delete(args, &data_dir),
        Commands::Restore(args) => cmd_restore(args, &data_dir),
        Commands::Sweep => cmd_sweep(&data_dir),

        // Categories
        Commands::Category(args) => cmd_category(args, &data_dir, json),

        // Export / import
        Commands::Export(args) => cmd_export(args, &data_dir),
        Commands::Import(args) => cmd_import(args, &data_dir),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Commit the session and mention anything the sweep archived.
fn finish(session: &mut Session, now: &NaiveDateTime) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let swept = session.commit(now)?;
    if !swept.is_empty() {
        eprintln!("archived overdue: {}", swept.join(", "));
    }
    Ok(swept)
}

/// Print each failed validation check, then fail with a short summary.
fn report_task_error(err: TaskError) -> Box<dyn std::error::Error> {
    match err.validation() {
        Some(errs) => {
            for msg in errs.messages() {
                eprintln!("invalid: {}", msg);
            }
            "task not saved".into()
        }
        None => err.into(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, data_dir: &Path, json: bool) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    let category = args
        .category
        .unwrap_or_else(|| session.store().active_tab().to_string());

    if category == ARCHIVED_VIEW {
        finish(&mut session, &now)?;
        return print_archived(&session, json);
    }
    if !session.store().categories().contains(&category) {
        return Err(format!("category not found: {}", category).into());
    }
    finish(&mut session, &now)?;

    let store = session.store();
    let tasks = views::visible_tasks(store, &category, args.filter);
    if json {
        print_json(&TaskListJson {
            category,
            tasks: tasks.iter().map(|t| task_to_json(t)).collect(),
        })
    } else {
        let mut header = format_tab_header(&category, store.active_tab() == category);
        if args.filter == CompletionFilter::Done {
            header.push_str(" (done)");
        }
        println!("{}", header);
        for line in format_task_table(&tasks, None) {
            println!("{}", line);
        }
        Ok(())
    }
}

fn cmd_archived(data_dir: &Path, json: bool) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    finish(&mut session, &now)?;
    print_archived(&session, json)
}

fn print_archived(session: &Session, json: bool) -> CmdResult {
    let archived = session.store().archived();
    if json {
        let items: Vec<ArchivedTaskJson> = archived
            .iter()
            .enumerate()
            .map(|(i, t)| ArchivedTaskJson {
                index: i + 1,
                task: task_to_json(t),
            })
            .collect();
        return print_json(&items);
    }
    let tasks: Vec<_> = archived.iter().collect();
    let numbers: Vec<String> = (1..=tasks.len()).map(|n| n.to_string()).collect();
    println!(
        "{}",
        format_tab_header(ARCHIVED_VIEW, session.store().active_tab() == ARCHIVED_VIEW)
    );
    for line in format_task_table(&tasks, Some(numbers.as_slice())) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_alerts(args: AlertsArgs, data_dir: &Path, json: bool) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    let window = args.days.unwrap_or(session.config().alerts.window_days);
    finish(&mut session, &now)?;

    let alerts = views::upcoming_alerts(session.store(), &now, window);
    if json {
        let items: Vec<_> = alerts.iter().map(|t| alert_to_json(t, &now)).collect();
        return print_json(&items);
    }
    if alerts.is_empty() {
        println!("(no alerts)");
    }
    for task in alerts {
        println!("{}", format_alert_line(task, &now));
    }
    Ok(())
}

fn cmd_tab(args: TabArgs, data_dir: &Path, json: bool) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    if let Some(name) = args.name {
        category_ops::select_tab(session.store_mut(), &name)?;
    }
    finish(&mut session, &now)?;

    let tab = session.store().active_tab();
    if json {
        print_json(&serde_json::json!({ "tab": tab }))
    } else {
        println!("{}", tab);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, data_dir: &Path) -> CmdResult {
    let now = now_local();
    let mut draft = TaskDraft::new(args.title);
    draft.category = args.category.unwrap_or_default();
    draft.provisional_due = parse_optional_due(args.provisional.as_deref().unwrap_or(""))?;
    draft.final_due = parse_optional_due(args.due.as_deref().unwrap_or(""))?;
    draft.priority = args.priority;

    let mut session = Session::open(data_dir)?;
    let id = task_ops::add_task(session.store_mut(), &mut draft, &now).map_err(report_task_error)?;
    finish(&mut session, &now)?;
    println!("{}", id);
    Ok(())
}

fn cmd_edit(args: EditArgs, data_dir: &Path) -> CmdResult {
    if args.title.is_none()
        && args.category.is_none()
        && args.provisional.is_none()
        && args.due.is_none()
        && args.priority.is_none()
    {
        return Err("nothing to change (see td edit --help)".into());
    }
    let now = now_local();
    let provisional = args.provisional.as_deref().map(parse_optional_due).transpose()?;
    let final_due = args.due.as_deref().map(parse_optional_due).transpose()?;

    // Edits are applied in memory and only committed if every one succeeds
    let mut session = Session::open(data_dir)?;
    let store = session.store_mut();
    if let Some(title) = &args.title {
        task_ops::edit_title(store, &args.id, title).map_err(report_task_error)?;
    }
    if let Some(category) = &args.category {
        task_ops::set_category(store, &args.id, category)?;
    }
    if let Some(priority) = args.priority {
        task_ops::set_priority(store, &args.id, priority)?;
    }
    if provisional.is_some() || final_due.is_some() {
        let edit = DueEdit {
            provisional,
            final_due,
        };
        task_ops::set_dues(store, &args.id, edit, &now).map_err(report_task_error)?;
    }
    finish(&mut session, &now)?;
    println!("updated {}", args.id);
    Ok(())
}

fn cmd_toggle(args: TaskIdArg, data_dir: &Path) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    let completed = task_ops::toggle_complete(session.store_mut(), &args.id)?;
    finish(&mut session, &now)?;
    println!("{} {}", args.id, if completed { "done" } else { "open" });
    Ok(())
}

fn cmd_done(args: TaskIdArg, data_dir: &Path) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    let changed = task_ops::complete_task(session.store_mut(), &args.id)?;
    finish(&mut session, &now)?;
    if changed {
        println!("{} done", args.id);
    } else {
        println!("{} already done", args.id);
    }
    Ok(())
}

fn cmd_delete(args: TaskIdArg, data_dir: &Path) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    let task = task_ops::delete_task(session.store_mut(), &args.id)?;
    finish(&mut session, &now)?;
    println!("{} archived", task.id);
    Ok(())
}

fn cmd_restore(args: RestoreArgs, data_dir: &Path) -> CmdResult {
    let now = now_local();
    let index = args
        .index
        .checked_sub(1)
        .ok_or("archive numbers start at 1 (see td archived)")?;
    let mut session = Session::open(data_dir)?;
    let id = task_ops::restore_task(session.store_mut(), index)?;
    let swept = finish(&mut session, &now)?;
    if swept.contains(&id) {
        eprintln!(
            "note: {} is more than {} day(s) past its final due date and was archived again",
            id,
            session.config().sweep.grace_days
        );
    } else {
        println!("{} restored", id);
    }
    Ok(())
}

fn cmd_sweep(data_dir: &Path) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    let swept = session.commit(&now)?;
    if swept.is_empty() {
        println!("nothing overdue");
    }
    for id in swept {
        println!("{} archived", id);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

fn cmd_category(args: CategoryCmd, data_dir: &Path, json: bool) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;

    match args.action.unwrap_or(CategoryAction::List) {
        CategoryAction::List => {
            finish(&mut session, &now)?;
            list_categories(&session, json)
        }
        CategoryAction::Add(a) => {
            let name = category_ops::add_category(session.store_mut(), &a.name)?;
            finish(&mut session, &now)?;
            println!("{}", name);
            Ok(())
        }
        CategoryAction::Rename(a) => {
            let store = session.store_mut();
            if !category_ops::rename_category(store, &a.old, &a.new) {
                let reason = if a.old == DEFAULT_CATEGORY {
                    format!("the default category '{}' cannot be renamed", DEFAULT_CATEGORY)
                } else if !store.categories().contains(&a.old) {
                    format!("category not found: {}", a.old)
                } else {
                    format!("'{}' is empty, reserved or already in use", a.new.trim())
                };
                return Err(reason.into());
            }
            finish(&mut session, &now)?;
            println!("{} -> {}", a.old, a.new.trim());
            Ok(())
        }
        CategoryAction::Delete(a) => {
            let name = a.name.trim();
            let in_use = category_ops::tasks_in_category(session.store(), name);
            if in_use > 0 && !a.force && !is_reserved(name) {
                return Err(format!(
                    "category '{}' has {} task(s); use --force to move them to {}",
                    name,
                    in_use,
                    DEFAULT_CATEGORY
                )
                .into());
            }
            let moved = category_ops::delete_category(session.store_mut(), name)?;
            finish(&mut session, &now)?;
            println!(
                "deleted {} ({} task(s) moved to {})",
                name,
                moved,
                DEFAULT_CATEGORY
            );
            Ok(())
        }
    }
}

fn list_categories(session: &Session, json: bool) -> CmdResult {
    let store = session.store();
    let rows: Vec<CategoryJson> = store
        .categories()
        .names()
        .iter()
        .map(|name| {
            let (done, open): (Vec<_>, Vec<_>) = store
                .tasks()
                .iter()
                .filter(|t| &t.category == name)
                .partition(|t| t.completed);
            CategoryJson {
                name: name.clone(),
                open: open.len(),
                done: done.len(),
                active: store.active_tab() == name,
            }
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    let name_w = rows
        .iter()
        .map(|r| display_width(&r.name))
        .max()
        .unwrap_or(0)
        .max(ARCHIVED_VIEW.len());
    for row in &rows {
        println!(
            "{} {}  {} open, {} done",
            if row.active { '*' } else { ' ' },
            pad_to_width(&row.name, name_w),
            row.open,
            row.done
        );
    }
    println!(
        "{} {}  {} task(s)",
        if store.active_tab() == ARCHIVED_VIEW { '*' } else { ' ' },
        pad_to_width(ARCHIVED_VIEW, name_w),
        store.archived().len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

fn cmd_export(args: ExportArgs, data_dir: &Path) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    finish(&mut session, &now)?;
    let path = session.export(args.path.as_deref())?;
    println!("{}", path.display());
    Ok(())
}

fn cmd_import(args: ImportArgs, data_dir: &Path) -> CmdResult {
    let now = now_local();
    let mut session = Session::open(data_dir)?;
    let summary = session.import(&args.path)?;
    finish(&mut session, &now)?;
    println!(
        "imported {} task(s), {} archived{}",
        summary.tasks,
        summary.archived,
        if summary.categories_replaced {
            ", categories replaced"
        } else {
            ""
        }
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(args: ConfigCmd, data_dir: &Path, json: bool) -> CmdResult {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let (config, _doc) = config_io::read_config(data_dir)?;
            if json {
                print_json(&config)
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
        }
        ConfigAction::Set(a) => {
            std::fs::create_dir_all(data_dir)?;
            let _lock = FileLock::acquire_default(data_dir)?;
            let mut doc = config_io::read_document(data_dir)?;
            config_io::set_value(&mut doc, &a.key, &a.value)?;
            config_io::write_config(data_dir, &doc)?;
            println!("{} = {}", a.key, a.value);
            Ok(())
        }
    }
}
