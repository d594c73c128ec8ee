use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::codec::{self, CATEGORIES_SHEET, CodecError, Workbook};
use crate::io::config_io::{ConfigError, read_config};
use crate::io::kv_store::{KvStore, atomic_write};
use crate::io::lock::{FileLock, LockError};
use crate::io::state::{UiState, read_ui_state, write_ui_state};
use crate::model::config::AppConfig;
use crate::model::store::TodoStore;
use crate::ops::category_ops::select_tab;
use crate::ops::sweep::sweep_overdue;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("could not encode data: {0}")]
    Encode(#[from] CodecError),
    #[error("could not import {path}: {source}")]
    Import { path: PathBuf, source: CodecError },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SessionError + '_ {
    move |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What an import brought in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub tasks: usize,
    pub archived: usize,
    /// Whether the file carried a categories table that replaced the registry
    pub categories_replaced: bool,
}

/// One load → mutate → commit cycle against a data directory.
///
/// Holds the directory lock for its whole lifetime.
pub struct Session {
    data_dir: PathBuf,
    config: AppConfig,
    kv: KvStore,
    store: TodoStore,
    saved_tab: String,
    _lock: FileLock,
}

impl Session {
    /// Open the data directory (creating it if needed), read config.toml
    /// and load the stored workbook.
    ///
    /// Unreadable stored data is not an error: it is logged, moved aside as
    /// `<key>.blob.bak`, and the session starts empty.
    pub fn open(data_dir: &Path) -> Result<Self, SessionError> {
        let kv = KvStore::open(data_dir).map_err(io_error(data_dir))?;
        let lock = FileLock::acquire_default(data_dir)?;
        let (config, _doc) = read_config(data_dir)?;
        let mut store = load_store(&kv, &config.storage.key)?;

        if let Some(state) = read_ui_state(data_dir)
            && select_tab(&mut store, &state.active_tab).is_err()
        {
            tracing::debug!(tab = %state.active_tab, "saved tab no longer exists");
        }
        let saved_tab = store.active_tab().to_string();

        Ok(Session {
            data_dir: data_dir.to_path_buf(),
            config,
            kv,
            store,
            saved_tab,
            _lock: lock,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &TodoStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TodoStore {
        &mut self.store
    }

    /// Run the overdue sweep, then write through if anything changed.
    /// Returns the IDs the sweep archived.
    pub fn commit(&mut self, now: &NaiveDateTime) -> Result<Vec<String>, SessionError> {
        let swept = sweep_overdue(&mut self.store, now, self.config.sweep.grace_days);
        if self.store.is_dirty() {
            self.flush()?;
        }
        if self.store.active_tab() != self.saved_tab {
            let state = UiState {
                active_tab: self.store.active_tab().to_string(),
            };
            write_ui_state(&self.data_dir, &state).map_err(io_error(&self.data_dir))?;
            self.saved_tab = state.active_tab;
        }
        Ok(swept)
    }

    /// Encode the whole store and replace the stored blob
    pub fn flush(&mut self) -> Result<(), SessionError> {
        let key = &self.config.storage.key;
        let text = codec::encode(
            self.store.tasks(),
            self.store.archived(),
            self.store.categories().names(),
        )?;
        self.kv
            .set(key, &text)
            .map_err(io_error(&self.kv.path_for(key)))?;
        self.store.mark_clean();
        tracing::debug!(
            key = %key,
            tasks = self.store.tasks().len(),
            archived = self.store.archived().len(),
            "flushed"
        );
        Ok(())
    }

    /// Write the workbook to `path`, or to the configured export file name
    /// in the current directory. Does not touch the dirty flag.
    pub fn export(&self, path: Option<&Path>) -> Result<PathBuf, SessionError> {
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(&self.config.export.filename),
        };
        let text = codec::encode(
            self.store.tasks(),
            self.store.archived(),
            self.store.categories().names(),
        )?;
        atomic_write(&target, text.as_bytes()).map_err(io_error(&target))?;
        tracing::info!(path = %target.display(), "exported");
        Ok(target)
    }

    /// Replace active and archived tasks with the contents of a workbook
    /// file. Categories are replaced only when the file has a categories
    /// table. On any error the store is untouched.
    pub fn import(&mut self, path: &Path) -> Result<ImportSummary, SessionError> {
        let text = fs::read_to_string(path).map_err(io_error(path))?;
        let wb = Workbook::from_text(&text).map_err(|source| SessionError::Import {
            path: path.to_path_buf(),
            source,
        })?;
        let categories_replaced = wb.sheet(CATEGORIES_SHEET).is_some();
        let snapshot = codec::from_workbook(&wb);
        let summary = ImportSummary {
            tasks: snapshot.tasks.len(),
            archived: snapshot.archived.len(),
            categories_replaced,
        };
        self.store.replace_contents(snapshot, categories_replaced);
        self.store.mark_dirty();
        tracing::info!(
            path = %path.display(),
            tasks = summary.tasks,
            archived = summary.archived,
            "imported"
        );
        Ok(summary)
    }
}

fn load_store(kv: &KvStore, key: &str) -> Result<TodoStore, SessionError> {
    let Some(text) = kv.get(key).map_err(io_error(&kv.path_for(key)))? else {
        tracing::debug!(key, "no stored data");
        return Ok(TodoStore::new());
    };
    match codec::decode(&text) {
        Ok(snapshot) => {
            tracing::debug!(
                key,
                tasks = snapshot.tasks.len(),
                archived = snapshot.archived.len(),
                "loaded"
            );
            Ok(TodoStore::from_snapshot(snapshot))
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "stored data is unreadable, starting empty");
            if let Some(bak) = kv.quarantine(key).map_err(io_error(&kv.path_for(key)))? {
                tracing::warn!(backup = %bak.display(), "moved unreadable data aside");
            }
            Ok(TodoStore::new())
        }
    }
}

/// Default data directory: $TABDO_HOME, else $XDG_DATA_HOME/tabdo, else
/// ~/.local/share/tabdo
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TABDO_HOME")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    let data_home = std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| dirs_home().join(".local").join("share"));
    data_home.join("tabdo")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Priority, Task, TaskDraft};
    use crate::ops::category_ops::add_category;
    use crate::ops::task_ops::add_task;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn now() -> NaiveDateTime {
        dt(2025, 5, 20, 12)
    }

    fn add(session: &mut Session, title: &str, category: &str) -> String {
        let mut draft = TaskDraft::new(title);
        draft.category = category.into();
        add_task(session.store_mut(), &mut draft, &now()).unwrap()
    }

    #[test]
    fn empty_directory_opens_empty() {
        let tmp = TempDir::new().unwrap();
        let session = Session::open(tmp.path()).unwrap();
        assert!(session.store().tasks().is_empty());
        assert_eq!(session.store().categories().names(), ["unsorted"]);
        assert!(!session.store().is_dirty());
    }

    #[test]
    fn commit_writes_through_and_reloads() {
        let tmp = TempDir::new().unwrap();
        {
            let mut session = Session::open(tmp.path()).unwrap();
            add_category(session.store_mut(), "home").unwrap();
            add(&mut session, "Buy milk", "home");
            session.commit(&now()).unwrap();
            assert!(!session.store().is_dirty());
        }
        assert!(tmp.path().join("todo-app-data.blob").exists());

        let session = Session::open(tmp.path()).unwrap();
        assert_eq!(session.store().tasks().len(), 1);
        assert_eq!(session.store().tasks()[0].title, "Buy milk");
        assert!(session.store().categories().contains("home"));
    }

    #[test]
    fn commit_without_changes_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut session = Session::open(tmp.path()).unwrap();
        session.commit(&now()).unwrap();
        assert!(!tmp.path().join("todo-app-data.blob").exists());
    }

    #[test]
    fn commit_sweeps_overdue_tasks() {
        let tmp = TempDir::new().unwrap();
        let mut session = Session::open(tmp.path()).unwrap();
        let id = add(&mut session, "Old", "unsorted");
        let mut snap = session.store().snapshot();
        snap.tasks[0].final_due = Some(dt(2025, 5, 1, 9));
        session.store_mut().replace_contents(snap, true);

        let swept = session.commit(&now()).unwrap();
        assert_eq!(swept, vec![id]);
        assert!(session.store().tasks().is_empty());
        assert_eq!(session.store().archived().len(), 1);
    }

    #[test]
    fn corrupt_blob_is_quarantined() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("todo-app-data.blob"), "not a workbook").unwrap();

        let session = Session::open(tmp.path()).unwrap();
        assert!(session.store().tasks().is_empty());
        assert!(!tmp.path().join("todo-app-data.blob").exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join("todo-app-data.blob.bak")).unwrap(),
            "not a workbook"
        );
    }

    #[test]
    fn storage_key_comes_from_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[storage]\nkey = \"other\"\n").unwrap();
        let mut session = Session::open(tmp.path()).unwrap();
        add(&mut session, "A", "unsorted");
        session.commit(&now()).unwrap();
        assert!(tmp.path().join("other.blob").exists());
    }

    #[test]
    fn active_tab_survives_sessions() {
        let tmp = TempDir::new().unwrap();
        {
            let mut session = Session::open(tmp.path()).unwrap();
            add_category(session.store_mut(), "work").unwrap();
            select_tab(session.store_mut(), "work").unwrap();
            session.commit(&now()).unwrap();
        }
        let session = Session::open(tmp.path()).unwrap();
        assert_eq!(session.store().active_tab(), "work");
    }

    #[test]
    fn export_then_import_replaces_contents() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("backup.json");
        {
            let mut session = Session::open(tmp.path()).unwrap();
            add_category(session.store_mut(), "home").unwrap();
            add(&mut session, "Keep me", "home");
            let written = session.export(Some(&file)).unwrap();
            assert_eq!(written, file);
            // export does not count as saving
            assert!(session.store().is_dirty());
        }

        let other = TempDir::new().unwrap();
        let mut session = Session::open(other.path()).unwrap();
        add(&mut session, "Replaced", "unsorted");
        let summary = session.import(&file).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                tasks: 1,
                archived: 0,
                categories_replaced: true
            }
        );
        assert_eq!(session.store().tasks().len(), 1);
        assert_eq!(session.store().tasks()[0].title, "Keep me");
        assert!(session.store().categories().contains("home"));
        assert!(session.store().is_dirty());
    }

    #[test]
    fn import_without_categories_keeps_registry() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("tasks-only.json");
        let mut task = Task::new("T-009".into(), "From file".into(), "errands".into());
        task.priority = Priority::High;
        let mut wb = codec::to_workbook(&[task], &[], &[]);
        wb.sheets.shift_remove(CATEGORIES_SHEET);
        fs::write(&file, wb.to_text().unwrap()).unwrap();

        let mut session = Session::open(tmp.path()).unwrap();
        add_category(session.store_mut(), "work").unwrap();
        let summary = session.import(&file).unwrap();
        assert!(!summary.categories_replaced);
        let names = session.store().categories().names();
        assert!(names.contains(&"work".to_string()));
        assert!(names.contains(&"errands".to_string()));
    }

    #[test]
    fn failed_import_leaves_state() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("bad.json");
        fs::write(&file, "PK garbage").unwrap();

        let mut session = Session::open(tmp.path()).unwrap();
        add(&mut session, "Still here", "unsorted");
        let before = session.store().snapshot();
        assert!(matches!(
            session.import(&file),
            Err(SessionError::Import { .. })
        ));
        assert!(matches!(
            session.import(&tmp.path().join("missing.json")),
            Err(SessionError::Io { .. })
        ));
        assert_eq!(session.store().snapshot(), before);
    }

    #[test]
    fn import_of_foreign_json_leaves_loaded_store() {
        let tmp = TempDir::new().unwrap();
        let mut session = Session::open(tmp.path()).unwrap();
        add(&mut session, "Loaded", "work");
        session.commit(&now()).unwrap();
        let before = session.store().snapshot();

        let other_format = tmp.path().join("other.json");
        fs::write(&other_format, r#"{"format": "other", "version": 1, "sheets": {}}"#).unwrap();
        let future = tmp.path().join("future.json");
        fs::write(&future, r#"{"format": "tabdo-workbook", "version": 99, "sheets": {}}"#).unwrap();

        for file in [&other_format, &future] {
            assert!(matches!(
                session.import(file),
                Err(SessionError::Import { .. })
            ));
            assert_eq!(session.store().snapshot(), before);
            assert!(!session.store().is_dirty());
        }
    }

    #[test]
    fn import_maps_archived_category_to_default() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("odd.json");
        let task = Task::new("T-001".into(), "Odd row".into(), "archived".into());
        let wb = codec::to_workbook(&[task], &[], &["archived".to_string()]);
        fs::write(&file, wb.to_text().unwrap()).unwrap();

        let mut session = Session::open(tmp.path()).unwrap();
        session.import(&file).unwrap();
        assert_eq!(session.store().categories().names(), &["unsorted"]);
        assert_eq!(session.store().tasks()[0].category, "unsorted");
    }
}
