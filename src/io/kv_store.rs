use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Extension of value files inside the store directory
const VALUE_EXT: &str = "blob";

/// A tiny local key-value store: one file per key in a directory.
///
/// Values are text. Writes replace the whole value atomically, so a reader
/// never sees a half-written blob.
#[derive(Debug, Clone)]
pub struct KvStore {
    dir: PathBuf,
}

impl KvStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(KvStore {
            dir: dir.to_path_buf(),
        })
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.{}", safe, VALUE_EXT))
    }

    /// Read a value. A missing key is `Ok(None)`.
    pub fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Overwrite a value
    pub fn set(&self, key: &str, value: &str) -> io::Result<()> {
        atomic_write(&self.path_for(key), value.as_bytes())
    }

    /// Move an unreadable value aside as `<file>.bak` so the next write
    /// does not destroy it. Returns the backup path if there was a value.
    pub fn quarantine(&self, key: &str) -> io::Result<Option<PathBuf>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bak = path.with_extension(format!("{}.bak", VALUE_EXT));
        fs::rename(&path, &bak)?;
        Ok(Some(bak))
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Directory holding `path`; a bare file name lives in the current one
fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}
