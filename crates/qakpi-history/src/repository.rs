//! History stores
//!
//! A store holds one record set per (project, release). `save` replaces the
//! whole set for its key; `load_project` returns every set of a project.
//!
//! The file store lays data out as
//! `<base>/<project>/<release>/kpi_history.json` and writes through a
//! temporary sibling that is renamed into place, so a crashed write never
//! leaves a half-written history file behind.

use crate::error::HistoryError;
use crate::record::HistoryRecord;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of one release's history
pub const HISTORY_FILE_NAME: &str = "kpi_history.json";

/// Persistence seam for KPI history
pub trait HistoryStore: Send + Sync {
    /// Replace the stored records of one release
    ///
    /// # Errors
    /// If the key is blank or the write fails
    fn save(&self, project: &str, release: &str, records: &[HistoryRecord])
        -> Result<(), HistoryError>;

    /// Every stored record of a project; unreadable entries are skipped
    ///
    /// # Errors
    /// If the project location exists but cannot be listed
    fn load_project(&self, project: &str) -> Result<Vec<HistoryRecord>, HistoryError>;
}

fn check_key(project: &str, release: &str) -> Result<(), HistoryError> {
    if project.trim().is_empty() || release.trim().is_empty() {
        return Err(HistoryError::invalid_key(project, release));
    }
    Ok(())
}

/// Map a project or release key to a directory name
///
/// `[A-Za-z0-9._-]` is kept, every other byte becomes `%XX`. Keys made only
/// of dots are escaped whole, so `.` and `..` are never produced. Distinct
/// keys always give distinct names; the empty key maps to `%`.
#[must_use]
pub fn encode_component(key: &str) -> String {
    if key.is_empty() {
        return "%".to_string();
    }
    let all_dots = key.bytes().all(|b| b == b'.');

    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'_' | b'-')
            || (byte == b'.' && !all_dots);
        if keep {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// File-tree history store
#[derive(Debug, Clone)]
pub struct FileHistoryRepository {
    base_dir: PathBuf,
}

impl FileHistoryRepository {
    /// Create store rooted at `base_dir` (created on first write)
    #[inline]
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory of one project
    #[must_use]
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.base_dir.join(encode_component(project))
    }

    /// History file of one release
    #[must_use]
    pub fn history_file(&self, project: &str, release: &str) -> PathBuf {
        self.project_dir(project)
            .join(encode_component(release))
            .join(HISTORY_FILE_NAME)
    }

    fn read_file(path: &Path) -> Result<Vec<HistoryRecord>, HistoryError> {
        let text = fs::read_to_string(path).map_err(|e| HistoryError::io_error(path, e))?;
        serde_json::from_str(&text).map_err(|source| HistoryError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl HistoryStore for FileHistoryRepository {
    fn save(
        &self,
        project: &str,
        release: &str,
        records: &[HistoryRecord],
    ) -> Result<(), HistoryError> {
        check_key(project, release)?;

        let path = self.history_file(project, release);
        let dir = path.parent().unwrap_or(&self.base_dir);
        fs::create_dir_all(dir).map_err(|e| HistoryError::io_error(dir, e))?;

        let mut bytes = serde_json::to_vec_pretty(records).map_err(|source| HistoryError::Encode {
            path: path.clone(),
            source,
        })?;
        bytes.push(b'\n');

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).map_err(|e| HistoryError::io_error(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(HistoryError::io_error(&path, e));
        }

        tracing::debug!(
            project,
            release,
            records = records.len(),
            path = %path.display(),
            "saved KPI history"
        );
        Ok(())
    }

    fn load_project(&self, project: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        let dir = self.project_dir(project);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HistoryError::io_error(&dir, e)),
        };

        let mut release_dirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        release_dirs.sort();

        let mut records = Vec::new();
        for release_dir in release_dirs {
            let file = release_dir.join(HISTORY_FILE_NAME);
            if !file.is_file() {
                continue;
            }
            match Self::read_file(&file) {
                Ok(loaded) => {
                    let before = records.len();
                    records.extend(loaded.into_iter().filter(|r| r.project == project));
                    if records.len() == before {
                        tracing::debug!(project, path = %file.display(), "no records of this project in history file");
                    }
                }
                Err(e) => {
                    tracing::warn!(project, path = %file.display(), error = %e, "skipping unreadable history file");
                }
            }
        }
        Ok(records)
    }
}

/// In-memory history store
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<BTreeMap<(String, String), Vec<HistoryRecord>>>,
}

impl MemoryHistoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of one release
    #[must_use]
    pub fn records(&self, project: &str, release: &str) -> Option<Vec<HistoryRecord>> {
        self.entries
            .lock()
            .get(&(project.to_string(), release.to_string()))
            .cloned()
    }

    /// Stored releases of one project
    #[must_use]
    pub fn releases(&self, project: &str) -> Vec<String> {
        self.entries
            .lock()
            .keys()
            .filter(|(p, _)| p == project)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Number of stored (project, release) sets
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Nothing stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn save(
        &self,
        project: &str,
        release: &str,
        records: &[HistoryRecord],
    ) -> Result<(), HistoryError> {
        check_key(project, release)?;
        self.entries
            .lock()
            .insert((project.to_string(), release.to_string()), records.to_vec());
        Ok(())
    }

    fn load_project(&self, project: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|((p, _), _)| p == project)
            .flat_map(|(_, records)| records.iter().cloned())
            .collect())
    }
}
