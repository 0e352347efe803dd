use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::error::AppError;

pub const HISTORY_PREFIX: &str = "sw_script_";
pub const SCRIPT_EXTENSION: &str = "vbs";
pub const DEFAULT_MAX_HISTORY: usize = 20;
pub const CURRENT_SCRIPT: &str = "current_script.vbs";
pub const SAMPLE_SCRIPT: &str = "create_simple_part.vbs";

const BUNDLED_SAMPLE: &str = include_str!("../assets/create_simple_part.vbs");

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One generated script on disk.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub path: PathBuf,
    pub file_name: String,
    /// `YYYY-mm-dd HH:MM:SS` when the name carries a timestamp, else the file name.
    pub label: String,
}

impl HistoryEntry {
    fn from_path(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let label = parse_label(&file_name).unwrap_or_else(|| file_name.clone());
        Self {
            path,
            file_name,
            label,
        }
    }
}

fn parse_label(file_name: &str) -> Option<String> {
    let stamp = file_name
        .strip_prefix(HISTORY_PREFIX)?
        .strip_suffix(&format!(".{}", SCRIPT_EXTENSION))?;
    // Same-second saves carry a `_N` suffix after the timestamp.
    let stamp = stamp.get(..15).unwrap_or(stamp);
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
        .ok()
        .map(|dt| dt.format(LABEL_FORMAT).to_string())
}

/// Directory of timestamp-named scripts, pruned to the newest `max_entries`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            dir: dir.into(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn save(&self, content: &str) -> Result<HistoryEntry, AppError> {
        self.save_at(content, Local::now().naive_local())
    }

    /// Write `content` under a name derived from `timestamp`, then prune.
    pub fn save_at(&self, content: &str, timestamp: NaiveDateTime) -> Result<HistoryEntry, AppError> {
        std::fs::create_dir_all(&self.dir)?;
        let stamp = timestamp.format(STAMP_FORMAT).to_string();

        let path = match self.last_suffix(&stamp)? {
            None => self
                .dir
                .join(format!("{}{}.{}", HISTORY_PREFIX, stamp, SCRIPT_EXTENSION)),
            // Zero-padded so same-second saves still sort in save order.
            Some(n) => self.dir.join(format!(
                "{}{}_{:03}.{}",
                HISTORY_PREFIX,
                stamp,
                n + 1,
                SCRIPT_EXTENSION
            )),
        };

        std::fs::write(&path, content)?;
        log::info!("Script saved: {}", path.display());
        self.prune();
        Ok(HistoryEntry::from_path(path))
    }

    /// Highest collision suffix already used for `stamp` (0 for the bare
    /// name), or `None` when nothing was saved in that second.
    fn last_suffix(&self, stamp: &str) -> Result<Option<u32>, AppError> {
        let prefix = format!("{}{}", HISTORY_PREFIX, stamp);
        let extension = format!(".{}", SCRIPT_EXTENSION);
        let mut last = None;
        for path in self.files_oldest_first()? {
            let Some(rest) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(prefix.as_str()))
                .and_then(|n| n.strip_suffix(extension.as_str()))
            else {
                continue;
            };
            let suffix = match rest.strip_prefix('_') {
                Some(digits) => digits.parse::<u32>().ok(),
                None if rest.is_empty() => Some(0),
                None => None,
            };
            last = last.max(suffix);
        }
        Ok(last)
    }

    /// History files sorted oldest first (names sort chronologically).
    fn files_oldest_first(&self) -> Result<Vec<PathBuf>, AppError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_history_file(path))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Delete the oldest files beyond `max_entries`. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let files = match self.files_oldest_first() {
            Ok(files) => files,
            Err(e) => {
                log::error!("Failed to list history for pruning: {}", e);
                return 0;
            }
        };
        if files.len() <= self.max_entries {
            return 0;
        }

        let excess = files.len() - self.max_entries;
        let mut removed = 0;
        for path in &files[..excess] {
            match std::fs::remove_file(path) {
                Ok(()) => {
                    removed += 1;
                    log::info!("Old script removed: {}", path.display());
                }
                Err(e) => log::error!("Failed to remove {}: {}", path.display(), e),
            }
        }
        removed
    }

    /// Newest first.
    pub fn list(&self) -> Result<Vec<HistoryEntry>, AppError> {
        let mut files = self.files_oldest_first()?;
        files.reverse();
        Ok(files.into_iter().map(HistoryEntry::from_path).collect())
    }

    /// Read a script that lives in this history directory.
    pub fn read(&self, path: &Path) -> Result<String, AppError> {
        let path = self.contain(path)?;
        Ok(std::fs::read_to_string(path)?)
    }

    /// Reject paths that are not history files inside this store.
    pub fn contain(&self, path: &Path) -> Result<PathBuf, AppError> {
        let outside = || {
            AppError::HistoryError(format!("{} is not a history script", path.display()))
        };
        let dir = self.dir.canonicalize().map_err(|_| outside())?;
        let resolved = path.canonicalize().map_err(|_| outside())?;
        if resolved.parent() != Some(dir.as_path()) || !is_history_file(&resolved) {
            return Err(outside());
        }
        Ok(resolved)
    }
}

fn is_history_file(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(HISTORY_PREFIX))
        .unwrap_or(false);
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(SCRIPT_EXTENSION))
        .unwrap_or(false);
    name_ok && ext_ok
}

/// The scripts directory: the "current" script that run/debug act on, and
/// the bundled sample.
#[derive(Debug, Clone)]
pub struct ScriptWorkspace {
    scripts_dir: PathBuf,
}

impl ScriptWorkspace {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
        }
    }

    pub fn current_path(&self) -> PathBuf {
        self.scripts_dir.join(CURRENT_SCRIPT)
    }

    pub fn sample_path(&self) -> PathBuf {
        self.scripts_dir.join(SAMPLE_SCRIPT)
    }

    pub fn has_current(&self) -> bool {
        self.current_path().is_file()
    }

    pub fn read_current(&self) -> Result<String, AppError> {
        let path = self.current_path();
        if !path.is_file() {
            return Err(AppError::HistoryError("There is no current script".into()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    pub fn write_current(&self, content: &str) -> Result<PathBuf, AppError> {
        std::fs::create_dir_all(&self.scripts_dir)?;
        let path = self.current_path();
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Copy `source` over the current script and return its contents.
    pub fn promote(&self, source: &Path) -> Result<String, AppError> {
        std::fs::create_dir_all(&self.scripts_dir)?;
        std::fs::copy(source, self.current_path())?;
        Ok(std::fs::read_to_string(source)?)
    }

    pub fn load_sample(&self) -> Result<String, AppError> {
        let sample = self.sample_path();
        if !sample.is_file() {
            return Err(AppError::HistoryError("Sample script not found".into()));
        }
        self.promote(&sample)
    }

    /// Write the built-in sample unless one is already on disk.
    pub fn install_bundled_sample(&self) -> Result<bool, AppError> {
        if self.sample_path().is_file() {
            return Ok(false);
        }
        std::fs::create_dir_all(&self.scripts_dir)?;
        std::fs::write(self.sample_path(), BUNDLED_SAMPLE)?;
        Ok(true)
    }

    /// On first start, make the sample the current script. Returns whether it copied.
    pub fn seed_current_from_sample(&self) -> Result<bool, AppError> {
        if self.has_current() || !self.sample_path().is_file() {
            return Ok(false);
        }
        std::fs::copy(self.sample_path(), self.current_path())?;
        log::info!("Sample script copied as the current script");
        Ok(true)
    }
}
