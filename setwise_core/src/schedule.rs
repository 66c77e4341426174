//! Schedule status glue and a file-backed schedule board.
//!
//! The engine maps lifecycle transitions to schedule statuses and fires
//! them without waiting on the outcome. [`ScheduleBoard`] is a small local
//! stand-in for the server side: a JSON file of entries guarded by file
//! locks and written atomically.

use crate::store::ScheduleApi;
use crate::{Error, Result, ScheduleStatus};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Session lifecycle moments that move a schedule entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleTransition {
    Started,
    Completed,
    Abandoned,
}

/// Status requested for each lifecycle moment
pub fn status_for(transition: LifecycleTransition) -> ScheduleStatus {
    match transition {
        LifecycleTransition::Started => ScheduleStatus::InProgress,
        LifecycleTransition::Completed => ScheduleStatus::Completed,
        LifecycleTransition::Abandoned => ScheduleStatus::Cancelled,
    }
}

/// Whether the board accepts moving from `from` to `to`
pub fn is_allowed(from: ScheduleStatus, to: ScheduleStatus) -> bool {
    use ScheduleStatus::*;
    matches!(
        (from, to),
        (Scheduled, InProgress)
            | (InProgress, Completed)
            | (Scheduled, Cancelled)
            | (InProgress, Cancelled)
    )
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub workout_id: String,
    pub status: ScheduleStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScheduleBook {
    pub entries: BTreeMap<String, ScheduleEntry>,
}

impl ScheduleBook {
    /// Load the book, treating a missing or unreadable file as empty
    pub fn load(path: &Path) -> Result<Self> {
        let Some(contents) = read_locked(path)? else {
            tracing::debug!("No schedule file at {:?}, starting empty", path);
            return Ok(Self::default());
        };

        match serde_json::from_str::<ScheduleBook>(&contents) {
            Ok(book) => Ok(book),
            Err(e) => {
                tracing::warn!("Failed to parse schedule file {:?}: {}. Using empty book.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Load, modify and save the book while holding the update lock.
    ///
    /// Nothing is written if `f` fails. A file that no longer parses is
    /// moved aside to `<name>.corrupt-<timestamp>` before the update starts
    /// from an empty book, so its contents can still be recovered by hand.
    pub fn update<T, F>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut ScheduleBook) -> Result<T>,
    {
        let _lock = UpdateLock::acquire(path)?;

        let mut book = match read_locked(path)? {
            None => Self::default(),
            Some(contents) => match serde_json::from_str::<ScheduleBook>(&contents) {
                Ok(book) => book,
                Err(e) => {
                    let stamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
                    let backup = sidecar_path(path, &format!("corrupt-{}", stamp));
                    std::fs::rename(path, &backup)?;
                    tracing::warn!(
                        "Schedule file {:?} is corrupt ({}); moved it to {:?}",
                        path,
                        e,
                        backup
                    );
                    Self::default()
                }
            },
        };

        let value = f(&mut book)?;
        book.save(path)?;
        Ok(value)
    }

    /// Atomically replace the book on disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Other(format!("schedule path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!("Saved schedule book to {:?}", path);
        Ok(())
    }
}

/// `<file name>.<suffix>` next to `path`
fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "schedule.json".into());
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Read the whole file under a shared lock; `None` if it does not exist
fn read_locked(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;
    Ok(Some(contents))
}

/// Exclusive lock on `<name>.lock`, held for a whole read-modify-write.
///
/// The book itself is replaced by rename on every save, so it cannot carry
/// the lock across an update.
struct UpdateLock {
    file: File,
}

impl UpdateLock {
    fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(sidecar_path(path, "lock"))?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release schedule lock: {}", e);
        }
    }
}

/// JSON-file-backed [`ScheduleApi`]
pub struct ScheduleBoard {
    path: PathBuf,
}

impl ScheduleBoard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Add a new entry in `SCHEDULED` state
    pub fn add(&mut self, schedule_id: &str, workout_id: &str) -> Result<()> {
        ScheduleBook::update(&self.path, |book| {
            if book.entries.contains_key(schedule_id) {
                return Err(Error::Schedule(format!(
                    "schedule '{}' already exists",
                    schedule_id
                )));
            }
            book.entries.insert(
                schedule_id.to_string(),
                ScheduleEntry {
                    workout_id: workout_id.to_string(),
                    status: ScheduleStatus::Scheduled,
                    updated_at: Utc::now(),
                },
            );
            Ok(())
        })
    }

    pub fn entries(&self) -> Result<BTreeMap<String, ScheduleEntry>> {
        Ok(ScheduleBook::load(&self.path)?.entries)
    }

    pub fn get(&self, schedule_id: &str) -> Result<Option<ScheduleEntry>> {
        Ok(self.entries()?.remove(schedule_id))
    }
}

impl ScheduleApi for ScheduleBoard {
    fn transition(&mut self, schedule_id: &str, status: ScheduleStatus) -> Result<()> {
        ScheduleBook::update(&self.path, |book| {
            let entry = book
                .entries
                .get_mut(schedule_id)
                .ok_or_else(|| Error::Schedule(format!("unknown schedule '{}'", schedule_id)))?;

            if !is_allowed(entry.status, status) {
                return Err(Error::Schedule(format!(
                    "schedule '{}' cannot move from {} to {}",
                    schedule_id, entry.status, status
                )));
            }

            entry.status = status;
            entry.updated_at = Utc::now();
            Ok(())
        })?;
        tracing::info!("Schedule {} is now {}", schedule_id, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_mapping() {
        assert_eq!(status_for(LifecycleTransition::Started), ScheduleStatus::InProgress);
        assert_eq!(status_for(LifecycleTransition::Completed), ScheduleStatus::Completed);
        assert_eq!(status_for(LifecycleTransition::Abandoned), ScheduleStatus::Cancelled);
    }

    #[test]
    fn test_board_walks_happy_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut board = ScheduleBoard::new(temp_dir.path().join("schedule.json"));

        board.add("mon-am", "full_body").unwrap();
        board.transition("mon-am", ScheduleStatus::InProgress).unwrap();
        board.transition("mon-am", ScheduleStatus::Completed).unwrap();

        let entry = board.get("mon-am").unwrap().unwrap();
        assert_eq!(entry.status, ScheduleStatus::Completed);
    }

    #[test]
    fn test_board_rejects_unknown_and_invalid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut board = ScheduleBoard::new(temp_dir.path().join("schedule.json"));

        assert!(matches!(
            board.transition("missing", ScheduleStatus::InProgress),
            Err(Error::Schedule(_))
        ));

        board.add("tue", "core_blast").unwrap();
        assert!(board.transition("tue", ScheduleStatus::Completed).is_err());
        assert!(board.add("tue", "core_blast").is_err());
    }

    #[test]
    fn test_corrupt_book_reads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("schedule.json");
        std::fs::write(&path, "{ broken").unwrap();

        let book = ScheduleBook::load(&path).unwrap();
        assert!(book.entries.is_empty());
    }

    #[test]
    fn test_update_moves_corrupt_book_aside() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("schedule.json");
        std::fs::write(&path, "{ broken").unwrap();

        let mut board = ScheduleBoard::new(&path);
        board.add("wed", "core_blast").unwrap();
        assert_eq!(board.entries().unwrap().len(), 1);

        let backups: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("schedule.json.corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read_to_string(backups[0].path()).unwrap(), "{ broken");
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("schedule.json");
        let mut board = ScheduleBoard::new(&path);
        board.add("thu", "full_body").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(board.transition("thu", ScheduleStatus::Completed).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_concurrent_adds_are_all_kept() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("schedule.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut board = ScheduleBoard::new(path);
                    board.add(&format!("slot-{}", i), "core_blast").unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = ScheduleBoard::new(&path).entries().unwrap();
        assert_eq!(entries.len(), 8);
    }
}
