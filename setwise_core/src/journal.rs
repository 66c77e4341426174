//! Append-only session journal.
//!
//! Session records are appended to a JSONL (JSON Lines) file with file
//! locking so the CLI and other readers can share it safely.

use crate::store::SessionStore;
use crate::{Result, SessionId, SessionSummary};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One line of the journal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalEntry {
    Created {
        session_id: SessionId,
        workout_id: String,
        created_at: DateTime<Utc>,
    },
    Completed {
        session_id: SessionId,
        summary: SessionSummary,
    },
}

impl JournalEntry {
    pub fn session_id(&self) -> SessionId {
        match self {
            JournalEntry::Created { session_id, .. } | JournalEntry::Completed { session_id, .. } => {
                *session_id
            }
        }
    }
}

/// JSONL-backed session store
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append one entry under an exclusive lock
    pub fn append(&mut self, entry: &JournalEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended {} entry for session {}", kind(entry), entry.session_id());
        Ok(())
    }
}

fn kind(entry: &JournalEntry) -> &'static str {
    match entry {
        JournalEntry::Created { .. } => "created",
        JournalEntry::Completed { .. } => "completed",
    }
}

impl SessionStore for Journal {
    fn create_session(&mut self, workout_id: &str) -> Result<SessionId> {
        let session_id = SessionId::new();
        self.append(&JournalEntry::Created {
            session_id,
            workout_id: workout_id.to_string(),
            created_at: Utc::now(),
        })?;
        tracing::info!("Opened session {} for workout {}", session_id, workout_id);
        Ok(session_id)
    }

    fn complete_session(&mut self, session_id: SessionId, summary: &SessionSummary) -> Result<()> {
        self.append(&JournalEntry::Completed {
            session_id,
            summary: summary.clone(),
        })?;
        tracing::info!(
            "Recorded session {} ({}s, {} kcal)",
            session_id,
            summary.duration_seconds,
            summary.calories_burned
        );
        Ok(())
    }
}

/// Read every entry from a journal file
///
/// A missing file reads as empty. Lines that fail to parse are skipped with
/// a warning rather than failing the whole read.
pub fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse journal entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} journal entries", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> SessionSummary {
        SessionSummary {
            workout_id: "full_body".into(),
            duration_seconds: 1200,
            calories_burned: 100,
            notes: "Completed 9 of 9 sets".into(),
            completed_sets: 9,
            total_sets: 9,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_then_complete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sessions").join("journal.jsonl");

        let mut journal = Journal::new(&path);
        let id = journal.create_session("full_body").unwrap();
        journal.complete_session(id, &summary()).unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], JournalEntry::Created { workout_id, .. } if workout_id == "full_body"));
        assert_eq!(entries[1].session_id(), id);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");

        let mut journal = Journal::new(&path);
        journal.create_session("a").unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{ not json").unwrap();
        }
        journal.create_session("b").unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_read_missing_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let entries = read_entries(&temp_dir.path().join("nope.jsonl")).unwrap();
        assert!(entries.is_empty());
    }
}
