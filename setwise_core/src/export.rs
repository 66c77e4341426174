//! CSV export of completed sessions.
//!
//! The file is written to a temp file in the target directory, synced, then
//! renamed over the destination so a reader never sees a half-written CSV.

use crate::history::CompletedSession;
use crate::{Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    session_id: String,
    workout_id: String,
    started_at: Option<String>,
    completed_at: String,
    duration_seconds: u64,
    calories_burned: u32,
    completed_sets: u32,
    total_sets: u32,
    notes: String,
}

impl From<&CompletedSession> for CsvRow {
    fn from(session: &CompletedSession) -> Self {
        CsvRow {
            session_id: session.session_id.to_string(),
            workout_id: session.summary.workout_id.clone(),
            started_at: session.started_at.map(|t| t.to_rfc3339()),
            completed_at: session.summary.completed_at.to_rfc3339(),
            duration_seconds: session.summary.duration_seconds,
            calories_burned: session.summary.calories_burned,
            completed_sets: session.summary.completed_sets,
            total_sets: session.summary.total_sets,
            notes: session.summary.notes.clone(),
        }
    }
}

/// Write sessions to `csv_path`, replacing any previous export
///
/// Returns the number of rows written.
pub fn export_csv(sessions: &[CompletedSession], csv_path: &Path) -> Result<usize> {
    let parent = match csv_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(temp.as_file());
        for session in sessions {
            writer.serialize(CsvRow::from(session))?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} sessions to {:?}", sessions.len(), csv_path);
    Ok(sessions.len())
}
