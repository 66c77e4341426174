//! Completed-session history read back from the journal.

use crate::journal::{read_entries, JournalEntry};
use crate::{Result, SessionId, SessionSummary};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::path::Path;

/// A session that was opened and finalized
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedSession {
    pub session_id: SessionId,
    pub started_at: Option<DateTime<Utc>>,
    pub summary: SessionSummary,
}

/// Load completed sessions, newest first
///
/// `days` limits the result to sessions completed within the window.
/// Sessions opened but never completed (abandoned, or still running) are
/// left out. A session completed twice keeps its latest summary.
pub fn load_completed_sessions(journal_path: &Path, days: Option<i64>) -> Result<Vec<CompletedSession>> {
    let entries = read_entries(journal_path)?;
    let cutoff = days.map(|d| Utc::now() - Duration::days(d));

    let mut started: HashMap<SessionId, DateTime<Utc>> = HashMap::new();
    let mut completed: HashMap<SessionId, SessionSummary> = HashMap::new();

    for entry in entries {
        match entry {
            JournalEntry::Created {
                session_id,
                created_at,
                ..
            } => {
                started.insert(session_id, created_at);
            }
            JournalEntry::Completed {
                session_id,
                summary,
            } => {
                completed.insert(session_id, summary);
            }
        }
    }

    let mut sessions: Vec<CompletedSession> = completed
        .into_iter()
        .filter(|(_, summary)| cutoff.map_or(true, |c| summary.completed_at >= c))
        .map(|(session_id, summary)| CompletedSession {
            session_id,
            started_at: started.get(&session_id).copied(),
            summary,
        })
        .collect();

    sessions.sort_by(|a, b| b.summary.completed_at.cmp(&a.summary.completed_at));

    tracing::debug!("Loaded {} completed sessions", sessions.len());
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Journal;
    use crate::store::SessionStore;

    fn summary(workout_id: &str, days_ago: i64) -> SessionSummary {
        SessionSummary {
            workout_id: workout_id.into(),
            duration_seconds: 600,
            calories_burned: 50,
            notes: "Completed 3 of 3 sets".into(),
            completed_sets: 3,
            total_sets: 3,
            completed_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_only_completed_sessions_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");
        let mut journal = Journal::new(&path);

        let old = journal.create_session("core_blast").unwrap();
        journal.complete_session(old, &summary("core_blast", 3)).unwrap();
        let _abandoned = journal.create_session("full_body").unwrap();
        let recent = journal.create_session("full_body").unwrap();
        journal.complete_session(recent, &summary("full_body", 0)).unwrap();

        let sessions = load_completed_sessions(&path, None).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, recent);
        assert!(sessions[0].started_at.is_some());
    }

    #[test]
    fn test_day_window() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");
        let mut journal = Journal::new(&path);

        let a = journal.create_session("a").unwrap();
        journal.complete_session(a, &summary("a", 1)).unwrap();
        let b = journal.create_session("b").unwrap();
        journal.complete_session(b, &summary("b", 10)).unwrap();

        let sessions = load_completed_sessions(&path, Some(7)).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].summary.workout_id, "a");
    }
}
