//! Collaborator contracts the session engine talks through.
//!
//! Implementations live elsewhere: [`crate::journal::Journal`],
//! [`crate::schedule::ScheduleBoard`] and [`crate::kudos::PhraseBook`] are
//! the file-backed ones the CLI uses.

use crate::{KudosEvent, Result, ScheduleStatus, SessionId, SessionSummary};

/// Durable owner of session records
pub trait SessionStore {
    /// Open a session record for a workout and return its id
    fn create_session(&mut self, workout_id: &str) -> Result<SessionId>;

    /// Finalize a session with its summary
    fn complete_session(&mut self, session_id: SessionId, summary: &SessionSummary) -> Result<()>;
}

/// Remote schedule status transitions
pub trait ScheduleApi {
    fn transition(&mut self, schedule_id: &str, status: ScheduleStatus) -> Result<()>;
}

/// Source of short motivational phrases
pub trait KudosFeed {
    fn get_phrase(&self, event: KudosEvent) -> Result<String>;
}

/// Schedule API for sessions not launched from a schedule
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSchedule;

impl ScheduleApi for NoSchedule {
    fn transition(&mut self, schedule_id: &str, status: ScheduleStatus) -> Result<()> {
        tracing::debug!("No schedule backend, dropping {} -> {}", schedule_id, status);
        Ok(())
    }
}
