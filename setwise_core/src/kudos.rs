//! Motivational phrases keyed by lifecycle event.

use crate::config::KudosConfig;
use crate::store::KudosFeed;
use crate::{Error, KudosEvent, Result};
use std::cell::Cell;

/// Phrase shown when the feed has nothing to offer
pub fn default_phrase(event: KudosEvent) -> &'static str {
    match event {
        KudosEvent::SessionStarted => "Let's get moving!",
        KudosEvent::SetCompleted => "Set done. Keep it up!",
        KudosEvent::RestStarted => "Breathe. You've earned this rest.",
        KudosEvent::ExerciseCompleted => "Exercise complete!",
        KudosEvent::SessionCompleted => "Workout complete. Great work!",
    }
}

/// Ask the feed, falling back to the fixed default on any failure
pub fn phrase_or_default(feed: &dyn KudosFeed, event: KudosEvent) -> String {
    match feed.get_phrase(event) {
        Ok(phrase) if !phrase.trim().is_empty() => phrase,
        Ok(_) => default_phrase(event).to_string(),
        Err(e) => {
            tracing::debug!("Kudos feed failed for {:?}: {}", event, e);
            default_phrase(event).to_string()
        }
    }
}

/// Config-driven feed that rotates through the configured phrases
pub struct PhraseBook {
    phrases: KudosConfig,
    turn: Cell<usize>,
}

impl PhraseBook {
    pub fn new(phrases: KudosConfig) -> Self {
        Self {
            phrases,
            turn: Cell::new(0),
        }
    }

    fn list(&self, event: KudosEvent) -> &[String] {
        match event {
            KudosEvent::SessionStarted => &self.phrases.session_started,
            KudosEvent::SetCompleted => &self.phrases.set_completed,
            KudosEvent::RestStarted => &self.phrases.rest_started,
            KudosEvent::ExerciseCompleted => &self.phrases.exercise_completed,
            KudosEvent::SessionCompleted => &self.phrases.session_completed,
        }
    }
}

impl KudosFeed for PhraseBook {
    fn get_phrase(&self, event: KudosEvent) -> Result<String> {
        let list = self.list(event);
        if list.is_empty() {
            return Err(Error::Kudos(format!("no phrases configured for {:?}", event)));
        }
        let turn = self.turn.get();
        self.turn.set(turn.wrapping_add(1));
        Ok(list[turn % list.len()].clone())
    }
}
