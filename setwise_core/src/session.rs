//! Session lifecycle controller.
//!
//! [`SessionEngine`] guides one user through one workout. It owns the
//! progression cursor, the completion ledger, a work/rest countdown and the
//! elapsed session clock, and decides on every completion or timer event
//! whether to rest, advance a set, advance an exercise or finish.
//!
//! The engine is runtime-agnostic. The host feeds it one [`SessionEngine::tick`]
//! per second and raw user actions, then drains [`EngineEvent`]s and reads
//! [`SessionEngine::view`] to render.
//!
//! Lifecycle: `Created -> Active -> {Completed, Abandoned}`.

use crate::clock::{Clock, SystemClock};
use crate::config::{KudosConfig, SessionConfig};
use crate::cursor::{Advance, ProgressionCursor};
use crate::gesture::{Feedback, Gesture, GestureDisambiguator};
use crate::kudos::{phrase_or_default, PhraseBook};
use crate::ledger::CompletionLedger;
use crate::schedule::{status_for, LifecycleTransition};
use crate::store::{KudosFeed, NoSchedule, ScheduleApi, SessionStore};
use crate::ticker::TickHandle;
use crate::timer::{format_clock, TimerEvent, TimerMode, TimerPurpose, TimerUnit};
use crate::{
    CompletionStep, Error, KudosEvent, Result, SessionId, SessionSummary, Workout,
};
use chrono::{DateTime, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Active,
    Completed,
    Abandoned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-visible, non-blocking message
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Something the host may want to render or react to
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Started { session_id: Option<SessionId> },
    Feedback(Feedback),
    TimerStarted { purpose: TimerPurpose, seconds: u64 },
    TimerPaused,
    TimerResumed,
    TimerReset,
    CountdownTick(u64),
    TimerExpired(TimerPurpose),
    RestStarted { seconds: u64 },
    SetCompleted { exercise_id: String, set_number: u32 },
    CursorMoved { exercise_index: usize, set_number: u32 },
    Kudos { event: KudosEvent, phrase: String },
    ExitRequested,
    Completed(SessionSummary),
    Saved(SessionId),
    SaveFailed { message: String },
    Abandoned,
    Notice(Notice),
}

/// Tuning knobs for one session
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub hold_threshold_ms: u64,
    pub submit_attempts: u32,
    pub calories_per_minute: f64,
    /// Set when the session was launched from a schedule entry
    pub schedule_id: Option<String>,
}

impl SessionOptions {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            hold_threshold_ms: config.hold_threshold_ms,
            submit_attempts: config.submit_attempts.max(1),
            calories_per_minute: config.calories_per_minute,
            schedule_id: None,
        }
    }

    pub fn with_schedule(mut self, schedule_id: impl Into<String>) -> Self {
        self.schedule_id = Some(schedule_id.into());
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

/// Everything outside the engine that it talks to
pub struct Collaborators {
    pub store: Box<dyn SessionStore>,
    pub schedule: Box<dyn ScheduleApi>,
    pub kudos: Box<dyn KudosFeed>,
    pub clock: Box<dyn Clock>,
}

impl Collaborators {
    /// Store only; no schedule, built-in phrases, system clock
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            schedule: Box::new(NoSchedule),
            kudos: Box::new(PhraseBook::new(KudosConfig::default())),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_schedule(mut self, schedule: impl ScheduleApi + 'static) -> Self {
        self.schedule = Box::new(schedule);
        self
    }

    pub fn with_kudos(mut self, kudos: impl KudosFeed + 'static) -> Self {
        self.kudos = Box::new(kudos);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }
}

/// Derived state for the presentation layer
#[derive(Clone, Debug, PartialEq)]
pub struct SessionView {
    pub state: LifecycleState,
    pub workout_name: String,
    pub exercise_name: String,
    pub exercise_index: usize,
    pub exercise_count: usize,
    pub set_number: u32,
    pub set_count: u32,
    pub set_label: String,
    pub reps_label: Option<String>,
    pub notes: Option<String>,
    pub timer_mode: TimerMode,
    pub timer_purpose: TimerPurpose,
    pub countdown_text: String,
    pub elapsed_text: String,
    pub progress: f64,
    pub resting: bool,
    pub can_complete_set: bool,
    pub can_go_previous: bool,
    pub next_label: &'static str,
    pub exit_pending: bool,
    /// No session record could be opened; saving will be attempted at the end
    pub offline: bool,
}

/// Calories for a workout that carries no figure of its own
pub fn estimate_calories(duration_seconds: u64, calories_per_minute: f64) -> u32 {
    (duration_seconds as f64 / 60.0 * calories_per_minute).round().max(0.0) as u32
}

pub struct SessionEngine {
    workout: Workout,
    options: SessionOptions,
    collab: Collaborators,
    state: LifecycleState,
    session_id: Option<SessionId>,
    cursor: ProgressionCursor,
    ledger: CompletionLedger,
    countdown: TimerUnit,
    elapsed: TimerUnit,
    /// Advance deferred until the running rest expires
    pending: Option<Advance>,
    gesture: GestureDisambiguator,
    set_started_at: DateTime<Utc>,
    exit_requested: bool,
    summary: Option<SessionSummary>,
    unsaved: Option<SessionSummary>,
    tick_source: Option<Box<dyn TickHandle>>,
    disposed: bool,
    events: Vec<EngineEvent>,
}

impl SessionEngine {
    /// Build an engine in the `Created` state
    pub fn new(workout: Workout, options: SessionOptions, collab: Collaborators) -> Result<Self> {
        let errors = workout.validate();
        if !errors.is_empty() {
            return Err(Error::Workout(errors.join("; ")));
        }

        let now = collab.clock.now();
        Ok(Self {
            ledger: CompletionLedger::new(workout.total_sets()),
            gesture: GestureDisambiguator::new(options.hold_threshold_ms),
            workout,
            options,
            collab,
            state: LifecycleState::Created,
            session_id: None,
            cursor: ProgressionCursor::new(),
            countdown: TimerUnit::countdown(),
            elapsed: TimerUnit::elapsed(),
            pending: None,
            set_started_at: now,
            exit_requested: false,
            summary: None,
            unsaved: None,
            tick_source: None,
            disposed: false,
            events: Vec::new(),
        })
    }

    /// Build and start in one step
    pub fn create(workout: Workout, options: SessionOptions, collab: Collaborators) -> Result<Self> {
        let mut engine = Self::new(workout, options, collab)?;
        engine.start();
        Ok(engine)
    }

    /// `Created -> Active`. Runs once; later calls do nothing.
    ///
    /// If the store cannot open a session record, the session still runs
    /// locally and the user is told their result may not be saved.
    pub fn start(&mut self) {
        if self.state != LifecycleState::Created || self.disposed {
            return;
        }

        match self.collab.store.create_session(&self.workout.id) {
            Ok(id) => self.session_id = Some(id),
            Err(e) => {
                tracing::warn!("Could not open session record, running offline: {}", e);
                self.notify(
                    NoticeLevel::Warning,
                    format!("Couldn't reach the session store ({}). Your progress is tracked locally.", e),
                );
            }
        }

        self.state = LifecycleState::Active;
        self.set_started_at = self.collab.clock.now();
        self.elapsed.start(0, TimerPurpose::None);
        tracing::info!(
            "Session started for workout {} ({} exercises, {} sets)",
            self.workout.id,
            self.workout.exercises.len(),
            self.ledger.total_sets()
        );

        self.events.push(EngineEvent::Started {
            session_id: self.session_id,
        });
        self.kudos(KudosEvent::SessionStarted);
        self.request_schedule(LifecycleTransition::Started);
    }

    /// Hand the engine the host's tick source so teardown can stop it
    pub fn attach_tick_source(&mut self, handle: Box<dyn TickHandle>) {
        if let Some(mut old) = self.tick_source.replace(handle) {
            old.cancel();
        }
        if !self.is_active() {
            self.release_tick_source();
        }
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Advance both timers by one second
    pub fn tick(&mut self) {
        if !self.is_active() {
            return;
        }

        self.elapsed.tick();
        match self.countdown.tick() {
            Some(TimerEvent::Tick(remaining)) => {
                self.events.push(EngineEvent::CountdownTick(remaining));
            }
            Some(TimerEvent::Expired(purpose)) => self.on_expired(purpose),
            None => {}
        }

        self.poll_gesture();
    }

    fn on_expired(&mut self, purpose: TimerPurpose) {
        tracing::debug!("{:?} timer expired", purpose);
        self.events.push(EngineEvent::TimerExpired(purpose));
        match purpose {
            TimerPurpose::Rest => {
                if let Some(advance) = self.pending.take() {
                    self.apply_advance(advance);
                }
            }
            TimerPurpose::Work => self.complete_current_set(),
            TimerPurpose::None => {}
        }
    }

    // ------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------

    pub fn press_start(&mut self) {
        if !self.is_active() {
            return;
        }
        let feedback = self.gesture.press_start(self.collab.clock.now_ms());
        self.events.push(EngineEvent::Feedback(feedback));
    }

    pub fn press_end(&mut self) {
        if !self.is_active() {
            return;
        }
        let resettable = self.countdown_resettable();
        if let Some(gesture) = self.gesture.press_end(self.collab.clock.now_ms(), resettable) {
            self.handle_gesture(gesture);
        }
    }

    /// Let a held press turn into HOLD before it is released
    pub fn poll_gesture(&mut self) {
        if !self.is_active() || !self.gesture.is_pressed() {
            return;
        }
        let resettable = self.countdown_resettable();
        if let Some((gesture, feedback)) = self.gesture.poll(self.collab.clock.now_ms(), resettable)
        {
            self.events.push(EngineEvent::Feedback(feedback));
            self.handle_gesture(gesture);
        }
    }

    /// Dispatch an already classified gesture
    pub fn handle_gesture(&mut self, gesture: Gesture) {
        if !self.is_active() {
            return;
        }

        match gesture {
            Gesture::Tap => match self.countdown.mode() {
                TimerMode::Idle => {
                    let work = self
                        .cursor
                        .current(&self.workout)
                        .and_then(|e| e.timing.work_seconds());
                    if let Some(seconds) = work {
                        self.countdown.start(seconds as u64, TimerPurpose::Work);
                        self.events.push(EngineEvent::TimerStarted {
                            purpose: TimerPurpose::Work,
                            seconds: seconds as u64,
                        });
                    }
                }
                TimerMode::CountingDown => {
                    self.countdown.pause();
                    self.events.push(EngineEvent::TimerPaused);
                }
                TimerMode::Paused => {
                    self.countdown.resume();
                    self.events.push(EngineEvent::TimerResumed);
                }
                TimerMode::CountingUp => {}
            },
            Gesture::Hold => {
                self.countdown.reset();
                if self.pending.take().is_some() {
                    tracing::debug!("Rest cancelled by hold");
                }
                self.events.push(EngineEvent::TimerReset);
            }
        }
    }

    fn countdown_resettable(&self) -> bool {
        self.countdown.has_pending_time() || self.pending.is_some()
    }

    // ------------------------------------------------------------------
    // Progression
    // ------------------------------------------------------------------

    /// Record the set under the cursor and move on.
    ///
    /// Re-completing an already recorded set does nothing, including while
    /// resting after it.
    pub fn complete_current_set(&mut self) {
        if !self.is_active() {
            return;
        }
        let Some(exercise) = self.cursor.current(&self.workout) else {
            return;
        };
        let exercise_id = exercise.exercise_id.clone();
        let rest = exercise.rest_seconds;
        let set_number = self.cursor.set_number();

        let recorded = self.ledger.record(CompletionStep {
            exercise_index: self.cursor.exercise_index(),
            exercise_id: exercise_id.clone(),
            set_number,
            started_at: self.set_started_at,
            completed_at: self.collab.clock.now(),
        });
        if !recorded {
            return;
        }

        tracing::debug!(
            "Completed set {} of {} ({:.0}% done)",
            set_number,
            exercise_id,
            self.ledger.progress() * 100.0
        );
        self.events.push(EngineEvent::SetCompleted {
            exercise_id,
            set_number,
        });

        // With a rest configured the advance waits for the rest to expire,
        // including the finish after the final set.
        let advance = self.cursor.next_step(&self.workout);
        self.countdown.reset();
        match rest {
            Some(seconds) => {
                self.pending = Some(advance);
                self.countdown.start(seconds as u64, TimerPurpose::Rest);
                self.events.push(EngineEvent::RestStarted {
                    seconds: seconds as u64,
                });
                self.kudos(KudosEvent::RestStarted);
            }
            None => {
                match advance {
                    Advance::NextExercise => self.kudos(KudosEvent::ExerciseCompleted),
                    Advance::NextSet => self.kudos(KudosEvent::SetCompleted),
                    Advance::Finish => {}
                }
                self.apply_advance(advance);
            }
        }
    }

    /// Move to the next exercise, or finish the session on the last one
    pub fn advance_exercise(&mut self) {
        if !self.is_active() {
            return;
        }
        if self.cursor.next_exercise(&self.workout) {
            self.after_cursor_move();
        } else {
            self.complete();
        }
    }

    /// Step back one exercise. Completed sets stay recorded.
    pub fn go_to_previous_exercise(&mut self) {
        if !self.is_active() {
            return;
        }
        if self.cursor.previous_exercise() {
            self.after_cursor_move();
        }
    }

    fn apply_advance(&mut self, advance: Advance) {
        match advance {
            Advance::NextSet => {
                self.cursor.next_set(&self.workout);
                self.after_cursor_move();
            }
            Advance::NextExercise => self.advance_exercise(),
            Advance::Finish => self.complete(),
        }
    }

    fn after_cursor_move(&mut self) {
        self.countdown.reset();
        self.pending = None;
        self.set_started_at = self.collab.clock.now();
        tracing::debug!(
            "Cursor at exercise {} set {}",
            self.cursor.exercise_index() + 1,
            self.cursor.set_number()
        );
        self.events.push(EngineEvent::CursorMoved {
            exercise_index: self.cursor.exercise_index(),
            set_number: self.cursor.set_number(),
        });
    }

    // ------------------------------------------------------------------
    // Terminal transitions
    // ------------------------------------------------------------------

    /// `Active -> Completed`: stop both timers, snapshot, submit
    fn complete(&mut self) {
        self.stop_timers();

        let duration_seconds = self.elapsed.seconds();
        let calories_burned = self.workout.calories_burn.unwrap_or_else(|| {
            estimate_calories(duration_seconds, self.options.calories_per_minute)
        });
        let summary = SessionSummary {
            workout_id: self.workout.id.clone(),
            duration_seconds,
            calories_burned,
            notes: format!(
                "Completed {} of {} sets",
                self.ledger.len(),
                self.ledger.total_sets()
            ),
            completed_sets: self.ledger.len() as u32,
            total_sets: self.ledger.total_sets(),
            completed_at: self.collab.clock.now(),
        };

        self.state = LifecycleState::Completed;
        self.exit_requested = false;
        tracing::info!(
            "Session complete: {} in {}",
            summary.notes,
            format_clock(duration_seconds)
        );

        self.summary = Some(summary.clone());
        self.unsaved = Some(summary.clone());
        self.events.push(EngineEvent::Completed(summary));
        self.kudos(KudosEvent::SessionCompleted);
        self.request_schedule(LifecycleTransition::Completed);
        self.submit_summary();
        self.release_tick_source();
    }

    /// Ask for confirmation before abandoning
    pub fn request_exit(&mut self) {
        if !self.is_active() {
            return;
        }
        self.exit_requested = true;
        self.events.push(EngineEvent::ExitRequested);
    }

    pub fn cancel_exit(&mut self) {
        self.exit_requested = false;
    }

    /// `Active -> Abandoned`, only after [`Self::request_exit`]
    pub fn confirm_exit(&mut self) {
        if !self.is_active() || !self.exit_requested {
            return;
        }

        self.stop_timers();
        self.state = LifecycleState::Abandoned;
        self.exit_requested = false;
        tracing::info!(
            "Session abandoned after {} of {} sets",
            self.ledger.len(),
            self.ledger.total_sets()
        );

        self.events.push(EngineEvent::Abandoned);
        self.request_schedule(LifecycleTransition::Abandoned);
        self.release_tick_source();
    }

    /// Try again to persist a completed session that failed to save.
    ///
    /// Returns true once nothing is left unsaved.
    pub fn retry_save(&mut self) -> bool {
        if self.state != LifecycleState::Completed {
            return false;
        }
        self.submit_summary()
    }

    fn submit_summary(&mut self) -> bool {
        let Some(summary) = self.unsaved.clone() else {
            return true;
        };

        let session_id = match self.session_id {
            Some(id) => id,
            None => match self.collab.store.create_session(&self.workout.id) {
                Ok(id) => {
                    self.session_id = Some(id);
                    id
                }
                Err(e) => {
                    tracing::error!("Cannot save session, no session record: {}", e);
                    self.report_save_failure(&e);
                    return false;
                }
            },
        };

        let mut last_error = None;
        for attempt in 1..=self.options.submit_attempts.max(1) {
            match self.collab.store.complete_session(session_id, &summary) {
                Ok(()) => {
                    self.unsaved = None;
                    self.events.push(EngineEvent::Saved(session_id));
                    return true;
                }
                Err(e) => {
                    tracing::warn!("Saving session {} failed (attempt {}): {}", session_id, attempt, e);
                    last_error = Some(e);
                }
            }
        }

        if let Some(e) = last_error {
            tracing::error!("Giving up saving session {} for now: {}", session_id, e);
            self.report_save_failure(&e);
        }
        false
    }

    fn report_save_failure(&mut self, error: &Error) {
        self.events.push(EngineEvent::SaveFailed {
            message: error.to_string(),
        });
        self.notify(
            NoticeLevel::Error,
            "Couldn't save your workout. Retry?".to_string(),
        );
    }

    /// Tear down: stop both timers and release the tick source.
    ///
    /// Safe to call repeatedly; also runs on drop.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop_timers();
        self.release_tick_source();
        self.disposed = true;

        if self.state == LifecycleState::Active {
            tracing::info!("Session disposed while active; nothing was saved");
        }
        if self.unsaved.is_some() {
            tracing::error!("Session disposed with an unsaved summary for {}", self.workout.id);
        }
    }

    fn stop_timers(&mut self) {
        self.countdown.reset();
        self.elapsed.reset();
        self.pending = None;
        self.gesture.cancel();
    }

    fn release_tick_source(&mut self) {
        if let Some(mut handle) = self.tick_source.take() {
            handle.cancel();
            tracing::debug!("Tick source released");
        }
    }

    // ------------------------------------------------------------------
    // Collaborator glue
    // ------------------------------------------------------------------

    fn request_schedule(&mut self, transition: LifecycleTransition) {
        let Some(schedule_id) = self.options.schedule_id.clone() else {
            return;
        };
        let status = status_for(transition);
        if let Err(e) = self.collab.schedule.transition(&schedule_id, status) {
            tracing::warn!("Schedule {} -> {} failed: {}", schedule_id, status, e);
            self.notify(
                NoticeLevel::Warning,
                format!("Couldn't update your schedule: {}", e),
            );
        }
    }

    fn kudos(&mut self, event: KudosEvent) {
        let phrase = phrase_or_default(self.collab.kudos.as_ref(), event);
        self.events.push(EngineEvent::Kudos { event, phrase });
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.events.push(EngineEvent::Notice(Notice { level, message }));
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active && !self.disposed
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn cursor(&self) -> ProgressionCursor {
        self.cursor
    }

    pub fn ledger(&self) -> &CompletionLedger {
        &self.ledger
    }

    pub fn countdown(&self) -> &TimerUnit {
        &self.countdown
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.seconds()
    }

    pub fn is_resting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn exit_pending(&self) -> bool {
        self.exit_requested
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn unsaved_summary(&self) -> Option<&SessionSummary> {
        self.unsaved.as_ref()
    }

    pub fn view(&self) -> SessionView {
        let exercise = self.cursor.current(&self.workout);
        let set_count = exercise.map(|e| e.sets).unwrap_or(1);
        let set_number = self.cursor.set_number();
        let already_done = exercise.is_none()
            || self
                .ledger
                .contains(self.cursor.exercise_index(), set_number);

        SessionView {
            state: self.state,
            workout_name: self.workout.name.clone(),
            exercise_name: exercise.map(|e| e.name.clone()).unwrap_or_default(),
            exercise_index: self.cursor.exercise_index(),
            exercise_count: self.workout.exercises.len(),
            set_number,
            set_count,
            set_label: format!("Set {} of {}", set_number, set_count),
            reps_label: exercise
                .and_then(|e| e.timing.reps())
                .map(|r| format!("{} reps", r)),
            notes: exercise.and_then(|e| e.notes.clone()),
            timer_mode: self.countdown.mode(),
            timer_purpose: self.countdown.purpose(),
            countdown_text: format_clock(self.countdown.seconds()),
            elapsed_text: format_clock(self.elapsed.seconds()),
            progress: self.ledger.progress(),
            resting: self.is_resting(),
            can_complete_set: self.is_active() && !already_done,
            can_go_previous: self.is_active() && self.cursor.can_go_back(),
            next_label: if self.cursor.is_last_exercise(&self.workout) {
                "Finish workout"
            } else {
                "Next exercise"
            },
            exit_pending: self.exit_requested,
            offline: self.session_id.is_none(),
        }
    }
}

impl Drop for SessionEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
