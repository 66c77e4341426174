//! Tick-driven timer unit.
//!
//! One implementation serves both the work/rest countdown and the
//! free-running session clock. Timers never read wall time; the host calls
//! [`TimerUnit::tick`] once per second and reacts to the returned event.

use serde::{Deserialize, Serialize};

/// What a timer is currently doing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Idle,
    CountingDown,
    Paused,
    CountingUp,
}

/// Why the countdown is running
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPurpose {
    None,
    Work,
    Rest,
}

/// Result of a single tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown moved to the given remaining value (or clock moved up to it)
    Tick(u64),
    /// Countdown reached zero and returned to idle
    Expired(TimerPurpose),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerKind {
    Countdown,
    Elapsed,
}

#[derive(Clone, Debug)]
pub struct TimerUnit {
    kind: TimerKind,
    mode: TimerMode,
    seconds: u64,
    purpose: TimerPurpose,
}

impl TimerUnit {
    pub fn countdown() -> Self {
        Self {
            kind: TimerKind::Countdown,
            mode: TimerMode::Idle,
            seconds: 0,
            purpose: TimerPurpose::None,
        }
    }

    /// Count-up clock that never expires
    pub fn elapsed() -> Self {
        Self {
            kind: TimerKind::Elapsed,
            mode: TimerMode::Idle,
            seconds: 0,
            purpose: TimerPurpose::None,
        }
    }

    /// Begin counting.
    ///
    /// For a countdown, `seconds` is the duration and the call is only
    /// meaningful from idle; callers must `reset` first. A zero duration
    /// leaves the timer idle. For the elapsed clock, `seconds` is ignored
    /// and counting resumes from the current value.
    pub fn start(&mut self, seconds: u64, purpose: TimerPurpose) {
        match self.kind {
            TimerKind::Countdown => {
                debug_assert_eq!(self.mode, TimerMode::Idle, "countdown started while busy");
                if seconds == 0 {
                    return;
                }
                self.seconds = seconds;
                self.purpose = purpose;
                self.mode = TimerMode::CountingDown;
            }
            TimerKind::Elapsed => {
                self.mode = TimerMode::CountingUp;
            }
        }
    }

    pub fn pause(&mut self) {
        if self.mode == TimerMode::CountingDown {
            self.mode = TimerMode::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.mode == TimerMode::Paused {
            self.mode = TimerMode::CountingDown;
        }
    }

    /// Force idle with nothing remaining. Always safe.
    ///
    /// On the elapsed clock this only stops counting; the accumulated value
    /// is kept so a summary can still read it.
    pub fn reset(&mut self) {
        self.mode = TimerMode::Idle;
        self.purpose = TimerPurpose::None;
        if self.kind == TimerKind::Countdown {
            self.seconds = 0;
        }
    }

    /// Advance by one second
    pub fn tick(&mut self) -> Option<TimerEvent> {
        match self.mode {
            TimerMode::CountingDown => {
                self.seconds = self.seconds.saturating_sub(1);
                if self.seconds == 0 {
                    let purpose = self.purpose;
                    self.mode = TimerMode::Idle;
                    self.purpose = TimerPurpose::None;
                    Some(TimerEvent::Expired(purpose))
                } else {
                    Some(TimerEvent::Tick(self.seconds))
                }
            }
            TimerMode::CountingUp => {
                self.seconds += 1;
                Some(TimerEvent::Tick(self.seconds))
            }
            TimerMode::Idle | TimerMode::Paused => None,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn purpose(&self) -> TimerPurpose {
        self.purpose
    }

    /// Remaining seconds for a countdown, accumulated seconds for the clock
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Running, or paused with time left
    pub fn has_pending_time(&self) -> bool {
        self.mode != TimerMode::Idle && self.seconds > 0
    }
}

/// Format seconds as "MM:SS", or "H:MM:SS" from one hour up
pub fn format_clock(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
