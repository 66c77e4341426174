//! Tap-versus-hold classification for the timer control.
//!
//! Input-agnostic: hosts translate pointer, touch or key events into
//! `press_start` / `press_end` calls carrying a millisecond timestamp.

/// Classified gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    /// Toggle the countdown (start, pause or resume)
    Tap,
    /// Reset the countdown and drop any pending rest
    Hold,
}

/// Cue the UI can render as haptic or visual feedback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    Pressed,
    HoldArmed,
}

#[derive(Clone, Debug)]
pub struct GestureDisambiguator {
    threshold_ms: u64,
    pressed_at: Option<i64>,
    hold_fired: bool,
}

impl GestureDisambiguator {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            threshold_ms,
            pressed_at: None,
            hold_fired: false,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    pub fn press_start(&mut self, now_ms: i64) -> Feedback {
        self.pressed_at = Some(now_ms);
        self.hold_fired = false;
        Feedback::Pressed
    }

    /// Fire HOLD as soon as the threshold passes while still pressed.
    ///
    /// `resettable` says whether the countdown has anything to reset; a long
    /// press with nothing to reset never becomes a HOLD.
    pub fn poll(&mut self, now_ms: i64, resettable: bool) -> Option<(Gesture, Feedback)> {
        if self.hold_fired || !resettable || !self.threshold_reached(now_ms) {
            return None;
        }
        self.hold_fired = true;
        Some((Gesture::Hold, Feedback::HoldArmed))
    }

    /// Classify the press that is ending.
    ///
    /// Returns `None` for a release without a press, a release after the
    /// HOLD already fired from `poll`, or a long press that had nothing to
    /// reset.
    pub fn press_end(&mut self, now_ms: i64, resettable: bool) -> Option<Gesture> {
        let reached = self.threshold_reached(now_ms);
        let started = self.pressed_at.take();
        let hold_fired = std::mem::take(&mut self.hold_fired);

        if started.is_none() || hold_fired {
            return None;
        }
        if !reached {
            return Some(Gesture::Tap);
        }
        resettable.then_some(Gesture::Hold)
    }

    /// Drop an in-flight press, e.g. when the pointer leaves the control
    pub fn cancel(&mut self) {
        self.pressed_at = None;
        self.hold_fired = false;
    }

    fn threshold_reached(&self, now_ms: i64) -> bool {
        match self.pressed_at {
            Some(start) => now_ms.saturating_sub(start) >= self.threshold_ms as i64,
            None => false,
        }
    }
}

impl Default for GestureDisambiguator {
    fn default() -> Self {
        Self::new(800)
    }
}
