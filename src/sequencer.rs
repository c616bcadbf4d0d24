//! Lookahead step scheduler.
//!
//! Dispatch decisions are batched on a coarse tick, but the time handed to
//! each step callback comes from the audio clock, so audible timing stays
//! sample-accurate even though the decision loop is not. The driver calls
//! [`StepScheduler::tick`] at least every [`LOOKAHEAD`]; every step falling
//! inside [`SCHEDULE_AHEAD`] of `now` is dispatched with its exact time.

use std::time::Duration;

use crate::pattern::PATTERN_STEPS;

/// How far ahead of the clock steps are scheduled, in seconds. Must exceed
/// the tick interval or steps are missed between ticks.
pub const SCHEDULE_AHEAD: f64 = 0.1;

/// The coarse re-arm interval a driving loop should sleep on.
pub const LOOKAHEAD: Duration = Duration::from_millis(25);

/// Small offset applied on start so the first step never lands in the past.
const START_EPSILON: f64 = 0.05;

/// Converts BPM + step position into a timeline of future trigger times.
#[derive(Debug, Clone)]
pub struct StepScheduler {
    bpm: f64,
    playing: bool,
    current_step: usize,
    next_step_time: f64,
}

impl StepScheduler {
    pub fn new(bpm: f64) -> Self {
        StepScheduler {
            bpm: bpm.clamp(40.0, 300.0),
            playing: false,
            current_step: 0,
            next_step_time: 0.0,
        }
    }

    /// Begin playback from step 0. No-op while already playing.
    pub fn start(&mut self, now: f64) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.current_step = 0;
        self.next_step_time = now + START_EPSILON;
    }

    /// Halt playback and reset to step 0. Idempotent. Steps already handed
    /// out keep their scheduled times; no new steps are dispatched.
    pub fn stop(&mut self) {
        self.playing = false;
        self.current_step = 0;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Update the tempo. Takes effect on the next step advance; steps
    /// already dispatched are not rescheduled.
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(40.0, 300.0);
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Seconds per 16th-note step at the current tempo.
    pub fn step_duration(&self) -> f64 {
        60.0 / self.bpm / 4.0
    }

    /// Dispatch every step due within the schedule-ahead window.
    ///
    /// Calls `on_step(step_index, scheduled_time)` for each, in strictly
    /// increasing time order, and returns how many were dispatched.
    pub fn tick(&mut self, now: f64, mut on_step: impl FnMut(usize, f64)) -> usize {
        if !self.playing {
            return 0;
        }
        let mut dispatched = 0;
        while self.next_step_time < now + SCHEDULE_AHEAD {
            on_step(self.current_step, self.next_step_time);
            self.next_step_time += self.step_duration();
            self.current_step = (self.current_step + 1) % PATTERN_STEPS;
            dispatched += 1;
        }
        dispatched
    }
}
