//! Pattern model — 32-step drum and melodic grids.
//!
//! A drum step is a plain hit flag. A melodic step optionally starts a
//! [`Note`] that sustains through the following `duration - 1` steps.

use serde::{Deserialize, Serialize};

/// Steps per pattern cycle (two bars of 16th notes).
pub const PATTERN_STEPS: usize = 32;

/// Longest note duration in step units.
pub const MAX_DURATION: u8 = 8;

/// One of the 12 semitone names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    #[serde(rename = "C#")]
    Cs,
    D,
    #[serde(rename = "D#")]
    Ds,
    E,
    F,
    #[serde(rename = "F#")]
    Fs,
    G,
    #[serde(rename = "G#")]
    Gs,
    A,
    #[serde(rename = "A#")]
    As,
    B,
}

impl PitchClass {
    /// Semitone offset from C (0..=11).
    pub fn semitone(self) -> i32 {
        match self {
            PitchClass::C => 0,
            PitchClass::Cs => 1,
            PitchClass::D => 2,
            PitchClass::Ds => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::Fs => 6,
            PitchClass::G => 7,
            PitchClass::Gs => 8,
            PitchClass::A => 9,
            PitchClass::As => 10,
            PitchClass::B => 11,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

/// A note placed on a melodic step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Semitone name, serialized as `"note"` to match the stored form.
    #[serde(rename = "note")]
    pub pitch_class: PitchClass,
    pub octave: i8,
    /// Sustain length in step units (1..=8).
    pub duration: u8,
}

impl Note {
    pub fn new(pitch_class: PitchClass, octave: i8, duration: u8) -> Self {
        Note {
            pitch_class,
            octave,
            duration: duration.clamp(1, MAX_DURATION),
        }
    }

    /// Frequency of this note in Hz (equal temperament, A4 = 440 Hz).
    pub fn frequency(&self) -> f64 {
        note_frequency(self.pitch_class, self.octave)
    }
}

/// Equal-temperament frequency for a pitch class + octave.
///
/// `440 · 2^(((octave − 4)·12 + semitone − 9) / 12)`; C4 ≈ 261.63 Hz.
pub fn note_frequency(pitch_class: PitchClass, octave: i8) -> f64 {
    let semitones = (octave as f64 - 4.0) * 12.0 + pitch_class.semitone() as f64 - 9.0;
    440.0 * (2.0_f64).powf(semitones / 12.0)
}

/// Classification of a melodic step for rendering and editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// A note starts on this step.
    Onset,
    /// An earlier note's duration covers this step.
    Sustained,
    Empty,
}

/// A 32-step drum row: hit or no hit per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumPattern {
    steps: [bool; PATTERN_STEPS],
}

impl Default for DrumPattern {
    fn default() -> Self {
        DrumPattern {
            steps: [false; PATTERN_STEPS],
        }
    }
}

impl DrumPattern {
    pub fn get(&self, step: usize) -> bool {
        self.steps.get(step).copied().unwrap_or(false)
    }

    pub fn set(&mut self, step: usize, hit: bool) {
        if let Some(s) = self.steps.get_mut(step) {
            *s = hit;
        }
    }

    /// Flip a step between hit and no-hit.
    pub fn toggle(&mut self, step: usize) {
        if let Some(s) = self.steps.get_mut(step) {
            *s = !*s;
        }
    }

    pub fn clear(&mut self) {
        self.steps = [false; PATTERN_STEPS];
    }

    /// Hit flags as 0/1 for the persisted form.
    pub fn to_flags(&self) -> Vec<u8> {
        self.steps.iter().map(|&s| s as u8).collect()
    }

    pub fn from_flags(flags: &[u8]) -> Option<Self> {
        if flags.len() != PATTERN_STEPS {
            return None;
        }
        let mut p = DrumPattern::default();
        for (i, &f) in flags.iter().enumerate() {
            p.steps[i] = f != 0;
        }
        Some(p)
    }
}

/// A 32-step melodic row: each step optionally starts a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodicPattern {
    steps: [Option<Note>; PATTERN_STEPS],
}

impl Default for MelodicPattern {
    fn default() -> Self {
        MelodicPattern {
            steps: [None; PATTERN_STEPS],
        }
    }
}

impl MelodicPattern {
    pub fn get(&self, step: usize) -> Option<Note> {
        self.steps.get(step).copied().flatten()
    }

    pub fn set(&mut self, step: usize, note: Note) {
        if let Some(s) = self.steps.get_mut(step) {
            *s = Some(note);
        }
    }

    pub fn clear(&mut self, step: usize) {
        if let Some(s) = self.steps.get_mut(step) {
            *s = None;
        }
    }

    /// Advance the note duration on a step: 1 → 2 → … → 8 → 1.
    /// No-op when the step holds no note.
    pub fn cycle_duration(&mut self, step: usize) {
        if let Some(Some(note)) = self.steps.get_mut(step) {
            note.duration = note.duration % MAX_DURATION + 1;
        }
    }

    /// Classify a step as onset, sustained-through, or empty.
    ///
    /// A step is sustained when some note within the previous
    /// `MAX_DURATION - 1` steps reaches past it. The scan does not wrap
    /// around the pattern end.
    pub fn step_state(&self, step: usize) -> StepState {
        if step >= PATTERN_STEPS {
            return StepState::Empty;
        }
        if self.steps[step].is_some() {
            return StepState::Onset;
        }
        let scan_from = step.saturating_sub(MAX_DURATION as usize - 1);
        for prev in scan_from..step {
            if let Some(note) = self.steps[prev] {
                if prev + note.duration as usize > step {
                    return StepState::Sustained;
                }
            }
        }
        StepState::Empty
    }

    pub fn to_row(&self) -> Vec<Option<Note>> {
        self.steps.to_vec()
    }

    pub fn from_row(row: &[Option<Note>]) -> Option<Self> {
        if row.len() != PATTERN_STEPS {
            return None;
        }
        let mut p = MelodicPattern::default();
        for (i, note) in row.iter().enumerate() {
            p.steps[i] = note.map(|n| Note::new(n.pitch_class, n.octave, n.duration));
        }
        Some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        let f = note_frequency(PitchClass::A, 4);
        assert!((f - 440.0).abs() < 0.01, "A4 should be 440Hz, got {f}");
    }

    #[test]
    fn c4_is_middle_c() {
        let f = note_frequency(PitchClass::C, 4);
        assert!((f - 261.63).abs() < 0.01, "C4 should be ~261.63Hz, got {f}");
    }

    #[test]
    fn octave_doubles_frequency() {
        let f3 = note_frequency(PitchClass::E, 3);
        let f4 = note_frequency(PitchClass::E, 4);
        assert!((f4 - 2.0 * f3).abs() < 1e-9);
    }

    #[test]
    fn drum_toggle_round_trip() {
        let mut p = DrumPattern::default();
        assert!(!p.get(5));
        p.toggle(5);
        assert!(p.get(5));
        p.toggle(5);
        assert!(!p.get(5));
    }

    #[test]
    fn drum_out_of_range_ignored() {
        let mut p = DrumPattern::default();
        p.toggle(99);
        assert!(!p.get(99));
    }

    #[test]
    fn duration_cycle_visits_all_values() {
        let mut p = MelodicPattern::default();
        p.set(0, Note::new(PitchClass::C, 4, 1));

        let mut seen = Vec::new();
        for _ in 0..9 {
            seen.push(p.get(0).unwrap().duration);
            p.cycle_duration(0);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7, 8, 1]);
    }

    #[test]
    fn duration_cycle_on_empty_step_is_noop() {
        let mut p = MelodicPattern::default();
        p.cycle_duration(3);
        assert_eq!(p.get(3), None);
    }

    #[test]
    fn sustain_classification() {
        let mut p = MelodicPattern::default();
        p.set(4, Note::new(PitchClass::G, 3, 4));

        assert_eq!(p.step_state(4), StepState::Onset);
        assert_eq!(p.step_state(5), StepState::Sustained);
        assert_eq!(p.step_state(6), StepState::Sustained);
        assert_eq!(p.step_state(7), StepState::Sustained);
        assert_eq!(p.step_state(8), StepState::Empty);
        assert_eq!(p.step_state(3), StepState::Empty);
    }

    #[test]
    fn onset_shadows_sustain() {
        let mut p = MelodicPattern::default();
        p.set(0, Note::new(PitchClass::C, 4, 8));
        p.set(3, Note::new(PitchClass::E, 4, 1));
        assert_eq!(p.step_state(3), StepState::Onset);
    }

    #[test]
    fn duration_one_does_not_sustain() {
        let mut p = MelodicPattern::default();
        p.set(10, Note::new(PitchClass::D, 2, 1));
        assert_eq!(p.step_state(11), StepState::Empty);
    }

    #[test]
    fn note_duration_clamped() {
        let n = Note::new(PitchClass::C, 4, 20);
        assert_eq!(n.duration, MAX_DURATION);
        let n = Note::new(PitchClass::C, 4, 0);
        assert_eq!(n.duration, 1);
    }
}
