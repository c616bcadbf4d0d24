//! Session state — channels, patterns, solo set, active synth.
//!
//! One `Session` is created at startup and owned by the engine for the
//! process lifetime. All edits (step toggles, solo changes) go through it.

use std::collections::HashSet;

use crate::drums::DrumKind;
use crate::pattern::{DrumPattern, MelodicPattern, Note};
use crate::synth::SynthType;

/// The six percussive channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrumChannelId {
    Kick,
    Clap,
    Snare,
    Hat,
    Perc,
    Bass,
}

impl DrumChannelId {
    pub const ALL: [DrumChannelId; 6] = [
        DrumChannelId::Kick,
        DrumChannelId::Clap,
        DrumChannelId::Snare,
        DrumChannelId::Hat,
        DrumChannelId::Perc,
        DrumChannelId::Bass,
    ];

    /// Synthesis recipe for this channel. Bass reuses the kick recipe
    /// (tuned per channel via its own params); Perc uses the generic sweep.
    pub fn kind(self) -> DrumKind {
        match self {
            DrumChannelId::Kick | DrumChannelId::Bass => DrumKind::Kick,
            DrumChannelId::Clap => DrumKind::Clap,
            DrumChannelId::Snare => DrumKind::Snare,
            DrumChannelId::Hat => DrumKind::Hat,
            DrumChannelId::Perc => DrumKind::Generic,
        }
    }

    /// Stable id used in the persisted records.
    pub fn id_str(self) -> &'static str {
        match self {
            DrumChannelId::Kick => "kick",
            DrumChannelId::Clap => "clap",
            DrumChannelId::Snare => "snare",
            DrumChannelId::Hat => "hat",
            DrumChannelId::Perc => "perc",
            DrumChannelId::Bass => "bass",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&c| c == self).unwrap_or(0)
    }
}

/// The five melodic synth channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynthChannelId {
    Rhodes,
    Piano,
    Organ,
    Pad,
    Lead,
}

impl SynthChannelId {
    pub const ALL: [SynthChannelId; 5] = [
        SynthChannelId::Rhodes,
        SynthChannelId::Piano,
        SynthChannelId::Organ,
        SynthChannelId::Pad,
        SynthChannelId::Lead,
    ];

    pub fn synth_type(self) -> SynthType {
        match self {
            SynthChannelId::Rhodes => SynthType::Rhodes,
            SynthChannelId::Piano => SynthType::Piano,
            SynthChannelId::Organ => SynthType::Organ,
            SynthChannelId::Pad => SynthType::Pad,
            SynthChannelId::Lead => SynthType::Lead,
        }
    }

    /// Stable id used in the persisted records.
    pub fn id_str(self) -> &'static str {
        match self {
            SynthChannelId::Rhodes => "rhodes",
            SynthChannelId::Piano => "piano",
            SynthChannelId::Organ => "organ",
            SynthChannelId::Pad => "pad",
            SynthChannelId::Lead => "lead",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&c| c == self).unwrap_or(0)
    }
}

/// Any channel, for the solo set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Drum(DrumChannelId),
    Synth(SynthChannelId),
}

/// Global mutable session state: patterns, tempo, solos, synth selection.
#[derive(Debug, Clone)]
pub struct Session {
    bpm: f64,
    drum_patterns: [DrumPattern; 6],
    melodic_patterns: [MelodicPattern; 5],
    solos: HashSet<ChannelId>,
    active_synth: SynthChannelId,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            bpm: 120.0,
            drum_patterns: Default::default(),
            melodic_patterns: Default::default(),
            solos: HashSet::new(),
            active_synth: SynthChannelId::Rhodes,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(40.0, 300.0);
    }

    pub fn active_synth(&self) -> SynthChannelId {
        self.active_synth
    }

    pub fn set_active_synth(&mut self, ch: SynthChannelId) {
        self.active_synth = ch;
    }

    pub fn drum_pattern(&self, ch: DrumChannelId) -> &DrumPattern {
        &self.drum_patterns[ch.index()]
    }

    pub fn drum_pattern_mut(&mut self, ch: DrumChannelId) -> &mut DrumPattern {
        &mut self.drum_patterns[ch.index()]
    }

    pub fn melodic_pattern(&self, ch: SynthChannelId) -> &MelodicPattern {
        &self.melodic_patterns[ch.index()]
    }

    pub fn melodic_pattern_mut(&mut self, ch: SynthChannelId) -> &mut MelodicPattern {
        &mut self.melodic_patterns[ch.index()]
    }

    /// Toggle a drum hit.
    pub fn toggle_drum_step(&mut self, ch: DrumChannelId, step: usize) {
        self.drum_pattern_mut(ch).toggle(step);
    }

    /// Place a note on a melodic step.
    pub fn set_melodic_step(&mut self, ch: SynthChannelId, step: usize, note: Note) {
        self.melodic_pattern_mut(ch).set(step, note);
    }

    /// Remove the note from a melodic step.
    pub fn clear_melodic_step(&mut self, ch: SynthChannelId, step: usize) {
        self.melodic_pattern_mut(ch).clear(step);
    }

    /// Cycle a note's duration: 1 → 2 → … → 8 → 1.
    pub fn cycle_melodic_duration(&mut self, ch: SynthChannelId, step: usize) {
        self.melodic_pattern_mut(ch).cycle_duration(step);
    }

    /// Add or remove a channel from the solo set.
    pub fn toggle_solo(&mut self, ch: ChannelId) {
        if !self.solos.remove(&ch) {
            self.solos.insert(ch);
        }
    }

    pub fn solos(&self) -> &HashSet<ChannelId> {
        &self.solos
    }

    /// Solo semantics: an empty solo set means every channel is audible;
    /// otherwise only members of the set sound.
    pub fn audible(&self, ch: ChannelId) -> bool {
        self.solos.is_empty() || self.solos.contains(&ch)
    }
}
