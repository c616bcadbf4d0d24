//! Melodic synth — a polyphonic subtractive voice bank. Notes are keyed by
//! slotmap handles so a release always targets the exact voice its attack
//! created, even across voice reclamation.

use slotmap::SlotMap;

use crate::dsp::filter::{BiquadFilter, FilterType};
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::dsp::param::{Automated, Smoothed};

slotmap::new_key_type! {
    /// Handle to a sounding voice. The default (null) key is returned when
    /// the voice pool is full; releasing it is a no-op.
    pub struct VoiceId;
}

/// The five instrument presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthType {
    Rhodes,
    Piano,
    Organ,
    Pad,
    Lead,
}

impl SynthType {
    fn waveform(self) -> Waveform {
        match self {
            SynthType::Rhodes => Waveform::Sine,
            SynthType::Piano => Waveform::Triangle,
            SynthType::Organ => Waveform::Square,
            SynthType::Pad => Waveform::Sawtooth,
            SynthType::Lead => Waveform::Sawtooth,
        }
    }
}

/// Tweakable envelope and tone parameters. One default set shared by every
/// preset; the preset controls only the waveform of subsequent attacks.
#[derive(Debug, Clone, Copy)]
pub struct SynthParams {
    /// Lowpass cutoff, Hz.
    pub cutoff: f64,
    /// Voice filter Q.
    pub resonance: f64,
    /// Attack time, seconds.
    pub attack: f64,
    /// Decay time, seconds. Held for external tunability; the onset shape
    /// is governed by attack alone.
    pub decay: f64,
    /// Held-note gain level.
    pub sustain: f64,
    /// Release time, seconds.
    pub release: f64,
}

impl Default for SynthParams {
    fn default() -> Self {
        SynthParams {
            cutoff: 2000.0,
            resonance: 0.0,
            attack: 0.01,
            decay: 0.5,
            sustain: 0.5,
            release: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthParam {
    Cutoff,
    Resonance,
    Attack,
    Decay,
    Sustain,
    Release,
    Volume,
}

impl SynthParam {
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "cutoff" => Some(SynthParam::Cutoff),
            "resonance" => Some(SynthParam::Resonance),
            "attack" => Some(SynthParam::Attack),
            "decay" => Some(SynthParam::Decay),
            "sustain" => Some(SynthParam::Sustain),
            "release" => Some(SynthParam::Release),
            "volume" => Some(SynthParam::Volume),
            _ => None,
        }
    }
}

/// Default per-synth output gain.
const DEFAULT_VOLUME: f64 = 0.5;
/// Shortest meaningful attack, seconds.
const MIN_ATTACK: f64 = 0.002;
/// Shortest meaningful release, seconds.
const MIN_RELEASE: f64 = 0.01;
/// A released voice lingers this long after its oscillator stops so the
/// envelope tail can ring out.
const CLEANUP_PAD: f64 = 0.1;
/// Filter glide time constant, seconds.
const CUTOFF_TAU: f64 = 0.02;
/// Hard cap on simultaneous voices.
pub const MAX_VOICES: usize = 64;

#[derive(Debug, Clone)]
struct Voice {
    osc: Oscillator,
    filter: BiquadFilter,
    cutoff: Smoothed,
    amp: Automated,
    start: f64,
    /// Oscillator stop time, set at release.
    stop: Option<f64>,
    /// Disposal time, set at release.
    end: Option<f64>,
}

impl Voice {
    fn is_finished(&self, t: f64) -> bool {
        matches!(self.end, Some(end) if t >= end)
    }

    fn next_sample(&mut self, t: f64) -> f64 {
        if t < self.start {
            return 0.0;
        }
        if let Some(stop) = self.stop {
            if t >= stop {
                return 0.0;
            }
        }

        let cutoff = self.cutoff.tick();
        if (cutoff - self.filter.frequency).abs() > 1.0 {
            self.filter.set_frequency(cutoff);
        }
        self.filter.process(self.osc.next_sample()) * self.amp.tick(t)
    }
}

/// A bank of voices sharing one instrument preset and output gain.
#[derive(Debug, Clone)]
pub struct MelodicSynth {
    synth_type: SynthType,
    pub params: SynthParams,
    volume: Smoothed,
    voices: SlotMap<VoiceId, Voice>,
    sample_rate: f64,
}

impl MelodicSynth {
    pub fn new(synth_type: SynthType, sample_rate: f64) -> Self {
        MelodicSynth {
            synth_type,
            params: SynthParams::default(),
            volume: Smoothed::new(DEFAULT_VOLUME, Smoothed::DEFAULT_TAU, sample_rate),
            voices: SlotMap::with_key(),
            sample_rate,
        }
    }

    pub fn synth_type(&self) -> SynthType {
        self.synth_type
    }

    /// Switch preset. Affects subsequent attacks only; sounding voices and
    /// the current params are left alone.
    pub fn set_type(&mut self, synth_type: SynthType) {
        self.synth_type = synth_type;
    }

    pub fn set_param(&mut self, param: SynthParam, value: f64) {
        match param {
            SynthParam::Cutoff => self.params.cutoff = value.clamp(20.0, 20000.0),
            SynthParam::Resonance => self.params.resonance = value.clamp(0.0, 30.0),
            SynthParam::Attack => self.params.attack = value.clamp(0.0, 4.0),
            SynthParam::Decay => self.params.decay = value.clamp(0.0, 8.0),
            SynthParam::Sustain => self.params.sustain = value.clamp(0.0, 1.0),
            SynthParam::Release => self.params.release = value.clamp(0.0, 8.0),
            SynthParam::Volume => self.volume.set_target(value.clamp(0.0, 1.0)),
        }
    }

    /// Start a note at absolute time `time`. Returns the handle to release
    /// it with; a null handle when the pool is full.
    pub fn trigger_attack(&mut self, frequency: f64, time: f64) -> VoiceId {
        if self.voices.len() >= MAX_VOICES {
            log::warn!("voice pool full ({MAX_VOICES}), dropping note at {frequency:.1} Hz");
            return VoiceId::default();
        }

        let attack = self.params.attack.max(MIN_ATTACK);
        let mut amp = Automated::new(0.0, self.sample_rate);
        amp.set_value_at(0.0, time);
        amp.set_target_at(self.params.sustain, time, attack / 2.0);

        let mut filter = BiquadFilter::new(FilterType::Lowpass, self.sample_rate);
        filter.set_frequency(self.params.cutoff.clamp(20.0, 20000.0));
        filter.set_q(self.params.resonance.max(0.707));
        let mut cutoff = Smoothed::new(self.params.cutoff, CUTOFF_TAU, self.sample_rate);
        cutoff.set_target(self.params.cutoff.clamp(20.0, 20000.0));

        self.voices.insert(Voice {
            osc: Oscillator::new(self.synth_type.waveform(), frequency, self.sample_rate),
            filter,
            cutoff,
            amp,
            start: time,
            stop: None,
            end: None,
        })
    }

    /// Release a note at absolute time `time`. Unknown or null handles are
    /// ignored, as are repeated releases.
    pub fn trigger_release(&mut self, id: VoiceId, time: f64) {
        let Some(voice) = self.voices.get_mut(id) else {
            return;
        };
        if voice.stop.is_some() {
            return;
        }

        let release = self.params.release.max(MIN_RELEASE);
        voice.amp.cancel_after(time);
        voice.amp.set_target_at(0.0, time, release / 3.0);
        voice.stop = Some(time + release);
        voice.end = Some(time + release + CLEANUP_PAD);
    }

    /// Sum all live voices at absolute time `t`, through the synth's
    /// smoothed output gain.
    pub fn process(&mut self, t: f64) -> f64 {
        let mut out = 0.0;
        for voice in self.voices.values_mut() {
            out += voice.next_sample(t);
        }
        out * self.volume.tick()
    }

    /// Drop voices whose release has fully ended.
    pub fn cleanup(&mut self, t: f64) {
        self.voices.retain(|_, v| !v.is_finished(t));
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }
}
