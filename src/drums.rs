//! Drum synthesis — each channel builds its hits from oscillators and
//! seeded noise at trigger time, so there are no samples to load and every
//! parameter tweak applies to the next hit.

use crate::dsp::filter::{BiquadFilter, FilterType};
use crate::dsp::noise::NoiseSource;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::dsp::param::{Automated, Smoothed};

/// The synthesis recipe a channel uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumKind {
    Kick,
    Snare,
    Hat,
    Clap,
    Generic,
}

/// Per-channel sound parameters.
#[derive(Debug, Clone, Copy)]
pub struct DrumParams {
    /// Pitch offset in recipe-specific units (semitone-ish).
    pub tune: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Lowpass cutoff the voice glides up to, Hz.
    pub cutoff: f64,
    /// Channel gain, 0.0 to 1.0.
    pub volume: f64,
}

impl Default for DrumParams {
    fn default() -> Self {
        DrumParams {
            tune: 0.0,
            decay: 0.3,
            attack: 0.005,
            cutoff: 20000.0,
            volume: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumParam {
    Tune,
    Decay,
    Attack,
    Cutoff,
    Volume,
}

impl DrumParam {
    /// Parse a parameter name as used in saved control state.
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "tune" => Some(DrumParam::Tune),
            "decay" => Some(DrumParam::Decay),
            "attack" => Some(DrumParam::Attack),
            "cutoff" => Some(DrumParam::Cutoff),
            "volume" => Some(DrumParam::Volume),
            _ => None,
        }
    }
}

/// Minimum usable attack, seconds. Anything shorter clicks.
const MIN_ATTACK: f64 = 0.002;
/// Voices overlap freely; a hit is disposed this long after its decay ends.
const RELEASE_PAD: f64 = 0.5;
/// Tonal oscillators stop a little past the decay.
const OSC_PAD: f64 = 0.2;

const KICK_SWEEP_TIME: f64 = 0.5;
const GENERIC_SWEEP_TIME: f64 = 0.2;
/// Snare noise snap decay time constant, seconds.
const SNARE_SNAP_TAU: f64 = 0.05;
const CLAP_BURST_SPACING: f64 = 0.015;
const CLAP_ATTACK_TAU: f64 = 0.002;
const CLAP_DECAY_TAU: f64 = 0.02;

/// Summed micro-envelope of the clap's three noise bursts at `dt` seconds
/// past the trigger. Each burst rises toward `volume` with a 2 ms constant,
/// then falls toward 0 with a 20 ms constant from 2 ms in.
fn clap_burst_env(dt: f64, volume: f64) -> f64 {
    let mut env = 0.0;
    for burst in 0..3 {
        let local = dt - burst as f64 * CLAP_BURST_SPACING;
        if local < 0.0 {
            continue;
        }
        env += if local < CLAP_ATTACK_TAU {
            volume * (1.0 - (-local / CLAP_ATTACK_TAU).exp())
        } else {
            let peak = volume * (1.0 - (-1.0_f64).exp());
            peak * (-(local - CLAP_ATTACK_TAU) / CLAP_DECAY_TAU).exp()
        };
    }
    env
}

/// The tone-generating half of a drum voice.
#[derive(Debug, Clone)]
enum DrumSource {
    /// Sine with an exponential pitch drop.
    Kick { osc: Oscillator, freq: Automated },
    /// Triangle body plus a noise snap with its own fast-decaying gain.
    Snare {
        osc: Oscillator,
        noise: NoiseSource,
        snap: Smoothed,
    },
    /// Noise through a highpass.
    Hat {
        noise: NoiseSource,
        filter: BiquadFilter,
    },
    /// Three noise bursts through a bandpass, each with a two-stage
    /// micro-envelope.
    Clap {
        noise: NoiseSource,
        filter: BiquadFilter,
        volume: f64,
    },
    /// Sine with a shorter pitch drop, for percs and toms.
    Generic { osc: Oscillator, freq: Automated },
}

/// A single drum hit, scheduled at an absolute time.
#[derive(Debug, Clone)]
pub struct DrumVoice {
    source: DrumSource,
    /// Per-voice lowpass gliding from closed toward the channel cutoff.
    lowpass: BiquadFilter,
    glide: Smoothed,
    amp: Automated,
    start: f64,
    osc_stop: f64,
    end: f64,
}

impl DrumVoice {
    pub fn new(kind: DrumKind, params: &DrumParams, start: f64, seed: u64, sample_rate: f64) -> Self {
        let source = match kind {
            DrumKind::Kick => {
                let f0 = 150.0 + params.tune * 5.0;
                let mut freq = Automated::new(f0, sample_rate);
                freq.set_value_at(f0, start);
                freq.exp_ramp(0.01, start, start + KICK_SWEEP_TIME);
                DrumSource::Kick {
                    osc: Oscillator::new(Waveform::Sine, f0, sample_rate),
                    freq,
                }
            }
            DrumKind::Snare => {
                // The snap dies on its own 50 ms constant, independent of
                // the outer decay.
                let mut snap = Smoothed::new(params.volume * 0.5, SNARE_SNAP_TAU, sample_rate);
                snap.set_target(0.0);
                DrumSource::Snare {
                    osc: Oscillator::new(
                        Waveform::Triangle,
                        250.0 + params.tune * 10.0,
                        sample_rate,
                    ),
                    noise: NoiseSource::new(seed),
                    snap,
                }
            }
            DrumKind::Hat => {
                let mut filter = BiquadFilter::new(FilterType::Highpass, sample_rate);
                filter.set_frequency((5000.0 + params.tune * 100.0).max(20.0));
                DrumSource::Hat {
                    noise: NoiseSource::new(seed),
                    filter,
                }
            }
            DrumKind::Clap => {
                let mut filter = BiquadFilter::new(FilterType::Bandpass, sample_rate);
                filter.set_frequency((1000.0 + params.tune * 50.0).max(20.0));
                filter.set_q(1.0);
                DrumSource::Clap {
                    noise: NoiseSource::new(seed),
                    filter,
                    volume: params.volume,
                }
            }
            DrumKind::Generic => {
                let f0 = 400.0 + params.tune * 20.0;
                let mut freq = Automated::new(f0, sample_rate);
                freq.set_value_at(f0, start);
                freq.exp_ramp(100.0, start, start + GENERIC_SWEEP_TIME);
                DrumSource::Generic {
                    osc: Oscillator::new(Waveform::Sine, f0, sample_rate),
                    freq,
                }
            }
        };

        let attack = params.attack.max(MIN_ATTACK);
        let mut amp = Automated::new(0.0, sample_rate);
        amp.set_value_at(0.0, start);
        amp.set_target_at(params.volume, start, attack / 3.0);
        amp.set_target_at(0.0, start + attack, params.decay / 3.0);

        let mut lowpass = BiquadFilter::new(FilterType::Lowpass, sample_rate);
        lowpass.set_frequency(350.0);
        let mut glide = Smoothed::new(350.0, Smoothed::DEFAULT_TAU, sample_rate);
        glide.set_target(params.cutoff.clamp(20.0, 20000.0));

        DrumVoice {
            source,
            lowpass,
            glide,
            amp,
            start,
            osc_stop: start + params.decay + OSC_PAD,
            end: start + params.decay + RELEASE_PAD,
        }
    }

    pub fn is_finished(&self, t: f64) -> bool {
        t >= self.end
    }

    /// Render one sample at absolute time `t`.
    pub fn next_sample(&mut self, t: f64) -> f64 {
        if t < self.start || t >= self.end {
            return 0.0;
        }

        let raw = match &mut self.source {
            DrumSource::Kick { osc, freq } => {
                if t >= self.osc_stop {
                    0.0
                } else {
                    osc.frequency = freq.tick(t);
                    osc.next_sample()
                }
            }
            DrumSource::Snare { osc, noise, snap } => {
                let tone = if t >= self.osc_stop { 0.0 } else { osc.next_sample() };
                tone + noise.next_sample() * snap.tick()
            }
            DrumSource::Hat { noise, filter } => filter.process(noise.next_sample()),
            DrumSource::Clap { noise, filter, volume } => {
                let env = clap_burst_env(t - self.start, *volume);
                filter.process(noise.next_sample() * env)
            }
            DrumSource::Generic { osc, freq } => {
                if t >= self.osc_stop {
                    0.0
                } else {
                    osc.frequency = freq.tick(t);
                    osc.next_sample()
                }
            }
        };

        let cutoff = self.glide.tick();
        if (cutoff - self.lowpass.frequency).abs() > 1.0 {
            self.lowpass.set_frequency(cutoff);
        }
        self.lowpass.process(raw) * self.amp.tick(t)
    }
}

/// One drum channel: its sound parameters plus the voices currently ringing.
#[derive(Debug, Clone)]
pub struct DrumChannel {
    kind: DrumKind,
    pub params: DrumParams,
    voices: Vec<DrumVoice>,
    trigger_count: u64,
    sample_rate: f64,
}

impl DrumChannel {
    pub fn new(kind: DrumKind, sample_rate: f64) -> Self {
        DrumChannel {
            kind,
            params: DrumParams::default(),
            voices: Vec::new(),
            trigger_count: 0,
            sample_rate,
        }
    }

    pub fn kind(&self) -> DrumKind {
        self.kind
    }

    pub fn set_param(&mut self, param: DrumParam, value: f64) {
        match param {
            DrumParam::Tune => self.params.tune = value,
            DrumParam::Decay => self.params.decay = value.clamp(0.01, 4.0),
            DrumParam::Attack => self.params.attack = value.clamp(0.0, 1.0),
            DrumParam::Cutoff => self.params.cutoff = value.clamp(20.0, 20000.0),
            DrumParam::Volume => self.params.volume = value.clamp(0.0, 1.0),
        }
    }

    /// Schedule a hit at absolute time `time`. May be ahead of the render
    /// position; the voice stays silent until then.
    pub fn trigger(&mut self, time: f64) {
        // Each hit gets a fresh noise stream.
        let seed = self
            .trigger_count
            .wrapping_mul(0x9e37_79b9_7f4a_7c15)
            .wrapping_add(self.kind as u64);
        self.trigger_count += 1;
        self.voices
            .push(DrumVoice::new(self.kind, &self.params, time, seed, self.sample_rate));
    }

    /// Sum all live voices at absolute time `t`.
    pub fn next_sample(&mut self, t: f64) -> f64 {
        let mut out = 0.0;
        for voice in self.voices.iter_mut() {
            out += voice.next_sample(t);
        }
        out
    }

    /// Drop voices whose tails have fully ended.
    pub fn cleanup(&mut self, t: f64) {
        self.voices.retain(|v| !v.is_finished(t));
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn render(channel: &mut DrumChannel, seconds: f64) -> Vec<f64> {
        let n = (seconds * SR) as usize;
        (0..n).map(|i| channel.next_sample(i as f64 / SR)).collect()
    }

    #[test]
    fn kick_rings_and_fades() {
        let mut ch = DrumChannel::new(DrumKind::Kick, SR);
        ch.trigger(0.0);
        let out = render(&mut ch, 1.0);

        let early: f64 = out[..4410].iter().map(|s| s.abs()).sum();
        let late: f64 = out[39690..].iter().map(|s| s.abs()).sum();
        assert!(early > 1.0, "kick should sound immediately, got {early}");
        assert!(late < early * 0.01, "kick should have decayed, got {late}");
    }

    #[test]
    fn voice_is_silent_before_its_start_time() {
        let mut ch = DrumChannel::new(DrumKind::Snare, SR);
        ch.trigger(0.5);
        let out = render(&mut ch, 1.0);
        let before: f64 = out[..22050].iter().map(|s| s.abs()).sum();
        let after: f64 = out[22050..].iter().map(|s| s.abs()).sum();
        assert_eq!(before, 0.0, "scheduled hit must stay silent until due");
        assert!(after > 0.0);
    }

    #[test]
    fn cleanup_reclaims_finished_voices() {
        let mut ch = DrumChannel::new(DrumKind::Hat, SR);
        ch.trigger(0.0);
        ch.trigger(0.1);
        assert_eq!(ch.voice_count(), 2);

        // decay 0.3 + pad 0.5 ⇒ both done well before t = 2.
        ch.cleanup(2.0);
        assert_eq!(ch.voice_count(), 0);
    }

    #[test]
    fn cleanup_keeps_ringing_voices() {
        let mut ch = DrumChannel::new(DrumKind::Clap, SR);
        ch.trigger(1.0);
        ch.cleanup(0.5);
        assert_eq!(ch.voice_count(), 1);
    }

    #[test]
    fn volume_scales_output() {
        let peak_at = |volume: f64| {
            let mut ch = DrumChannel::new(DrumKind::Kick, SR);
            ch.set_param(DrumParam::Volume, volume);
            ch.trigger(0.0);
            render(&mut ch, 0.3).iter().fold(0.0_f64, |m, s| m.max(s.abs()))
        };
        let loud = peak_at(0.8);
        let soft = peak_at(0.2);
        assert!(soft < loud * 0.5, "volume should scale the hit: {soft} vs {loud}");
    }

    #[test]
    fn longer_decay_rings_longer() {
        let tail_energy = |decay: f64| {
            let mut ch = DrumChannel::new(DrumKind::Snare, SR);
            ch.set_param(DrumParam::Decay, decay);
            ch.trigger(0.0);
            let out = render(&mut ch, 1.0);
            out[13230..].iter().map(|s| s.abs()).sum::<f64>()
        };
        assert!(tail_energy(0.8) > tail_energy(0.1) * 4.0);
    }

    #[test]
    fn hat_is_mostly_high_frequency() {
        let mut ch = DrumChannel::new(DrumKind::Hat, SR);
        ch.trigger(0.0);
        let out = render(&mut ch, 0.2);

        // Noise through a 5 kHz highpass crosses zero far more often than
        // any tonal voice would.
        let mut crossings = 0;
        for pair in out.windows(2) {
            if (pair[0] < 0.0) != (pair[1] < 0.0) {
                crossings += 1;
            }
        }
        assert!(crossings > 1000, "hat should be noisy, {crossings} crossings");
    }

    #[test]
    fn snare_snap_dies_before_the_body() {
        // With a long outer decay, the noise snap must still be gone on its
        // own 50 ms constant, leaving the tonal body. First-difference
        // energy separates noise from a 250 Hz tone.
        let mut ch = DrumChannel::new(DrumKind::Snare, SR);
        ch.set_param(DrumParam::Decay, 1.0);
        ch.trigger(0.0);
        let out = render(&mut ch, 0.5);

        let roughness = |window: &[f64]| {
            window
                .windows(2)
                .map(|p| (p[1] - p[0]).abs())
                .sum::<f64>()
                / (window.len() - 1) as f64
        };
        let early = roughness(&out[(0.02 * SR) as usize..(0.07 * SR) as usize]);
        let late = roughness(&out[(0.3 * SR) as usize..(0.35 * SR) as usize]);
        assert!(
            early > late * 5.0,
            "snap should decay independently: early {early}, late {late}"
        );
    }

    #[test]
    fn clap_burst_envelope_shape() {
        // Rises from zero with the 2 ms constant.
        assert_eq!(clap_burst_env(0.0, 0.8), 0.0);
        let quarter = clap_burst_env(0.0005, 0.8);
        let at_peak = clap_burst_env(0.002, 0.8);
        assert!(quarter < at_peak * 0.4, "attack should ramp: {quarter}");
        assert!((at_peak - 0.8 * (1.0 - (-1.0_f64).exp())).abs() < 1e-9);

        // Later bursts restart the envelope.
        let second_burst = clap_burst_env(0.017, 0.8);
        assert!(second_burst > clap_burst_env(0.014, 0.8));

        // The 20 ms decay keeps the tail ringing well past the last burst.
        let tail = clap_burst_env(0.06, 0.8);
        assert!(tail > 0.08, "tail should ring on the 20 ms constant: {tail}");
        assert!(clap_burst_env(0.2, 0.8) < 0.01);
    }

    #[test]
    fn clap_rings_past_its_bursts() {
        let mut ch = DrumChannel::new(DrumKind::Clap, SR);
        ch.trigger(0.0);
        let out = render(&mut ch, 0.2);

        let mean_abs = |window: &[f64]| {
            window.iter().map(|s| s.abs()).sum::<f64>() / window.len() as f64
        };
        let bursts = mean_abs(&out[(0.015 * SR) as usize..(0.03 * SR) as usize]);
        let tail = mean_abs(&out[(0.05 * SR) as usize..(0.065 * SR) as usize]);
        assert!(
            tail > bursts * 0.02,
            "tail should ring: bursts {bursts}, tail {tail}"
        );
    }

    #[test]
    fn generic_sweep_is_smooth_toned() {
        // The perc sweep is a sine: adjacent samples never jump the way a
        // square edge would.
        let mut ch = DrumChannel::new(DrumKind::Generic, SR);
        ch.trigger(0.0);
        let out = render(&mut ch, 0.2);

        let window = &out[(0.05 * SR) as usize..(0.1 * SR) as usize];
        let peak = window.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
        let max_step = window
            .windows(2)
            .map(|p| (p[1] - p[0]).abs())
            .fold(0.0_f64, f64::max);
        assert!(peak > 0.01, "sweep should still sound at 50 ms");
        assert!(
            max_step < peak * 0.3,
            "waveform should be smooth: step {max_step}, peak {peak}"
        );
    }

    #[test]
    fn unknown_param_name_is_rejected() {
        assert_eq!(DrumParam::from_str("tune"), Some(DrumParam::Tune));
        assert_eq!(DrumParam::from_str("resonance"), None);
    }
}
