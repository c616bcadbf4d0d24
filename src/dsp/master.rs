//! Master bus — the fixed signal chain everything renders through.
//!
//! ```text
//! melodic ─ tremolo ─┬────────────────────────────┐
//!                    ├─ chorus  ─ wet ─┐          │
//!                    ├─ flanger ─ wet ─┤          │
//!                    ├─ delay   ─ wet ─┤          │
//!                    └─ reverb  ─ wet ─┤          │
//! drums ────────────────────────────── Σ ── EQ ── crush/dry ─┐
//! drone ─────────────────────────────────────────────────────Σ ─ limiter ─ volume ─ out
//! ```
//!
//! The four send effects return wet-only signal; their send gains default
//! to zero so a fresh bus passes dry audio untouched (aside from the
//! limiter).

use crate::dsp::bitcrusher::Bitcrusher;
use crate::dsp::chorus::Chorus;
use crate::dsp::compressor::Compressor;
use crate::dsp::delay::Delay;
use crate::dsp::drone::Drone;
use crate::dsp::filter::{BiquadFilter, FilterType};
use crate::dsp::flanger::Flanger;
use crate::dsp::param::Smoothed;
use crate::dsp::reverb::Reverb;
use crate::dsp::tremolo::Tremolo;

const EQ_LOW_FREQUENCY: f64 = 250.0;
const EQ_MID_FREQUENCY: f64 = 1000.0;
const EQ_MID_Q: f64 = 1.0;
const EQ_HIGH_FREQUENCY: f64 = 4000.0;

const REVERB_DURATION: f64 = 1.5;
const REVERB_DECAY: f64 = 2.0;

const DEFAULT_VOLUME: f64 = 0.8;

pub struct MasterBus {
    tremolo: Tremolo,

    chorus: Chorus,
    chorus_wet: Smoothed,
    flanger: Flanger,
    flanger_wet: Smoothed,
    delay: Delay,
    delay_wet: Smoothed,
    reverb: Reverb,
    reverb_wet: Smoothed,

    eq_low: BiquadFilter,
    eq_low_gain: Smoothed,
    eq_mid: BiquadFilter,
    eq_mid_gain: Smoothed,
    eq_high: BiquadFilter,
    eq_high_gain: Smoothed,

    bitcrusher: Bitcrusher,
    crush_wet: Smoothed,

    drone: Drone,
    limiter: Compressor,
    volume: Smoothed,
}

impl MasterBus {
    pub fn new(sample_rate: f64) -> Self {
        let tau = Smoothed::DEFAULT_TAU;
        let mut eq_low = BiquadFilter::new(FilterType::Lowshelf, sample_rate);
        eq_low.set_frequency(EQ_LOW_FREQUENCY);
        let mut eq_mid = BiquadFilter::new(FilterType::Peaking, sample_rate);
        eq_mid.set_frequency(EQ_MID_FREQUENCY);
        eq_mid.set_q(EQ_MID_Q);
        let mut eq_high = BiquadFilter::new(FilterType::Highshelf, sample_rate);
        eq_high.set_frequency(EQ_HIGH_FREQUENCY);

        MasterBus {
            tremolo: Tremolo::new(sample_rate),
            chorus: Chorus::new(sample_rate),
            chorus_wet: Smoothed::new(0.0, tau, sample_rate),
            flanger: Flanger::new(sample_rate),
            flanger_wet: Smoothed::new(0.0, tau, sample_rate),
            delay: Delay::new(sample_rate),
            delay_wet: Smoothed::new(0.0, tau, sample_rate),
            reverb: Reverb::new(sample_rate, REVERB_DURATION, REVERB_DECAY),
            reverb_wet: Smoothed::new(0.0, tau, sample_rate),
            eq_low,
            eq_low_gain: Smoothed::new(0.0, tau, sample_rate),
            eq_mid,
            eq_mid_gain: Smoothed::new(0.0, tau, sample_rate),
            eq_high,
            eq_high_gain: Smoothed::new(0.0, tau, sample_rate),
            bitcrusher: Bitcrusher::new(sample_rate),
            crush_wet: Smoothed::new(0.0, tau, sample_rate),
            drone: Drone::new(sample_rate),
            limiter: Compressor::limiter(sample_rate),
            volume: Smoothed::new(DEFAULT_VOLUME, tau, sample_rate),
        }
    }

    /// Run one sample of the melodic and drum submixes through the bus.
    pub fn process(&mut self, melodic: f32, drums: f32) -> f32 {
        let melodic = self.tremolo.process(melodic);

        // Parallel wet sends off the post-tremolo melodic signal.
        let wet = self.chorus.process(melodic) * self.chorus_wet.tick() as f32
            + self.flanger.process(melodic) * self.flanger_wet.tick() as f32
            + self.delay.process(melodic) * self.delay_wet.tick() as f32
            + self.reverb.process(melodic) * self.reverb_wet.tick() as f32;

        let mut sum = melodic + drums + wet;

        // Three-band EQ. Re-deriving coefficients is deferred until the
        // smoothed gain has moved far enough to matter.
        let low_gain = self.eq_low_gain.tick();
        if (low_gain - self.eq_low.gain_db).abs() > 0.01 {
            self.eq_low.set_gain_db(low_gain);
        }
        let mid_gain = self.eq_mid_gain.tick();
        if (mid_gain - self.eq_mid.gain_db).abs() > 0.01 {
            self.eq_mid.set_gain_db(mid_gain);
        }
        let high_gain = self.eq_high_gain.tick();
        if (high_gain - self.eq_high.gain_db).abs() > 0.01 {
            self.eq_high.set_gain_db(high_gain);
        }
        sum = self.eq_high.process(self.eq_mid.process(self.eq_low.process(sum as f64))) as f32;

        // Crossfade clean signal against the waveshaper.
        let crush_mix = self.crush_wet.tick() as f32;
        let crushed = self.bitcrusher.process(sum);
        sum = sum * (1.0 - crush_mix) + crushed * crush_mix;

        sum += self.drone.next_sample() as f32;

        self.limiter.process(sum) * self.volume.tick() as f32
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume.set_target(volume.clamp(0.0, 1.0));
    }

    pub fn set_delay_wet(&mut self, wet: f64) {
        self.delay_wet.set_target(wet.clamp(0.0, 1.0));
    }

    pub fn set_delay_time(&mut self, seconds: f64) {
        self.delay.set_time(seconds);
    }

    pub fn set_delay_feedback(&mut self, feedback: f64) {
        self.delay.set_feedback(feedback);
    }

    pub fn set_chorus_wet(&mut self, wet: f64) {
        self.chorus_wet.set_target(wet.clamp(0.0, 1.0));
    }

    pub fn set_chorus_speed(&mut self, hz: f64) {
        self.chorus.set_speed(hz);
    }

    pub fn set_flanger_wet(&mut self, wet: f64) {
        self.flanger_wet.set_target(wet.clamp(0.0, 1.0));
    }

    pub fn set_flanger_speed(&mut self, hz: f64) {
        self.flanger.set_speed(hz);
    }

    pub fn set_flanger_feedback(&mut self, feedback: f64) {
        self.flanger.set_feedback(feedback);
    }

    pub fn set_reverb_wet(&mut self, wet: f64) {
        self.reverb_wet.set_target(wet.clamp(0.0, 1.0));
    }

    pub fn set_tremolo_speed(&mut self, hz: f64) {
        self.tremolo.set_speed(hz);
    }

    pub fn set_tremolo_depth(&mut self, depth: f64) {
        self.tremolo.set_depth(depth);
    }

    /// Low-shelf gain at 250 Hz, in dB.
    pub fn set_eq_low(&mut self, gain_db: f64) {
        self.eq_low_gain.set_target(gain_db.clamp(-24.0, 24.0));
    }

    /// Peaking gain at 1 kHz, in dB.
    pub fn set_eq_mid(&mut self, gain_db: f64) {
        self.eq_mid_gain.set_target(gain_db.clamp(-24.0, 24.0));
    }

    /// High-shelf gain at 4 kHz, in dB.
    pub fn set_eq_high(&mut self, gain_db: f64) {
        self.eq_high_gain.set_target(gain_db.clamp(-24.0, 24.0));
    }

    /// One knob drives both the wet/dry crossfade and the shaper drive.
    pub fn set_bitcrush_mix(&mut self, mix: f64) {
        let mix = mix.clamp(0.0, 1.0);
        self.crush_wet.set_target(mix);
        self.bitcrusher.set_amount(mix);
    }

    pub fn set_drone_level(&mut self, level: f64) {
        self.drone.set_level(level);
    }

    pub fn set_drone_frequency(&mut self, hz: f64) {
        self.drone.set_frequency(hz);
    }
}
