//! Drone — a low sine oscillator through a sharply resonant lowpass filter,
//! mixed underneath the full mix as a sub-bass bed.

use crate::dsp::filter::{BiquadFilter, FilterType};
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::dsp::param::Smoothed;

const OSC_FREQUENCY: f64 = 40.0;
const FILTER_FREQUENCY: f64 = 100.0;
const FILTER_Q: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct Drone {
    oscillator: Oscillator,
    filter: BiquadFilter,
    level: Smoothed,
}

impl Drone {
    pub fn new(sample_rate: f64) -> Self {
        let mut filter = BiquadFilter::new(FilterType::Lowpass, sample_rate);
        filter.set_frequency(FILTER_FREQUENCY);
        filter.set_q(FILTER_Q);
        Drone {
            oscillator: Oscillator::new(Waveform::Sine, OSC_FREQUENCY, sample_rate),
            filter,
            level: Smoothed::new(0.0, Smoothed::DEFAULT_TAU, sample_rate),
        }
    }

    /// Set the drone level (0.0 to 1.0); smoothed to avoid zipper noise.
    pub fn set_level(&mut self, level: f64) {
        self.level.set_target(level.clamp(0.0, 1.0));
    }

    /// Retune the drone fundamental. The resonant filter stays fixed, so
    /// moving the oscillator toward or away from 100 Hz changes the timbre
    /// as well as the pitch.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.oscillator.frequency = frequency.max(1.0);
    }

    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        let level = self.level.tick();
        if level < 1e-6 {
            // Keep the oscillator and filter running so fades stay smooth.
            let raw = self.oscillator.next_sample();
            self.filter.process(raw);
            return 0.0;
        }
        let raw = self.oscillator.next_sample();
        self.filter.process(raw) * level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_at_zero_level() {
        let mut drone = Drone::new(44100.0);
        for _ in 0..4410 {
            assert_eq!(drone.next_sample(), 0.0);
        }
    }

    #[test]
    fn produces_signal_when_raised() {
        let mut drone = Drone::new(44100.0);
        drone.set_level(0.5);
        let mut peak = 0.0_f64;
        for _ in 0..44100 {
            peak = peak.max(drone.next_sample().abs());
        }
        assert!(peak > 0.01, "drone should be audible, peak {peak}");
    }

    #[test]
    fn output_is_low_frequency() {
        // A 40 Hz sine through a 100 Hz lowpass should have very few
        // zero crossings per second.
        let mut drone = Drone::new(44100.0);
        drone.set_level(1.0);
        // Let the level smoothing settle first.
        for _ in 0..22050 {
            drone.next_sample();
        }
        let mut crossings = 0;
        let mut last = drone.next_sample();
        for _ in 0..44100 {
            let s = drone.next_sample();
            if (last < 0.0) != (s < 0.0) {
                crossings += 1;
            }
            last = s;
        }
        // 40 Hz ⇒ 80 crossings per second.
        assert!(
            (60..100).contains(&crossings),
            "expected ~80 crossings, got {crossings}"
        );
    }
}
