//! Anti-aliased oscillators using PolyBLEP.

use std::f64::consts::PI;

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A band-limited oscillator with anti-aliasing (PolyBLEP).
///
/// `frequency` may be rewritten every sample (pitch sweeps); phase stays
/// continuous across frequency changes.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            frequency,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        self.frequency / self.sample_rate
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        let inc = self.phase_inc();
        let sample = match self.waveform {
            Waveform::Sine => self.sine(),
            Waveform::Sawtooth => self.sawtooth(inc),
            Waveform::Square => self.square(inc),
            Waveform::Triangle => self.triangle(),
        };

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    fn sine(&self) -> f64 {
        (2.0 * PI * self.phase).sin()
    }

    /// Naive sawtooth: rises from -1 to +1, then drops.
    /// PolyBLEP corrects the discontinuity at the wrap.
    fn sawtooth(&self, inc: f64) -> f64 {
        let naive = 2.0 * self.phase - 1.0;
        naive - poly_blep(self.phase, inc)
    }

    /// Square wave via two sawtooth waves with PolyBLEP.
    fn square(&self, inc: f64) -> f64 {
        let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, inc);
        value -= poly_blep((self.phase + 0.5) % 1.0, inc);
        value
    }

    /// Piecewise-linear triangle: -1→+1 in [0, 0.5], +1→-1 in [0.5, 1].
    fn triangle(&self) -> f64 {
        if self.phase < 0.5 {
            4.0 * self.phase - 1.0
        } else {
            3.0 - 4.0 * self.phase
        }
    }

    /// Reset oscillator phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) anti-aliasing correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
/// Returns a correction value to subtract from the naive waveform
/// at discontinuities.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        // Just after the discontinuity
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        // Just before the next discontinuity
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_zero_at_start() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, 44100.0);
        let sample = osc.next_sample();
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn sine_range() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, 44100.0);
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s >= -1.0 && s <= 1.0, "Sine out of range: {s}");
        }
    }

    #[test]
    fn sawtooth_range() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, 440.0, 44100.0);
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s >= -1.5 && s <= 1.5, "Saw out of range: {s}");
        }
    }

    #[test]
    fn square_range() {
        let mut osc = Oscillator::new(Waveform::Square, 440.0, 44100.0);
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s >= -1.5 && s <= 1.5, "Square out of range: {s}");
        }
    }

    #[test]
    fn triangle_range() {
        let mut osc = Oscillator::new(Waveform::Triangle, 440.0, 44100.0);
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s >= -1.0 && s <= 1.0, "Triangle out of range: {s}");
        }
    }

    #[test]
    fn frequency_sweep_keeps_phase_continuous() {
        let mut osc = Oscillator::new(Waveform::Sine, 150.0, 44100.0);
        let mut last = osc.next_sample();
        for i in 0..4410 {
            // Sweep downward as the kick voice does.
            osc.frequency = 150.0 * (1.0 - i as f64 / 4410.0) + 1.0;
            let s = osc.next_sample();
            assert!(
                (s - last).abs() < 0.05,
                "sweep should not produce a discontinuity: {last} -> {s}"
            );
            last = s;
        }
    }
}
