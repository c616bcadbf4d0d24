//! Tremolo — slow amplitude modulation on the melodic path.

use std::f64::consts::PI;

use super::param::Smoothed;

/// Gain modulated by a sine LFO: `out = in · (1 + depth · sin)`. Depth
/// defaults to zero so the stage is transparent until a parameter raises it.
#[derive(Debug, Clone)]
pub struct Tremolo {
    sample_rate: f64,
    phase: f64,
    speed: Smoothed,
    depth: Smoothed,
}

impl Tremolo {
    pub fn new(sample_rate: f64) -> Self {
        Tremolo {
            sample_rate,
            phase: 0.0,
            speed: Smoothed::new(5.0, Smoothed::DEFAULT_TAU, sample_rate),
            depth: Smoothed::new(0.0, Smoothed::DEFAULT_TAU, sample_rate),
        }
    }

    /// LFO rate in Hz.
    pub fn set_speed(&mut self, hz: f64) {
        self.speed.set_target(hz.clamp(0.05, 20.0));
    }

    /// Modulation depth (0 = transparent).
    pub fn set_depth(&mut self, depth: f64) {
        self.depth.set_target(depth.clamp(0.0, 1.0));
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let lfo = (2.0 * PI * self.phase).sin();
        self.phase = (self.phase + self.speed.tick() / self.sample_rate) % 1.0;
        let gain = 1.0 + self.depth.tick() * lfo;
        input * gain as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_depth_is_transparent() {
        let mut trem = Tremolo::new(44100.0);
        for i in 0..4410 {
            let input = ((i as f32) * 0.01).sin();
            let out = trem.process(input);
            assert!((out - input).abs() < 1e-6, "depth 0 must pass through");
        }
    }

    #[test]
    fn depth_modulates_amplitude() {
        let mut trem = Tremolo::new(44100.0);
        trem.set_depth(1.0);
        trem.set_speed(5.0);

        // Constant input: output should swing around 1.0 once depth settles.
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for i in 0..44100 {
            let out = trem.process(1.0);
            if i > 22050 {
                min = min.min(out);
                max = max.max(out);
            }
        }
        assert!(max > 1.5, "peak should exceed input, got {max}");
        assert!(min < 0.5, "trough should dip below input, got {min}");
    }
}
