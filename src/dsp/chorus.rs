//! Chorus effect — LFO-modulated short delay for thickening sound.

use std::f64::consts::PI;

use super::param::Smoothed;

/// A mono chorus: base delay around 20 ms, gently modulated. Returns the
/// wet signal only; the wet level lives in the master bus routing.
#[derive(Debug, Clone)]
pub struct Chorus {
    buffer: Vec<f32>,
    write_pos: usize,
    sample_rate: f64,
    phase: f64,
    speed: Smoothed,

    /// Base delay time in seconds.
    pub delay: f64,
    /// Modulation depth in seconds.
    pub depth: f64,
}

impl Chorus {
    pub fn new(sample_rate: f64) -> Self {
        // Buffer size: max delay + max depth + margin
        let max_delay = 0.05;
        let buffer_size = (sample_rate * max_delay) as usize + 1;

        Chorus {
            buffer: vec![0.0; buffer_size],
            write_pos: 0,
            sample_rate,
            phase: 0.0,
            speed: Smoothed::new(1.5, Smoothed::DEFAULT_TAU, sample_rate),
            delay: 0.02,
            depth: 0.003,
        }
    }

    /// LFO rate in Hz.
    pub fn set_speed(&mut self, hz: f64) {
        self.speed.set_target(hz.clamp(0.05, 20.0));
    }

    /// Read from the delay buffer with fractional (linear interpolation) delay.
    #[inline]
    fn read_interpolated(buffer: &[f32], write_pos: usize, delay_samples: f64) -> f32 {
        let buffer_len = buffer.len();
        let delay_int = delay_samples as usize;
        let frac = (delay_samples - delay_int as f64) as f32;

        let read_pos_0 = (write_pos + buffer_len - delay_int) % buffer_len;
        let read_pos_1 = (read_pos_0 + buffer_len - 1) % buffer_len;

        let s0 = buffer[read_pos_0];
        let s1 = buffer[read_pos_1];
        s0 + frac * (s1 - s0)
    }

    /// Process one sample; returns the modulated-delay (wet) signal.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let buffer_len = self.buffer.len();
        self.buffer[self.write_pos] = input;

        let lfo = (2.0 * PI * self.phase).sin();
        let delay_samples = ((self.delay + self.depth * lfo) * self.sample_rate)
            .clamp(1.0, (buffer_len - 1) as f64);
        let wet = Self::read_interpolated(&self.buffer, self.write_pos, delay_samples);

        self.write_pos = (self.write_pos + 1) % buffer_len;
        self.phase = (self.phase + self.speed.tick() / self.sample_rate) % 1.0;

        wet
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wet_signal_is_delayed_copy() {
        let mut chorus = Chorus::new(44100.0);
        // Before the base delay fills, wet stays silent.
        let early = chorus.process(1.0);
        assert_eq!(early, 0.0);

        let mut nonzero = false;
        for _ in 0..2000 {
            if chorus.process(1.0).abs() > 0.5 {
                nonzero = true;
                break;
            }
        }
        assert!(nonzero, "wet signal should appear after the base delay");
    }

    #[test]
    fn modulation_varies_the_delay() {
        let mut chorus = Chorus::new(44100.0);
        chorus.set_speed(5.0);

        // A ramp input makes delay variation visible as output variation.
        let mut i = 0.0_f32;
        let mut outputs = Vec::new();
        for _ in 0..44100 {
            outputs.push(chorus.process((i * 0.001).sin()));
            i += 1.0;
        }
        let later = &outputs[4410..];
        let min = later.iter().cloned().fold(f32::MAX, f32::min);
        let max = later.iter().cloned().fold(f32::MIN, f32::max);
        assert!(max > min, "modulated output should vary");
    }

    #[test]
    fn output_stays_bounded() {
        let mut chorus = Chorus::new(44100.0);
        for i in 0..44100 {
            let input = ((i as f32) * 0.05).sin();
            let out = chorus.process(input);
            assert!(out.abs() <= 1.01, "chorus out of range: {out}");
        }
    }
}
