//! Flanger effect — very short modulated delay with feedback.

use std::f64::consts::PI;

use super::param::Smoothed;

/// A mono flanger: ~5 ms modulated delay whose output is fed back into the
/// line. Returns the wet signal only; the wet level lives in the master bus.
#[derive(Debug, Clone)]
pub struct Flanger {
    buffer: Vec<f32>,
    write_pos: usize,
    sample_rate: f64,
    phase: f64,
    speed: Smoothed,
    feedback: Smoothed,

    /// Base delay time in seconds.
    pub delay: f64,
    /// Modulation depth in seconds.
    pub depth: f64,
}

impl Flanger {
    pub fn new(sample_rate: f64) -> Self {
        let max_delay = 0.02;
        let buffer_size = (sample_rate * max_delay) as usize + 1;

        Flanger {
            buffer: vec![0.0; buffer_size],
            write_pos: 0,
            sample_rate,
            phase: 0.0,
            speed: Smoothed::new(0.25, Smoothed::DEFAULT_TAU, sample_rate),
            feedback: Smoothed::new(0.0, Smoothed::DEFAULT_TAU, sample_rate),
            delay: 0.005,
            depth: 0.002,
        }
    }

    /// LFO rate in Hz.
    pub fn set_speed(&mut self, hz: f64) {
        self.speed.set_target(hz.clamp(0.01, 10.0));
    }

    pub fn set_feedback(&mut self, feedback: f64) {
        self.feedback.set_target(feedback.clamp(0.0, 0.9));
    }

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

    /// Process one sample; returns the flanged (wet) signal.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let buffer_len = self.buffer.len();

        let lfo = (2.0 * PI * self.phase).sin();
        let delay_samples = ((self.delay + self.depth * lfo) * self.sample_rate)
            .clamp(1.0, (buffer_len - 1) as f64);
        let wet = Self::read_interpolated(&self.buffer, self.write_pos, delay_samples);

        let fb = self.feedback.tick() as f32;
        self.buffer[self.write_pos] = input + wet * fb;
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
