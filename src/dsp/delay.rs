//! Delay effect — feedback delay line on the melodic send bus.

use super::param::Smoothed;

/// A mono feedback delay. Returns the wet signal only; the dry path and
/// wet level live in the master bus routing.
///
/// The delay time is smoothed and read with linear interpolation so live
/// changes glide instead of crackling.
#[derive(Debug, Clone)]
pub struct Delay {
    buffer: Vec<f32>,
    write_pos: usize,
    sample_rate: f64,
    time: Smoothed,
    feedback: Smoothed,
}

impl Delay {
    /// Maximum supported delay time in seconds.
    pub const MAX_TIME: f64 = 2.0;

    pub fn new(sample_rate: f64) -> Self {
        let buffer_size = (sample_rate * Self::MAX_TIME) as usize + 1;
        Delay {
            buffer: vec![0.0; buffer_size],
            write_pos: 0,
            sample_rate,
            time: Smoothed::new(0.3, Smoothed::DEFAULT_TAU, sample_rate),
            feedback: Smoothed::new(0.3, Smoothed::DEFAULT_TAU, sample_rate),
        }
    }

    pub fn set_time(&mut self, seconds: f64) {
        self.time.set_target(seconds.clamp(0.001, Self::MAX_TIME));
    }

    pub fn set_feedback(&mut self, feedback: f64) {
        self.feedback.set_target(feedback.clamp(0.0, 0.95));
    }

    /// Read the delay buffer `delay_samples` behind the write head with
    /// linear interpolation.
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

    /// Process one sample; returns the delayed (wet) signal.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delay_samples = (self.time.tick() * self.sample_rate)
            .clamp(1.0, (self.buffer.len() - 1) as f64);
        let delayed = Self::read_interpolated(&self.buffer, self.write_pos, delay_samples);

        let fb = self.feedback.tick() as f32;
        self.buffer[self.write_pos] = input + delayed * fb;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        delayed
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_reappears_after_delay_time() {
        let sample_rate = 44100.0;
        let mut delay = Delay::new(sample_rate);
        delay.set_time(0.01); // 441 samples
        delay.set_feedback(0.0);
        // Let the smoothed time settle before measuring.
        for _ in 0..44100 {
            delay.process(0.0);
        }

        delay.process(1.0);
        let delay_samples = (0.01 * sample_rate) as usize;
        let mut peak_at = 0;
        let mut peak = 0.0_f32;
        for i in 1..delay_samples * 2 {
            let out = delay.process(0.0);
            if out.abs() > peak {
                peak = out.abs();
                peak_at = i;
            }
        }
        assert!(peak > 0.5, "impulse should come back, peak {peak}");
        assert!(
            (peak_at as i64 - delay_samples as i64).abs() <= 1,
            "echo at {peak_at}, expected ~{delay_samples}"
        );
    }

    #[test]
    fn feedback_attenuates_successive_echoes() {
        let sample_rate = 1000.0;
        let mut delay = Delay::new(sample_rate);
        delay.set_time(0.01); // 10 samples
        delay.set_feedback(0.5);
        for _ in 0..10_000 {
            delay.process(0.0);
        }

        delay.process(1.0);
        let mut echoes = Vec::new();
        for _ in 0..40 {
            let out = delay.process(0.0);
            if out.abs() > 0.1 {
                echoes.push(out);
            }
        }
        assert!(echoes.len() >= 2, "expected at least two echoes");
        assert!(
            echoes[1].abs() < echoes[0].abs(),
            "second echo should be quieter: {echoes:?}"
        );
    }

    #[test]
    fn silence_in_silence_out() {
        let mut delay = Delay::new(44100.0);
        for _ in 0..1000 {
            assert_eq!(delay.process(0.0), 0.0);
        }
    }
}
