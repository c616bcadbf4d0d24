//! Output limiter — a feed-forward compressor with a soft knee, fixed at
//! limiting-friendly settings and placed last on the master bus to stop the
//! summed sends from clipping.

/// A mono dynamics compressor.
///
/// Level detection runs in dB with separate attack and release smoothing on
/// the gain-reduction signal.
#[derive(Debug, Clone)]
pub struct Compressor {
    threshold_db: f32,
    knee_db: f32,
    ratio: f32,
    attack_coeff: f32,
    release_coeff: f32,
    envelope_db: f32,
}

const LIMITER_THRESHOLD_DB: f32 = -10.0;
const LIMITER_KNEE_DB: f32 = 30.0;
const LIMITER_RATIO: f32 = 4.0;
const LIMITER_ATTACK: f64 = 0.01;
const LIMITER_RELEASE: f64 = 0.1;

impl Compressor {
    /// Build the master-bus limiter.
    pub fn limiter(sample_rate: f64) -> Self {
        Compressor {
            threshold_db: LIMITER_THRESHOLD_DB,
            knee_db: LIMITER_KNEE_DB,
            ratio: LIMITER_RATIO,
            attack_coeff: (-1.0 / (LIMITER_ATTACK * sample_rate)).exp() as f32,
            release_coeff: (-1.0 / (LIMITER_RELEASE * sample_rate)).exp() as f32,
            envelope_db: 0.0,
        }
    }

    /// Gain reduction (dB, negative) for an input level in dB, with a soft
    /// knee spanning [threshold - knee/2, threshold + knee/2].
    fn gain_reduction_db(&self, level_db: f32) -> f32 {
        let half_knee = self.knee_db / 2.0;
        let over = level_db - self.threshold_db;

        if over <= -half_knee {
            0.0
        } else if over >= half_knee {
            over * (1.0 / self.ratio - 1.0)
        } else {
            // Quadratic interpolation through the knee.
            let x = over + half_knee;
            (1.0 / self.ratio - 1.0) * x * x / (2.0 * self.knee_db)
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let level = input.abs().max(1e-6);
        let level_db = 20.0 * level.log10();

        let target_gr = self.gain_reduction_db(level_db);

        // More reduction = attack, less = release.
        let coeff = if target_gr < self.envelope_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope_db = target_gr + (self.envelope_db - target_gr) * coeff;

        input * 10.0_f32.powf(self.envelope_db / 20.0)
    }

    pub fn reset(&mut self) {
        self.envelope_db = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_signal_passes_unchanged() {
        let mut comp = Compressor::limiter(44100.0);
        comp.reset();
        // -40 dB signal, well below threshold and knee.
        let input = 0.01_f32;
        let mut out = 0.0;
        for _ in 0..44100 {
            out = comp.process(input);
        }
        assert!(
            (out - input).abs() / input < 0.05,
            "quiet signal should pass, got {out}"
        );
    }

    #[test]
    fn loud_signal_is_reduced() {
        let mut comp = Compressor::limiter(44100.0);
        comp.reset();
        // 0 dB steady input is 10 dB over threshold.
        let mut out = 0.0_f32;
        for _ in 0..44100 {
            out = comp.process(1.0);
        }
        assert!(out < 0.9, "loud signal should be attenuated, got {out}");
        assert!(out > 0.1, "limiter should not mute, got {out}");
    }

    #[test]
    fn attack_is_faster_than_release() {
        let mut comp = Compressor::limiter(44100.0);
        comp.reset();

        // Hit with a loud burst, measure samples until most reduction applies.
        let mut attack_samples = 0;
        for i in 0..44100 {
            let out = comp.process(1.0);
            if out < 0.8 {
                attack_samples = i;
                break;
            }
        }

        // Drop to quiet, measure samples until gain mostly recovers.
        let mut release_samples = 44100;
        for i in 0..44100 {
            let out = comp.process(0.01);
            if out > 0.009 {
                release_samples = i;
                break;
            }
        }

        assert!(
            attack_samples < release_samples,
            "attack {attack_samples} should beat release {release_samples}"
        );
    }

    #[test]
    fn output_is_finite_for_silence() {
        let mut comp = Compressor::limiter(44100.0);
        for _ in 0..1000 {
            assert!(comp.process(0.0).is_finite());
        }
    }
}
