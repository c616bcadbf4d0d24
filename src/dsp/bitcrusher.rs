//! Bitcrusher — a memoryless waveshaping distortion.
//!
//! The shaping curve is the classic "amount"-parameterized arctangent-like
//! transfer function:
//!
//! ```text
//! y = ((3 + k) · x · 57 · π / 180) / (π + k · |x|)      k = amount · 100
//! ```
//!
//! Evaluated directly per sample rather than via a lookup table, so changing
//! the amount never glitches mid-buffer.

use std::f64::consts::PI;

use crate::dsp::param::Smoothed;

#[derive(Debug, Clone)]
pub struct Bitcrusher {
    amount: Smoothed,
}

impl Bitcrusher {
    pub fn new(sample_rate: f64) -> Self {
        Bitcrusher {
            amount: Smoothed::new(0.0, Smoothed::DEFAULT_TAU, sample_rate),
        }
    }

    /// Set distortion amount (0.0 = clean, 1.0 = maximum drive).
    pub fn set_amount(&mut self, amount: f64) {
        self.amount.set_target(amount.clamp(0.0, 1.0));
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let k = self.amount.tick() * 100.0;
        let x = input as f64;
        let shaped = ((3.0 + k) * x * 57.0 * PI / 180.0) / (PI + k * x.abs());
        shaped as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amount_is_near_linear() {
        // k = 0 reduces the curve to y = 3·57·π/180 / π · x ≈ 0.95 x.
        let mut crusher = Bitcrusher::new(44100.0);
        let out = crusher.process(0.5);
        assert!((out - 0.475).abs() < 0.01, "got {out}");
    }

    #[test]
    fn drive_compresses_peaks() {
        let mut crusher = Bitcrusher::new(44100.0);
        crusher.set_amount(1.0);
        // Let the smoothed amount settle.
        for _ in 0..44100 {
            crusher.process(0.0);
        }
        let small = crusher.process(0.01);
        let large = crusher.process(1.0);
        // Heavy drive: small signals gain a lot, large signals saturate.
        assert!(small / 0.01 > 10.0, "small-signal gain {}", small / 0.01);
        assert!(large / 1.0 < small / 0.01, "curve should flatten at peaks");
    }

    #[test]
    fn curve_is_odd_symmetric() {
        let mut a = Bitcrusher::new(44100.0);
        let mut b = Bitcrusher::new(44100.0);
        a.set_amount(0.7);
        b.set_amount(0.7);
        for _ in 0..44100 {
            a.process(0.0);
            b.process(0.0);
        }
        let pos = a.process(0.6);
        let neg = b.process(-0.6);
        assert!((pos + neg).abs() < 1e-6);
    }
}
