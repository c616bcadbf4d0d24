//! Reverb — Schroeder-style algorithmic reverb on the melodic send bus.
//!
//! Parallel comb filters followed by series allpass filters, tuned from a
//! (duration, decay) pair describing the synthetic decaying-noise character
//! of the original impulse response.

/// A comb filter delay line with damped feedback.
#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filterstore: f32,
}

impl CombFilter {
    fn new(size: usize, feedback: f32, damp: f32) -> Self {
        CombFilter {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            feedback,
            damp1: damp,
            damp2: 1.0 - damp,
            filterstore: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];

        // Lowpass in the feedback path (damping)
        self.filterstore = output * self.damp2 + self.filterstore * self.damp1;

        self.buffer[self.index] = input + self.filterstore * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();

        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filterstore = 0.0;
    }
}

/// An allpass filter delay line.
#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
}

impl AllpassFilter {
    fn new(size: usize) -> Self {
        AllpassFilter {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            feedback: 0.5,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let bufout = self.buffer[self.index];
        let output = bufout - input;

        self.buffer[self.index] = input + bufout * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();

        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

// Tuning constants (scaled for 44100 Hz sample rate)
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];

/// A mono algorithmic reverb. Returns the wet signal only.
#[derive(Debug, Clone)]
pub struct Reverb {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
    gain: f32,
}

impl Reverb {
    /// Build a reverb whose tail approximates a decaying-noise impulse of
    /// the given duration (seconds) and decay exponent.
    pub fn new(sample_rate: f64, duration: f64, decay: f64) -> Self {
        // Longer impulse ⇒ more comb feedback; steeper decay ⇒ more damping.
        let room = (duration / 3.0).clamp(0.0, 1.0) as f32;
        let damp = (decay / 4.0).clamp(0.0, 1.0) as f32;
        let feedback = 0.7 + room * 0.28;

        let scale = sample_rate / 44100.0;
        let combs = COMB_TUNING
            .iter()
            .map(|&n| CombFilter::new((n as f64 * scale) as usize, feedback, damp * 0.4))
            .collect();
        let allpasses = ALLPASS_TUNING
            .iter()
            .map(|&n| AllpassFilter::new((n as f64 * scale) as usize))
            .collect();

        Reverb {
            combs,
            allpasses,
            gain: 0.015,
        }
    }

    /// Process one sample; returns the reverberated (wet) signal.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let attenuated = input * self.gain;
        let mut out = 0.0;
        for comb in self.combs.iter_mut() {
            out += comb.process(attenuated);
        }
        for allpass in self.allpasses.iter_mut() {
            out = allpass.process(out);
        }
        out
    }

    pub fn clear(&mut self) {
        for c in self.combs.iter_mut() {
            c.clear();
        }
        for a in self.allpasses.iter_mut() {
            a.clear();
        }
    }
}
