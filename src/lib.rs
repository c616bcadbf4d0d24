pub mod drums;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod persist;
pub mod renderer;
pub mod sequencer;
pub mod session;
pub mod synth;

pub use crate::engine::AudioEngine;
pub use crate::error::StepwaveError;
pub use crate::pattern::{Note, PitchClass};
pub use crate::session::{ChannelId, DrumChannelId, Session, SynthChannelId};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Standard rate used by the engine when the host does not dictate one.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Build a ready-to-play engine at the default sample rate.
pub fn new_engine() -> AudioEngine {
    AudioEngine::new(DEFAULT_SAMPLE_RATE)
}
