//! Signal-processing building blocks: oscillators, filters, parameter
//! smoothing, and the send effects that make up the master bus.

pub mod bitcrusher;
pub mod chorus;
pub mod compressor;
pub mod delay;
pub mod drone;
pub mod filter;
pub mod flanger;
pub mod master;
pub mod noise;
pub mod oscillator;
pub mod param;
pub mod reverb;
pub mod tremolo;
