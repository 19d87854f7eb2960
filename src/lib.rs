pub mod config;
pub mod dsp; // Oscillators and envelopes
pub mod engine; // Session, scheduling and the sound-device boundary
pub mod error;
pub mod network;
pub mod packet;
pub mod sequencing; // Pitches, scales, chords and note lengths
pub mod sonify;
pub mod synth; // Voice management and polyphony
pub mod voices;

pub use error::{Error, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
