//! Low-level DSP primitives used by the synth voices.
//!
//! These components are allocation-free and realtime-safe, so they can be
//! embedded directly inside voice structs.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Oscillator waveforms, noise and portamento.
pub mod oscillator;

pub use envelope::{Adsr, EnvelopeStage};
pub use oscillator::Waveform;
