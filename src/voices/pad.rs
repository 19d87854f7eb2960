//! Pad voice - sustained, atmospheric texture.
//!
//! Held sawtooth chords for IGMP. A pad stays on until the next pad chord
//! replaces it, so it works as a slowly changing backdrop.
//!
//! # How It Works
//!
//! 1. Sawtooth oscillator for a full harmonic spectrum
//! 2. Slow attack (300ms) for gradual fade-in
//! 3. High sustain keeps the sound alive while held
//! 4. Long release (500ms) for smooth hand-over to the next chord
//!
//! # Variations
//!
//! - Lower gain = more ambient, less present

use crate::dsp::{envelope::Adsr, oscillator::Waveform};

use super::Patch;

/// Create a pad patch - lush, sustained texture.
pub fn pad() -> Patch {
    Patch {
        waveform: Waveform::Sawtooth,
        adsr: Adsr::new(0.3, 0.1, 0.8, 0.5),
        gain: 0.25,
        polyphony: 6,
    }
}
