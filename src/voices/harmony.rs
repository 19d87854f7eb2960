//! Harmony voice.
//!
//! Dark sine chords for TCP traffic, mixed 10 dB under the melody so the
//! chord tones read as background.
//!
//! # How It Works
//!
//! 1. Sine oscillator per chord tone
//! 2. 150ms attack, high sustain (0.7) and a 1.8s release
//! 3. Eight voices so two full triads can ring over each other

use crate::dsp::{envelope::Adsr, oscillator::Waveform};

use super::{db_to_gain, Patch};

/// Create the harmony patch.
pub fn harmony() -> Patch {
    Patch {
        waveform: Waveform::Sine,
        adsr: Adsr::new(0.15, 0.6, 0.7, 1.8),
        gain: db_to_gain(-10.0),
        polyphony: 8,
    }
}
