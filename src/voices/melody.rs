//! Melody voice.
//!
//! A pure sine lead that carries the per-packet scale notes. The soft
//! attack and long tail let consecutive notes overlap into a line rather
//! than a series of blips, and portamento slides between them.
//!
//! # How It Works
//!
//! 1. Sine oscillator, no harmonics to fight the pad or chords
//! 2. 200ms attack fades each packet in
//! 3. Half sustain with a 1.5s release keeps the line legato
//!
//! # Variations
//!
//! - Triangle instead of sine = a little more bite
//! - Shorter release = staccato, one note per packet

use crate::dsp::{envelope::Adsr, oscillator::Waveform};

use super::Patch;

/// Create the melody patch.
pub fn melody() -> Patch {
    Patch {
        waveform: Waveform::Sine,
        adsr: Adsr::new(0.2, 0.5, 0.5, 1.5),
        gain: 0.8,
        polyphony: 8,
    }
}
