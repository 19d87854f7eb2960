//! Sub-bass voice.
//!
//! A slow sine an octave or two under everything else. It fires on the
//! chord root every seventh byte-count, so it acts as an irregular pulse
//! under the melody.
//!
//! # Variations
//!
//! - Triangle = audible on small speakers
//! - Shorter attack = more of a kick than a swell

use crate::dsp::{envelope::Adsr, oscillator::Waveform};

use super::Patch;

/// Create the sub-bass patch.
pub fn bass() -> Patch {
    Patch {
        waveform: Waveform::Sine,
        adsr: Adsr::new(0.3, 0.8, 0.6, 2.0),
        gain: 0.9,
        polyphony: 4,
    }
}
