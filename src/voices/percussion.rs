//! Percussion voice.
//!
//! A noise burst with no sustain: a short tick for each ICMP packet. The
//! pitch it is given is ignored by the noise source.

use crate::dsp::{envelope::Adsr, oscillator::Waveform};

use super::Patch;

/// Create the percussion patch.
pub fn percussion() -> Patch {
    Patch {
        waveform: Waveform::Noise,
        adsr: Adsr::new(0.001, 0.1, 0.0, 0.05),
        gain: 0.4,
        polyphony: 4,
    }
}
