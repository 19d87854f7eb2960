//! Synth patches for each sonification voice.
//!
//! A [`Patch`] is the recipe a [`PolySynth`](crate::synth::poly::PolySynth)
//! builds its voices from: one oscillator through one ADSR envelope, a
//! channel gain and a voice budget. Patches are plain data, so a session
//! can swap any of them out.
//!
//! # Example
//!
//! ```ignore
//! use netsonify::{sonify::Voice, voices};
//!
//! let melody = voices::melody();
//! let pad = voices::patch(Voice::Pad);
//! ```

mod bass;
mod harmony;
mod melody;
mod pad;
mod percussion;

pub use bass::bass;
pub use harmony::harmony;
pub use melody::melody;
pub use pad::pad;
pub use percussion::percussion;

use serde::{Deserialize, Serialize};

use crate::{
    dsp::{envelope::Adsr, oscillator::Waveform},
    sonify::Voice,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub waveform: Waveform,
    pub adsr: Adsr,
    /// Linear channel gain applied when the voices are mixed.
    pub gain: f32,
    /// Simultaneous notes before voice stealing kicks in.
    pub polyphony: usize,
}

/// Convert decibels to linear gain.
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// The stock patch for `voice`.
pub fn patch(voice: Voice) -> Patch {
    match voice {
        Voice::Melody => melody(),
        Voice::Harmony => harmony(),
        Voice::Bass => bass(),
        Voice::Percussion => percussion(),
        Voice::Pad => pad(),
    }
}
