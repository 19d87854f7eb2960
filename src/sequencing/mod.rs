pub mod chord;
pub mod duration;
pub mod notes;
pub mod scale;

pub use chord::{Chord, ChordTable};
pub use duration::{Duration, NoteLength};
pub use notes::{Pitch, PitchClass};
pub use scale::{KeyChoice, Scale, Scales, NATURAL_MINOR};
