//! Scale generation and session key selection.
//!
//! A scale is built by walking the chromatic alphabet from a root pitch by a
//! list of semitone steps. The octave number carries whenever the chromatic
//! index wraps past B. A single step that covers a whole octave or more is
//! not detected as a wrap; step patterns are expected to use small intervals.

use std::ops::Index;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use super::notes::{Pitch, PitchClass};

/// Natural minor (aeolian) step pattern in semitones.
pub const NATURAL_MINOR: [u8; 7] = [2, 1, 2, 2, 1, 2, 2];

/// Default key pool a session picks its tonic from.
pub const DEFAULT_KEYS: [PitchClass; 6] = [
    PitchClass::F,
    PitchClass::D,
    PitchClass::G,
    PitchClass::C,
    PitchClass::DS,
    PitchClass::AS,
];

/// Ordered pitches of a scale. Always `steps.len() + 1` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    pitches: Vec<Pitch>,
}

impl Scale {
    /// Walk the chromatic alphabet from `root` by each interval in `steps`.
    pub fn generate(root: Pitch, steps: &[u8]) -> Self {
        let mut pitches = Vec::with_capacity(steps.len() + 1);
        pitches.push(root);

        let mut index = root.class.index();
        let mut octave = root.octave;
        for &step in steps {
            let next = ((index as u16 + step as u16) % 12) as u8;
            if next < index {
                octave = octave.saturating_add(1);
            }
            index = next;
            pitches.push(PitchClass::from_index(index).at(octave));
        }

        Self { pitches }
    }

    pub fn root(&self) -> Pitch {
        self.pitches[0]
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Pitch at `seed mod len`. Used to map packet sizes onto the scale.
    pub fn degree(&self, seed: u32) -> Pitch {
        self.pitches[seed as usize % self.pitches.len()]
    }

    pub fn pitches(&self) -> &[Pitch] {
        &self.pitches
    }
}

impl Index<usize> for Scale {
    type Output = Pitch;

    fn index(&self, index: usize) -> &Self::Output {
        &self.pitches[index]
    }
}

/// The melody and bass scales of one session, sharing a tonic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scales {
    pub key: PitchClass,
    pub melody: Scale,
    pub bass: Scale,
}

impl Scales {
    pub fn new(key: PitchClass, steps: &[u8], melody_octave: i8, bass_octave: i8) -> Self {
        Self {
            key,
            melody: Scale::generate(key.at(melody_octave), steps),
            bass: Scale::generate(key.at(bass_octave), steps),
        }
    }
}

/// How a session picks its key from the pool.
///
/// `Fixed` and `Seeded` make scale output reproducible in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyChoice {
    Fixed(PitchClass),
    Seeded(u64),
    Random,
}

impl KeyChoice {
    /// Resolve to a concrete key. `pool` must be non-empty.
    pub fn select(self, pool: &[PitchClass]) -> PitchClass {
        match self {
            KeyChoice::Fixed(key) => key,
            KeyChoice::Seeded(seed) => pick(pool, &mut StdRng::seed_from_u64(seed)),
            KeyChoice::Random => pick(pool, &mut rand::thread_rng()),
        }
    }
}

fn pick<R: Rng>(pool: &[PitchClass], rng: &mut R) -> PitchClass {
    pool.choose(rng).copied().unwrap_or(PitchClass::C)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(scale: &Scale) -> Vec<String> {
        scale.pitches().iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn f_minor_matches_reference() {
        let scale = Scale::generate(PitchClass::F.at(4), &NATURAL_MINOR);
        assert_eq!(
            names(&scale),
            ["F4", "G4", "G#4", "A#4", "C5", "C#5", "D#5", "F5"]
        );
    }

    #[test]
    fn every_default_key_yields_eight_ascending_pitches() {
        for key in DEFAULT_KEYS {
            for octave in [3, 4] {
                let root = key.at(octave);
                let scale = Scale::generate(root, &NATURAL_MINOR);

                assert_eq!(scale.len(), 8);
                assert_eq!(scale.root(), root);
                assert!(
                    scale.pitches().windows(2).all(|w| w[0].octave <= w[1].octave),
                    "octaves must not decrease in {:?}",
                    names(&scale)
                );
                // One full octave above the root
                assert_eq!(scale[7].midi(), root.midi() + 12);
            }
        }
    }

    #[test]
    fn octave_carries_on_wrap() {
        let scale = Scale::generate(PitchClass::AS.at(3), &[2, 1]);
        assert_eq!(names(&scale), ["A#3", "C4", "C#4"]);
    }

    #[test]
    fn full_octave_step_is_not_detected() {
        // Known limitation: a 12-semitone step lands on the same index.
        let scale = Scale::generate(PitchClass::C.at(4), &[12]);
        assert_eq!(names(&scale), ["C4", "C4"]);
    }

    #[test]
    fn octave_saturates_at_the_top() {
        let scale = Scale::generate(PitchClass::AS.at(i8::MAX), &[2, 1]);
        assert_eq!(scale[1].octave, i8::MAX);
        assert_eq!(scale[2].class, PitchClass::from_index(1));
    }

    #[test]
    fn degree_wraps_by_length() {
        let scale = Scale::generate(PitchClass::F.at(4), &NATURAL_MINOR);
        assert_eq!(scale.degree(21).to_string(), "C#5");
        assert_eq!(scale.degree(8).to_string(), "F4");
    }

    #[test]
    fn seeded_choice_is_reproducible() {
        let a = KeyChoice::Seeded(42).select(&DEFAULT_KEYS);
        let b = KeyChoice::Seeded(42).select(&DEFAULT_KEYS);
        assert_eq!(a, b);
        assert!(DEFAULT_KEYS.contains(&a));
    }

    #[test]
    fn fixed_choice_ignores_pool() {
        assert_eq!(KeyChoice::Fixed(PitchClass::G).select(&DEFAULT_KEYS), PitchClass::G);
    }

    #[test]
    fn scales_share_tonic_an_octave_apart() {
        let scales = Scales::new(PitchClass::D, &NATURAL_MINOR, 4, 3);
        assert_eq!(scales.melody.root().midi(), scales.bass.root().midi() + 12);
    }
}
