/*
Pitch Names
===========

Pitches are written the way a keyboard player names them: a letter, an
optional accidental, and an octave number.

  "C4"   middle C (MIDI 60)
  "D#4"  D sharp above middle C (MIDI 63)
  "Bb3"  accepted on input, printed back as "A#3"

The chromatic alphabet used for output is fixed at 12 symbols, sharps only:

  index:  0   1    2   3    4   5   6    7   8    9   10   11
  name:   C   C#   D   D#   E   F   F#   G   G#   A   A#   B

The MIDI formula: note_number = 12 * (octave + 1) + index
A4 (MIDI 69) is the 440 Hz tuning reference.
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PitchParseError;

/// The 12-symbol chromatic alphabet, sharps canonical.
pub const CHROMATIC: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the 12 pitch classes (index into [`CHROMATIC`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);
    pub const D: PitchClass = PitchClass(2);
    pub const DS: PitchClass = PitchClass(3);
    pub const F: PitchClass = PitchClass(5);
    pub const G: PitchClass = PitchClass(7);
    pub const AS: PitchClass = PitchClass(10);

    /// Build from a chromatic index, wrapping modulo 12.
    pub const fn from_index(index: u8) -> Self {
        PitchClass(index % 12)
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        CHROMATIC[self.0 as usize]
    }

    /// Attach an octave number.
    pub const fn at(self, octave: i8) -> Pitch {
        Pitch {
            class: self,
            octave,
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = PitchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (class, _, rest) = split_class(s)?;
        if !rest.is_empty() {
            return Err(PitchParseError {
                name: s.to_string(),
                reason: "unexpected trailing characters",
            });
        }
        Ok(class)
    }
}

impl TryFrom<String> for PitchClass {
    type Error = PitchParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchClass> for String {
    fn from(value: PitchClass) -> Self {
        value.name().to_string()
    }
}

/// A named pitch: pitch class plus octave number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pitch {
    pub class: PitchClass,
    pub octave: i8,
}

impl Pitch {
    /// MIDI note number, clamped into the 0-127 range.
    pub fn midi(self) -> u8 {
        let number = 12 * (self.octave as i16 + 1) + self.class.index() as i16;
        number.clamp(0, 127) as u8
    }

    /// Equal-tempered frequency in Hz (A4 = 440 Hz).
    pub fn frequency(self) -> f32 {
        midi_note_to_freq(self.midi())
    }
}

/// Convert MIDI note number to frequency in Hz.
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class.name(), self.octave)
    }
}

impl FromStr for Pitch {
    type Err = PitchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (class, carry, rest) = split_class(s)?;
        let octave = rest
            .parse::<i8>()
            .ok()
            .and_then(|octave| octave.checked_add(carry))
            .ok_or_else(|| PitchParseError {
                name: s.to_string(),
                reason: "missing or malformed octave number",
            })?;
        Ok(class.at(octave))
    }
}

impl TryFrom<String> for Pitch {
    type Error = PitchParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pitch> for String {
    fn from(value: Pitch) -> Self {
        value.to_string()
    }
}

/// Split `"D#4"` into (`D#`, 0, `"4"`). Accepts `#`/`s` for sharp and `b` for flat.
///
/// The middle value is the octave carry when an accidental crosses B/C:
/// `Cb4` is `B3` (-1), `B#3` is `C4` (+1).
fn split_class(s: &str) -> Result<(PitchClass, i8, &str), PitchParseError> {
    let err = |reason| PitchParseError {
        name: s.to_string(),
        reason,
    };

    let mut chars = s.chars();
    let letter = chars.next().ok_or_else(|| err("empty pitch name"))?;
    let natural: i8 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(err("unknown note letter")),
    };

    let rest = &s[letter.len_utf8()..];
    let (shift, rest) = match rest.chars().next() {
        Some('#') | Some('s') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    let semitone = natural + shift;
    let index = semitone.rem_euclid(12) as u8;
    Ok((PitchClass::from_index(index), semitone.div_euclid(12), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_c_is_60() {
        let c4: Pitch = "C4".parse().unwrap();
        assert_eq!(c4.midi(), 60);
    }

    #[test]
    fn a440_is_69() {
        let a4: Pitch = "A4".parse().unwrap();
        assert_eq!(a4.midi(), 69);
        assert!((a4.frequency() - 440.0).abs() < 1e-3);
    }

    #[test]
    fn sharps_round_trip_and_flats_normalise() {
        let ds: Pitch = "D#4".parse().unwrap();
        assert_eq!(ds.to_string(), "D#4");

        let eb: Pitch = "Eb4".parse().unwrap();
        assert_eq!(eb, ds);
        assert_eq!(eb.to_string(), "D#4");

        let cs: Pitch = "Cs3".parse().unwrap();
        assert_eq!(cs.to_string(), "C#3");
    }

    #[test]
    fn accidentals_carry_across_b_and_c() {
        let cb: Pitch = "Cb4".parse().unwrap();
        assert_eq!(cb.to_string(), "B3");
        assert_eq!(cb.midi(), 59);

        let bs: Pitch = "B#3".parse().unwrap();
        assert_eq!(bs.to_string(), "C4");
        assert_eq!(bs.midi(), 60);

        // Pitch classes have no octave to carry into
        assert_eq!("Cb".parse::<PitchClass>().unwrap().name(), "B");
    }

    #[test]
    fn octaves_are_12_apart() {
        let c3: Pitch = "C3".parse().unwrap();
        let c4: Pitch = "C4".parse().unwrap();
        assert_eq!(c4.midi() - c3.midi(), 12);
    }

    #[test]
    fn rejects_bad_names() {
        assert!("H4".parse::<Pitch>().is_err());
        assert!("C#".parse::<Pitch>().is_err());
        assert!("".parse::<Pitch>().is_err());
        assert!("A#x".parse::<Pitch>().is_err());
    }

    #[test]
    fn pitch_class_parses_without_octave() {
        let class: PitchClass = "A#".parse().unwrap();
        assert_eq!(class, PitchClass::AS);
        assert!("A#4".parse::<PitchClass>().is_err());
    }
}
