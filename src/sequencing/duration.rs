use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DurationParseError;

/// Musical note duration represented as a rational fraction of a whole note.
/// All operations preserve exact ratios; conversion to seconds happens last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    /// Numerator: how many parts
    pub numerator: u32,
    /// Denominator: of what size (4 = quarter, 8 = eighth, etc.)
    pub denominator: u32,
}

impl Duration {
    pub const WHOLE: Duration = Duration {
        numerator: 1,
        denominator: 1,
    };
    pub const HALF: Duration = Duration {
        numerator: 1,
        denominator: 2,
    };
    pub const QUARTER: Duration = Duration {
        numerator: 1,
        denominator: 4,
    };
    pub const EIGHTH: Duration = Duration {
        numerator: 1,
        denominator: 8,
    };
    pub const SIXTEENTH: Duration = Duration {
        numerator: 1,
        denominator: 16,
    };

    /// Apply a dot: multiply duration by 3/2
    pub const fn dotted(self) -> Self {
        Duration {
            numerator: self.numerator * 3,
            denominator: self.denominator * 2,
        }
    }

    /// Triplet: three notes in the time of two (multiply by 2/3)
    pub const fn triplet(self) -> Self {
        Duration {
            numerator: self.numerator * 2,
            denominator: self.denominator * 3,
        }
        .reduce()
    }

    /// Reduce the fraction to lowest terms using GCD
    pub const fn reduce(self) -> Self {
        let gcd = const_gcd(self.numerator, self.denominator);
        Duration {
            numerator: self.numerator / gcd,
            denominator: self.denominator / gcd,
        }
    }

    /// Length in seconds at the given tempo (quarter note = one beat).
    ///
    /// seconds = (numerator / denominator) * 4 beats * (60 / bpm)
    pub fn to_seconds(self, bpm: f64) -> f64 {
        (self.numerator as f64 * 4.0 * 60.0) / (self.denominator as f64 * bpm)
    }
}

/// Compute greatest common divisor (Euclidean algorithm)
const fn const_gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}

/// Parses transport-style notation: `"4n"` quarter, `"8n."` dotted eighth,
/// `"8t"` eighth triplet, `"1n"` whole.
impl FromStr for Duration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| DurationParseError {
            text: s.to_string(),
            reason,
        };

        let (body, dotted) = match s.strip_suffix('.') {
            Some(body) => (body, true),
            None => (s, false),
        };
        let (digits, triplet) = if let Some(d) = body.strip_suffix('n') {
            (d, false)
        } else if let Some(d) = body.strip_suffix('t') {
            (d, true)
        } else {
            return Err(err("expected an 'n' or 't' suffix"));
        };

        let denominator: u32 = digits.parse().map_err(|_| err("expected a note value"))?;
        if denominator == 0 || !denominator.is_power_of_two() || denominator > 64 {
            return Err(err("note value must be a power of two up to 64"));
        }

        let mut duration = Duration {
            numerator: 1,
            denominator,
        };
        if triplet {
            duration = duration.triplet();
        }
        if dotted {
            duration = duration.dotted();
        }
        Ok(duration.reduce())
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.reduce();
        match (d.numerator, d.denominator) {
            (1, den) if den % 3 == 0 => write!(f, "{}t", den / 3 * 2),
            (1, den) => write!(f, "{den}n"),
            (3, den) if den % 2 == 0 => write!(f, "{}n.", den / 2),
            (num, den) => write!(f, "{num}/{den}"),
        }
    }
}

/// How long a sonified note sounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "LengthRepr")]
pub enum NoteLength {
    /// Tempo-relative note value.
    Note(Duration),
    /// Absolute length in seconds.
    Seconds(f32),
    /// Sustained until explicitly released.
    Hold,
}

impl NoteLength {
    /// Seconds at `bpm`, or `None` for held notes.
    pub fn seconds(self, bpm: f64) -> Option<f64> {
        match self {
            NoteLength::Note(d) => Some(d.to_seconds(bpm)),
            NoteLength::Seconds(s) => Some(s as f64),
            NoteLength::Hold => None,
        }
    }
}

impl fmt::Display for NoteLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteLength::Note(d) => write!(f, "{d}"),
            NoteLength::Seconds(s) => write!(f, "{s}s"),
            NoteLength::Hold => f.write_str("hold"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Seconds(f32),
    Text(String),
}

impl TryFrom<LengthRepr> for NoteLength {
    type Error = DurationParseError;

    fn try_from(value: LengthRepr) -> Result<Self, Self::Error> {
        match value {
            LengthRepr::Seconds(s) if s > 0.0 && s.is_finite() => Ok(NoteLength::Seconds(s)),
            LengthRepr::Seconds(s) => Err(DurationParseError {
                text: s.to_string(),
                reason: "length in seconds must be positive",
            }),
            LengthRepr::Text(text) if text.eq_ignore_ascii_case("hold") => Ok(NoteLength::Hold),
            LengthRepr::Text(text) => text.parse().map(NoteLength::Note),
        }
    }
}

impl From<NoteLength> for LengthRepr {
    fn from(value: NoteLength) -> Self {
        match value {
            NoteLength::Seconds(s) => LengthRepr::Seconds(s),
            other => LengthRepr::Text(other.to_string()),
        }
    }
}
