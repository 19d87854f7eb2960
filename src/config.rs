//! Static session configuration.
//!
//! Everything here is fixed before a session starts. Defaults reproduce the
//! canonical mapping, so an empty TOML document is a valid configuration.
//!
//! ```toml
//! interval = 0.4
//! keys = ["D", "A#"]
//!
//! [routes]
//! other = "harmony"
//!
//! [velocity.melody]
//! cap = 0.8
//! divisor = 2000.0
//! ```

use std::path::Path;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::{
    error::{Error, Result},
    packet::Protocol,
    sequencing::{
        notes::PitchClass,
        scale::{DEFAULT_KEYS, NATURAL_MINOR},
        Chord, ChordTable, Duration, NoteLength,
    },
    sonify::Voice,
};

/// Octaves whose scales stay inside the MIDI note range.
const OCTAVE_RANGE: std::ops::RangeInclusive<i8> = -1..=8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds between scheduler ticks (one packet played per tick).
    pub interval: f64,
    /// Tempo used to turn note values like `"8n"` into seconds.
    pub bpm: f64,
    /// Pool the session key is drawn from.
    pub keys: Vec<PitchClass>,
    /// Semitone steps of the scale.
    pub steps: Vec<u8>,
    pub melody_octave: i8,
    pub bass_octave: i8,
    pub chords: Vec<Chord>,
    /// Seconds between background chord changes; `None` keeps the first chord.
    pub chord_advance: Option<f64>,
    /// Melody glide time in seconds once a previous melody note exists.
    pub portamento: f32,
    pub sub_bass_velocity: f32,
    /// Oldest edges are evicted past this many; unbounded when `None`.
    pub max_edges: Option<usize>,
    pub routes: RouteTable,
    pub velocity: VelocityTable,
    pub lengths: LengthTable,
    pub large_packet: LargePacketRule,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval: 0.5,
            bpm: 120.0,
            keys: DEFAULT_KEYS.to_vec(),
            steps: NATURAL_MINOR.to_vec(),
            melody_octave: 4,
            bass_octave: 3,
            chords: ChordTable::minor_progression().chords().to_vec(),
            chord_advance: None,
            portamento: 0.1,
            sub_bass_velocity: 0.5,
            max_edges: None,
            routes: RouteTable::default(),
            velocity: VelocityTable::default(),
            lengths: LengthTable::default(),
            large_packet: LargePacketRule::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SessionConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if !(self.interval > 0.0 && self.interval.is_finite()) {
            return invalid("interval must be a positive number of seconds");
        }
        if !(self.bpm > 0.0 && self.bpm.is_finite()) {
            return invalid("bpm must be positive");
        }
        for octave in [self.melody_octave, self.bass_octave] {
            if !OCTAVE_RANGE.contains(&octave) {
                return invalid("melody_octave and bass_octave must be within -1..=8");
            }
        }
        if self.keys.is_empty() {
            return invalid("key pool must not be empty");
        }
        if self.steps.is_empty() || self.steps.contains(&0) {
            return invalid("step pattern must be non-empty positive intervals");
        }
        if self.chords.is_empty() {
            return invalid("chord table must not be empty");
        }
        if let Some(every) = self.chord_advance {
            if !(every > 0.0 && every.is_finite()) {
                return invalid("chord_advance must be positive when set");
            }
        }
        if self.portamento < 0.0 {
            return invalid("portamento must not be negative");
        }
        if !(0.0..=1.0).contains(&self.sub_bass_velocity) {
            return invalid("sub_bass_velocity must be within 0..=1");
        }
        if self.max_edges == Some(0) {
            return invalid("max_edges must be at least 1 when set");
        }
        for (name, curve) in self.velocity.curves() {
            if !(curve.divisor > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "velocity.{name}.divisor must be positive"
                )));
            }
            if !(0.0..=1.0).contains(&curve.cap) || !(0.0..=1.0).contains(&curve.gain) {
                return Err(Error::InvalidConfig(format!(
                    "velocity.{name} cap and gain must be within 0..=1"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.large_packet.velocity_scale) {
            return invalid("large_packet.velocity_scale must be within 0..=1");
        }
        Ok(())
    }
}

/// Protocol to voice table. A protocol mapped to nothing is unmapped;
/// in TOML that is spelled `"none"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteTable {
    #[serde(deserialize_with = "route_entry")]
    pub udp: Option<Voice>,
    #[serde(deserialize_with = "route_entry")]
    pub tcp: Option<Voice>,
    #[serde(deserialize_with = "route_entry")]
    pub icmp: Option<Voice>,
    #[serde(deserialize_with = "route_entry")]
    pub igmp: Option<Voice>,
    #[serde(deserialize_with = "route_entry")]
    pub other: Option<Voice>,
}

fn route_entry<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Voice>, D::Error> {
    let name = String::deserialize(deserializer)?;
    if name.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Voice::ALL
        .into_iter()
        .find(|voice| voice.name().eq_ignore_ascii_case(&name))
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("unknown voice {name:?}")))
}

impl RouteTable {
    pub fn route(&self, protocol: Protocol) -> Option<Voice> {
        match protocol {
            Protocol::Udp => self.udp,
            Protocol::Tcp => self.tcp,
            Protocol::Icmp => self.icmp,
            Protocol::Igmp => self.igmp,
            Protocol::Other => self.other,
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            udp: Some(Voice::Melody),
            tcp: Some(Voice::Harmony),
            icmp: Some(Voice::Percussion),
            igmp: Some(Voice::Pad),
            other: None,
        }
    }
}

/// `velocity = gain * min(cap, size / divisor)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VelocityCurve {
    pub cap: f32,
    pub divisor: f32,
    #[serde(default = "unit_gain")]
    pub gain: f32,
}

fn unit_gain() -> f32 {
    1.0
}

impl VelocityCurve {
    pub const fn new(cap: f32, divisor: f32, gain: f32) -> Self {
        Self { cap, divisor, gain }
    }

    pub fn apply(&self, size: u32) -> f32 {
        self.gain * self.cap.min(size as f32 / self.divisor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VelocityTable {
    pub melody: VelocityCurve,
    pub harmony: VelocityCurve,
    pub percussion: VelocityCurve,
    pub pad: VelocityCurve,
}

impl VelocityTable {
    /// Curve for a routed voice. The sub-bass uses a fixed velocity instead.
    pub fn curve(&self, voice: Voice) -> VelocityCurve {
        match voice {
            Voice::Melody | Voice::Bass => self.melody,
            Voice::Harmony => self.harmony,
            Voice::Percussion => self.percussion,
            Voice::Pad => self.pad,
        }
    }

    fn curves(&self) -> [(&'static str, VelocityCurve); 4] {
        [
            ("melody", self.melody),
            ("harmony", self.harmony),
            ("percussion", self.percussion),
            ("pad", self.pad),
        ]
    }
}

impl Default for VelocityTable {
    fn default() -> Self {
        Self {
            melody: VelocityCurve::new(0.6, 2500.0, 1.0),
            harmony: VelocityCurve::new(0.6, 2500.0, 0.7),
            percussion: VelocityCurve::new(0.8, 2000.0, 1.0),
            pad: VelocityCurve::new(0.3, 2000.0, 1.0),
        }
    }
}

/// Articulation per voice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LengthTable {
    pub melody: NoteLength,
    pub harmony: NoteLength,
    pub bass: NoteLength,
    pub percussion: NoteLength,
    pub pad: NoteLength,
}

impl LengthTable {
    pub fn length(&self, voice: Voice) -> NoteLength {
        match voice {
            Voice::Melody => self.melody,
            Voice::Harmony => self.harmony,
            Voice::Bass => self.bass,
            Voice::Percussion => self.percussion,
            Voice::Pad => self.pad,
        }
    }
}

impl Default for LengthTable {
    fn default() -> Self {
        Self {
            melody: NoteLength::Note(Duration::EIGHTH),
            harmony: NoteLength::Note(Duration::QUARTER),
            bass: NoteLength::Note(Duration::QUARTER),
            percussion: NoteLength::Note(Duration::SIXTEENTH),
            pad: NoteLength::Hold,
        }
    }
}

/// Packets above `threshold` bytes play softer and, with `reroute`, take
/// their melody pitch from the bass scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LargePacketRule {
    pub enabled: bool,
    pub threshold: u32,
    pub velocity_scale: f32,
    pub reroute: bool,
}

impl LargePacketRule {
    pub fn applies(&self, size: u32) -> bool {
        self.enabled && size > self.threshold
    }
}

impl Default for LargePacketRule {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 1000,
            velocity_scale: 0.8,
            reroute: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = SessionConfig::from_toml_str(
            r#"
            interval = 0.4
            keys = ["D", "A#"]
            chord_advance = 4.0

            [routes]
            other = "harmony"
            icmp = "melody"
            igmp = "none"

            [velocity.melody]
            cap = 0.8
            divisor = 2000.0

            [lengths]
            melody = 0.3
            "#,
        )
        .unwrap();

        assert_eq!(config.interval, 0.4);
        assert_eq!(config.keys, vec![PitchClass::D, PitchClass::AS]);
        assert_eq!(config.chord_advance, Some(4.0));
        assert_eq!(config.routes.route(Protocol::Other), Some(Voice::Harmony));
        assert_eq!(config.routes.route(Protocol::Icmp), Some(Voice::Melody));
        assert_eq!(config.routes.route(Protocol::Igmp), None);
        // untouched route keeps its default
        assert_eq!(config.routes.route(Protocol::Udp), Some(Voice::Melody));
        assert_eq!(config.velocity.melody.gain, 1.0);
        assert_eq!(config.lengths.melody, NoteLength::Seconds(0.3));
        assert_eq!(config.lengths.harmony, NoteLength::Note(Duration::QUARTER));
    }

    #[test]
    fn custom_chords_parse_from_pitch_names() {
        let config =
            SessionConfig::from_toml_str(r#"chords = [["F3", "G#3", "C4"], ["Eb3", "G3", "Bb3"]]"#)
                .unwrap();
        assert_eq!(config.chords.len(), 2);
        assert_eq!(config.chords[1][0].to_string(), "D#3");
    }

    #[test]
    fn rejects_unusable_values() {
        for doc in [
            "interval = 0.0",
            "keys = []",
            "steps = [2, 0, 2]",
            "chords = []",
            "max_edges = 0",
            "melody_octave = 127",
            "bass_octave = -2",
            "[velocity.harmony]\ncap = 0.5\ndivisor = 0.0",
        ] {
            let result = SessionConfig::from_toml_str(doc);
            assert!(
                matches!(result, Err(Error::InvalidConfig(_))),
                "expected rejection for {doc:?}"
            );
        }
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(
            SessionConfig::from_toml_str("chords = [[\"C3\", \"E3\"]]"),
            Err(Error::ConfigSyntax(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("keys = [\"H\"]"),
            Err(Error::ConfigSyntax(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("tempo = 90"),
            Err(Error::ConfigSyntax(_))
        ));
    }

    #[test]
    fn velocity_curve_caps() {
        let curve = VelocityCurve::new(0.6, 2500.0, 1.0);
        assert!((curve.apply(500) - 0.2).abs() < 1e-6);
        assert_eq!(curve.apply(100_000), 0.6);

        let quiet = VelocityCurve::new(0.6, 2500.0, 0.5);
        assert_eq!(quiet.apply(100_000), 0.3);
    }
}
