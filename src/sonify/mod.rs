//! Packet to music mapping.
//!
//! Only a packet's `size` and `protocol` matter here. Size picks the scale
//! degree, the chord voicing, the velocity and the sub-bass trigger; protocol
//! picks the voice. Given the same scales, chord cursor and voice state the
//! output is always the same.
//!
//! | rule                 | condition                | result                         |
//! |----------------------|--------------------------|--------------------------------|
//! | melody pitch         | always                   | `melody[size mod len]`         |
//! | chord voicing        | `size mod 3 == 0`        | full triad, else root + fifth  |
//! | sub-bass             | `size mod 7 == 0`        | chord root on the bass voice   |
//! | large packet         | `size > threshold`       | softer, bass-register melody   |
//! | glide                | previous melody note     | portamento on the melody voice |

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::{LargePacketRule, LengthTable, RouteTable, SessionConfig, VelocityTable},
    packet::Packet,
    sequencing::{ChordTable, NoteLength, Pitch, Scales},
};

/// Logical sound-producing channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Melody,
    Harmony,
    Bass,
    Percussion,
    Pad,
}

impl Voice {
    pub const ALL: [Voice; 5] = [
        Voice::Melody,
        Voice::Harmony,
        Voice::Bass,
        Voice::Percussion,
        Voice::Pad,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Voice::Melody => "melody",
            Voice::Harmony => "harmony",
            Voice::Bass => "bass",
            Voice::Percussion => "percussion",
            Voice::Pad => "pad",
        }
    }

    /// Position in [`Voice::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One note (or chord) to hand to the sound device.
#[derive(Debug, Clone, PartialEq)]
pub struct SonificationEvent {
    pub voice: Voice,
    pub pitches: Vec<Pitch>,
    pub length: NoteLength,
    /// 0.0 to 1.0
    pub velocity: f32,
    /// Seconds since session start.
    pub start_offset: f64,
    /// Portamento time for this note, when gliding from a previous one.
    pub glide: Option<f32>,
}

/// Per-session voice memory.
#[derive(Debug, Clone, Default)]
pub struct VoiceState {
    last_melody: Option<Pitch>,
    held: HashMap<Voice, Vec<Pitch>>,
}

impl VoiceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last melody pitch emitted this session.
    pub fn last_melody(&self) -> Option<Pitch> {
        self.last_melody
    }

    /// Record `pitches` as sounding on `voice`, returning what was held before.
    pub fn replace_held(&mut self, voice: Voice, pitches: Vec<Pitch>) -> Vec<Pitch> {
        self.held.insert(voice, pitches).unwrap_or_default()
    }

    pub fn held(&self, voice: Voice) -> &[Pitch] {
        self.held.get(&voice).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Maps packets to [`SonificationEvent`]s.
#[derive(Debug, Clone)]
pub struct PacketSonifier {
    routes: RouteTable,
    velocity: VelocityTable,
    lengths: LengthTable,
    large_packet: LargePacketRule,
    portamento: f32,
    sub_bass_velocity: f32,
}

impl PacketSonifier {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            routes: config.routes,
            velocity: config.velocity,
            lengths: config.lengths,
            large_packet: config.large_packet,
            portamento: config.portamento,
            sub_bass_velocity: config.sub_bass_velocity,
        }
    }

    /// Events for one packet, in playing order: routed voice first, then
    /// the sub-bass when it triggers.
    ///
    /// Packets without a size produce nothing. Unmapped protocols produce no
    /// routed event but can still trigger the sub-bass.
    pub fn sonify(
        &self,
        packet: &Packet,
        scales: &Scales,
        chords: &ChordTable,
        state: &mut VoiceState,
        at: f64,
    ) -> Vec<SonificationEvent> {
        let Some(size) = packet.size else {
            debug!(protocol = %packet.protocol, "packet without size, nothing to play");
            return Vec::new();
        };

        let mut events = Vec::with_capacity(2);

        match self.routes.route(packet.protocol) {
            Some(voice) => events.push(self.routed(voice, size, scales, chords, state, at)),
            None => debug!(protocol = %packet.protocol, size, "unmapped protocol, no voice"),
        }

        if size % 7 == 0 {
            events.push(SonificationEvent {
                voice: Voice::Bass,
                pitches: vec![chords.current()[0]],
                length: self.lengths.bass,
                velocity: self.sub_bass_velocity,
                start_offset: at,
                glide: None,
            });
        }

        events
    }

    fn routed(
        &self,
        voice: Voice,
        size: u32,
        scales: &Scales,
        chords: &ChordTable,
        state: &mut VoiceState,
        at: f64,
    ) -> SonificationEvent {
        let mut velocity = self.velocity.curve(voice).apply(size);
        let mut glide = None;

        let pitches = match voice {
            Voice::Melody => {
                let large = self.large_packet.applies(size);
                let pitch = if large && self.large_packet.reroute {
                    scales.bass.degree(size)
                } else {
                    scales.melody.degree(size)
                };
                if large {
                    velocity *= self.large_packet.velocity_scale;
                }
                if state.last_melody.is_some() && self.portamento > 0.0 {
                    glide = Some(self.portamento);
                }
                state.last_melody = Some(pitch);
                vec![pitch]
            }
            Voice::Harmony | Voice::Pad => chords.voicing(size),
            Voice::Bass | Voice::Percussion => vec![scales.bass.degree(size)],
        };

        SonificationEvent {
            voice,
            pitches,
            length: self.lengths.length(voice),
            velocity,
            start_offset: at,
            glide,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        packet::Protocol,
        sequencing::{PitchClass, NATURAL_MINOR},
    };

    fn f_minor() -> Scales {
        Scales::new(PitchClass::F, &NATURAL_MINOR, 4, 3)
    }

    fn sonifier() -> PacketSonifier {
        PacketSonifier::new(&SessionConfig::default())
    }

    fn names(pitches: &[Pitch]) -> Vec<String> {
        pitches.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn udp_21_plays_c_sharp_5_with_sub_bass() {
        let packet = Packet::new(21, Protocol::Udp).with_hosts("10.0.0.1", "10.0.0.2");
        let events = sonifier().sonify(
            &packet,
            &f_minor(),
            &ChordTable::default(),
            &mut VoiceState::new(),
            0.0,
        );

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].voice, Voice::Melody);
        assert_eq!(names(&events[0].pitches), ["C#5"]);
        assert_eq!(events[0].glide, None);
        assert_eq!(events[1].voice, Voice::Bass);
        assert_eq!(names(&events[1].pitches), ["C3"]);
    }

    #[test]
    fn sub_bass_iff_size_divisible_by_seven() {
        let s = sonifier();
        let scales = f_minor();
        let chords = ChordTable::default();
        for size in 0..200u32 {
            let events = s.sonify(
                &Packet::new(size, Protocol::Tcp),
                &scales,
                &chords,
                &mut VoiceState::new(),
                0.0,
            );
            let has_bass = events.iter().any(|e| e.voice == Voice::Bass);
            assert_eq!(has_bass, size % 7 == 0, "size {size}");
        }
    }

    #[test]
    fn harmony_voicing_size_follows_mod_three() {
        let s = sonifier();
        let scales = f_minor();
        let chords = ChordTable::default();
        for size in [1u32, 2, 3, 4, 9, 10, 300, 301] {
            let events = s.sonify(
                &Packet::new(size, Protocol::Tcp),
                &scales,
                &chords,
                &mut VoiceState::new(),
                0.0,
            );
            let harmony = &events[0];
            assert_eq!(harmony.voice, Voice::Harmony);
            assert_eq!(harmony.pitches.len(), if size % 3 == 0 { 3 } else { 2 });
        }
    }

    #[test]
    fn same_inputs_same_events() {
        let s = sonifier();
        let scales = f_minor();
        let chords = ChordTable::default();
        for protocol in Protocol::ALL {
            for size in [0u32, 7, 21, 64, 999, 1001, 1500] {
                let packet = Packet::new(size, protocol);
                let a = s.sonify(&packet, &scales, &chords, &mut VoiceState::new(), 1.0);
                let b = s.sonify(&packet, &scales, &chords, &mut VoiceState::new(), 1.0);
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn melody_glides_after_first_note() {
        let s = sonifier();
        let scales = f_minor();
        let chords = ChordTable::default();
        let mut state = VoiceState::new();

        let first = s.sonify(&Packet::new(10, Protocol::Udp), &scales, &chords, &mut state, 0.0);
        // TCP does not touch the melody memory
        s.sonify(&Packet::new(11, Protocol::Tcp), &scales, &chords, &mut state, 0.5);
        let second = s.sonify(&Packet::new(12, Protocol::Udp), &scales, &chords, &mut state, 1.0);

        assert_eq!(first[0].glide, None);
        assert_eq!(second[0].glide, Some(0.1));
        assert_eq!(state.last_melody(), Some(second[0].pitches[0]));
    }

    #[test]
    fn velocity_is_capped_per_voice() {
        let s = sonifier();
        let scales = f_minor();
        let chords = ChordTable::default();

        let small = s.sonify(&Packet::new(500, Protocol::Udp), &scales, &chords, &mut VoiceState::new(), 0.0);
        assert!((small[0].velocity - 0.2).abs() < 1e-6);

        let tcp = s.sonify(&Packet::new(500, Protocol::Tcp), &scales, &chords, &mut VoiceState::new(), 0.0);
        assert!((tcp[0].velocity - 0.14).abs() < 1e-6);

        let huge = s.sonify(&Packet::new(999, Protocol::Udp), &scales, &chords, &mut VoiceState::new(), 0.0);
        assert!(huge[0].velocity <= 0.6);
    }

    #[test]
    fn large_packets_drop_to_bass_register() {
        let s = sonifier();
        let scales = f_minor();
        let chords = ChordTable::default();

        let events = s.sonify(&Packet::new(1500, Protocol::Udp), &scales, &chords, &mut VoiceState::new(), 0.0);
        let melody = &events[0];
        // 1500 mod 8 = 4 -> fifth degree of the bass scale
        assert_eq!(melody.pitches[0], scales.bass.degree(1500));
        assert_eq!(melody.pitches[0].to_string(), "C4");
        assert!((melody.velocity - 0.6 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn unmapped_protocol_keeps_only_sub_bass() {
        let s = sonifier();
        let scales = f_minor();
        let chords = ChordTable::default();

        let silent = s.sonify(&Packet::new(10, Protocol::Other), &scales, &chords, &mut VoiceState::new(), 0.0);
        assert!(silent.is_empty());

        let bass_only = s.sonify(&Packet::new(14, Protocol::Other), &scales, &chords, &mut VoiceState::new(), 0.0);
        assert_eq!(bass_only.len(), 1);
        assert_eq!(bass_only[0].voice, Voice::Bass);
    }

    #[test]
    fn missing_size_plays_nothing() {
        let packet = Packet {
            protocol: Protocol::Udp,
            ..Packet::default()
        };
        let events = sonifier().sonify(
            &packet,
            &f_minor(),
            &ChordTable::default(),
            &mut VoiceState::new(),
            0.0,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn pad_holds_and_percussion_uses_bass_scale() {
        let s = sonifier();
        let scales = f_minor();
        let chords = ChordTable::default();

        let pad = s.sonify(&Packet::new(6, Protocol::Igmp), &scales, &chords, &mut VoiceState::new(), 0.0);
        assert_eq!(pad[0].voice, Voice::Pad);
        assert_eq!(pad[0].length, NoteLength::Hold);
        assert_eq!(pad[0].pitches.len(), 3);

        let hit = s.sonify(&Packet::new(9, Protocol::Icmp), &scales, &chords, &mut VoiceState::new(), 0.0);
        assert_eq!(hit[0].voice, Voice::Percussion);
        assert_eq!(hit[0].pitches, vec![scales.bass.degree(9)]);
    }

    #[test]
    fn chord_cursor_changes_harmony_and_sub_bass() {
        let s = sonifier();
        let scales = f_minor();
        let mut chords = ChordTable::default();
        chords.advance();

        let events = s.sonify(&Packet::new(21, Protocol::Tcp), &scales, &chords, &mut VoiceState::new(), 0.0);
        assert_eq!(names(&events[0].pitches), ["A2", "C3", "E3"]);
        assert_eq!(names(&events[1].pitches), ["A2"]);
    }
}
