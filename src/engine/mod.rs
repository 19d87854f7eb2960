//! Session controller.
//!
//! A [`Session`] owns every piece of mutable state for one run: the scales
//! picked at creation, the chord cursor, melody/held-note memory, the
//! playback queue and the host graph. Packets go in through [`Session::enqueue`];
//! the caller drives [`Session::tick`] from a timer and supplies the sound
//! device and graph view each time.

pub mod device;
pub mod scheduler;

use tracing::{debug, info};

use crate::{
    config::SessionConfig,
    error::Result,
    network::{GraphView, IngestOutcome, NetworkGraphModel},
    packet::Packet,
    sequencing::{ChordTable, KeyChoice, Scales},
    sonify::{PacketSonifier, SonificationEvent, VoiceState},
};

use self::{device::SoundDevice, scheduler::PlaybackScheduler};

/// What happened when one packet was played.
#[derive(Debug, Clone)]
pub struct Played {
    pub packet: Packet,
    pub events: Vec<SonificationEvent>,
    pub graph: IngestOutcome,
}

pub struct Session {
    config: SessionConfig,
    scales: Scales,
    chords: ChordTable,
    voices: VoiceState,
    sonifier: PacketSonifier,
    scheduler: PlaybackScheduler,
    graph: NetworkGraphModel,
    started: bool,
    /// Session time of the last chord change (background progression).
    chord_clock: Option<f64>,
}

impl Session {
    /// Validate `config` and pick the session key.
    pub fn new(config: SessionConfig, key: KeyChoice) -> Result<Self> {
        config.validate()?;

        let key = key.select(&config.keys);
        let scales = Scales::new(key, &config.steps, config.melody_octave, config.bass_octave);
        let graph = match config.max_edges {
            Some(max) => NetworkGraphModel::with_edge_capacity(max),
            None => NetworkGraphModel::new(),
        };

        Ok(Self {
            chords: ChordTable::new(config.chords.clone()),
            voices: VoiceState::new(),
            sonifier: PacketSonifier::new(&config),
            scheduler: PlaybackScheduler::new(config.interval),
            scales,
            graph,
            config,
            started: false,
            chord_clock: None,
        })
    }

    /// Begin playback. Returns `false` if the session was already started.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        info!(
            key = %self.scales.key,
            melody = %self.scales.melody.root(),
            interval = self.config.interval,
            "session started"
        );
        true
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Queue a packet for playback (stream delivery).
    pub fn enqueue(&mut self, packet: Packet) {
        self.scheduler.enqueue(packet);
    }

    /// Queue a whole batch in order (bulk delivery).
    pub fn enqueue_batch(&mut self, packets: impl IntoIterator<Item = Packet>) {
        for packet in packets {
            self.scheduler.enqueue(packet);
        }
    }

    /// Drive the session clock to `now` (seconds since session start).
    ///
    /// Plays at most one queued packet when a scheduler tick is due. Does
    /// nothing before [`Session::start`].
    pub fn tick(
        &mut self,
        now: f64,
        device: &mut impl SoundDevice,
        view: &mut impl GraphView,
    ) -> Option<Played> {
        if !self.started {
            return None;
        }

        self.advance_progression(now);

        let at = self.scheduler.next_tick(now)?;
        let packet = self.scheduler.tick()?;
        Some(self.play(packet, at, device, view))
    }

    /// Sonify and graph one packet immediately, bypassing the queue.
    pub fn play(
        &mut self,
        packet: Packet,
        at: f64,
        device: &mut impl SoundDevice,
        view: &mut impl GraphView,
    ) -> Played {
        let events = self
            .sonifier
            .sonify(&packet, &self.scales, &self.chords, &mut self.voices, at);
        for event in &events {
            self.perform(event, device);
        }

        let graph = self.graph.ingest(&packet);
        if graph.changed() {
            self.graph.publish(view);
        }

        debug!(
            size = ?packet.size,
            protocol = %packet.protocol,
            events = events.len(),
            queued = self.scheduler.len(),
            "played packet"
        );

        Played {
            packet,
            events,
            graph,
        }
    }

    fn perform(&mut self, event: &SonificationEvent, device: &mut impl SoundDevice) {
        if let Some(glide) = event.glide {
            device.set_glide(event.voice, glide);
        }

        match event.length.seconds(self.config.bpm) {
            Some(duration) => device.attack_release(
                event.voice,
                &event.pitches,
                duration,
                event.start_offset,
                event.velocity,
            ),
            None => {
                // One held chord per voice: release the previous one first
                let previous = self.voices.replace_held(event.voice, event.pitches.clone());
                for pitch in previous {
                    device.release(event.voice, pitch, event.start_offset);
                }
                device.attack(event.voice, &event.pitches, event.start_offset, event.velocity);
            }
        }
    }

    fn advance_progression(&mut self, now: f64) {
        let Some(every) = self.config.chord_advance else {
            return;
        };
        let clock = self.chord_clock.get_or_insert(now);
        while now - *clock >= every {
            *clock += every;
            self.chords.advance();
            debug!(chord = self.chords.index(), "chord progression advanced");
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scales(&self) -> &Scales {
        &self.scales
    }

    pub fn chords(&self) -> &ChordTable {
        &self.chords
    }

    pub fn graph(&self) -> &NetworkGraphModel {
        &self.graph
    }

    /// Packets waiting for playback.
    pub fn queued(&self) -> usize {
        self.scheduler.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::device::{DeviceCall, RecordingDevice},
        packet::Protocol,
        sequencing::PitchClass,
        sonify::Voice,
    };

    fn session(config: SessionConfig) -> Session {
        let mut session = Session::new(config, KeyChoice::Fixed(PitchClass::F)).unwrap();
        session.start();
        session
    }

    #[test]
    fn nothing_plays_before_start() {
        let mut session = Session::new(SessionConfig::default(), KeyChoice::Seeded(7)).unwrap();
        session.enqueue(Packet::new(21, Protocol::Udp));

        let mut device = RecordingDevice::new();
        assert!(session.tick(0.0, &mut device, &mut ()).is_none());
        assert_eq!(session.queued(), 1);

        assert!(session.start());
        assert!(!session.start(), "second start is a no-op");
        assert!(session.tick(0.0, &mut device, &mut ()).is_some());
    }

    #[test]
    fn melody_note_becomes_attack_release() {
        let mut session = session(SessionConfig::default());
        let mut device = RecordingDevice::new();

        session.play(Packet::new(21, Protocol::Udp), 2.0, &mut device, &mut ());

        match &device.calls()[0] {
            DeviceCall::AttackRelease {
                voice,
                pitches,
                duration,
                start,
                ..
            } => {
                assert_eq!(*voice, Voice::Melody);
                assert_eq!(pitches[0].to_string(), "C#5");
                assert_eq!(*duration, 0.25); // "8n" at 120 bpm
                assert_eq!(*start, 2.0);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn glide_is_set_before_second_melody_note() {
        let mut session = session(SessionConfig::default());
        let mut device = RecordingDevice::new();

        session.play(Packet::new(10, Protocol::Udp), 0.0, &mut device, &mut ());
        session.play(Packet::new(11, Protocol::Udp), 0.5, &mut device, &mut ());

        let calls = device.calls();
        assert!(matches!(calls[0], DeviceCall::AttackRelease { .. }));
        assert_eq!(
            calls[1],
            DeviceCall::Glide {
                voice: Voice::Melody,
                seconds: 0.1
            }
        );
        assert!(matches!(calls[2], DeviceCall::AttackRelease { .. }));
    }

    #[test]
    fn pad_releases_previous_chord() {
        let mut session = session(SessionConfig::default());
        let mut device = RecordingDevice::new();

        session.play(Packet::new(3, Protocol::Igmp), 0.0, &mut device, &mut ());
        session.play(Packet::new(4, Protocol::Igmp), 0.5, &mut device, &mut ());

        let calls = device.take();
        assert!(matches!(calls[0], DeviceCall::Attack { .. }));
        let releases = calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::Release { start, .. } if *start == 0.5))
            .count();
        assert_eq!(releases, 3, "the full triad from the first pad is released");
        assert!(matches!(calls.last(), Some(DeviceCall::Attack { .. })));
    }

    #[test]
    fn background_progression_moves_the_cursor() {
        let config = SessionConfig {
            chord_advance: Some(2.0),
            ..SessionConfig::default()
        };
        let mut session = session(config);
        let mut device = RecordingDevice::new();

        session.tick(0.0, &mut device, &mut ());
        assert_eq!(session.chords().index(), 0);
        session.tick(2.0, &mut device, &mut ());
        assert_eq!(session.chords().index(), 1);
        session.tick(6.5, &mut device, &mut ());
        assert_eq!(session.chords().index(), 3);
    }

    #[test]
    fn edge_cap_from_config() {
        let config = SessionConfig {
            max_edges: Some(2),
            ..SessionConfig::default()
        };
        let mut session = session(config);
        let mut device = RecordingDevice::new();
        for size in 0..5 {
            session.play(
                Packet::new(size, Protocol::Tcp).with_hosts("a", "b"),
                0.0,
                &mut device,
                &mut (),
            );
        }
        assert_eq!(session.graph().edges().len(), 2);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SessionConfig {
            interval: -1.0,
            ..SessionConfig::default()
        };
        assert!(Session::new(config, KeyChoice::Random).is_err());

        let config = SessionConfig {
            melody_octave: 127,
            ..SessionConfig::default()
        };
        assert!(Session::new(config, KeyChoice::Fixed(PitchClass::F)).is_err());
    }
}
