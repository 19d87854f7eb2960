use rtrb::{Consumer, Producer, RingBuffer};
use tracing::warn;

use crate::{
    engine::device::SoundDevice,
    sequencing::Pitch,
    sonify::Voice,
    synth::message::SynthMessage,
};

/// [`SoundDevice`] that forwards note commands to the audio thread over a
/// lock-free ring.
///
/// Start times are shifted by `lookahead` so a note scheduled "now" still
/// lands in a block that has not been rendered yet.
pub struct RingDevice {
    tx: Producer<SynthMessage>,
    lookahead: f64,
    dropped: u64,
}

impl RingDevice {
    pub fn new(tx: Producer<SynthMessage>) -> Self {
        Self {
            tx,
            lookahead: 0.0,
            dropped: 0,
        }
    }

    /// Create a device plus the consumer end for an [`Ensemble`](super::ensemble::Ensemble).
    pub fn channel(capacity: usize) -> (Self, Consumer<SynthMessage>) {
        let (tx, rx) = RingBuffer::new(capacity);
        (Self::new(tx), rx)
    }

    pub fn with_lookahead(mut self, seconds: f64) -> Self {
        self.lookahead = seconds.max(0.0);
        self
    }

    /// Messages lost to a full ring.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn send(&mut self, msg: SynthMessage) {
        if self.tx.push(msg).is_err() {
            self.dropped += 1;
            warn!(dropped = self.dropped, "synth message ring full, dropping {msg:?}");
        }
    }
}

impl SoundDevice for RingDevice {
    fn attack(&mut self, voice: Voice, pitches: &[Pitch], start: f64, velocity: f32) {
        let at = start + self.lookahead;
        for pitch in pitches {
            self.send(SynthMessage::NoteOn {
                voice,
                note: pitch.midi(),
                velocity,
                at,
            });
        }
    }

    fn attack_release(
        &mut self,
        voice: Voice,
        pitches: &[Pitch],
        duration: f64,
        start: f64,
        velocity: f32,
    ) {
        self.attack(voice, pitches, start, velocity);
        let at = start + duration + self.lookahead;
        for pitch in pitches {
            self.send(SynthMessage::NoteOff {
                voice,
                note: pitch.midi(),
                at,
            });
        }
    }

    fn release(&mut self, voice: Voice, pitch: Pitch, start: f64) {
        self.send(SynthMessage::NoteOff {
            voice,
            note: pitch.midi(),
            at: start + self.lookahead,
        });
    }

    fn set_glide(&mut self, voice: Voice, seconds: f32) {
        self.send(SynthMessage::Glide { voice, seconds });
    }
}
