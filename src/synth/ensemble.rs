use crate::{
    sonify::Voice,
    synth::{
        message::{MessageReceiver, SynthMessage},
        poly::{NoteCommand, PolySynth},
    },
    voices::{self, Patch},
    MAX_BLOCK_SIZE,
};

struct Channel {
    synth: PolySynth,
    gain: f32,
}

/// Every sonification voice as its own [`PolySynth`], mixed to one mono
/// signal.
///
/// Runs on the audio thread: drains the message receiver at the top of
/// each block, converts session seconds to frames and renders.
pub struct Ensemble<R: MessageReceiver> {
    rx: R,
    channels: Vec<Channel>,
    temp_buffer: Vec<f32>,
    sample_rate: f32,
}

impl<R: MessageReceiver> Ensemble<R> {
    /// Stock patches from [`voices`].
    pub fn new(sample_rate: f32, rx: R) -> Self {
        Self::with_patches(sample_rate, rx, voices::patch)
    }

    pub fn with_patches(sample_rate: f32, rx: R, patch: impl Fn(Voice) -> Patch) -> Self {
        let channels = Voice::ALL
            .iter()
            .map(|&voice| {
                let patch = patch(voice);
                Channel {
                    synth: PolySynth::new(sample_rate, &patch),
                    gain: patch.gain,
                }
            })
            .collect();

        Self {
            rx,
            channels,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
            sample_rate,
        }
    }

    pub fn render_block(&mut self, out: &mut [f32]) {
        while let Some(msg) = self.rx.pop() {
            self.handle(msg);
        }

        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            chunk.fill(0.0);
            let temp = &mut self.temp_buffer[..chunk.len()];
            for channel in &mut self.channels {
                channel.synth.render_block(temp);
                for (o, v) in chunk.iter_mut().zip(temp.iter()) {
                    *o += v * channel.gain;
                }
            }
        }
    }

    fn handle(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn {
                voice,
                note,
                velocity,
                at,
            } => {
                let frame = self.frame_at(at);
                self.channels[voice.index()]
                    .synth
                    .schedule(frame, NoteCommand::On { note, velocity });
            }
            SynthMessage::NoteOff { voice, note, at } => {
                let frame = self.frame_at(at);
                self.channels[voice.index()]
                    .synth
                    .schedule(frame, NoteCommand::Off { note });
            }
            SynthMessage::Glide { voice, seconds } => {
                self.channels[voice.index()].synth.set_glide(seconds);
            }
            SynthMessage::AllNotesOff => {
                for channel in &mut self.channels {
                    channel.synth.all_notes_off();
                }
            }
        }
    }

    fn frame_at(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate as f64).round() as u64
    }

    pub fn synth(&self, voice: Voice) -> &PolySynth {
        &self.channels[voice.index()].synth
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    #[test]
    fn routes_messages_to_their_voice() {
        let mut rx = VecDeque::new();
        rx.push_back(SynthMessage::NoteOn {
            voice: Voice::Harmony,
            note: 60,
            velocity: 0.5,
            at: 0.0,
        });
        rx.push_back(SynthMessage::NoteOn {
            voice: Voice::Harmony,
            note: 64,
            velocity: 0.5,
            at: 0.0,
        });
        let mut ensemble = Ensemble::new(8_000.0, rx);

        let mut out = vec![0.0; 256];
        ensemble.render_block(&mut out);

        assert_eq!(ensemble.synth(Voice::Harmony).active_voices(), 2);
        assert_eq!(ensemble.synth(Voice::Melody).active_voices(), 0);
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn seconds_become_frames() {
        let mut rx = VecDeque::new();
        rx.push_back(SynthMessage::NoteOn {
            voice: Voice::Melody,
            note: 69,
            velocity: 0.6,
            at: 0.5,
        });
        let mut ensemble = Ensemble::new(1_000.0, rx);

        let mut out = vec![0.0; 400];
        ensemble.render_block(&mut out);
        assert_eq!(ensemble.synth(Voice::Melody).active_voices(), 0);
        assert!(out.iter().all(|s| *s == 0.0));

        ensemble.render_block(&mut out);
        assert_eq!(ensemble.synth(Voice::Melody).active_voices(), 1);
    }

    #[test]
    fn long_buffers_render_in_chunks() {
        let mut ensemble = Ensemble::new(48_000.0, VecDeque::<SynthMessage>::new());
        let mut out = vec![1.0; MAX_BLOCK_SIZE * 2 + 7];
        ensemble.render_block(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
        assert_eq!(ensemble.synth(Voice::Pad).frame(), out.len() as u64);
    }
}
