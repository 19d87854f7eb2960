use std::collections::VecDeque;

use tracing::trace;

use crate::{
    sequencing::notes::midi_note_to_freq,
    synth::voice::{SynthVoice, VoiceState},
    voices::Patch,
};

/// What to do to a note once its frame comes up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteCommand {
    On { note: u8, velocity: f32 },
    Off { note: u8 },
}

/// Commands that may wait at once; past this they are dropped so the
/// queue never grows on the audio thread.
pub const MAX_PENDING: usize = 256;

#[derive(Debug, Clone, Copy)]
struct Pending {
    frame: u64,
    command: NoteCommand,
}

/// A pool of voices sharing one patch, with sample-accurate note timing.
///
/// Commands are queued against an absolute frame and applied inside
/// [`PolySynth::render_block`] on the exact sample they are due. Commands
/// for a frame already rendered apply at the start of the next block.
pub struct PolySynth {
    voices: Vec<SynthVoice>,
    pending: VecDeque<Pending>,
    sample_rate: f32,
    frame_counter: u64,
    glide: f32,
    last_freq: Option<f32>,
    dropped: u64,
}

impl PolySynth {
    pub fn new(sample_rate: f32, patch: &Patch) -> Self {
        let voices = (0..patch.polyphony.max(1))
            .map(|_| SynthVoice::new(patch))
            .collect();

        Self {
            voices,
            // Preallocated so scheduling does not allocate on the audio thread
            pending: VecDeque::with_capacity(MAX_PENDING),
            sample_rate,
            frame_counter: 0,
            glide: 0.0,
            last_freq: None,
            dropped: 0,
        }
    }

    /// Queue `command` for absolute `frame`. Same-frame commands keep
    /// arrival order. A full queue drops the command.
    pub fn schedule(&mut self, frame: u64, command: NoteCommand) {
        if self.pending.len() >= MAX_PENDING {
            self.dropped += 1;
            trace!(frame, "command queue full, command dropped");
            return;
        }
        let idx = self.pending.partition_point(|p| p.frame <= frame);
        self.pending.insert(idx, Pending { frame, command });
    }

    /// Portamento time for following notes; zero disables it.
    pub fn set_glide(&mut self, seconds: f32) {
        self.glide = seconds.max(0.0);
    }

    /// Release every sounding note now and forget anything queued.
    pub fn all_notes_off(&mut self) {
        self.pending.clear();
        for voice in &mut self.voices {
            voice.release(self.sample_rate);
        }
    }

    pub fn render_block(&mut self, out: &mut [f32]) {
        for (i, sample) in out.iter_mut().enumerate() {
            let frame = self.frame_counter + i as u64;
            while self.pending.front().is_some_and(|p| p.frame <= frame) {
                if let Some(pending) = self.pending.pop_front() {
                    self.apply(pending.command);
                }
            }

            let mut mix = 0.0;
            for voice in &mut self.voices {
                if voice.is_active() {
                    mix += voice.next_sample(self.sample_rate);
                }
            }
            *sample = mix;
        }

        self.frame_counter += out.len() as u64;
    }

    fn apply(&mut self, command: NoteCommand) {
        match command {
            NoteCommand::On { note, velocity } => {
                let target = midi_note_to_freq(note);
                let glide = match self.last_freq {
                    Some(from) if self.glide > 0.0 => Some((from, self.glide)),
                    _ => None,
                };
                self.last_freq = Some(target);

                let age = self.frame_counter;
                let sample_rate = self.sample_rate;
                match self.allocate_voice() {
                    Some(voice) => voice.start(note, velocity, age, glide, sample_rate),
                    None => {
                        self.dropped += 1;
                        trace!(note, "no voice available, note dropped");
                    }
                }
            }
            NoteCommand::Off { note } => {
                let sample_rate = self.sample_rate;
                if let Some(voice) = self.find_voice(note) {
                    voice.release(sample_rate);
                }
            }
        }
    }

    fn allocate_voice(&mut self) -> Option<&mut SynthVoice> {
        // First pass: find free voice index
        let free_idx = self.voices.iter().position(|v| v.is_free());
        if let Some(idx) = free_idx {
            return Some(&mut self.voices[idx]);
        }

        // Second pass: steal oldest releasing voice
        let steal_idx = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx);

        steal_idx.map(|idx| &mut self.voices[idx])
    }

    /// Oldest held voice playing `note`.
    fn find_voice(&mut self, note: u8) -> Option<&mut SynthVoice> {
        self.voices
            .iter_mut()
            .filter(|v| v.note() == note && v.state() == VoiceState::Active)
            .min_by_key(|v| v.age())
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Notes lost because every voice was held or the command queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn frame(&self) -> u64 {
        self.frame_counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::{envelope::Adsr, oscillator::Waveform},
        voices,
    };

    const SAMPLE_RATE: f32 = 1_000.0;

    fn organ(polyphony: usize) -> Patch {
        Patch {
            waveform: Waveform::Sine,
            adsr: Adsr::new(0.005, 0.01, 1.0, 0.02),
            gain: 1.0,
            polyphony,
        }
    }

    #[test]
    fn notes_start_on_their_frame() {
        let mut synth = PolySynth::new(SAMPLE_RATE, &organ(4));
        synth.schedule(10, NoteCommand::On { note: 69, velocity: 1.0 });

        let mut out = [0.0; 16];
        synth.render_block(&mut out);

        assert!(out[..10].iter().all(|s| *s == 0.0), "silent before frame 10");
        assert_eq!(synth.active_voices(), 1);
        assert_eq!(synth.frame(), 16);
    }

    #[test]
    fn note_off_releases_voice() {
        let mut synth = PolySynth::new(SAMPLE_RATE, &organ(4));
        synth.schedule(0, NoteCommand::On { note: 60, velocity: 0.5 });
        synth.schedule(20, NoteCommand::Off { note: 60 });

        let mut out = [0.0; 64];
        synth.render_block(&mut out);

        // 20ms release at 1kHz is done by frame 41
        assert_eq!(synth.active_voices(), 0);
        assert_eq!(synth.pending(), 0);
    }

    #[test]
    fn steals_oldest_releasing_voice() {
        let mut synth = PolySynth::new(SAMPLE_RATE, &organ(2));
        synth.schedule(0, NoteCommand::On { note: 60, velocity: 1.0 });
        synth.schedule(1, NoteCommand::On { note: 64, velocity: 1.0 });
        synth.schedule(2, NoteCommand::Off { note: 60 });
        synth.schedule(3, NoteCommand::On { note: 67, velocity: 1.0 });

        let mut out = [0.0; 4];
        synth.render_block(&mut out);

        assert_eq!(synth.active_voices(), 2);
        assert_eq!(synth.dropped(), 0);
    }

    #[test]
    fn drops_when_every_voice_is_held() {
        let mut synth = PolySynth::new(SAMPLE_RATE, &organ(2));
        for note in [60, 64, 67] {
            synth.schedule(0, NoteCommand::On { note, velocity: 1.0 });
        }

        let mut out = [0.0; 4];
        synth.render_block(&mut out);

        assert_eq!(synth.active_voices(), 2);
        assert_eq!(synth.dropped(), 1);
    }

    #[test]
    fn command_queue_is_bounded() {
        let mut synth = PolySynth::new(SAMPLE_RATE, &organ(2));
        for i in 0..MAX_PENDING + 10 {
            synth.schedule(1_000 + i as u64, NoteCommand::Off { note: 60 });
        }

        assert_eq!(synth.pending(), MAX_PENDING);
        assert_eq!(synth.dropped(), 10);
    }

    #[test]
    fn late_commands_apply_next_block() {
        let mut synth = PolySynth::new(SAMPLE_RATE, &organ(2));
        let mut out = [0.0; 32];
        synth.render_block(&mut out);

        synth.schedule(5, NoteCommand::On { note: 60, velocity: 1.0 });
        synth.render_block(&mut out);
        assert_eq!(synth.active_voices(), 1);
    }

    #[test]
    fn percussion_frees_itself() {
        let mut synth = PolySynth::new(SAMPLE_RATE, &voices::percussion());
        synth.schedule(0, NoteCommand::On { note: 48, velocity: 0.8 });

        let mut out = vec![0.0; 200];
        synth.render_block(&mut out);

        assert!(out.iter().any(|s| *s != 0.0));
        assert_eq!(synth.active_voices(), 0);
    }
}
