use crate::{
    dsp::{
        envelope::Envelope,
        oscillator::Oscillator,
    },
    sequencing::notes::midi_note_to_freq,
    voices::Patch,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// One oscillator + envelope pair playing a single note.
#[derive(Debug, Clone)]
pub struct SynthVoice {
    note: u8,
    velocity: f32,
    state: VoiceState,
    age: u64,
    osc: Oscillator,
    env: Envelope,
}

impl SynthVoice {
    pub fn new(patch: &Patch) -> Self {
        Self {
            note: 0,
            velocity: 0.0,
            state: VoiceState::Free,
            age: 0,
            osc: Oscillator::new(patch.waveform),
            env: Envelope::new(patch.adsr),
        }
    }

    /// Start `note`. With `glide` set, the pitch slides from
    /// `glide.0` Hz over `glide.1` seconds.
    pub fn start(
        &mut self,
        note: u8,
        velocity: f32,
        age: u64,
        glide: Option<(f32, f32)>,
        sample_rate: f32,
    ) {
        self.note = note;
        self.velocity = velocity.clamp(0.0, 1.0);
        self.state = VoiceState::Active;
        self.age = age;

        let target = midi_note_to_freq(note);
        match glide {
            Some((from, seconds)) => self.osc.glide(from, target, seconds, sample_rate),
            None => self.osc.set_frequency(target),
        }
        self.env.note_on();
    }

    pub fn release(&mut self, sample_rate: f32) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.env.note_off(sample_rate);
        }
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let out = self.osc.next_sample(sample_rate) * self.env.next_sample(sample_rate) * self.velocity;

        // Envelope finished (released, or a zero-sustain shape ran out)
        if !self.env.is_active() {
            self.free();
        }
        out
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn envelope_level(&self) -> f32 {
        self.env.level()
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
        self.velocity = 0.0;
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }
}
