#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::sonify::Voice;

/// Control message from the session thread to the audio thread.
///
/// `at` is seconds since session start; the synth turns it into a frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn {
        voice: Voice,
        note: u8,
        velocity: f32,
        at: f64,
    },
    NoteOff {
        voice: Voice,
        note: u8,
        at: f64,
    },
    Glide {
        voice: Voice,
        seconds: f32,
    },
    AllNotesOff,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

/// Plain queue receiver for offline rendering and tests.
impl MessageReceiver for std::collections::VecDeque<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        self.pop_front()
    }
}
