use tracing::debug;

use crate::{sequencing::Pitch, sonify::Voice};

/// Anything that can turn note commands into sound.
///
/// Start times are seconds since session start; devices are expected to
/// honour them sample-accurately. Nothing here can fail: a device that
/// cannot keep up drops notes.
pub trait SoundDevice {
    /// Start `pitches` and hold them until [`SoundDevice::release`].
    fn attack(&mut self, voice: Voice, pitches: &[Pitch], start: f64, velocity: f32);

    /// Start `pitches` and release them `duration` seconds later.
    fn attack_release(
        &mut self,
        voice: Voice,
        pitches: &[Pitch],
        duration: f64,
        start: f64,
        velocity: f32,
    );

    fn release(&mut self, voice: Voice, pitch: Pitch, start: f64);

    /// Portamento for subsequent notes on `voice`; zero disables it.
    fn set_glide(&mut self, _voice: Voice, _seconds: f32) {}
}

/// A call received by a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Attack {
        voice: Voice,
        pitches: Vec<Pitch>,
        start: f64,
        velocity: f32,
    },
    AttackRelease {
        voice: Voice,
        pitches: Vec<Pitch>,
        duration: f64,
        start: f64,
        velocity: f32,
    },
    Release {
        voice: Voice,
        pitch: Pitch,
        start: f64,
    },
    Glide {
        voice: Voice,
        seconds: f32,
    },
}

/// Silent device that logs and keeps every call, for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn take(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }
}

fn pitch_list(pitches: &[Pitch]) -> String {
    pitches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl SoundDevice for RecordingDevice {
    fn attack(&mut self, voice: Voice, pitches: &[Pitch], start: f64, velocity: f32) {
        debug!(%voice, notes = %pitch_list(pitches), start, velocity, "attack");
        self.calls.push(DeviceCall::Attack {
            voice,
            pitches: pitches.to_vec(),
            start,
            velocity,
        });
    }

    fn attack_release(
        &mut self,
        voice: Voice,
        pitches: &[Pitch],
        duration: f64,
        start: f64,
        velocity: f32,
    ) {
        debug!(%voice, notes = %pitch_list(pitches), duration, start, velocity, "attack/release");
        self.calls.push(DeviceCall::AttackRelease {
            voice,
            pitches: pitches.to_vec(),
            duration,
            start,
            velocity,
        });
    }

    fn release(&mut self, voice: Voice, pitch: Pitch, start: f64) {
        debug!(%voice, note = %pitch, start, "release");
        self.calls.push(DeviceCall::Release { voice, pitch, start });
    }

    fn set_glide(&mut self, voice: Voice, seconds: f32) {
        self.calls.push(DeviceCall::Glide { voice, seconds });
    }
}
