// Voice management and polyphony for the audio thread.
// The session talks to this layer only through SynthMessage.

#[cfg(feature = "rtrb")]
pub mod device;
pub mod ensemble;
pub mod message;
pub mod poly;
pub mod voice;
