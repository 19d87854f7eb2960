use std::f32::consts::TAU;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/*
Oscillator
==========

Phase-accumulator oscillator. Phase runs 0..1 and advances by
frequency / sample_rate each sample.

  Sine      pure fundamental, used for melody and sub-bass
  Triangle  soft odd harmonics
  Sawtooth  all harmonics, bright pads
  Noise     white noise, unpitched percussion

Glide (portamento) slides the frequency linearly from the previous pitch to
the new one over the glide time.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Noise,
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f32,
    frequency: f32,
    target: f32,
    /// Hz per sample while gliding
    glide_step: f32,
    noise: SmallRng,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
            frequency: 440.0,
            target: 440.0,
            glide_step: 0.0,
            noise: SmallRng::seed_from_u64(0x5eed),
        }
    }

    /// Jump to `frequency` and restart the cycle.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.target = frequency;
        self.glide_step = 0.0;
        self.phase = 0.0;
    }

    /// Start at `from` and slide to `to` over `seconds`.
    pub fn glide(&mut self, from: f32, to: f32, seconds: f32, sample_rate: f32) {
        let samples = seconds * sample_rate;
        if samples < 1.0 {
            self.set_frequency(to);
            return;
        }
        self.phase = 0.0;
        self.frequency = from;
        self.target = to;
        self.glide_step = (to - from) / samples;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let out = match self.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (self.phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            Waveform::Noise => self.noise.gen_range(-1.0..=1.0),
        };

        self.phase += self.frequency / sample_rate;
        self.phase -= self.phase.floor();

        if self.glide_step != 0.0 {
            self.frequency += self.glide_step;
            let arrived = (self.glide_step > 0.0 && self.frequency >= self.target)
                || (self.glide_step < 0.0 && self.frequency <= self.target);
            if arrived {
                self.frequency = self.target;
                self.glide_step = 0.0;
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let mut osc = Oscillator::new(Waveform::Sine);
        osc.set_frequency(440.0);

        let samples: Vec<f32> = (0..64).map(|_| osc.next_sample(sample_rate)).collect();

        // sample n should be sin(2pi f n / sr)
        let n = 12;
        let expected = (TAU * 440.0 * n as f32 / sample_rate).sin();
        assert!((samples[n] - expected).abs() < 1e-4);
    }

    #[test]
    fn waveforms_stay_in_range() {
        for waveform in [Waveform::Sine, Waveform::Triangle, Waveform::Sawtooth, Waveform::Noise] {
            let mut osc = Oscillator::new(waveform);
            osc.set_frequency(220.0);
            for _ in 0..2_000 {
                let s = osc.next_sample(48_000.0);
                assert!((-1.0..=1.0).contains(&s), "{waveform:?} produced {s}");
            }
        }
    }

    #[test]
    fn glide_arrives_at_target() {
        let sample_rate = 1_000.0;
        let mut osc = Oscillator::new(Waveform::Sine);
        osc.glide(220.0, 440.0, 0.1, sample_rate);

        for _ in 0..50 {
            osc.next_sample(sample_rate);
        }
        let midway = osc.frequency();
        assert!(midway > 300.0 && midway < 360.0, "midway at {midway}");

        for _ in 0..60 {
            osc.next_sample(sample_rate);
        }
        assert_eq!(osc.frequency(), 440.0);
    }

    #[test]
    fn zero_glide_jumps() {
        let mut osc = Oscillator::new(Waveform::Sine);
        osc.glide(220.0, 330.0, 0.0, 48_000.0);
        assert_eq!(osc.frequency(), 330.0);
    }
}
