use std::collections::VecDeque;

use crate::packet::Packet;

/// Fixed-cadence FIFO between packet arrival and playback.
///
/// Arrival is bursty, playback is one packet per `interval`. The queue has no
/// capacity bound; packets wait until their turn.
#[derive(Debug, Clone)]
pub struct PlaybackScheduler {
    queue: VecDeque<Packet>,
    interval: f64,
    next_due: Option<f64>,
}

impl PlaybackScheduler {
    /// `interval` in seconds; callers validate it is positive.
    pub fn new(interval: f64) -> Self {
        Self {
            queue: VecDeque::new(),
            interval,
            next_due: None,
        }
    }

    pub fn enqueue(&mut self, packet: Packet) {
        self.queue.push_back(packet);
    }

    /// Take the oldest waiting packet, if any.
    pub fn tick(&mut self) -> Option<Packet> {
        self.queue.pop_front()
    }

    /// Returns the scheduled time of the tick due at `now`, at most one per
    /// call. The first call fires immediately. A caller that falls more than
    /// one interval behind skips the missed ticks instead of bursting.
    pub fn next_tick(&mut self, now: f64) -> Option<f64> {
        let due = *self.next_due.get_or_insert(now);
        if now < due {
            return None;
        }

        let next = due + self.interval;
        if next <= now {
            self.next_due = Some(now + self.interval);
            return Some(now);
        }
        self.next_due = Some(next);
        Some(due)
    }

    /// Time the next tick becomes due, once the cadence has started.
    pub fn next_due(&self) -> Option<f64> {
        self.next_due
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
