use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use super::AgentId;

/// Simulated time in whole microseconds. Integer time keeps event ordering
/// exact; 0.1 s cadences never drift against each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: Self = Self(0);

    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1_000_000.0).round().max(0.0) as u64)
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Retarget,
    Perceive(AgentId),
    Decide(AgentId),
    RefreshDisplay,
}

impl Event {
    // Same-instant order: the target moves first, agents act, the display
    // reads last.
    fn class(self) -> u8 {
        match self {
            Self::Retarget => 0,
            Self::Perceive(_) | Self::Decide(_) => 1,
            Self::RefreshDisplay => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Scheduled {
    at: SimTime,
    seq: u64,
    event: Event,
}

impl Scheduled {
    fn key(&self) -> (SimTime, u8, u64) {
        (self.at, self.event.class(), self.seq)
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-ordered timer queue shared by every agent chain, the target and the
/// display refresh.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: SimTime, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled { at, seq, event }));
    }

    /// Pops the earliest event due at or before `until`.
    pub fn pop_due(&mut self, until: SimTime) -> Option<(SimTime, Event)> {
        match self.queue.peek() {
            Some(Reverse(next)) if next.at <= until => {
                let Reverse(next) = self.queue.pop()?;
                Some((next.at, next.event))
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Cancels every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.next_seq = 0;
    }
}
