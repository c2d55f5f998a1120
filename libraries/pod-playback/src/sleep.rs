//! Sleep timer

use chrono::{DateTime, Duration, Utc};

/// Pauses playback at a wall-clock deadline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SleepTimer {
    deadline: Option<DateTime<Utc>>,
}

impl SleepTimer {
    /// Create an unarmed timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for `minutes` from `now`, or disarm with `None`
    pub fn set(&mut self, minutes: Option<u32>, now: DateTime<Utc>) {
        self.deadline = minutes.map(|m| now + Duration::minutes(i64::from(m)));
    }

    /// Disarm
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    /// Deadline, if armed
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Whether the deadline has passed
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Time left, if armed and not yet due
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline - now)
            .filter(|left| *left > Duration::zero())
    }
}
