//! Match phases and the tick-driven match clock.

use serde::{Deserialize, Serialize};

use crate::config::MAX_MATCH_DURATION;

/// One stage of a fixture's lifecycle. The order is fixed:
/// `NotStarted -> FirstHalf -> HalfTime -> SecondHalf -> ExtraTime -> FullTime -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    NotStarted,
    FirstHalf,
    HalfTime,
    SecondHalf,
    ExtraTime,
    FullTime,
    Completed,
}

impl Phase {
    /// The phase that must follow this one, or `None` once terminal.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::NotStarted => Some(Phase::FirstHalf),
            Phase::FirstHalf => Some(Phase::HalfTime),
            Phase::HalfTime => Some(Phase::SecondHalf),
            Phase::SecondHalf => Some(Phase::ExtraTime),
            Phase::ExtraTime => Some(Phase::FullTime),
            Phase::FullTime => Some(Phase::Completed),
            Phase::Completed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Completed
    }

    /// Stable identifier used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::NotStarted => "not_started",
            Phase::FirstHalf => "first_half",
            Phase::HalfTime => "half_time",
            Phase::SecondHalf => "second_half",
            Phase::ExtraTime => "extra_time",
            Phase::FullTime => "full_time",
            Phase::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(Phase::NotStarted),
            "first_half" => Some(Phase::FirstHalf),
            "half_time" => Some(Phase::HalfTime),
            "second_half" => Some(Phase::SecondHalf),
            "extra_time" => Some(Phase::ExtraTime),
            "full_time" => Some(Phase::FullTime),
            "completed" => Some(Phase::Completed),
            _ => None,
        }
    }

    /// Human-readable label for announcements.
    pub fn label(self) -> &'static str {
        match self {
            Phase::NotStarted => "Not Started",
            Phase::FirstHalf => "1st Half",
            Phase::HalfTime => "Half-Time",
            Phase::SecondHalf => "2nd Half",
            Phase::ExtraTime => "Extra Time",
            Phase::FullTime => "Full Time",
            Phase::Completed => "Completed",
        }
    }
}

/// What a tick means for the surrounding phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    /// Keep ticking.
    Running,
    /// The first half just ended.
    HalfTime,
    /// The second half just ended.
    SecondHalfOver,
}

/// Monotonic match clock shared by both halves.
///
/// Boundaries are exact equality checks on a counter that only ever moves
/// forward by one, so each boundary fires exactly once. The second half
/// resumes from `half_length` rather than from zero.
#[derive(Debug, Clone)]
pub struct MatchClock {
    elapsed: u32,
    half_length: u32,
    full_length: u32,
}

impl MatchClock {
    /// Halves longer than [`MAX_MATCH_DURATION`] are clamped so that the
    /// second half still has an end.
    pub fn new(half_length: u32) -> Self {
        let half_length = half_length.min(MAX_MATCH_DURATION);
        Self {
            elapsed: 0,
            half_length,
            full_length: half_length * 2,
        }
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Advance by one tick and report any boundary reached.
    pub fn tick(&mut self) -> (u32, ClockSignal) {
        self.elapsed = self.elapsed.saturating_add(1);
        let signal = if self.elapsed == self.half_length {
            ClockSignal::HalfTime
        } else if self.elapsed == self.full_length {
            ClockSignal::SecondHalfOver
        } else {
            ClockSignal::Running
        };
        (self.elapsed, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_sequence_is_linear() {
        let mut trace = vec![];
        let mut phase = Phase::NotStarted;
        while let Some(next) = phase.next() {
            trace.push(next);
            phase = next;
        }
        assert_eq!(
            trace,
            vec![
                Phase::FirstHalf,
                Phase::HalfTime,
                Phase::SecondHalf,
                Phase::ExtraTime,
                Phase::FullTime,
                Phase::Completed,
            ]
        );
        assert!(phase.is_terminal());
    }

    #[test]
    fn clock_signals_each_boundary_once() {
        let mut clock = MatchClock::new(3);
        let signals: Vec<_> = (0..6).map(|_| clock.tick()).collect();
        assert_eq!(
            signals,
            vec![
                (1, ClockSignal::Running),
                (2, ClockSignal::Running),
                (3, ClockSignal::HalfTime),
                (4, ClockSignal::Running),
                (5, ClockSignal::Running),
                (6, ClockSignal::SecondHalfOver),
            ]
        );
    }

    #[test]
    fn longest_halves_do_not_overflow() {
        let mut clock = MatchClock::new(u32::MAX);
        assert_eq!(clock.tick(), (1, ClockSignal::Running));

        let mut clock = MatchClock::new(MAX_MATCH_DURATION);
        clock.elapsed = MAX_MATCH_DURATION - 1;
        assert_eq!(clock.tick(), (MAX_MATCH_DURATION, ClockSignal::HalfTime));
        clock.elapsed = u32::MAX - 2;
        assert_eq!(clock.tick(), (u32::MAX - 1, ClockSignal::SecondHalfOver));
    }

    #[test]
    fn persisted_names_parse_back() {
        let mut phase = Phase::NotStarted;
        loop {
            assert_eq!(Phase::parse(phase.as_str()), Some(phase));
            match phase.next() {
                Some(next) => phase = next,
                None => break,
            }
        }
    }
}
