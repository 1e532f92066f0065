use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Expired,
    Cancelled,
}

/// What one tick observed. `Expired` is reported on the transition tick only;
/// every later tick reports `Inactive`, which is what makes the forced-submit
/// callback fire at most once no matter how often the clock is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Inactive,
    Running { remaining_seconds: u64, low_time: bool },
    Expired,
}

/// Countdown clock for a timed exam. Driven externally one second at a time;
/// the struct itself holds no interval and never re-enters the caller.
#[derive(Debug, Clone)]
pub struct Countdown {
    state: TimerState,
    remaining_seconds: u64,
    warning_threshold_seconds: u64,
}

impl Countdown {
    /// An exam without a known duration runs untimed.
    pub fn idle() -> Self {
        Self { state: TimerState::Idle, remaining_seconds: 0, warning_threshold_seconds: 0 }
    }

    pub fn start(duration_seconds: i64, warning_threshold_seconds: u64) -> Self {
        if duration_seconds <= 0 {
            return Self::idle();
        }

        Self {
            state: TimerState::Running,
            remaining_seconds: duration_seconds as u64,
            warning_threshold_seconds,
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Inactive;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.state = TimerState::Expired;
            return TickOutcome::Expired;
        }

        TickOutcome::Running {
            remaining_seconds: self.remaining_seconds,
            low_time: self.remaining_seconds < self.warning_threshold_seconds,
        }
    }

    /// Stop ticking without triggering submission: manual exit or a completed
    /// submission. Expiry that already happened stays expired.
    pub fn cancel(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Cancelled;
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        match self.state {
            TimerState::Idle => None,
            _ => Some(self.remaining_seconds),
        }
    }
}
