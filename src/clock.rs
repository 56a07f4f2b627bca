use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock source, in seconds since the Unix epoch.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> f64;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// The pair every visual timer redraws from. Clients extrapolate locally from
/// it and never write back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub running: bool,
    pub base_elapsed: f64,
    pub run_start: Option<f64>,
}

impl ClockSnapshot {
    /// Logical elapsed seconds at wall time `now`.
    pub fn elapsed_at(&self, now: f64) -> f64 {
        match (self.running, self.run_start) {
            (true, Some(start)) => self.base_elapsed + (now - start).max(0.0),
            _ => self.base_elapsed,
        }
    }
}

/// Game clock: accumulated seconds plus the timestamp of the current run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameClock {
    running: bool,
    accumulated: f64,
    run_start: Option<f64>,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the clock was already running.
    pub fn start(&mut self, now: f64) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.run_start = Some(now);
        true
    }

    /// Returns false when the clock was not running.
    pub fn pause(&mut self, now: f64) -> bool {
        if !self.running {
            return false;
        }
        self.accumulated = self.elapsed(now);
        self.running = false;
        self.run_start = None;
        true
    }

    /// Start if paused, pause if running. Returns the new running flag.
    pub fn toggle(&mut self, now: f64) -> bool {
        if self.running {
            self.pause(now);
        } else {
            self.start(now);
        }
        self.running
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.accumulated = 0.0;
        self.run_start = None;
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        self.snapshot().elapsed_at(now)
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            running: self.running,
            base_elapsed: self.accumulated,
            run_start: self.run_start,
        }
    }
}

/// `MM:SS`, floored and clamped at zero. Minutes are not wrapped.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() { seconds.max(0.0).floor() as u64 } else { 0 };
    format!("{:02}:{:02}", total / 60, total % 60)
}
