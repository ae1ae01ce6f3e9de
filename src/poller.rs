//! Fixed-interval position sampling for the display.
//!
//! The poller never touches the transport state. On each tick it reads the
//! playback position from the loaded source (only while the source is
//! actually playing) and hands back the formatted label, plus a redraw
//! request when the waveform view is on.

use std::time::{Duration, Instant};

use crate::transport::AudioSource;

/// Default tick interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(20);

/// Label shown when the transport is returned to zero.
pub const ZERO_POSITION: &str = "00:00:000";

/// Format a playback position as `MM:SS:mmm`.
///
/// Minutes and seconds wrap at 60. The millisecond field is the sub-second
/// milliseconds taken modulo 99, so it never exceeds 98.
pub fn format_position(position: Duration) -> String {
    let total_secs = position.as_secs();
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    // TODO: switch to % 1000 once nobody depends on the truncated readout
    let millis = position.subsec_millis() % 99;

    format!("{minutes:02}:{seconds:02}:{millis:03}")
}

/// Result of a single poller tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tick {
    /// New position label, present only while the source is playing.
    pub position: Option<String>,
    pub redraw: bool,
}

pub struct PositionPoller {
    interval: Duration,
    redraw_every_tick: bool,
    next_deadline: Instant,
}

impl PositionPoller {
    pub fn new(interval: Duration, redraw_every_tick: bool, now: Instant) -> Self {
        Self {
            interval,
            redraw_every_tick,
            next_deadline: now + interval,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_deadline
    }

    /// How long the event loop may block before the next tick is due.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next_deadline.saturating_duration_since(now)
    }

    pub fn tick<S: AudioSource>(&mut self, now: Instant, source: Option<&S>) -> Tick {
        self.next_deadline += self.interval;
        if self.next_deadline <= now {
            // Fell behind; resume the cadence from now instead of bursting.
            self.next_deadline = now + self.interval;
        }

        let position = source
            .filter(|s| s.is_playing())
            .map(|s| format_position(s.current_position()));

        Tick {
            position,
            redraw: self.redraw_every_tick,
        }
    }
}
