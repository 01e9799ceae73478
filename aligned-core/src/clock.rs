//! Widget-local mirror of the shared playback clock.

use crate::keys;
use crate::WidgetError;
use binding::{Change, HostBinding, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockEvent {
    Running(bool),
    Seeked(f64),
    DurationChanged(f64),
}

/// Mirror of `is_running`, `sync_time` and `duration`.
///
/// The mirror changes in two ways only: [`ClockSync::apply_change`] for
/// notifications, or one of the publishing methods, which write and commit.
/// Publishing a value the mirror already holds is a no-op, so reacting to a
/// notification can never echo it back.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockSync {
    is_running: bool,
    current_time: f64,
    duration: f64,
}

impl ClockSync {
    pub fn new(is_running: bool, current_time: f64, duration: f64) -> Self {
        Self {
            is_running,
            current_time,
            duration: duration.max(0.0),
        }
    }

    /// Reads the initial clock from `binding`. `fallback_duration` is used when
    /// the store has no `duration` key.
    pub fn from_binding<B: HostBinding + ?Sized>(binding: &B, fallback_duration: f64) -> Self {
        Self::new(
            binding.read_bool(keys::IS_RUNNING).unwrap_or(false),
            binding.read_f64(keys::SYNC_TIME).unwrap_or(0.0),
            binding.read_f64(keys::DURATION).unwrap_or(fallback_duration),
        )
    }

    pub fn subscribe<B: HostBinding + ?Sized>(binding: &mut B) -> Result<(), WidgetError> {
        binding.subscribe(keys::IS_RUNNING)?;
        binding.subscribe(keys::SYNC_TIME)?;
        binding.subscribe(keys::DURATION)?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
    }

    fn clamp_time(&self, time: f64) -> f64 {
        if self.duration > 0.0 {
            time.clamp(0.0, self.duration)
        } else {
            time.max(0.0)
        }
    }

    /// Returns whether anything was published.
    pub fn set_running<B: HostBinding + ?Sized>(&mut self, binding: &mut B, running: bool) -> Result<bool, WidgetError> {
        if self.is_running == running {
            return Ok(false);
        }
        self.is_running = running;
        binding.write(keys::IS_RUNNING, Value::Bool(running));
        binding.commit()?;
        Ok(true)
    }

    pub fn toggle_running<B: HostBinding + ?Sized>(&mut self, binding: &mut B) -> Result<bool, WidgetError> {
        let running = !self.is_running;
        self.set_running(binding, running)
    }

    /// Moves the playhead to `time`, clamped to the series, and publishes it.
    pub fn seek<B: HostBinding + ?Sized>(&mut self, binding: &mut B, time: f64) -> Result<bool, WidgetError> {
        let time = self.clamp_time(time);
        if time == self.current_time {
            return Ok(false);
        }
        self.current_time = time;
        self.publish_time(binding)?;
        Ok(true)
    }

    pub fn publish_time<B: HostBinding + ?Sized>(&mut self, binding: &mut B) -> Result<(), WidgetError> {
        binding.write(keys::SYNC_TIME, Value::from(self.current_time));
        binding.commit()?;
        Ok(())
    }

    /// Local playback advance. Returns whether the playhead moved.
    pub fn advance(&mut self, delta_seconds: f64) -> bool {
        if !self.is_running || !(delta_seconds > 0.0) {
            return false;
        }
        let next = self.clamp_time(self.current_time + delta_seconds);
        let moved = next != self.current_time;
        self.current_time = next;
        moved
    }

    /// Updates the mirror from a notification. Never writes back.
    pub fn apply_change(&mut self, change: &Change) -> Option<ClockEvent> {
        match change.key.as_str() {
            keys::IS_RUNNING => {
                let running = change.value.as_bool()?;
                self.is_running = running;
                Some(ClockEvent::Running(running))
            }
            keys::SYNC_TIME => {
                let time = change.value.as_f64()?;
                self.current_time = time;
                Some(ClockEvent::Seeked(time))
            }
            keys::DURATION => {
                let duration = change.value.as_f64()?;
                self.set_duration(duration);
                Some(ClockEvent::DurationChanged(self.duration))
            }
            _ => None,
        }
    }
}

/// Turns frame timestamps in milliseconds into elapsed seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    last_timestamp_ms: Option<f64>,
}

impl FrameClock {
    /// The first tick yields zero. Timestamps going backwards yield zero.
    pub fn tick(&mut self, timestamp_ms: f64) -> f64 {
        let delta = match self.last_timestamp_ms {
            Some(last) => ((timestamp_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last_timestamp_ms = Some(timestamp_ms);
        delta
    }

    pub fn reset(&mut self) {
        self.last_timestamp_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_clamped_to_duration() {
        let mut clock = ClockSync::new(true, 9.5, 10.0);
        assert!(clock.advance(1.0));
        assert_eq!(clock.current_time(), 10.0);
        assert!(!clock.advance(1.0));

        let mut paused = ClockSync::new(false, 1.0, 10.0);
        assert!(!paused.advance(1.0));
        assert_eq!(paused.current_time(), 1.0);
    }

    #[test]
    fn frame_clock_measures_deltas() {
        let mut frames = FrameClock::default();
        assert_eq!(frames.tick(1000.0), 0.0);
        assert_eq!(frames.tick(1016.0), 0.016);
        assert_eq!(frames.tick(1000.0), 0.0);
        frames.reset();
        assert_eq!(frames.tick(5000.0), 0.0);
    }

    #[test]
    fn unrelated_or_malformed_changes_are_ignored() {
        let mut clock = ClockSync::new(false, 0.0, 10.0);
        let change = Change {
            key: keys::SYNC_TIME.to_string(),
            value: Value::from("soon"),
            revision: 3,
        };
        assert_eq!(clock.apply_change(&change), None);
        let change = Change {
            key: keys::TITLE.to_string(),
            value: Value::from("x"),
            revision: 4,
        };
        assert_eq!(clock.apply_change(&change), None);
    }
}
