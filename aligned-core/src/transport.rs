//! Play/pause, seek and skip controls that drive the shared clock.

use crate::clock::{ClockEvent, ClockSync};
use crate::scheduler::{FrameLoop, FrameScheduler};
use crate::WidgetError;
use binding::HostBinding;
use session::TransportSettings;

pub struct TransportWidget<B: HostBinding> {
    binding: B,
    frames: FrameLoop,
    clock: ClockSync,
    skip_seconds: f64,
}

impl<B: HostBinding> TransportWidget<B> {
    pub fn new(binding: B, scheduler: Box<dyn FrameScheduler>, settings: &TransportSettings) -> Self {
        let clock = ClockSync::from_binding(&binding, 0.0);
        Self {
            binding,
            frames: FrameLoop::new(scheduler),
            clock,
            skip_seconds: settings.skip_seconds.abs(),
        }
    }

    pub fn render(&mut self) -> Result<(), WidgetError> {
        if self.frames.is_running() {
            return Ok(());
        }
        ClockSync::subscribe(&mut self.binding)?;
        self.frames.start();
        Ok(())
    }

    pub fn destroy(&mut self) -> Result<(), WidgetError> {
        self.frames.stop();
        self.binding.unsubscribe_all()?;
        Ok(())
    }

    /// Advances the clock while running and publishes the new time.
    pub fn frame(&mut self, timestamp_ms: f64) -> Result<Vec<ClockEvent>, WidgetError> {
        let Some(delta) = self.frames.begin_frame(timestamp_ms) else {
            return Ok(Vec::new());
        };
        let result = self.step(delta);
        self.frames.end_frame();
        result
    }

    fn step(&mut self, delta: f64) -> Result<Vec<ClockEvent>, WidgetError> {
        let events = self.pump_changes()?;
        if self.clock.advance(delta) {
            self.clock.publish_time(&mut self.binding)?;
        }
        Ok(events)
    }

    pub fn pump_changes(&mut self) -> Result<Vec<ClockEvent>, WidgetError> {
        let changes = self.binding.poll_changes()?;
        Ok(changes
            .iter()
            .filter_map(|change| self.clock.apply_change(change))
            .collect())
    }

    pub fn toggle_play(&mut self) -> Result<bool, WidgetError> {
        self.clock.toggle_running(&mut self.binding)
    }

    /// Seeks to `fraction` of the duration, as a progress slider does.
    pub fn seek_fraction(&mut self, fraction: f64) -> Result<bool, WidgetError> {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let time = fraction * self.clock.duration();
        self.clock.seek(&mut self.binding, time)
    }

    pub fn seek(&mut self, time: f64) -> Result<bool, WidgetError> {
        self.clock.seek(&mut self.binding, time)
    }

    pub fn rewind(&mut self) -> Result<bool, WidgetError> {
        let time = self.clock.current_time() - self.skip_seconds;
        self.clock.seek(&mut self.binding, time)
    }

    pub fn forward(&mut self) -> Result<bool, WidgetError> {
        let time = self.clock.current_time() + self.skip_seconds;
        self.clock.seek(&mut self.binding, time)
    }

    pub fn progress(&self) -> f64 {
        let duration = self.clock.duration();
        if duration > 0.0 {
            (self.clock.current_time() / duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn current_label(&self) -> String {
        format_time(self.clock.current_time())
    }

    pub fn total_label(&self) -> String {
        format_time(self.clock.duration())
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    pub fn is_rendering(&self) -> bool {
        self.frames.is_running()
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }
}

/// `mm:ss`, or `hh:mm:ss` from one hour on. Fractions are dropped.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::format_time;

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(59.9), "00:59");
        assert_eq!(format_time(125.0), "02:05");
        assert_eq!(format_time(3725.0), "01:02:05");
        assert_eq!(format_time(-3.0), "00:00");
    }
}
