//! Bridges a native video element and the shared clock.
//!
//! Native `play`/`pause`/`seeked` events go into the clock. Clock changes from
//! other widgets come out as [`VideoCommand`]s for the element. Since
//! [`ClockSync`] ignores values it already holds, a command applied to the
//! element and reported back as a native event does not loop.

use crate::clock::{ClockEvent, ClockSync};
use crate::keys;
use crate::scheduler::{FrameLoop, FrameScheduler};
use crate::WidgetError;
use binding::{HostBinding, Value};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    #[error("video file not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported video format (expected .mp4): {0}")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoCommand {
    Play,
    Pause,
    SeekTo(f64),
}

pub fn validate_video_path(path: &Path) -> Result<PathBuf, VideoError> {
    let is_mp4 = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));
    if !is_mp4 {
        return Err(VideoError::UnsupportedFormat(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(VideoError::NotFound(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}

pub struct VideoSync<B: HostBinding> {
    binding: B,
    frames: FrameLoop,
    clock: ClockSync,
    url: String,
    drift_tolerance: f64,
}

impl<B: HostBinding> VideoSync<B> {
    pub fn new(
        binding: B,
        scheduler: Box<dyn FrameScheduler>,
        drift_tolerance: f64,
    ) -> Result<Self, WidgetError> {
        let url = binding
            .read(keys::VIDEO_URL)
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or(WidgetError::MissingKey(keys::VIDEO_URL))?;
        let clock = ClockSync::from_binding(&binding, 0.0);
        Ok(Self {
            binding,
            frames: FrameLoop::new(scheduler),
            clock,
            url,
            drift_tolerance: drift_tolerance.max(0.0),
        })
    }

    /// Validates `path` and publishes it as the shared video source.
    pub fn publish_source(&mut self, path: &Path) -> Result<(), WidgetError> {
        let path = validate_video_path(path)?;
        self.url = path.display().to_string();
        self.binding
            .write(keys::VIDEO_URL, Value::from(self.url.clone()));
        self.binding.commit()?;
        Ok(())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn render(&mut self) -> Result<(), WidgetError> {
        if self.frames.is_running() {
            return Ok(());
        }
        ClockSync::subscribe(&mut self.binding)?;
        self.binding.subscribe(keys::VIDEO_URL)?;
        self.frames.start();
        Ok(())
    }

    pub fn destroy(&mut self) -> Result<(), WidgetError> {
        self.frames.stop();
        self.binding.unsubscribe_all()?;
        Ok(())
    }

    /// Commands needed to bring an element at `element_position` seconds in
    /// line with clock changes made elsewhere.
    pub fn frame(
        &mut self,
        timestamp_ms: f64,
        element_position: f64,
    ) -> Result<Vec<VideoCommand>, WidgetError> {
        if self.frames.begin_frame(timestamp_ms).is_none() {
            return Ok(Vec::new());
        }
        let result = self.poll(element_position);
        self.frames.end_frame();
        result
    }

    pub fn poll(&mut self, element_position: f64) -> Result<Vec<VideoCommand>, WidgetError> {
        let mut commands = Vec::new();
        for change in self.binding.poll_changes()? {
            if change.key == keys::VIDEO_URL {
                if let Some(url) = change.value.as_str() {
                    self.url = url.to_string();
                }
                continue;
            }
            match self.clock.apply_change(&change) {
                Some(ClockEvent::Running(true)) => commands.push(VideoCommand::Play),
                Some(ClockEvent::Running(false)) => commands.push(VideoCommand::Pause),
                Some(ClockEvent::Seeked(time)) => {
                    if (time - element_position).abs() > self.drift_tolerance {
                        commands.push(VideoCommand::SeekTo(time));
                    }
                }
                Some(ClockEvent::DurationChanged(_)) | None => {}
            }
        }
        Ok(commands)
    }

    pub fn on_native_play(&mut self) -> Result<bool, WidgetError> {
        self.clock.set_running(&mut self.binding, true)
    }

    pub fn on_native_pause(&mut self) -> Result<bool, WidgetError> {
        self.clock.set_running(&mut self.binding, false)
    }

    pub fn on_native_seeked(&mut self, time: f64) -> Result<bool, WidgetError> {
        if (time - self.clock.current_time()).abs() <= self.drift_tolerance {
            return Ok(false);
        }
        self.clock.seek(&mut self.binding, time)
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_existing_mp4_files_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.MP4");
        std::fs::write(&clip, b"").unwrap();
        assert_eq!(validate_video_path(&clip), Ok(clip.clone()));

        let missing = dir.path().join("missing.mp4");
        assert_eq!(
            validate_video_path(&missing),
            Err(VideoError::NotFound(missing.clone()))
        );

        let avi = dir.path().join("clip.avi");
        std::fs::write(&avi, b"").unwrap();
        assert_eq!(
            validate_video_path(&avi),
            Err(VideoError::UnsupportedFormat(avi.clone()))
        );
    }
}
