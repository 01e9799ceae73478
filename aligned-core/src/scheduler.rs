//! Frame scheduling. Widgets ask for exactly one next frame at a time and must
//! cancel the outstanding request when they are torn down.

use crate::clock::FrameClock;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

pub trait FrameScheduler {
    fn schedule_next_frame(&mut self) -> FrameRequest;
    fn cancel(&mut self, request: FrameRequest);
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    pending: Vec<FrameRequest>,
    cancelled: usize,
}

/// A scheduler driven by hand. Clones share state, so a test keeps one clone
/// and hands another to the widget.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Vec<FrameRequest> {
        self.state.borrow().pending.clone()
    }

    pub fn has_pending(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    /// Hands out every pending request, clearing them.
    pub fn take_due(&self) -> Vec<FrameRequest> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }

    pub fn cancelled_count(&self) -> usize {
        self.state.borrow().cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_next_frame(&mut self) -> FrameRequest {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let request = FrameRequest(state.next_id);
        state.pending.push(request);
        request
    }

    fn cancel(&mut self, request: FrameRequest) {
        let mut state = self.state.borrow_mut();
        let before = state.pending.len();
        state.pending.retain(|pending| *pending != request);
        if state.pending.len() != before {
            state.cancelled += 1;
        }
    }
}

/// The self-rescheduling frame loop every widget runs.
pub struct FrameLoop {
    scheduler: Box<dyn FrameScheduler>,
    request: Option<FrameRequest>,
    clock: FrameClock,
    started: bool,
}

impl FrameLoop {
    pub fn new(scheduler: Box<dyn FrameScheduler>) -> Self {
        Self {
            scheduler,
            request: None,
            clock: FrameClock::default(),
            started: false,
        }
    }

    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.clock.reset();
        self.request = Some(self.scheduler.schedule_next_frame());
    }

    pub fn is_running(&self) -> bool {
        self.started
    }

    pub fn outstanding(&self) -> Option<FrameRequest> {
        self.request
    }

    /// Consumes the outstanding request and returns the elapsed seconds, or
    /// `None` when the loop is stopped.
    pub fn begin_frame(&mut self, timestamp_ms: f64) -> Option<f64> {
        if !self.started {
            return None;
        }
        self.request = None;
        Some(self.clock.tick(timestamp_ms))
    }

    pub fn end_frame(&mut self) {
        if self.started && self.request.is_none() {
            self.request = Some(self.scheduler.schedule_next_frame());
        }
    }

    pub fn stop(&mut self) {
        self.started = false;
        if let Some(request) = self.request.take() {
            self.scheduler.cancel(request);
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_reschedules_until_stopped() {
        let scheduler = ManualScheduler::new();
        let mut frames = FrameLoop::new(Box::new(scheduler.clone()));
        assert_eq!(frames.begin_frame(0.0), None);

        frames.start();
        assert_eq!(scheduler.take_due().len(), 1);
        assert_eq!(frames.begin_frame(0.0), Some(0.0));
        frames.end_frame();
        assert_eq!(scheduler.take_due().len(), 1);
        assert_eq!(frames.begin_frame(500.0), Some(0.5));
        frames.end_frame();

        frames.stop();
        assert!(!scheduler.has_pending());
        assert_eq!(scheduler.cancelled_count(), 1);
        assert_eq!(frames.begin_frame(600.0), None);
    }
}
