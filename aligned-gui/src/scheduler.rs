use aligned_core::{FrameRequest, FrameScheduler};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct SchedulerState {
    next_id: u64,
    pending: Option<FrameRequest>,
    ctx: Option<egui::Context>,
}

/// Frame scheduler backed by egui repaints. Scheduling asks for a repaint and
/// the app runs the widget's frame on the next `update` if the request is
/// still pending. Clones share state.
#[derive(Clone, Default)]
pub struct EguiScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl EguiScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires repaint requests to `ctx`. Requests made before this are picked
    /// up by the first `update`.
    pub fn attach(&self, ctx: &egui::Context) {
        if let Ok(mut state) = self.state.lock() {
            state.ctx = Some(ctx.clone());
        }
        ctx.request_repaint();
    }

    /// Takes the pending request, if any. Cancelled requests never come out.
    pub fn take_due(&self) -> Option<FrameRequest> {
        self.state.lock().ok().and_then(|mut state| state.pending.take())
    }

    pub fn has_pending(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.pending.is_some())
            .unwrap_or(false)
    }
}

impl FrameScheduler for EguiScheduler {
    fn schedule_next_frame(&mut self) -> FrameRequest {
        let Ok(mut state) = self.state.lock() else {
            log::error!("frame scheduler state poisoned");
            return FrameRequest(0);
        };
        state.next_id += 1;
        let request = FrameRequest(state.next_id);
        state.pending = Some(request);
        if let Some(ctx) = &state.ctx {
            ctx.request_repaint();
        }
        request
    }

    fn cancel(&mut self, request: FrameRequest) {
        if let Ok(mut state) = self.state.lock() {
            if state.pending == Some(request) {
                state.pending = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_request_is_never_due() {
        let scheduler = EguiScheduler::new();
        let mut handle = scheduler.clone();
        let first = handle.schedule_next_frame();
        handle.cancel(first);
        assert!(!scheduler.has_pending());
        assert_eq!(scheduler.take_due(), None);

        let second = handle.schedule_next_frame();
        assert_ne!(first, second);
        assert_eq!(scheduler.take_due(), Some(second));
        assert_eq!(scheduler.take_due(), None);
    }
}
