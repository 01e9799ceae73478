//! Pointer gestures over the annotation bands.
//!
//! A press resolves through [`AnnotationStore::hit_test`] into one of three
//! outcomes: grabbing a resize handle, grabbing a body to move it, or a plain
//! selection click. Drags edit the in-memory annotation on every move and the
//! whole list is persisted exactly once on release.

use crate::annotations::{AnnotationStore, HitTarget, Side};
use crate::viewport::Viewport;
use crate::WidgetError;
use binding::HostBinding;
use session::AnnotationSettings;

/// Which stored bound a resize handle drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Resizing {
        index: usize,
        side: Side,
        edge: Edge,
        original_start: f64,
        original_end: f64,
    },
    Moving {
        index: usize,
        /// Pointer x minus the pixel x of the annotation's start at press time.
        grab_offset_x: f64,
        original_start: f64,
        original_end: f64,
        pointer_origin_x: f64,
        moved: bool,
    },
}

impl Gesture {
    pub fn index(&self) -> Option<usize> {
        match *self {
            Gesture::Idle => None,
            Gesture::Resizing { index, .. } | Gesture::Moving { index, .. } => Some(index),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    gesture: Gesture,
    handle_tolerance: f64,
    move_threshold: f64,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::from_settings(&AnnotationSettings::default())
    }
}

impl InteractionController {
    pub fn new(handle_tolerance: f64, move_threshold: f64) -> Self {
        Self {
            gesture: Gesture::Idle,
            handle_tolerance: handle_tolerance.max(0.0),
            move_threshold: move_threshold.max(0.0),
        }
    }

    pub fn from_settings(settings: &AnnotationSettings) -> Self {
        Self::new(
            f64::from(settings.handle_tolerance_px),
            f64::from(settings.move_threshold_px),
        )
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    pub fn pointer_down(
        &mut self,
        x: f64,
        store: &mut AnnotationStore,
        viewport: &Viewport,
        width: f64,
    ) -> HitTarget {
        let target = store.hit_test(x, viewport, width, self.handle_tolerance);
        self.gesture = match target {
            HitTarget::Handle { index, side } => match store.get(index).map(|a| (a.start, a.end)) {
                Some((start, end)) => {
                    let edge = match (side, start <= end) {
                        (Side::Left, true) | (Side::Right, false) => Edge::Start,
                        (Side::Left, false) | (Side::Right, true) => Edge::End,
                    };
                    store.select(Some(index));
                    Gesture::Resizing {
                        index,
                        side,
                        edge,
                        original_start: start,
                        original_end: end,
                    }
                }
                None => Gesture::Idle,
            },
            HitTarget::Body { index } => match store.get(index).map(|a| (a.start, a.end)) {
                Some((start, end)) => {
                    let start_x = viewport.x_at_time(start, width);
                    store.select(Some(index));
                    Gesture::Moving {
                        index,
                        grab_offset_x: x - start_x,
                        original_start: start,
                        original_end: end,
                        pointer_origin_x: x,
                        moved: false,
                    }
                }
                None => Gesture::Idle,
            },
            HitTarget::Select { index } => {
                store.select(Some(index));
                Gesture::Idle
            }
            HitTarget::Empty => {
                store.select(None);
                Gesture::Idle
            }
        };
        target
    }

    /// Live edit of the dragged annotation. Returns whether it changed.
    pub fn pointer_move(
        &mut self,
        x: f64,
        store: &mut AnnotationStore,
        viewport: &Viewport,
        width: f64,
    ) -> bool {
        match &mut self.gesture {
            Gesture::Idle => false,
            Gesture::Resizing { index, edge, .. } => {
                let time = viewport.time_at_x(x, width);
                let Some(ann) = store.get_mut(*index) else {
                    return false;
                };
                match edge {
                    Edge::Start => ann.start = time,
                    Edge::End => ann.end = time,
                }
                true
            }
            Gesture::Moving {
                index,
                grab_offset_x,
                original_start,
                original_end,
                pointer_origin_x,
                moved,
            } => {
                if !*moved && (x - *pointer_origin_x).abs() < self.move_threshold {
                    return false;
                }
                *moved = true;
                let start = viewport.time_at_x(x - *grab_offset_x, width);
                let Some(ann) = store.get_mut(*index) else {
                    return false;
                };
                ann.start = start;
                ann.end = start + (*original_end - *original_start);
                true
            }
        }
    }

    /// Ends the gesture. A completed resize or move is normalised and the list
    /// committed once. Returns whether a commit happened.
    pub fn pointer_up<B: HostBinding + ?Sized>(
        &mut self,
        store: &mut AnnotationStore,
        binding: &mut B,
    ) -> Result<bool, WidgetError> {
        let gesture = std::mem::take(&mut self.gesture);
        let index = match gesture {
            Gesture::Idle => return Ok(false),
            Gesture::Moving { moved: false, .. } => return Ok(false),
            Gesture::Resizing { index, .. } | Gesture::Moving { index, .. } => index,
        };
        let Some(ann) = store.get_mut(index) else {
            return Ok(false);
        };
        if ann.normalize() {
            log::debug!("annotation {index} edges crossed during drag, swapped");
        }
        store.commit(binding)?;
        Ok(true)
    }

    /// Abandons the gesture and restores the original bounds without persisting.
    pub fn cancel(&mut self, store: &mut AnnotationStore) -> bool {
        let gesture = std::mem::take(&mut self.gesture);
        let (index, start, end) = match gesture {
            Gesture::Idle => return false,
            Gesture::Resizing {
                index,
                original_start,
                original_end,
                ..
            }
            | Gesture::Moving {
                index,
                original_start,
                original_end,
                ..
            } => (index, original_start, original_end),
        };
        if let Some(ann) = store.get_mut(index) {
            ann.start = start;
            ann.end = end;
        }
        true
    }
}
