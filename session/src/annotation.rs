use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A labelled time interval, in seconds.
///
/// `start <= end` is expected after an edit completes but is not enforced while
/// an edge is being dragged; use [`Annotation::normalize`] to restore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Annotation {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            tags: BTreeSet::new(),
        }
    }

    pub fn lower(&self) -> f64 {
        self.start.min(self.end)
    }

    pub fn upper(&self) -> f64 {
        self.start.max(self.end)
    }

    pub fn duration(&self) -> f64 {
        self.upper() - self.lower()
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    /// Swaps the bounds when the end lies before the start. Returns whether a swap happened.
    pub fn normalize(&mut self) -> bool {
        if self.is_inverted() {
            std::mem::swap(&mut self.start, &mut self.end);
            true
        } else {
            false
        }
    }

    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.lower() <= end && self.upper() >= start
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Adds `tag` if absent, removes it otherwise. Returns whether the tag is now present.
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.tags.remove(tag) {
            false
        } else {
            self.tags.insert(tag.to_string());
            true
        }
    }
}
