//! The in-widget annotation list, its selection and the shared geometry used by
//! both drawing and hit-testing.

use crate::keys;
use crate::tags::TagRegistry;
use crate::viewport::Viewport;
use crate::WidgetError;
use binding::{HostBinding, Value};
use session::Annotation;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("unknown tag '{0}'")]
    UnknownTag(String),
    #[error("tag name is empty")]
    EmptyTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Pixel geometry of one annotation clipped to the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleAnnotation {
    pub index: usize,
    pub x: f64,
    pub width: f64,
    /// Pixel x of the left edge when it lies inside the window.
    pub left_edge: Option<f64>,
    pub right_edge: Option<f64>,
}

impl VisibleAnnotation {
    fn strictly_contains(&self, x: f64) -> bool {
        x > self.x && x < self.x + self.width
    }

    fn contains(&self, x: f64) -> bool {
        x >= self.x && x <= self.x + self.width
    }
}

/// Result of a pointer hit-test, in priority order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    Handle { index: usize, side: Side },
    Body { index: usize },
    Select { index: usize },
    Empty,
}

#[derive(Debug, Clone)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    tags: TagRegistry,
    selected: Option<usize>,
    default_width: f64,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(Vec::new(), TagRegistry::default(), 0.5)
    }
}

impl AnnotationStore {
    pub fn new(annotations: Vec<Annotation>, tags: TagRegistry, default_width: f64) -> Self {
        Self {
            annotations,
            tags,
            selected: None,
            default_width: if default_width > 0.0 { default_width } else { 0.5 },
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.annotations.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Annotation> {
        self.annotations.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected.and_then(|idx| self.annotations.get(idx))
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|idx| *idx < self.annotations.len());
    }

    /// Appends `[at_time, at_time + default width]` and selects it.
    pub fn add(&mut self, at_time: f64) -> usize {
        self.annotations
            .push(Annotation::new(at_time, at_time + self.default_width));
        let index = self.annotations.len() - 1;
        self.selected = Some(index);
        index
    }

    /// Removes the selected annotation. No-op without a selection.
    pub fn delete_selected(&mut self) -> Option<Annotation> {
        let index = self.selected.take()?;
        if index < self.annotations.len() {
            Some(self.annotations.remove(index))
        } else {
            None
        }
    }

    /// Adds or removes `tag` on the selected annotation. Returns the new
    /// membership, or `None` when nothing is selected.
    pub fn toggle_tag(&mut self, tag: &str) -> Result<Option<bool>, AnnotationError> {
        if !self.tags.contains(tag) {
            return Err(AnnotationError::UnknownTag(tag.to_string()));
        }
        let Some(annotation) = self.selected.and_then(|idx| self.annotations.get_mut(idx)) else {
            return Ok(None);
        };
        Ok(Some(annotation.toggle_tag(tag)))
    }

    pub fn register_tag(&mut self, name: &str) -> Result<(usize, bool), AnnotationError> {
        self.tags.register(name)
    }

    /// Replaces the whole list, e.g. with a copy committed by another instance.
    /// The selection is an index, so it is cleared whenever the list changes.
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        if annotations != self.annotations {
            self.selected = None;
        }
        self.annotations = annotations;
    }

    pub fn replace_tags(&mut self, tags: TagRegistry) {
        self.tags = tags;
    }

    /// Colour index for an annotation band: its first tag's registry position.
    pub fn color_index(&self, annotation: &Annotation) -> Option<usize> {
        annotation
            .tags
            .iter()
            .find_map(|tag| self.tags.index_of(tag))
    }

    /// Annotations overlapping the window, clipped to it, in list order.
    pub fn visible_in(&self, viewport: &Viewport, width: f64) -> Vec<VisibleAnnotation> {
        let start_time = viewport.start_time();
        let end_time = viewport.end_time();
        self.annotations
            .iter()
            .enumerate()
            .filter(|(_, ann)| ann.overlaps(start_time, end_time))
            .map(|(index, ann)| {
                let lower = ann.lower();
                let upper = ann.upper();
                let x0 = viewport.x_at_time(lower.max(start_time), width);
                let x1 = viewport.x_at_time(upper.min(end_time), width);
                VisibleAnnotation {
                    index,
                    x: x0,
                    width: (x1 - x0).max(0.0),
                    left_edge: (lower >= start_time).then(|| viewport.x_at_time(lower, width)),
                    right_edge: (upper <= end_time).then(|| viewport.x_at_time(upper, width)),
                }
            })
            .collect()
    }

    /// Handles within `tolerance` beat a strictly-inside body, which beats an
    /// inclusive selection hit. Later annotations win ties.
    pub fn hit_test(&self, x: f64, viewport: &Viewport, width: f64, tolerance: f64) -> HitTarget {
        let visible = self.visible_in(viewport, width);

        let mut best: Option<(f64, usize, Side)> = None;
        for geometry in &visible {
            for (edge, side) in [(geometry.left_edge, Side::Left), (geometry.right_edge, Side::Right)] {
                let Some(edge_x) = edge else {
                    continue;
                };
                let distance = (x - edge_x).abs();
                if distance > tolerance {
                    continue;
                }
                if best.map_or(true, |(d, _, _)| distance <= d) {
                    best = Some((distance, geometry.index, side));
                }
            }
        }
        if let Some((_, index, side)) = best {
            return HitTarget::Handle { index, side };
        }

        if let Some(geometry) = visible.iter().rev().find(|g| g.strictly_contains(x)) {
            return HitTarget::Body {
                index: geometry.index,
            };
        }
        if let Some(geometry) = visible.iter().rev().find(|g| g.contains(x)) {
            return HitTarget::Select {
                index: geometry.index,
            };
        }
        HitTarget::Empty
    }

    /// Persists the whole list: clears it, sets it again, then commits, so a
    /// store that compares shallowly still sees a change.
    pub fn commit<B: HostBinding + ?Sized>(&self, binding: &mut B) -> Result<usize, WidgetError> {
        let value = self.to_value()?;
        binding.write(keys::ANNOTATIONS, Value::Array(Vec::new()));
        binding.write(keys::ANNOTATIONS, value);
        Ok(binding.commit()?)
    }

    pub fn commit_tags<B: HostBinding + ?Sized>(&self, binding: &mut B) -> Result<usize, WidgetError> {
        binding.write(keys::TAGS, self.tags.to_value());
        Ok(binding.commit()?)
    }

    pub fn to_value(&self) -> Result<Value, WidgetError> {
        serde_json::to_value(&self.annotations).map_err(|err| WidgetError::InvalidValue {
            key: keys::ANNOTATIONS,
            reason: err.to_string(),
        })
    }
}

pub fn annotations_from_value(value: &Value) -> Result<Vec<Annotation>, WidgetError> {
    serde_json::from_value(value.clone()).map_err(|err| WidgetError::InvalidValue {
        key: keys::ANNOTATIONS,
        reason: err.to_string(),
    })
}
