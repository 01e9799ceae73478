use aligned_core::{Canvas, Color, Point, Stroke};
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Vec2};

pub(crate) const BACKGROUND: Color32 = Color32::from_rgb(24, 24, 24);

/// [`Canvas`] over an egui painter, with the origin at the plot rect's corner.
pub struct EguiCanvas<'a> {
    painter: &'a Painter,
    rect: Rect,
}

impl<'a> EguiCanvas<'a> {
    pub fn new(painter: &'a Painter, rect: Rect) -> Self {
        Self { painter, rect }
    }

    fn pos(&self, point: Point) -> Pos2 {
        self.rect.min + Vec2::new(point.x, point.y)
    }
}

pub(crate) fn color32(color: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn stroke(stroke: Stroke) -> egui::Stroke {
    egui::Stroke::new(stroke.width, color32(stroke.color))
}

impl Canvas for EguiCanvas<'_> {
    fn size(&self) -> (f32, f32) {
        (self.rect.width(), self.rect.height())
    }

    fn clear(&mut self) {
        self.painter.rect_filled(self.rect, 0.0, BACKGROUND);
    }

    fn line(&mut self, from: Point, to: Point, line: Stroke) {
        self.painter
            .line_segment([self.pos(from), self.pos(to)], stroke(line));
    }

    fn polyline(&mut self, points: &[Point], line: Stroke) {
        if points.len() < 2 {
            return;
        }
        let points: Vec<Pos2> = points.iter().map(|p| self.pos(*p)).collect();
        self.painter.add(egui::Shape::line(points, stroke(line)));
    }

    fn fill_rect(&mut self, min: Point, size: Point, color: Color) {
        let rect = Rect::from_min_size(self.pos(min), Vec2::new(size.x, size.y));
        self.painter.rect_filled(rect, 0.0, color32(color));
    }

    fn stroke_rect(&mut self, min: Point, size: Point, line: Stroke) {
        let rect = Rect::from_min_size(self.pos(min), Vec2::new(size.x, size.y));
        self.painter.rect_stroke(rect, 0.0, stroke(line));
    }

    fn text(&mut self, pos: Point, text: &str, color: Color) {
        self.painter.text(
            self.pos(pos),
            Align2::LEFT_TOP,
            text,
            FontId::monospace(11.0),
            color32(color),
        );
    }
}
