//! Visual primitives owned by a marker.

use glam::{DVec2, Vec2};

use crate::{Color, figure::AxesId};

/// Vertical line through the snapped x-position of a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexLine {
    /// Axes the line is drawn on.
    pub axes: AxesId,
    /// Position in data units.
    pub x: f64,
    pub color: Color,
    /// Line width in pixels.
    pub width: f32,
    pub visible: bool,
}

/// Dot on a curve at its selected sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDot {
    /// Axes owning the curve.
    pub axes: AxesId,
    /// Position in data units.
    pub position: DVec2,
    pub color: Color,
    /// Radius in pixels.
    pub radius: f32,
    pub visible: bool,
}

/// Boxed text label positioned in normalized-axes units.
///
/// The anchor is the left edge of the box at its vertical center.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBox {
    /// Axes whose normalized space the label lives in.
    pub axes: AxesId,
    pub text: String,
    pub anchor: DVec2,
    /// Box extent in normalized units.
    pub size: DVec2,
    /// Border color; the text is white on a dark fill.
    pub border: Color,
    pub alpha: f32,
    pub visible: bool,
    /// Font size in pixels.
    pub font_size: f32,
    /// Measured text extent in pixels, without padding.
    pub text_extent: Vec2,
}

impl LabelBox {
    pub(crate) fn new(axes: AxesId, border: Color, alpha: f32) -> Self {
        Self {
            axes,
            text: String::new(),
            anchor: DVec2::ZERO,
            size: DVec2::ZERO,
            border,
            alpha,
            visible: true,
            font_size: 0.0,
            text_extent: Vec2::ZERO,
        }
    }

    /// Lower-left and upper-right corners in normalized units.
    pub fn corners(&self) -> (DVec2, DVec2) {
        let half = self.size.y / 2.0;
        (
            DVec2::new(self.anchor.x, self.anchor.y - half),
            DVec2::new(self.anchor.x + self.size.x, self.anchor.y + half),
        )
    }

    /// Hit-test a normalized point against the box.
    pub fn contains(&self, point: DVec2) -> bool {
        let (min, max) = self.corners();
        self.visible && point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}

/// Borrowed glyph in paint order.
#[derive(Debug, Clone, Copy)]
pub enum Glyph<'a> {
    IndexLine(&'a IndexLine),
    Dot(&'a ValueDot),
    Label(&'a LabelBox),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_hit_test_uses_vertical_center() {
        let mut label = LabelBox::new(AxesId(0), Color::BLACK, 1.0);
        label.anchor = DVec2::new(0.5, 0.5);
        label.size = DVec2::new(0.2, 0.1);
        assert!(label.contains(DVec2::new(0.6, 0.54)));
        assert!(!label.contains(DVec2::new(0.45, 0.5)));
        assert!(!label.contains(DVec2::new(0.6, 0.56)));
        label.visible = false;
        assert!(!label.contains(DVec2::new(0.6, 0.5)));
    }
}
