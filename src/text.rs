use glam::Vec2;

/// Measures device-space text extents for label layout.
///
/// Label geometry is converted to normalized-axes units from these extents, so layout
/// stays independent of the surface resolution.
pub trait TextMeasure {
    /// Width and height in logical pixels of `text` rendered at `font_size`.
    fn measure(&self, text: &str, font_size: f32) -> Vec2;
}

impl<T: TextMeasure + ?Sized> TextMeasure for Box<T> {
    fn measure(&self, text: &str, font_size: f32) -> Vec2 {
        (**self).measure(text, font_size)
    }
}

/// Fixed-advance approximation used when no shaping backend is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxTextMeasure {
    /// Advance per character as a fraction of the font size.
    pub char_advance: f32,
    /// Line height as a fraction of the font size.
    pub line_height: f32,
}

impl Default for ApproxTextMeasure {
    fn default() -> Self {
        Self {
            char_advance: 0.6,
            line_height: 1.2,
        }
    }
}

impl TextMeasure for ApproxTextMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Vec2 {
        let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let lines = text.lines().count().max(1);
        Vec2::new(
            widest as f32 * font_size * self.char_advance,
            lines as f32 * font_size * self.line_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_measure_scales_with_length() {
        let m = ApproxTextMeasure::default();
        let a = m.measure("0.500", 10.0);
        let b = m.measure("10.500", 10.0);
        assert!(b.x > a.x);
        assert_eq!(a.y, b.y);
        assert_eq!(m.measure("", 10.0).x, 0.0);
    }
}
