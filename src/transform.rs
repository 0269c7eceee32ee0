//! Coordinate mapping between data, normalized-axes and device space.
//!
//! Normalized-axes space spans `[0, 1]` on both axes with the origin at the lower-left
//! corner of the axes region. Device space is in logical pixels with the origin at the
//! top-left corner of the surface and y growing downwards.

use glam::{DVec2, Vec2};
use iced::Rectangle;

use crate::{AxisScale, MarkerError, figure::AxesId};

const MIN_SPAN: f64 = 1e-12;

/// Transform for one axes region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesTransform {
    bounds: Rectangle,
    x_scale: AxisScale,
    y_scale: AxisScale,
    /// Visible x range in plot space (after the scale function).
    x_range: (f64, f64),
    /// Visible y range in plot space.
    y_range: (f64, f64),
}

impl AxesTransform {
    /// Create a transform for the given view limits (data units) and device rectangle.
    ///
    /// Fails before any geometry is computed if either axis uses a scale the mapper
    /// does not support.
    pub fn new(
        axes: AxesId,
        bounds: Rectangle,
        x_lim: (f64, f64),
        y_lim: (f64, f64),
        x_scale: AxisScale,
        y_scale: AxisScale,
    ) -> Result<Self, MarkerError> {
        for scale in [x_scale, y_scale] {
            if !scale.is_supported() {
                return Err(MarkerError::UnsupportedScaleKind { axes, scale });
            }
        }
        let x_range = map_range(x_lim, x_scale).ok_or(MarkerError::InvalidAxisLimits(axes))?;
        let y_range = map_range(y_lim, y_scale).ok_or(MarkerError::InvalidAxisLimits(axes))?;
        Ok(Self {
            bounds,
            x_scale,
            y_scale,
            x_range,
            y_range,
        })
    }

    /// Device rectangle of the axes region.
    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// Map a data point into normalized-axes space.
    ///
    /// Returns `None` when the point cannot be represented (e.g. non-positive values on a
    /// log axis, or non-finite input).
    pub fn to_normalized(&self, data: DVec2) -> Option<DVec2> {
        let x = self.x_scale.data_to_plot(data.x)?;
        let y = self.y_scale.data_to_plot(data.y)?;
        Some(DVec2::new(
            (x - self.x_range.0) / span(self.x_range),
            (y - self.y_range.0) / span(self.y_range),
        ))
    }

    /// Map a data x-value into normalized-axes space, independent of y.
    pub fn x_to_normalized(&self, x: f64) -> Option<f64> {
        let x = self.x_scale.data_to_plot(x)?;
        Some((x - self.x_range.0) / span(self.x_range))
    }

    /// Map a normalized-axes point back into data space.
    pub fn from_normalized(&self, normalized: DVec2) -> Option<DVec2> {
        let x = self.x_range.0 + normalized.x * span(self.x_range);
        let y = self.y_range.0 + normalized.y * span(self.y_range);
        Some(DVec2::new(
            self.x_scale.plot_to_data(x)?,
            self.y_scale.plot_to_data(y)?,
        ))
    }

    /// Map a normalized-axes point into device space.
    pub fn to_display(&self, normalized: DVec2) -> Vec2 {
        let x = self.bounds.x as f64 + normalized.x * self.bounds.width as f64;
        let y = self.bounds.y as f64 + (1.0 - normalized.y) * self.bounds.height as f64;
        Vec2::new(x as f32, y as f32)
    }

    /// Map a device point into normalized-axes space.
    pub fn from_display(&self, device: Vec2) -> DVec2 {
        let width = (self.bounds.width as f64).max(1.0);
        let height = (self.bounds.height as f64).max(1.0);
        DVec2::new(
            (device.x as f64 - self.bounds.x as f64) / width,
            1.0 - (device.y as f64 - self.bounds.y as f64) / height,
        )
    }

    pub fn data_to_display(&self, data: DVec2) -> Option<Vec2> {
        self.to_normalized(data).map(|n| self.to_display(n))
    }

    pub fn display_to_data(&self, device: Vec2) -> Option<DVec2> {
        self.from_normalized(self.from_display(device))
    }

    /// Convert a device-space extent (width, height in pixels) into normalized units.
    pub fn extent_to_normalized(&self, size: Vec2) -> DVec2 {
        DVec2::new(
            size.x as f64 / (self.bounds.width as f64).max(1.0),
            size.y as f64 / (self.bounds.height as f64).max(1.0),
        )
    }

    /// Whether a device point lies inside the axes region.
    pub fn contains_display(&self, device: Vec2) -> bool {
        self.bounds.contains(iced::Point::new(device.x, device.y))
    }
}

fn span(range: (f64, f64)) -> f64 {
    let s = range.1 - range.0;
    if s.abs() < MIN_SPAN {
        MIN_SPAN.copysign(s)
    } else {
        s
    }
}

fn map_range(range: (f64, f64), scale: AxisScale) -> Option<(f64, f64)> {
    let min = scale.data_to_plot(range.0)?;
    let max = scale.data_to_plot(range.1)?;
    Some((min, max))
}
