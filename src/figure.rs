//! Retained scene model the markers are placed on.
//!
//! A [`Figure`] is one render surface holding any number of axes regions. Axes created
//! with [`Figure::add_twin_x`] overlay another axes and share its x-domain; together they
//! form a single interactive group for markers.

use core::fmt;

use iced::{Point, Rectangle, Size};
use indexmap::IndexMap;

use crate::{
    AxisScale, MarkerError,
    curve::{Curve, CurveId, CurveKey},
    transform::AxesTransform,
};

const AUTOSCALE_PADDING: f64 = 0.05;

/// Unique identifier for an axes region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxesId(pub(crate) u64);

impl AxesId {
    pub(crate) fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AxesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Axes({})", self.0)
    }
}

/// One rectangular axes region.
#[derive(Debug, Clone)]
pub struct Axes {
    pub id: AxesId,
    pub(crate) curves: IndexMap<CurveId, Curve>,
    /// Placement as a fraction of the figure, origin at the top-left.
    pub(crate) placement: Rectangle,
    pub(crate) x_scale: AxisScale,
    pub(crate) y_scale: AxisScale,
    pub(crate) x_lim: Option<(f64, f64)>,
    pub(crate) y_lim: Option<(f64, f64)>,
    /// Axes this one shares its x-domain with.
    pub(crate) share_x: Option<AxesId>,
    pub(crate) zorder: i32,
    /// Whether the opaque background patch is drawn.
    pub(crate) patch_visible: bool,
    /// Bumped every time the axes is cleared.
    pub(crate) generation: u64,
}

impl Axes {
    fn new(placement: Rectangle) -> Self {
        Self {
            id: AxesId::new(),
            curves: IndexMap::new(),
            placement,
            x_scale: AxisScale::Linear,
            y_scale: AxisScale::Linear,
            x_lim: None,
            y_lim: None,
            share_x: None,
            zorder: 0,
            patch_visible: true,
            generation: 0,
        }
    }

    /// Curves in insertion order.
    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.curves.values()
    }

    pub fn curve(&self, id: CurveId) -> Option<&Curve> {
        self.curves.get(&id)
    }

    pub fn zorder(&self) -> i32 {
        self.zorder
    }

    pub fn patch_visible(&self) -> bool {
        self.patch_visible
    }

    pub fn x_scale(&self) -> AxisScale {
        self.x_scale
    }

    pub fn y_scale(&self) -> AxisScale {
        self.y_scale
    }

    fn data_bounds(&self, axis: usize, scale: AxisScale) -> Option<(f64, f64)> {
        self.curves
            .values()
            .filter(|c| c.visible)
            .flat_map(|c| c.positions.iter())
            .filter_map(|p| scale.data_to_plot(p[axis]))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A render surface holding axes regions.
#[derive(Debug, Clone)]
pub struct Figure {
    pub(crate) axes: IndexMap<AxesId, Axes>,
    pub(crate) size: Size,
    /// Bumped on any change that requires a full redraw.
    pub(crate) version: u64,
}

impl Default for Figure {
    fn default() -> Self {
        Self::new(Size::new(800.0, 600.0))
    }
}

impl Figure {
    /// Create an empty figure of the given device size.
    pub fn new(size: Size) -> Self {
        Self {
            axes: IndexMap::new(),
            size,
            version: 1,
        }
    }

    /// Create a figure with a `rows` x `cols` grid of axes, returned in row-major order.
    pub fn subplots(size: Size, rows: usize, cols: usize) -> (Self, Vec<AxesId>) {
        const MARGIN: f32 = 0.08;
        let mut fig = Self::new(size);
        let rows = rows.max(1);
        let cols = cols.max(1);
        let cell_w = 1.0 / cols as f32;
        let cell_h = 1.0 / rows as f32;
        let mut ids = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let placement = Rectangle::new(
                    Point::new(
                        c as f32 * cell_w + MARGIN * cell_w,
                        r as f32 * cell_h + MARGIN * cell_h,
                    ),
                    Size::new(cell_w * (1.0 - 2.0 * MARGIN), cell_h * (1.0 - 2.0 * MARGIN)),
                );
                ids.push(fig.add_axes(placement));
            }
        }
        (fig, ids)
    }

    /// Add an axes region. `placement` is a fraction of the figure size.
    pub fn add_axes(&mut self, placement: Rectangle) -> AxesId {
        let axes = Axes::new(placement);
        let id = axes.id;
        self.axes.insert(id, axes);
        self.touch();
        id
    }

    /// Add an axes overlaying `of` and sharing its x-domain (a dual y-axis overlay).
    pub fn add_twin_x(&mut self, of: AxesId) -> Result<AxesId, MarkerError> {
        let base = self.axes_ref(of)?;
        let mut axes = Axes::new(base.placement);
        axes.share_x = Some(of);
        axes.x_scale = base.x_scale;
        let id = axes.id;
        self.axes.insert(id, axes);
        self.touch();
        Ok(id)
    }

    /// Add a curve to an axes.
    pub fn add_curve(&mut self, axes: AxesId, curve: Curve) -> Result<CurveId, MarkerError> {
        curve.validate()?;
        let id = curve.id;
        self.axes_mut(axes)?.curves.insert(id, curve);
        self.touch();
        Ok(id)
    }

    /// Remove a curve from an axes.
    pub fn remove_curve(&mut self, axes: AxesId, curve: CurveId) -> Result<Curve, MarkerError> {
        let a = self.axes_mut(axes)?;
        let removed = a
            .curves
            .shift_remove(&curve)
            .ok_or(MarkerError::UnknownCurve(curve))?;
        // Markers hold per-curve traces, so dropping a curve resets them like a clear.
        a.generation = a.generation.wrapping_add(1);
        self.touch();
        Ok(removed)
    }

    /// Show or hide a curve.
    pub fn set_curve_visible(
        &mut self,
        axes: AxesId,
        curve: CurveId,
        visible: bool,
    ) -> Result<(), MarkerError> {
        let c = self
            .axes_mut(axes)?
            .curves
            .get_mut(&curve)
            .ok_or(MarkerError::UnknownCurve(curve))?;
        c.visible = visible;
        self.touch();
        Ok(())
    }

    /// Remove every curve from an axes. Markers placed on its group are reset.
    pub fn clear_axes(&mut self, axes: AxesId) -> Result<(), MarkerError> {
        let a = self.axes_mut(axes)?;
        a.curves.clear();
        a.generation = a.generation.wrapping_add(1);
        self.touch();
        Ok(())
    }

    /// Set the x-axis view limits. Shared-x siblings follow.
    pub fn set_x_lim(&mut self, axes: AxesId, min: f64, max: f64) -> Result<(), MarkerError> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(MarkerError::InvalidAxisLimits(axes));
        }
        for id in self.shared_x_siblings(axes)? {
            self.axes_mut(id)?.x_lim = Some((min, max));
        }
        self.touch();
        Ok(())
    }

    /// Set the y-axis view limits.
    pub fn set_y_lim(&mut self, axes: AxesId, min: f64, max: f64) -> Result<(), MarkerError> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(MarkerError::InvalidAxisLimits(axes));
        }
        self.axes_mut(axes)?.y_lim = Some((min, max));
        self.touch();
        Ok(())
    }

    /// Set the x-axis scale. Shared-x siblings follow.
    pub fn set_x_scale(&mut self, axes: AxesId, scale: AxisScale) -> Result<(), MarkerError> {
        for id in self.shared_x_siblings(axes)? {
            self.axes_mut(id)?.x_scale = scale;
        }
        self.touch();
        Ok(())
    }

    /// Set the y-axis scale.
    pub fn set_y_scale(&mut self, axes: AxesId, scale: AxisScale) -> Result<(), MarkerError> {
        self.axes_mut(axes)?.y_scale = scale;
        self.touch();
        Ok(())
    }

    /// Resize the render surface.
    pub fn resize(&mut self, size: Size) {
        if self.size != size {
            self.size = size;
            self.touch();
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Axes in figure order.
    pub fn axes(&self) -> impl Iterator<Item = &Axes> {
        self.axes.values()
    }

    pub fn get(&self, id: AxesId) -> Option<&Axes> {
        self.axes.get(&id)
    }

    pub fn curve(&self, key: CurveKey) -> Option<&Curve> {
        self.axes.get(&key.axes)?.curves.get(&key.curve)
    }

    /// Every axes sharing an x-domain with `axes` (itself included), in figure order.
    pub fn shared_x_siblings(&self, axes: AxesId) -> Result<Vec<AxesId>, MarkerError> {
        let root = self.share_root(axes)?;
        let mut out = Vec::new();
        for id in self.axes.keys() {
            if self.share_root(*id)? == root {
                out.push(*id);
            }
        }
        Ok(out)
    }

    fn share_root(&self, mut axes: AxesId) -> Result<AxesId, MarkerError> {
        // share_x chains are built by add_twin_x and cannot form cycles.
        while let Some(next) = self.axes_ref(axes)?.share_x {
            axes = next;
        }
        Ok(axes)
    }

    pub fn set_zorder(&mut self, axes: AxesId, zorder: i32) -> Result<(), MarkerError> {
        self.axes_mut(axes)?.zorder = zorder;
        self.touch();
        Ok(())
    }

    pub fn set_patch_visible(&mut self, axes: AxesId, visible: bool) -> Result<(), MarkerError> {
        self.axes_mut(axes)?.patch_visible = visible;
        self.touch();
        Ok(())
    }

    /// Topmost axes containing a device point. Among equal z-orders, the one added last wins.
    pub fn axes_at(&self, point: Point) -> Option<AxesId> {
        self.axes
            .values()
            .filter(|a| self.device_bounds_of(a).contains(point))
            .max_by_key(|a| a.zorder)
            .map(|a| a.id)
    }

    /// Axes ids sorted for painting (ascending z-order, stable).
    pub(crate) fn paint_order(&self) -> Vec<AxesId> {
        let mut ids: Vec<_> = self.axes.values().map(|a| (a.zorder, a.id)).collect();
        ids.sort_by_key(|(z, _)| *z);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Device rectangle of an axes region.
    pub fn device_bounds(&self, axes: AxesId) -> Result<Rectangle, MarkerError> {
        Ok(self.device_bounds_of(self.axes_ref(axes)?))
    }

    fn device_bounds_of(&self, axes: &Axes) -> Rectangle {
        let p = axes.placement;
        Rectangle::new(
            Point::new(p.x * self.size.width, p.y * self.size.height),
            Size::new(p.width * self.size.width, p.height * self.size.height),
        )
    }

    /// Current view limits of an axes in data units: explicit limits, or data bounds with
    /// a small padding. The x-limits cover every shared-x sibling.
    pub fn view_limits(&self, axes: AxesId) -> Result<((f64, f64), (f64, f64)), MarkerError> {
        let a = self.axes_ref(axes)?;
        let x = match a.x_lim {
            Some(lim) => lim,
            None => {
                let mut bounds: Option<(f64, f64)> = None;
                for id in self.shared_x_siblings(axes)? {
                    if let Some((lo, hi)) = self.axes_ref(id)?.data_bounds(0, a.x_scale) {
                        bounds = Some(bounds.map_or((lo, hi), |(l, h)| (l.min(lo), h.max(hi))));
                    }
                }
                padded(bounds, a.x_scale)
            }
        };
        let y = match a.y_lim {
            Some(lim) => lim,
            None => padded(a.data_bounds(1, a.y_scale), a.y_scale),
        };
        Ok((x, y))
    }

    /// Coordinate mapper for an axes region.
    pub fn transform(&self, axes: AxesId) -> Result<AxesTransform, MarkerError> {
        let a = self.axes_ref(axes)?;
        for scale in [a.x_scale, a.y_scale] {
            if !scale.is_supported() {
                return Err(MarkerError::UnsupportedScaleKind { axes, scale });
            }
        }
        let (x_lim, y_lim) = self.view_limits(axes)?;
        AxesTransform::new(
            axes,
            self.device_bounds_of(a),
            x_lim,
            y_lim,
            a.x_scale,
            a.y_scale,
        )
    }

    pub(crate) fn axes_ref(&self, axes: AxesId) -> Result<&Axes, MarkerError> {
        self.axes.get(&axes).ok_or(MarkerError::UnknownAxes(axes))
    }

    fn axes_mut(&mut self, axes: AxesId) -> Result<&mut Axes, MarkerError> {
        self.axes.get_mut(&axes).ok_or(MarkerError::UnknownAxes(axes))
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }
}

/// Pad plot-space bounds and map them back to data units.
fn padded(bounds: Option<(f64, f64)>, scale: AxisScale) -> (f64, f64) {
    let (lo, hi) = bounds.unwrap_or((0.0, 1.0));
    let span = (hi - lo).max(1e-6);
    let pad = span * AUTOSCALE_PADDING / 2.0;
    match (scale.plot_to_data(lo - pad), scale.plot_to_data(hi + pad)) {
        (Some(a), Some(b)) => (a, b),
        _ => (0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Rectangle {
        Rectangle::new(Point::ORIGIN, Size::new(1.0, 1.0))
    }

    #[test]
    fn twins_share_x_domain() {
        let mut fig = Figure::default();
        let a = fig.add_axes(full());
        let b = fig.add_twin_x(a).unwrap();
        let c = fig.add_axes(full());
        assert_eq!(fig.shared_x_siblings(b).unwrap(), vec![a, b]);
        assert_eq!(fig.shared_x_siblings(c).unwrap(), vec![c]);
    }

    #[test]
    fn hit_test_prefers_highest_zorder() {
        let mut fig = Figure::new(Size::new(100.0, 100.0));
        let a = fig.add_axes(full());
        let b = fig.add_twin_x(a).unwrap();
        assert_eq!(fig.axes_at(Point::new(50.0, 50.0)), Some(a));
        fig.set_zorder(b, 3).unwrap();
        assert_eq!(fig.axes_at(Point::new(50.0, 50.0)), Some(b));
        assert_eq!(fig.axes_at(Point::new(150.0, 50.0)), None);
    }

    #[test]
    fn clear_bumps_generation() {
        let mut fig = Figure::default();
        let a = fig.add_axes(full());
        fig.add_curve(a, Curve::from_xy(&[0.0, 1.0], &[0.0, 1.0]))
            .unwrap();
        fig.clear_axes(a).unwrap();
        let axes = fig.get(a).unwrap();
        assert_eq!(axes.generation, 1);
        assert_eq!(axes.curves().count(), 0);
    }

    #[test]
    fn autoscaled_limits_cover_siblings() {
        let mut fig = Figure::default();
        let a = fig.add_axes(full());
        let b = fig.add_twin_x(a).unwrap();
        fig.add_curve(a, Curve::from_xy(&[0.0, 10.0], &[0.0, 1.0]))
            .unwrap();
        fig.add_curve(b, Curve::from_xy(&[-10.0, 5.0], &[0.0, 1.0]))
            .unwrap();
        let ((x0, x1), _) = fig.view_limits(a).unwrap();
        assert!(x0 < -10.0 && x1 > 10.0);
    }

    #[test]
    fn invalid_limits_rejected() {
        let mut fig = Figure::default();
        let a = fig.add_axes(full());
        assert_eq!(
            fig.set_x_lim(a, 1.0, 1.0),
            Err(MarkerError::InvalidAxisLimits(a))
        );
    }
}
