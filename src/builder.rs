use iced::{Rectangle, Size};

use crate::{
    AxisScale, MarkerError,
    curve::Curve,
    figure::{AxesId, Figure},
    manager::MarkerManager,
    marker::MarkerTarget,
    params::{MarkerOption, MarkerParams},
    text::TextMeasure,
    widget::MarkerPlot,
};

/// Builder for configuring and constructing a [`MarkerPlot`].
///
/// Axes are referred to by the position they were added in: the cells of
/// [`grid`](Self::grid) first (row-major), then every [`add_axes`](Self::add_axes) or
/// [`add_twin_x`](Self::add_twin_x) call in order.
///
/// # Example
///
/// ```ignore
/// let plot = MarkerPlotBuilder::new()
///     .grid(2, 1)
///     .add_curve(0, Curve::from_xy(&x, &sin))
///     .add_curve(1, Curve::from_xy(&x, &cos))
///     .with_link_all()
///     .with_option(MarkerOption::ShowIndexLabel(true))
///     .build()?;
/// ```
#[derive(Default)]
pub struct MarkerPlotBuilder {
    size: Option<Size>,
    grid: Option<(usize, usize)>,
    axes: Vec<AxesSpec>,
    curves: Vec<(usize, Curve)>,
    x_lims: Vec<(usize, f64, f64)>,
    y_lims: Vec<(usize, f64, f64)>,
    x_scales: Vec<(usize, AxisScale)>,
    y_scales: Vec<(usize, AxisScale)>,
    params: Option<MarkerParams>,
    options: Vec<MarkerOption>,
    top_axes: Vec<usize>,
    links: Vec<(usize, usize)>,
    link_all: bool,
    markers: Vec<(usize, f64)>,
    text_measure: Option<Box<dyn TextMeasure>>,
}

enum AxesSpec {
    Placed(Rectangle),
    TwinX(usize),
}

impl MarkerPlotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device size the figure starts with. The widget resizes it to its bounds on first
    /// layout.
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    /// Lay out a `rows` x `cols` grid of axes.
    pub fn grid(mut self, rows: usize, cols: usize) -> Self {
        self.grid = Some((rows, cols));
        self
    }

    /// Add an axes at a placement given as a fraction of the figure.
    pub fn add_axes(mut self, placement: Rectangle) -> Self {
        self.axes.push(AxesSpec::Placed(placement));
        self
    }

    /// Add an axes overlaying the one at position `of`, sharing its x-domain.
    pub fn add_twin_x(mut self, of: usize) -> Self {
        self.axes.push(AxesSpec::TwinX(of));
        self
    }

    pub fn add_curve(mut self, axes: usize, curve: Curve) -> Self {
        self.curves.push((axes, curve));
        self
    }

    pub fn with_x_lim(mut self, axes: usize, min: f64, max: f64) -> Self {
        self.x_lims.push((axes, min, max));
        self
    }

    pub fn with_y_lim(mut self, axes: usize, min: f64, max: f64) -> Self {
        self.y_lims.push((axes, min, max));
        self
    }

    pub fn with_x_scale(mut self, axes: usize, scale: AxisScale) -> Self {
        self.x_scales.push((axes, scale));
        self
    }

    pub fn with_y_scale(mut self, axes: usize, scale: AxisScale) -> Self {
        self.y_scales.push((axes, scale));
        self
    }

    /// Base marker configuration for every group. Options are applied on top of it.
    pub fn with_params(mut self, params: MarkerParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_option(mut self, option: MarkerOption) -> Self {
        self.options.push(option);
        self
    }

    /// Prefer the axes at `axes` as the interactive member of its shared-x group.
    pub fn with_top_axes(mut self, axes: usize) -> Self {
        self.top_axes.push(axes);
        self
    }

    /// Link the marker groups of two axes.
    pub fn with_link(mut self, a: usize, b: usize) -> Self {
        self.links.push((a, b));
        self
    }

    /// Link every marker group on the figure.
    pub fn with_link_all(mut self) -> Self {
        self.link_all = true;
        self
    }

    /// Place a marker at `x` once the plot is built. Linked groups follow.
    pub fn with_marker(mut self, axes: usize, x: f64) -> Self {
        self.markers.push((axes, x));
        self
    }

    pub fn with_text_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.text_measure = Some(Box::new(measure));
        self
    }

    /// Build the plot; fails on positions that name no axes and on invalid curves or
    /// limits.
    pub fn build(self) -> Result<MarkerPlot, MarkerError> {
        let size = self.size.unwrap_or(Size::new(800.0, 600.0));
        let (mut figure, mut ids) = match self.grid {
            Some((rows, cols)) => Figure::subplots(size, rows, cols),
            None => (Figure::new(size), Vec::new()),
        };
        for spec in self.axes {
            let id = match spec {
                AxesSpec::Placed(placement) => figure.add_axes(placement),
                AxesSpec::TwinX(of) => figure.add_twin_x(resolve(&ids, of)?)?,
            };
            ids.push(id);
        }

        for (axes, curve) in self.curves {
            figure.add_curve(resolve(&ids, axes)?, curve)?;
        }
        for (axes, scale) in self.x_scales {
            figure.set_x_scale(resolve(&ids, axes)?, scale)?;
        }
        for (axes, scale) in self.y_scales {
            figure.set_y_scale(resolve(&ids, axes)?, scale)?;
        }
        for (axes, min, max) in self.x_lims {
            figure.set_x_lim(resolve(&ids, axes)?, min, max)?;
        }
        for (axes, min, max) in self.y_lims {
            figure.set_y_lim(resolve(&ids, axes)?, min, max)?;
        }

        let mut params = self.params.unwrap_or_default();
        params.merge(self.options);
        let top = self
            .top_axes
            .iter()
            .map(|&i| resolve(&ids, i))
            .collect::<Result<Vec<_>, _>>()?;
        let mut manager = MarkerManager::enable(&mut figure, params, &top, self.link_all)?;
        if let Some(measure) = self.text_measure {
            manager = manager.with_text_measure(measure);
        }
        for (a, b) in self.links {
            manager.link(resolve(&ids, a)?, [resolve(&ids, b)?])?;
        }
        for (axes, x) in self.markers {
            manager.add_linked(&figure, resolve(&ids, axes)?, MarkerTarget::x(x))?;
        }

        log::debug!("marker plot built with {} axes", ids.len());
        Ok(MarkerPlot::new(figure, manager))
    }
}

fn resolve(ids: &[AxesId], position: usize) -> Result<AxesId, MarkerError> {
    ids.get(position)
        .copied()
        .ok_or(MarkerError::UnknownAxesIndex(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Curve {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        Curve::from_xy(&x, &x)
    }

    #[test]
    fn unknown_position_is_rejected() {
        let err = MarkerPlotBuilder::new()
            .grid(1, 1)
            .add_curve(3, ramp(5))
            .build()
            .err();
        assert_eq!(err, Some(MarkerError::UnknownAxesIndex(3)));
    }

    #[test]
    fn twin_axes_form_one_group() {
        let plot = MarkerPlotBuilder::new()
            .grid(1, 1)
            .add_twin_x(0)
            .add_curve(0, ramp(5))
            .add_curve(1, ramp(5))
            .with_top_axes(1)
            .build()
            .unwrap();
        let ids: Vec<_> = plot.figure().axes().map(|a| a.id).collect();
        assert_eq!(plot.manager().groups().count(), 1);
        assert_eq!(plot.manager().group_of(ids[0]).unwrap(), ids[1]);
    }

    #[test]
    fn initial_markers_follow_links() {
        let plot = MarkerPlotBuilder::new()
            .grid(2, 1)
            .add_curve(0, ramp(11))
            .add_curve(1, ramp(11))
            .with_link(0, 1)
            .with_marker(0, 4.2)
            .build()
            .unwrap();
        let ids: Vec<_> = plot.figure().axes().map(|a| a.id).collect();
        for id in ids {
            let set = plot.manager().markers(id).unwrap();
            assert_eq!(set.len(), 1);
            assert_eq!(set.active().unwrap().index(), 4);
        }
    }
}
