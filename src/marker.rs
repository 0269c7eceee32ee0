//! A single data-cursor and its glyphs.

use glam::{DVec2, Vec2};
use iced::Point;
use indexmap::{IndexMap, map::Entry};

use crate::{
    Color, MarkerError,
    curve::{Curve, CurveKey},
    figure::{AxesId, Figure},
    glyph::{Glyph, IndexLine, LabelBox, ValueDot},
    layout::space_labels,
    params::{MarkerParams, ValueContext},
    text::TextMeasure,
    transform::AxesTransform,
};

const INDEX_LINE_WIDTH: f32 = 0.5;
const DOT_RADIUS: f32 = 4.0;

/// Where to place a marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerTarget {
    /// Snap to the sample nearest a data-space position. `y` only takes part in the
    /// distance metric in value mode.
    Value { x: f64, y: Option<f64> },
    /// Select a sample index of the reference curve (the first eligible curve).
    Index(usize),
}

impl MarkerTarget {
    pub fn x(x: f64) -> Self {
        Self::Value { x, y: None }
    }

    pub fn xy(x: f64, y: f64) -> Self {
        Self::Value { x, y: Some(y) }
    }
}

/// Direction of a one-step marker shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the next sample.
    Forward,
    /// Towards the previous sample.
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Everything a marker reads while it updates.
#[derive(Clone, Copy)]
pub(crate) struct MarkerContext<'a> {
    pub figure: &'a Figure,
    pub params: &'a MarkerParams,
    pub measure: &'a dyn TextMeasure,
}

/// The part of a marker attached to one curve.
#[derive(Debug, Clone)]
pub struct Trace {
    pub key: CurveKey,
    /// Selected sample; always in bounds for the curve.
    pub index: usize,
    x_bounds: Option<(f64, f64)>,
    pub dot: ValueDot,
    pub label: LabelBox,
}

impl Trace {
    fn new(key: CurveKey, curve: &Curve, params: &MarkerParams) -> Self {
        Self {
            key,
            index: 0,
            x_bounds: curve.x_bounds(),
            dot: ValueDot {
                axes: key.axes,
                position: DVec2::ZERO,
                color: curve.color,
                radius: DOT_RADIUS,
                visible: params.show_value_dot,
            },
            label: LabelBox::new(key.axes, curve.color, params.label_alpha),
        }
    }

    fn in_domain(&self, x: f64) -> bool {
        self.x_bounds.is_some_and(|(lo, hi)| x >= lo && x <= hi)
    }

    fn hide(&mut self) {
        self.dot.visible = false;
        self.label.visible = false;
    }
}

/// A data-cursor snapped to one x-position, with a readout on every eligible curve of
/// its axes group.
///
/// Markers are owned by the [`MarkerSet`](crate::MarkerSet) of their group and are
/// dropped with their glyphs when deleted.
#[derive(Debug, Clone)]
pub struct Marker {
    group: AxesId,
    /// Snapped x in data units.
    x: f64,
    traces: Vec<Trace>,
    index_line: IndexLine,
    index_label: LabelBox,
}

impl Marker {
    /// Create a marker on `group` over the given eligible curves and snap it to `target`.
    pub(crate) fn create(
        group: AxesId,
        curves: Vec<CurveKey>,
        target: MarkerTarget,
        ctx: MarkerContext<'_>,
    ) -> Result<Self, MarkerError> {
        if curves.is_empty() {
            return Err(MarkerError::NoEligibleCurves { axes: group });
        }
        // Scale kinds are checked before any geometry is computed.
        ctx.figure.transform(group)?;
        let mut traces = Vec::with_capacity(curves.len());
        for key in curves {
            ctx.figure.transform(key.axes)?;
            let curve = ctx
                .figure
                .curve(key)
                .ok_or(MarkerError::UnknownCurve(key.curve))?;
            traces.push(Trace::new(key, curve, ctx.params));
        }

        let mut marker = Self {
            group,
            x: f64::NAN,
            traces,
            index_line: IndexLine {
                axes: group,
                x: f64::NAN,
                color: Color::from_rgb(1.0, 0.0, 0.0),
                width: INDEX_LINE_WIDTH,
                visible: ctx.params.show_index_line,
            },
            index_label: LabelBox::new(group, Color::BLACK, ctx.params.label_alpha),
        };
        marker.move_to(target, ctx)?;
        Ok(marker)
    }

    /// Axes group the marker belongs to.
    pub fn group(&self) -> AxesId {
        self.group
    }

    /// Snapped x-position in data units.
    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Selected sample of the reference curve. Linked groups follow this index.
    pub fn index(&self) -> usize {
        debug_assert!(!self.traces.is_empty());
        self.traces[0].index
    }

    /// Selected sample of every curve, in trace order.
    pub fn indices(&self) -> Vec<usize> {
        self.traces.iter().map(|t| t.index).collect()
    }

    pub fn index_line(&self) -> &IndexLine {
        &self.index_line
    }

    pub fn index_label(&self) -> &LabelBox {
        &self.index_label
    }

    /// Glyphs in paint order.
    pub fn glyphs(&self) -> impl Iterator<Item = Glyph<'_>> {
        std::iter::once(Glyph::IndexLine(&self.index_line))
            .chain(
                self.traces
                    .iter()
                    .flat_map(|t| [Glyph::Dot(&t.dot), Glyph::Label(&t.label)]),
            )
            .chain(std::iter::once(Glyph::Label(&self.index_label)))
    }

    /// Whether a device point hits one of the marker's labels.
    pub fn contains_point(&self, figure: &Figure, point: Point) -> bool {
        let device = Vec2::new(point.x, point.y);
        std::iter::once(&self.index_label)
            .chain(self.traces.iter().map(|t| &t.label))
            .filter(|label| label.visible)
            .any(|label| {
                figure
                    .transform(label.axes)
                    .is_ok_and(|t| label.contains(t.from_display(device)))
            })
    }

    /// Re-snap to a new target.
    ///
    /// In index mode every curve selects the same sample and the nominal x is read from
    /// the reference curve. In value mode each curve picks its own sample nearest the
    /// snapped x, so curves need not share a sample grid.
    pub(crate) fn move_to(
        &mut self,
        target: MarkerTarget,
        ctx: MarkerContext<'_>,
    ) -> Result<(), MarkerError> {
        let figure = ctx.figure;
        let reference = self.reference_curve(figure)?;

        if ctx.params.index_only_mode {
            let index = match target {
                MarkerTarget::Index(i) => Some(i),
                MarkerTarget::Value { x, .. } => reference.nearest_index_x(x),
            };
            if let Some(index) = index {
                let index = index.min(self.shared_len(figure)? - 1);
                for trace in &mut self.traces {
                    trace.index = index;
                }
                self.x = reference.x(index);
            }
        } else {
            let snapped = match target {
                MarkerTarget::Index(i) => {
                    let i = i.min(reference.len() - 1);
                    Some((reference.x(i), Some(i)))
                }
                MarkerTarget::Value { x, y } => self
                    .find_nearest(figure, x, y.filter(|y| y.is_finite()))
                    .map(|x| (x, None)),
            };
            if let Some((x, pinned)) = snapped {
                for (n, trace) in self.traces.iter_mut().enumerate() {
                    if let (0, Some(i)) = (n, pinned) {
                        trace.index = i;
                    } else if let Some(i) = figure
                        .curve(trace.key)
                        .and_then(|c| c.nearest_index_x(x))
                    {
                        trace.index = i;
                    }
                }
                self.x = x;
            }
        }

        self.update_glyphs(ctx)
    }

    /// Step to the adjacent sample.
    ///
    /// Value mode takes the largest step any curve needs to reach its neighbouring sample,
    /// so the cursor advances uniformly across curves of different densities.
    pub(crate) fn shift(
        &mut self,
        direction: Direction,
        ctx: MarkerContext<'_>,
    ) -> Result<(), MarkerError> {
        let figure = ctx.figure;
        let params = ctx.params;
        let direction = if params.x_reversed {
            direction.reversed()
        } else {
            direction
        };

        if params.index_only_mode {
            let len = self.shared_len(figure)?;
            let current = self.index();
            let next = match direction {
                Direction::Forward if current + 1 < len => current + 1,
                Direction::Forward if params.allow_wrap_around => 0,
                Direction::Forward => len - 1,
                Direction::Backward if current > 0 => current - 1,
                Direction::Backward if params.allow_wrap_around => len - 1,
                Direction::Backward => 0,
            };
            return self.move_to(MarkerTarget::Index(next), ctx);
        }

        let mut step = 0.0_f64;
        let mut anchor: Option<f64> = None;
        for trace in &self.traces {
            let Some(curve) = figure.curve(trace.key) else {
                continue;
            };
            let i = trace.index;
            let neighbour = match direction {
                Direction::Forward => (i + 1 < curve.len()).then_some(i + 1),
                Direction::Backward => i.checked_sub(1),
            };
            let Some(j) = neighbour else { continue };
            let (here, there) = (curve.x(i), curve.x(j));
            if !(here.is_finite() && there.is_finite()) {
                continue;
            }
            let (s, a) = match direction {
                Direction::Forward => (there - here, anchor.map_or(here, |a| a.min(here))),
                Direction::Backward => (here - there, anchor.map_or(here, |a| a.max(here))),
            };
            step = step.max(s);
            anchor = Some(a);
        }

        match anchor {
            Some(a) => {
                let x = match direction {
                    Direction::Forward => a + step,
                    Direction::Backward => a - step,
                };
                self.move_to(MarkerTarget::x(x), ctx)
            }
            None if params.allow_wrap_around => {
                let last = self.reference_curve(figure)?.len() - 1;
                let index = match direction {
                    Direction::Forward => 0,
                    Direction::Backward => last,
                };
                self.move_to(MarkerTarget::Index(index), ctx)
            }
            None => Ok(()),
        }
    }

    /// Recompute glyph geometry and text from the current indices.
    pub(crate) fn update_glyphs(&mut self, ctx: MarkerContext<'_>) -> Result<(), MarkerError> {
        let MarkerContext {
            figure,
            params,
            measure,
        } = ctx;
        let mut transforms = IndexMap::new();
        let group = transform_for(&mut transforms, figure, self.group)?;
        let x = self.x;

        self.index_line.x = x;
        self.index_line.visible = params.show_index_line && x.is_finite();

        let label = &mut self.index_label;
        set_label_text(label, params.format_x(x), &group, measure, params);
        match group.x_to_normalized(x).filter(|xa| xa.is_finite()) {
            Some(xa) => {
                label.anchor = DVec2::new(xa - label.size.x / 2.0, label.size.y / 2.0);
                label.visible = params.show_index_label;
            }
            None => label.visible = false,
        }
        let floor = label.visible.then_some(label.size.y);

        for trace in &mut self.traces {
            let transform = transform_for(&mut transforms, figure, trace.key.axes)?;
            let Some(curve) = figure.curve(trace.key) else {
                trace.hide();
                continue;
            };
            let (xd, yd) = (curve.x(trace.index), curve.y(trace.index));
            let in_domain = params.index_only_mode || trace.in_domain(x);

            trace.dot.position = DVec2::new(xd, yd);
            trace.dot.color = curve.color;
            trace.label.border = curve.color;
            let text = params.format_value(ValueContext {
                x: curve.label_x(trace.index),
                y: yd,
                index: trace.index,
            });
            set_label_text(&mut trace.label, text, &transform, measure, params);

            let normalized = transform
                .to_normalized(DVec2::new(xd, yd))
                .filter(|n| in_domain && yd.is_finite() && n.is_finite());
            match normalized {
                Some(n) => {
                    let gap = transform
                        .extent_to_normalized(Vec2::new(params.label_gap_px, 0.0))
                        .x;
                    trace.label.anchor = DVec2::new(n.x + gap, n.y);
                    trace.dot.visible = params.show_value_dot;
                    trace.label.visible = params.show_value_labels;
                }
                None => trace.hide(),
            }
        }

        let shown: Vec<usize> = (0..self.traces.len())
            .filter(|&i| self.traces[i].label.visible)
            .collect();
        let height = shown
            .iter()
            .map(|&i| self.traces[i].label.size.y)
            .fold(0.0, f64::max);
        let ys: Vec<f64> = shown
            .iter()
            .map(|&i| self.traces[i].label.anchor.y)
            .collect();
        for (&i, y) in shown.iter().zip(space_labels(&ys, height, floor)) {
            self.traces[i].label.anchor.y = y;
        }
        Ok(())
    }

    /// Snap x of the sample nearest `(x, y)` over every curve. Without `y` the distance
    /// is measured along x only. Ties resolve to the first curve, then the lowest index.
    ///
    /// Curves in a group need not share a sample grid, so the closest sample of any curve
    /// sets the marker x. Each trace then takes its own nearest sample to that x. With a
    /// single curve this is the reference-curve search.
    fn find_nearest(&self, figure: &Figure, x: f64, y: Option<f64>) -> Option<f64> {
        let mut best: Option<(f64, f64)> = None;
        for trace in &self.traces {
            let Some(curve) = figure.curve(trace.key) else {
                continue;
            };
            for p in &curve.positions {
                let d = match y {
                    Some(y) => (p[0] - x).powi(2) + (p[1] - y).powi(2),
                    None => (p[0] - x).powi(2),
                };
                if !d.is_finite() {
                    continue;
                }
                if best.is_none_or(|(_, best_d)| d < best_d) {
                    best = Some((p[0], d));
                }
            }
        }
        best.map(|(x, _)| x)
    }

    fn reference_curve<'f>(&self, figure: &'f Figure) -> Result<&'f Curve, MarkerError> {
        debug_assert!(!self.traces.is_empty());
        let key = self.traces[0].key;
        figure.curve(key).ok_or(MarkerError::UnknownCurve(key.curve))
    }

    /// Length shared by every curve, so a common index stays in bounds.
    fn shared_len(&self, figure: &Figure) -> Result<usize, MarkerError> {
        let mut len = usize::MAX;
        for trace in &self.traces {
            let curve = figure
                .curve(trace.key)
                .ok_or(MarkerError::UnknownCurve(trace.key.curve))?;
            len = len.min(curve.len());
        }
        Ok(len)
    }
}

fn transform_for(
    cache: &mut IndexMap<AxesId, AxesTransform>,
    figure: &Figure,
    axes: AxesId,
) -> Result<AxesTransform, MarkerError> {
    Ok(match cache.entry(axes) {
        Entry::Occupied(e) => *e.get(),
        Entry::Vacant(e) => *e.insert(figure.transform(axes)?),
    })
}

/// Set label text and size the box from the measured extent.
fn set_label_text(
    label: &mut LabelBox,
    text: String,
    transform: &AxesTransform,
    measure: &dyn TextMeasure,
    params: &MarkerParams,
) {
    label.text_extent = measure.measure(&text, params.font_size);
    label.size = transform.extent_to_normalized(label.text_extent * params.label_padding);
    label.font_size = params.font_size;
    label.alpha = params.label_alpha;
    label.text = text;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{curve::Curve, text::ApproxTextMeasure};
    use iced::{Rectangle, Size};

    struct Scene {
        figure: Figure,
        axes: AxesId,
        keys: Vec<CurveKey>,
    }

    fn scene(curves: Vec<Curve>) -> Scene {
        let mut figure = Figure::new(Size::new(400.0, 300.0));
        let axes = figure.add_axes(Rectangle::new(Point::ORIGIN, Size::new(1.0, 1.0)));
        let keys = curves
            .into_iter()
            .map(|c| CurveKey {
                axes,
                curve: figure.add_curve(axes, c).unwrap(),
            })
            .collect();
        Scene { figure, axes, keys }
    }

    fn ramp(n: usize, step: f64) -> Curve {
        let x: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
        Curve::from_xy(&x, &x)
    }

    fn create(s: &Scene, params: &MarkerParams, target: MarkerTarget) -> Marker {
        let ctx = MarkerContext {
            figure: &s.figure,
            params,
            measure: &ApproxTextMeasure::default(),
        };
        Marker::create(s.axes, s.keys.clone(), target, ctx).unwrap()
    }

    #[test]
    fn no_curves_is_an_error() {
        let s = scene(Vec::new());
        let params = MarkerParams::default();
        let ctx = MarkerContext {
            figure: &s.figure,
            params: &params,
            measure: &ApproxTextMeasure::default(),
        };
        let err = Marker::create(s.axes, Vec::new(), MarkerTarget::x(0.0), ctx).unwrap_err();
        assert_eq!(err, MarkerError::NoEligibleCurves { axes: s.axes });
    }

    #[test]
    fn euclidean_snap_uses_y_hint() {
        let low = Curve::from_xy(&[0.0, 1.0, 2.0], &[0.0, 0.0, 0.0]);
        let high = Curve::from_xy(&[0.4, 1.4, 2.4], &[5.0, 5.0, 5.0]);
        let s = scene(vec![low, high]);
        let params = MarkerParams::default();
        let m = create(&s, &params, MarkerTarget::xy(1.3, 5.0));
        assert_eq!(m.x(), 1.4);
        let m = create(&s, &params, MarkerTarget::x(1.3));
        assert_eq!(m.x(), 1.4);
        let m = create(&s, &params, MarkerTarget::xy(1.3, 0.0));
        assert_eq!(m.x(), 1.0);
    }

    #[test]
    fn snap_tie_prefers_first_curve() {
        let a = Curve::from_xy(&[0.0, 2.0], &[0.0, 0.0]);
        let b = Curve::from_xy(&[1.0, 3.0], &[0.0, 0.0]);
        let s = scene(vec![a, b]);
        let m = create(&s, &MarkerParams::default(), MarkerTarget::x(1.5));
        assert_eq!(m.x(), 2.0);
    }

    #[test]
    fn value_mode_indices_are_per_curve() {
        let s = scene(vec![ramp(11, 1.0), ramp(21, 0.5)]);
        let m = create(&s, &MarkerParams::default(), MarkerTarget::x(4.2));
        assert_eq!(m.x(), 4.0);
        assert_eq!(m.indices(), vec![4, 8]);
    }

    #[test]
    fn index_mode_clamps_to_shortest_curve() {
        let s = scene(vec![ramp(10, 1.0), ramp(5, 1.0)]);
        let params = MarkerParams {
            index_only_mode: true,
            ..MarkerParams::default()
        };
        let mut m = create(&s, &params, MarkerTarget::Index(8));
        assert_eq!(m.indices(), vec![4, 4]);
        let ctx = MarkerContext {
            figure: &s.figure,
            params: &params,
            measure: &ApproxTextMeasure::default(),
        };
        m.shift(Direction::Forward, ctx).unwrap();
        assert_eq!(m.indices(), vec![4, 4]);
        m.shift(Direction::Backward, ctx).unwrap();
        assert_eq!(m.indices(), vec![3, 3]);
    }

    #[test]
    fn shift_uses_largest_step() {
        let s = scene(vec![ramp(11, 1.0), ramp(41, 0.25)]);
        let params = MarkerParams::default();
        let mut m = create(&s, &params, MarkerTarget::x(2.0));
        let ctx = MarkerContext {
            figure: &s.figure,
            params: &params,
            measure: &ApproxTextMeasure::default(),
        };
        m.shift(Direction::Forward, ctx).unwrap();
        assert_eq!(m.x(), 3.0);
        assert_eq!(m.indices(), vec![3, 12]);
    }

    #[test]
    fn reversed_axis_inverts_shift() {
        let s = scene(vec![ramp(11, 1.0)]);
        let params = MarkerParams {
            x_reversed: true,
            ..MarkerParams::default()
        };
        let mut m = create(&s, &params, MarkerTarget::x(5.0));
        let ctx = MarkerContext {
            figure: &s.figure,
            params: &params,
            measure: &ApproxTextMeasure::default(),
        };
        m.shift(Direction::Forward, ctx).unwrap();
        assert_eq!(m.index(), 4);
    }

    #[test]
    fn wrap_around_jumps_to_other_end() {
        let s = scene(vec![ramp(5, 1.0)]);
        let params = MarkerParams {
            allow_wrap_around: true,
            ..MarkerParams::default()
        };
        let mut m = create(&s, &params, MarkerTarget::x(4.0));
        let ctx = MarkerContext {
            figure: &s.figure,
            params: &params,
            measure: &ApproxTextMeasure::default(),
        };
        m.shift(Direction::Forward, ctx).unwrap();
        assert_eq!(m.index(), 0);
        m.shift(Direction::Backward, ctx).unwrap();
        assert_eq!(m.index(), 4);
    }

    #[test]
    fn non_finite_value_hides_trace() {
        let curve = Curve::new(vec![[0.0, 1.0], [1.0, f64::NAN], [2.0, 3.0]]);
        let s = scene(vec![curve]);
        let m = create(&s, &MarkerParams::default(), MarkerTarget::x(1.0));
        let trace = &m.traces()[0];
        assert_eq!(trace.index, 1);
        assert!(!trace.dot.visible);
        assert!(!trace.label.visible);
        assert!(m.index_line().visible);
    }

    #[test]
    fn label_hit_test_in_device_space() {
        let s = scene(vec![ramp(11, 1.0)]);
        let m = create(&s, &MarkerParams::default(), MarkerTarget::x(5.0));
        let label = &m.traces()[0].label;
        let t = s.figure.transform(s.axes).unwrap();
        let inside = t.to_display(label.anchor + DVec2::new(label.size.x / 2.0, 0.0));
        assert!(m.contains_point(&s.figure, Point::new(inside.x, inside.y)));
        let dot = t.data_to_display(DVec2::new(5.0, 5.0)).unwrap();
        assert!(!m.contains_point(&s.figure, Point::new(dot.x - 20.0, dot.y)));
    }

    #[test]
    fn glyph_paint_order() {
        let s = scene(vec![ramp(3, 1.0), ramp(3, 1.0)]);
        let m = create(&s, &MarkerParams::default(), MarkerTarget::x(1.0));
        let glyphs: Vec<_> = m.glyphs().collect();
        assert_eq!(glyphs.len(), 6);
        assert!(matches!(glyphs[0], Glyph::IndexLine(_)));
        assert!(matches!(glyphs[1], Glyph::Dot(_)));
        assert!(matches!(glyphs[5], Glyph::Label(_)));
    }
}
