use core::fmt;

use crate::{Color, MarkerError, figure::AxesId};

/// Unique identifier for a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurveId(pub(crate) u64);

impl CurveId {
    /// Create a new unique curve ID (0, 1, 2, ...).
    pub(crate) fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Curve({})", self.0)
    }
}

/// A curve together with the axes region that draws it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurveKey {
    pub axes: AxesId,
    pub curve: CurveId,
}

/// An ordered sequence of (x, y) samples drawn on one axes region.
///
/// Curves are immutable while markers are placed on them; replacing the data of an
/// axes means clearing it and adding new curves.
#[derive(Debug, Clone)]
pub struct Curve {
    /// Unique identifier for the curve.
    pub id: CurveId,

    /// Sample positions in data coordinates.
    pub positions: Vec<[f64; 2]>,

    /// Optional per-sample value shown in marker labels instead of x.
    ///
    /// Useful when the plotted x is not what the cursor should report, e.g. a trace on
    /// the complex plane whose samples are indexed by frequency.
    pub marker_x: Option<Vec<f64>>,

    /// Optional label for the curve.
    pub label: Option<String>,

    /// Line color. Marker dots and label borders inherit it.
    pub color: Color,

    /// Line width in pixels.
    pub width: f32,

    /// Hidden curves are neither drawn nor eligible for markers.
    pub visible: bool,
}

impl Curve {
    /// Create a new curve from sample positions.
    pub fn new(positions: Vec<[f64; 2]>) -> Self {
        Self {
            id: CurveId::new(),
            positions,
            marker_x: None,
            label: None,
            color: Color::from_rgb(0.3, 0.3, 0.9),
            width: 1.0,
            visible: true,
        }
    }

    /// Create a new curve from separate x and y arrays. Extra samples of the longer array
    /// are dropped.
    pub fn from_xy(x: &[f64], y: &[f64]) -> Self {
        Self::new(x.iter().zip(y).map(|(&x, &y)| [x, y]).collect())
    }

    /// Set a label for the curve.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let l = label.into();
        if !l.is_empty() {
            self.label = Some(l);
        }
        self
    }

    /// Set the color of the curve.
    pub fn with_color(mut self, color: impl Into<Color>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the line width in pixels.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width.max(0.5);
        self
    }

    /// Set the per-sample values reported by marker labels in place of x.
    pub fn with_marker_x(mut self, marker_x: Vec<f64>) -> Self {
        self.marker_x = Some(marker_x);
        self
    }

    /// Start the curve hidden.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub(crate) fn x(&self, index: usize) -> f64 {
        self.positions[index][0]
    }

    pub(crate) fn y(&self, index: usize) -> f64 {
        self.positions[index][1]
    }

    /// Value reported for the sample's x in marker labels.
    pub(crate) fn label_x(&self, index: usize) -> f64 {
        self.marker_x
            .as_ref()
            .and_then(|mx| mx.get(index))
            .copied()
            .unwrap_or_else(|| self.x(index))
    }

    /// Smallest and largest finite x, or `None` when the curve has no finite x.
    pub(crate) fn x_bounds(&self) -> Option<(f64, f64)> {
        self.positions
            .iter()
            .map(|p| p[0])
            .filter(|x| x.is_finite())
            .fold(None, |acc, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
    }

    /// Curves without any finite x cannot host a marker.
    pub(crate) fn is_degenerate(&self) -> bool {
        self.x_bounds().is_none()
    }

    /// Index of the sample whose x is closest to `x`. Ties resolve to the lowest index.
    pub(crate) fn nearest_index_x(&self, x: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in self.positions.iter().enumerate() {
            let d = (p[0] - x).powi(2);
            if !d.is_finite() {
                continue;
            }
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }

    pub(crate) fn validate(&self) -> Result<(), MarkerError> {
        if self.positions.is_empty() {
            return Err(MarkerError::EmptyCurve);
        }
        Ok(())
    }
}
