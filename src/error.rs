use crate::{AxisScale, curve::CurveId, figure::AxesId};

/// Errors produced by marker operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkerError {
    /// The axes group has no curves a marker could snap to.
    #[error("{axes} has no curves eligible for markers")]
    NoEligibleCurves { axes: AxesId },

    /// An axis reports a scale the coordinate mapper cannot invert.
    #[error("{axes} uses unsupported axis scale {scale:?}")]
    UnsupportedScaleKind { axes: AxesId, scale: AxisScale },

    /// A linked marker set has no marker at the propagated position.
    #[error("{axes} has {len} markers, linked operation targeted index {index}")]
    LinkIndexMismatch {
        axes: AxesId,
        index: usize,
        len: usize,
    },

    /// The group has no active marker to operate on.
    #[error("{axes} has no active marker")]
    NoActiveMarker { axes: AxesId },

    /// No axes with the given id exists in the figure.
    #[error("unknown axes: {0}")]
    UnknownAxes(AxesId),

    /// No curve with the given id exists on the axes.
    #[error("unknown curve: {0}")]
    UnknownCurve(CurveId),

    /// Axis limits are not properly set (min >= max, or non-finite).
    #[error("invalid axis limits on {0}")]
    InvalidAxisLimits(AxesId),

    /// A builder call referred to an axes position that was never added.
    #[error("no axes at builder position {0}")]
    UnknownAxesIndex(usize),

    /// A curve was constructed with no samples.
    #[error("curve has no samples")]
    EmptyCurve,
}
