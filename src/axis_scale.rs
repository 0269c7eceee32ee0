/// Axis scaling mode reported by an axes region.
///
/// Only [`AxisScale::Linear`] and [`AxisScale::Log10`] can be mapped by the marker core.
/// The remaining kinds exist so a host can describe its axes faithfully; asking the
/// coordinate mapper to work with them fails with
/// [`MarkerError::UnsupportedScaleKind`](crate::MarkerError::UnsupportedScaleKind).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AxisScale {
    /// Linear axis: displayed value is the raw data value.
    #[default]
    Linear,

    /// Logarithmic axis: displayed value is `log10(raw)`.
    ///
    /// Only positive values are representable on this axis.
    Log10,

    /// Symmetric log axis, linear within `±linthresh`.
    SymLog {
        /// Half-width of the linear region around zero.
        linthresh: f64,
    },

    /// Logit axis over the open interval (0, 1).
    Logit,
}

impl AxisScale {
    /// Whether the coordinate mapper can transform values on this axis.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Linear | Self::Log10)
    }

    /// Transform raw data value into plot-space value.
    pub(crate) fn data_to_plot(self, value: f64) -> Option<f64> {
        match self {
            Self::Linear => value.is_finite().then_some(value),
            Self::Log10 => (value.is_finite() && value > 0.0)
                .then(|| value.log10())
                .filter(|v| v.is_finite()),
            Self::SymLog { .. } | Self::Logit => None,
        }
    }

    /// Transform plot-space value into raw data value.
    pub(crate) fn plot_to_data(self, value: f64) -> Option<f64> {
        match self {
            Self::Linear => value.is_finite().then_some(value),
            Self::Log10 => {
                if !value.is_finite() {
                    return None;
                }
                let out = 10f64.powf(value);
                (out.is_finite() && out > 0.0).then_some(out)
            }
            Self::SymLog { .. } | Self::Logit => None,
        }
    }
}
