//! Marker configuration.

use std::fmt;
use std::sync::Arc;

/// Label background opacity used by default and in place of a NaN setting.
pub const DEFAULT_LABEL_ALPHA: f32 = 0.7;

/// Formats the snapped x-value shown in the index label.
pub type XFormatter = Arc<dyn Fn(f64) -> String + Send + Sync>;

/// Formats a value label from the sample it points at.
pub type ValueFormatter = Arc<dyn Fn(ValueContext) -> String + Send + Sync>;

/// Context passed to a [`ValueFormatter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueContext {
    /// Sample x, or the curve's alternate marker x when it has one.
    pub x: f64,
    /// Sample y.
    pub y: f64,
    /// Sample index within the curve.
    pub index: usize,
}

/// Configuration of the markers on one axes group.
#[derive(Clone)]
pub struct MarkerParams {
    /// Draw a vertical line through the snapped x-position.
    pub show_index_line: bool,
    /// Draw a dot on each curve at its selected sample.
    pub show_value_dot: bool,
    /// Draw the x-value label at the bottom of the axes.
    pub show_index_label: bool,
    /// Draw a value label next to each dot.
    pub show_value_labels: bool,
    pub x_formatter: Option<XFormatter>,
    pub value_formatter: Option<ValueFormatter>,
    /// Treat the cursor position as a sample index shared by every curve.
    pub index_only_mode: bool,
    /// Invert the direction of arrow-key shifting.
    pub x_reversed: bool,
    /// Opacity of label boxes, in `[0, 1]`.
    pub label_alpha: f32,
    /// Shifting past either end of the data wraps to the other end.
    pub allow_wrap_around: bool,
    /// Horizontal gap between a dot and its label, in pixels.
    pub label_gap_px: f32,
    /// Label boxes are the measured text extent times this factor.
    pub label_padding: f32,
    /// Label font size in pixels.
    pub font_size: f32,
}

impl Default for MarkerParams {
    fn default() -> Self {
        Self {
            show_index_line: true,
            show_value_dot: true,
            show_index_label: false,
            show_value_labels: true,
            x_formatter: None,
            value_formatter: None,
            index_only_mode: false,
            x_reversed: false,
            label_alpha: DEFAULT_LABEL_ALPHA,
            allow_wrap_around: false,
            label_gap_px: 8.0,
            label_padding: 1.8,
            font_size: 8.0,
        }
    }
}

impl fmt::Debug for MarkerParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerParams")
            .field("show_index_line", &self.show_index_line)
            .field("show_value_dot", &self.show_value_dot)
            .field("show_index_label", &self.show_index_label)
            .field("show_value_labels", &self.show_value_labels)
            .field("x_formatter", &self.x_formatter.is_some())
            .field("value_formatter", &self.value_formatter.is_some())
            .field("index_only_mode", &self.index_only_mode)
            .field("x_reversed", &self.x_reversed)
            .field("label_alpha", &self.label_alpha)
            .field("allow_wrap_around", &self.allow_wrap_around)
            .field("label_gap_px", &self.label_gap_px)
            .field("label_padding", &self.label_padding)
            .field("font_size", &self.font_size)
            .finish()
    }
}

/// A single typed configuration option.
#[derive(Clone)]
pub enum MarkerOption {
    ShowIndexLine(bool),
    ShowValueDot(bool),
    ShowIndexLabel(bool),
    ShowValueLabels(bool),
    XFormatter(Option<XFormatter>),
    ValueFormatter(Option<ValueFormatter>),
    IndexOnlyMode(bool),
    XReversed(bool),
    LabelAlpha(f32),
    AllowWrapAround(bool),
    LabelGap(f32),
    FontSize(f32),
}

/// Untyped value for [`MarkerParams::set_named`].
#[derive(Clone)]
pub enum OptionValue {
    Bool(bool),
    Float(f64),
    XFormatter(XFormatter),
    ValueFormatter(ValueFormatter),
    /// Resets an optional setting (formatters) to its default.
    Unset,
}

impl MarkerParams {
    /// Apply one option.
    pub fn apply(&mut self, option: MarkerOption) {
        match option {
            MarkerOption::ShowIndexLine(v) => self.show_index_line = v,
            MarkerOption::ShowValueDot(v) => self.show_value_dot = v,
            MarkerOption::ShowIndexLabel(v) => self.show_index_label = v,
            MarkerOption::ShowValueLabels(v) => self.show_value_labels = v,
            MarkerOption::XFormatter(f) => self.x_formatter = f,
            MarkerOption::ValueFormatter(f) => self.value_formatter = f,
            MarkerOption::IndexOnlyMode(v) => self.index_only_mode = v,
            MarkerOption::XReversed(v) => self.x_reversed = v,
            MarkerOption::LabelAlpha(a) if a.is_nan() => self.label_alpha = DEFAULT_LABEL_ALPHA,
            MarkerOption::LabelAlpha(a) => self.label_alpha = a.clamp(0.0, 1.0),
            MarkerOption::AllowWrapAround(v) => self.allow_wrap_around = v,
            MarkerOption::LabelGap(px) => self.label_gap_px = px.max(0.0),
            MarkerOption::FontSize(px) => self.font_size = px.max(1.0),
        }
    }

    /// Merge several options, later ones winning.
    pub fn merge(&mut self, options: impl IntoIterator<Item = MarkerOption>) {
        for option in options {
            self.apply(option);
        }
    }

    /// Set an option by name. Unknown keys and values of the wrong kind are logged and
    /// ignored; returns whether the option was applied.
    pub fn set_named(&mut self, key: &str, value: OptionValue) -> bool {
        let Some(option) = parse_option(key, value) else {
            log::warn!("ignoring marker option {key:?}: unknown key or unexpected value");
            return false;
        };
        self.apply(option);
        true
    }

    /// Text for the index label.
    pub(crate) fn format_x(&self, x: f64) -> String {
        match &self.x_formatter {
            Some(f) => f(x),
            None => format!("{x:.3}"),
        }
    }

    /// Text for a value label.
    pub(crate) fn format_value(&self, ctx: ValueContext) -> String {
        match &self.value_formatter {
            Some(f) => f(ctx),
            None => format!("{:.3}", ctx.y),
        }
    }
}

fn parse_option(key: &str, value: OptionValue) -> Option<MarkerOption> {
    use OptionValue as V;
    let option = match (key, value) {
        ("show_index_line", V::Bool(v)) => MarkerOption::ShowIndexLine(v),
        ("show_value_dot", V::Bool(v)) => MarkerOption::ShowValueDot(v),
        ("show_index_label", V::Bool(v)) => MarkerOption::ShowIndexLabel(v),
        ("show_value_labels", V::Bool(v)) => MarkerOption::ShowValueLabels(v),
        ("index_only_mode", V::Bool(v)) => MarkerOption::IndexOnlyMode(v),
        ("x_reversed", V::Bool(v)) => MarkerOption::XReversed(v),
        ("allow_wrap_around", V::Bool(v)) => MarkerOption::AllowWrapAround(v),
        ("label_alpha", V::Float(v)) => MarkerOption::LabelAlpha(v as f32),
        ("label_gap", V::Float(v)) => MarkerOption::LabelGap(v as f32),
        ("font_size", V::Float(v)) => MarkerOption::FontSize(v as f32),
        ("x_formatter", V::XFormatter(f)) => MarkerOption::XFormatter(Some(f)),
        ("x_formatter", V::Unset) => MarkerOption::XFormatter(None),
        ("value_formatter", V::ValueFormatter(f)) => MarkerOption::ValueFormatter(Some(f)),
        ("value_formatter", V::Unset) => MarkerOption::ValueFormatter(None),
        _ => return None,
    };
    Some(option)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_ignored() {
        let mut params = MarkerParams::default();
        assert!(!params.set_named("no_such_option", OptionValue::Bool(true)));
        assert!(!params.set_named("x_reversed", OptionValue::Float(1.0)));
        assert!(!params.x_reversed);
        assert!(params.set_named("x_reversed", OptionValue::Bool(true)));
        assert!(params.x_reversed);
    }

    #[test]
    fn alpha_is_clamped() {
        let mut params = MarkerParams::default();
        params.apply(MarkerOption::LabelAlpha(3.0));
        assert_eq!(params.label_alpha, 1.0);
        params.apply(MarkerOption::LabelAlpha(f32::NAN));
        assert_eq!(params.label_alpha, DEFAULT_LABEL_ALPHA);
        params.apply(MarkerOption::LabelAlpha(0.2));
        assert!(params.set_named("label_alpha", OptionValue::Float(f64::NAN)));
        assert_eq!(params.label_alpha, 0.7);
    }

    #[test]
    fn formatters() {
        let mut params = MarkerParams::default();
        assert_eq!(params.format_x(1.23456), "1.235");
        params.merge([
            MarkerOption::XFormatter(Some(Arc::new(|x: f64| format!("{x:.1} GHz")))),
            MarkerOption::ValueFormatter(Some(Arc::new(|c: ValueContext| {
                format!("#{} {:.0}", c.index, c.y)
            }))),
        ]);
        assert_eq!(params.format_x(2.0), "2.0 GHz");
        let ctx = ValueContext {
            x: 0.0,
            y: 7.0,
            index: 3,
        };
        assert_eq!(params.format_value(ctx), "#3 7");
        params.set_named("x_formatter", OptionValue::Unset);
        assert_eq!(params.format_x(2.0), "2.000");
    }
}
