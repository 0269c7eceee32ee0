//! Interactive data-cursor markers for 2-D plots in Iced.
//!
//! - Markers snap to the nearest sample of every curve on an axes group
//! - Value labels are stacked so they never overlap
//! - Groups can be linked so markers are added, moved and deleted together
//! - Shared-x twin axes act as one group
//!
//! Quick start:
//!
//! ```no_run
//! use iced_markers::{Curve, MarkerOption, MarkerPlotBuilder};
//!
//! let x: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
//! let sin: Vec<f64> = x.iter().map(|v| v.sin()).collect();
//! let cos: Vec<f64> = x.iter().map(|v| v.cos()).collect();
//!
//! MarkerPlotBuilder::new()
//!     .grid(2, 1)
//!     .add_curve(0, Curve::from_xy(&x, &sin).with_label("sin"))
//!     .add_curve(1, Curve::from_xy(&x, &cos).with_label("cos"))
//!     .with_link_all()
//!     .with_option(MarkerOption::ShowIndexLabel(true))
//!     .build()
//!     .unwrap();
//! ```
//!
//! The marker engine ([`MarkerManager`], [`InteractionController`]) works without the
//! widget; see `demos/` for a complete application.
pub mod controller;
pub mod curve;
pub mod figure;
pub mod glyph;
pub mod layout;
pub mod link;
pub mod manager;
pub mod marker;
pub mod marker_set;
pub mod message;
pub mod params;
pub mod text;
pub mod transform;

#[cfg(feature = "canvas")]
pub mod builder;
#[cfg(feature = "canvas")]
pub mod widget;

mod axis_scale;
mod error;

// Iced re-exports.
pub use iced::Color;

// Re-exports of public types.
pub use axis_scale::AxisScale;
pub use controller::{InteractionController, KEY_RELEASE_DEBOUNCE};
pub use curve::{Curve, CurveId, CurveKey};
pub use error::MarkerError;
pub use figure::{Axes, AxesId, Figure};
pub use glyph::{Glyph, IndexLine, LabelBox, ValueDot};
pub use layout::space_labels;
pub use link::LinkGraph;
pub use manager::{LinkOutcome, MarkerManager, PaintList};
pub use marker::{Direction, Marker, MarkerTarget, Trace};
pub use marker_set::MarkerSet;
pub use message::{MarkerEvent, MarkerKey, MarkerMessage, Redraw};
pub use params::{
    MarkerOption, MarkerParams, OptionValue, ValueContext, ValueFormatter, XFormatter,
};
pub use text::{ApproxTextMeasure, TextMeasure};
pub use transform::AxesTransform;

#[cfg(feature = "canvas")]
pub use builder::MarkerPlotBuilder;
#[cfg(feature = "canvas")]
pub use widget::MarkerPlot;
