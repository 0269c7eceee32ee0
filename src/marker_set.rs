//! Markers of one axes group.

use iced::Point;
use indexmap::IndexSet;

use crate::{
    MarkerError,
    curve::CurveKey,
    figure::{AxesId, Figure},
    marker::{Direction, Marker, MarkerContext, MarkerTarget},
    params::{MarkerOption, MarkerParams, OptionValue},
    text::TextMeasure,
};

/// Ordered markers of an axes group, the active one, and the group's configuration.
///
/// Markers keep their creation order; the position of a marker in the set is what
/// linked groups agree on.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    group: AxesId,
    markers: Vec<Marker>,
    active: Option<usize>,
    params: MarkerParams,
    ignored: IndexSet<CurveKey>,
    /// Sum of the cleared-generation counters of the group's axes when last synced.
    generation: u64,
}

impl MarkerSet {
    pub(crate) fn new(group: AxesId, params: MarkerParams, generation: u64) -> Self {
        Self {
            group,
            markers: Vec::new(),
            active: None,
            params,
            ignored: IndexSet::new(),
            generation,
        }
    }

    /// Representative axes of the group.
    pub fn group(&self) -> AxesId {
        self.group
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Marker> {
        self.markers.get(position)
    }

    /// Position of the active marker.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Marker> {
        self.markers.get(self.active?)
    }

    pub fn params(&self) -> &MarkerParams {
        &self.params
    }

    /// Whether a curve is excluded from snapping.
    pub fn is_ignored(&self, key: CurveKey) -> bool {
        self.ignored.contains(&key)
    }

    /// Curves a new marker attaches to: visible, non-ignored curves with finite x data,
    /// from the representative first and then its shared-x siblings in figure order.
    pub fn eligible_curves(&self, figure: &Figure) -> Result<Vec<CurveKey>, MarkerError> {
        let mut order = vec![self.group];
        order.extend(
            figure
                .shared_x_siblings(self.group)?
                .into_iter()
                .filter(|id| *id != self.group),
        );
        let mut out = Vec::new();
        for axes in order {
            for curve in figure.axes_ref(axes)?.curves() {
                let key = CurveKey {
                    axes,
                    curve: curve.id,
                };
                if curve.visible && !curve.is_degenerate() && !self.ignored.contains(&key) {
                    out.push(key);
                }
            }
        }
        Ok(out)
    }

    /// Append a marker snapped to `target` and make it active. Returns its position.
    ///
    /// Nothing is appended when creation fails.
    pub(crate) fn add(
        &mut self,
        figure: &Figure,
        measure: &dyn TextMeasure,
        target: MarkerTarget,
    ) -> Result<usize, MarkerError> {
        let curves = self.eligible_curves(figure)?;
        let ctx = MarkerContext {
            figure,
            params: &self.params,
            measure,
        };
        let marker = Marker::create(self.group, curves, target, ctx)?;
        self.markers.push(marker);
        let position = self.markers.len() - 1;
        self.active = Some(position);
        log::debug!("{}: added marker {position} at {target:?}", self.group);
        Ok(position)
    }

    /// Remove the marker at `position`. The last remaining marker becomes active; the
    /// new active position is returned.
    pub(crate) fn delete(&mut self, position: usize) -> Option<usize> {
        if position < self.markers.len() {
            self.markers.remove(position);
            log::debug!("{}: deleted marker {position}", self.group);
        }
        self.active = self.markers.len().checked_sub(1);
        self.active
    }

    /// Remove every marker.
    pub(crate) fn delete_all(&mut self) {
        if !self.markers.is_empty() {
            log::debug!("{}: deleted {} markers", self.group, self.markers.len());
        }
        self.markers.clear();
        self.active = None;
    }

    /// Make the marker at `position` active, or clear the active marker.
    pub(crate) fn set_active(&mut self, position: Option<usize>) -> Result<(), MarkerError> {
        if let Some(p) = position
            && p >= self.markers.len()
        {
            return Err(MarkerError::LinkIndexMismatch {
                axes: self.group,
                index: p,
                len: self.markers.len(),
            });
        }
        self.active = position;
        Ok(())
    }

    /// Move the active marker.
    pub(crate) fn move_active(
        &mut self,
        figure: &Figure,
        measure: &dyn TextMeasure,
        target: MarkerTarget,
    ) -> Result<(), MarkerError> {
        let ctx = MarkerContext {
            figure,
            params: &self.params,
            measure,
        };
        let marker = self
            .active
            .and_then(|i| self.markers.get_mut(i))
            .ok_or(MarkerError::NoActiveMarker { axes: self.group })?;
        marker.move_to(target, ctx)
    }

    /// Shift the active marker one step.
    pub(crate) fn shift_active(
        &mut self,
        figure: &Figure,
        measure: &dyn TextMeasure,
        direction: Direction,
    ) -> Result<(), MarkerError> {
        let ctx = MarkerContext {
            figure,
            params: &self.params,
            measure,
        };
        let marker = self
            .active
            .and_then(|i| self.markers.get_mut(i))
            .ok_or(MarkerError::NoActiveMarker { axes: self.group })?;
        marker.shift(direction, ctx)
    }

    /// Merge options into the group configuration.
    pub(crate) fn set_params(&mut self, options: impl IntoIterator<Item = MarkerOption>) {
        self.params.merge(options);
    }

    /// Set one option by name; unknown keys are ignored.
    pub(crate) fn set_named(&mut self, key: &str, value: OptionValue) -> bool {
        self.params.set_named(key, value)
    }

    /// Exclude a curve from snapping for markers created afterwards.
    pub(crate) fn ignore_curve(&mut self, key: CurveKey) {
        self.ignored.insert(key);
    }

    /// Recompute every marker's glyphs, e.g. after the configuration or view changed.
    pub(crate) fn refresh(
        &mut self,
        figure: &Figure,
        measure: &dyn TextMeasure,
    ) -> Result<(), MarkerError> {
        let ctx = MarkerContext {
            figure,
            params: &self.params,
            measure,
        };
        for marker in &mut self.markers {
            marker.update_glyphs(ctx)?;
        }
        Ok(())
    }

    /// First marker whose labels contain a device point.
    pub fn marker_at(&self, figure: &Figure, point: Point) -> Option<usize> {
        self.markers
            .iter()
            .position(|m| m.contains_point(figure, point))
    }

    /// Drop every marker and ignored curve if the group's axes were cleared since the
    /// last sync. Returns whether anything was reset.
    pub(crate) fn sync_generation(&mut self, generation: u64) -> bool {
        if generation == self.generation {
            return false;
        }
        self.generation = generation;
        self.delete_all();
        self.ignored.clear();
        true
    }
}
