//! Marker state of a whole figure: the axes-to-group registry, per-group marker sets,
//! the link graph, and link-aware propagation of marker operations.

use glam::Vec2;
use iced::Point;
use indexmap::IndexMap;

use crate::{
    MarkerError,
    curve::{CurveId, CurveKey},
    figure::{AxesId, Figure},
    glyph::Glyph,
    link::LinkGraph,
    marker::{Direction, Marker, MarkerTarget},
    marker_set::MarkerSet,
    message::Redraw,
    params::{MarkerOption, MarkerParams, OptionValue},
    text::{ApproxTextMeasure, TextMeasure},
};

/// Result of a link-aware operation.
///
/// The origin group is always updated first. A failure on a linked group abandons the
/// step for that group only; the failures are collected here and the remaining linked
/// groups still complete.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkOutcome {
    pub redraw: Redraw,
    pub errors: Vec<MarkerError>,
}

impl LinkOutcome {
    fn new(redraw: Redraw) -> Self {
        Self {
            redraw,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, result: Result<(), MarkerError>) {
        if let Err(e) = result {
            log::warn!("linked marker operation skipped: {e}");
            self.errors.push(e);
        }
    }
}

/// Glyphs split for incremental redraw.
#[derive(Debug, Default)]
pub struct PaintList<'a> {
    /// Every non-active marker; painted into the cached background.
    pub background: Vec<Glyph<'a>>,
    /// Active markers only; painted on top of the restored background.
    pub overlay: Vec<Glyph<'a>>,
}

/// Marker state for one figure.
pub struct MarkerManager {
    /// Axes -> representative of its group.
    registry: IndexMap<AxesId, AxesId>,
    /// Representative -> markers of the group.
    sets: IndexMap<AxesId, MarkerSet>,
    links: LinkGraph,
    measure: Box<dyn TextMeasure>,
    /// Bumped whenever cached backgrounds must be recaptured.
    background_version: u64,
    /// Figure version the glyph geometry was last computed for.
    figure_version: u64,
}

impl std::fmt::Debug for MarkerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerManager")
            .field("registry", &self.registry)
            .field("sets", &self.sets)
            .field("links", &self.links)
            .field("background_version", &self.background_version)
            .finish_non_exhaustive()
    }
}

impl MarkerManager {
    /// Enable markers on every axes of `figure`.
    ///
    /// Axes sharing an x-domain collapse into one group. The representative is the first
    /// member listed in `top_axes`, or else the first member in figure order. It is
    /// raised above its siblings and the siblings' background patches are hidden.
    pub fn enable(
        figure: &mut Figure,
        params: MarkerParams,
        top_axes: &[AxesId],
        link_all: bool,
    ) -> Result<Self, MarkerError> {
        for id in top_axes {
            figure.axes_ref(*id)?;
        }

        let mut registry = IndexMap::new();
        let mut sets = IndexMap::new();
        let ids: Vec<AxesId> = figure.axes().map(|a| a.id).collect();
        for id in ids {
            if registry.contains_key(&id) {
                continue;
            }
            let siblings = figure.shared_x_siblings(id)?;
            let group = siblings
                .iter()
                .copied()
                .find(|s| top_axes.contains(s))
                .unwrap_or(id);
            for s in &siblings {
                registry.insert(*s, group);
            }
            if siblings.len() > 1 {
                let mut top = i32::MIN;
                for s in &siblings {
                    top = top.max(figure.axes_ref(*s)?.zorder());
                    if *s != group {
                        figure.set_patch_visible(*s, false)?;
                    }
                }
                figure.set_zorder(group, top + 1)?;
            }
            let generation = group_generation(figure, group)?;
            sets.insert(group, MarkerSet::new(group, params.clone(), generation));
            log::debug!("markers enabled on {group} ({} axes)", siblings.len());
        }

        let mut links = LinkGraph::new();
        if link_all {
            links.link_all(sets.keys().copied());
        }

        Ok(Self {
            registry,
            sets,
            links,
            measure: Box::new(ApproxTextMeasure::default()),
            background_version: 1,
            figure_version: figure.version(),
        })
    }

    /// Measure label text with a different backend.
    pub fn with_text_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.measure = Box::new(measure);
        self.touch_background();
        self
    }

    /// Representative of the group `axes` belongs to.
    pub fn group_of(&self, axes: AxesId) -> Result<AxesId, MarkerError> {
        self.registry
            .get(&axes)
            .copied()
            .ok_or(MarkerError::UnknownAxes(axes))
    }

    /// Group representatives in figure order.
    pub fn groups(&self) -> impl Iterator<Item = AxesId> + '_ {
        self.sets.keys().copied()
    }

    /// Marker set of the group `axes` belongs to.
    pub fn markers(&self, axes: AxesId) -> Result<&MarkerSet, MarkerError> {
        let group = self.group_of(axes)?;
        self.sets.get(&group).ok_or(MarkerError::UnknownAxes(group))
    }

    pub fn links(&self) -> &LinkGraph {
        &self.links
    }

    /// Groups linked to the group of `axes`, in link order.
    pub fn linked(&self, axes: AxesId) -> Result<Vec<AxesId>, MarkerError> {
        Ok(self.links.linked(self.group_of(axes)?))
    }

    /// Version of the cached backgrounds; changes whenever they must be recaptured.
    pub fn background_version(&self) -> u64 {
        self.background_version
    }

    /// Bring marker state up to date with the figure.
    ///
    /// Groups whose axes were cleared or lost a curve drop their markers and ignored curves.
    /// Any other figure change (limits, scales, size, curve visibility) recomputes glyph
    /// geometry.
    pub fn sync(&mut self, figure: &Figure) -> Result<Redraw, MarkerError> {
        let mut redraw = Redraw::None;
        let refresh = figure.version() != self.figure_version;
        let measure = self.measure.as_ref();
        // Groups are refreshed independently; a failing group keeps its previous glyphs
        // and reports the error when it is operated on directly.
        for set in self.sets.values_mut() {
            let group = set.group();
            match group_generation(figure, group) {
                Ok(generation) => {
                    if set.sync_generation(generation) {
                        log::debug!("{group}: axes cleared, markers reset");
                        redraw = Redraw::Full;
                    }
                }
                Err(e) => {
                    log::warn!("{group}: skipped during sync: {e}");
                    continue;
                }
            }
            if refresh && let Err(e) = set.refresh(figure, measure) {
                log::warn!("{group}: marker refresh failed: {e}");
            }
        }
        if refresh {
            self.figure_version = figure.version();
            redraw = Redraw::Full;
        }
        if redraw == Redraw::Full {
            self.touch_background();
        }
        Ok(redraw)
    }

    // Per-group operations. These act on one group only; keeping linked groups at equal
    // cardinality is up to the caller when mixing them with the linked operations below.

    /// Add a marker to the group of `axes` and make it active. Returns its position.
    pub fn add_marker(
        &mut self,
        figure: &Figure,
        axes: AxesId,
        target: MarkerTarget,
    ) -> Result<usize, MarkerError> {
        self.sync(figure)?;
        let group = self.group_of(axes)?;
        let measure = self.measure.as_ref();
        let position = self
            .sets
            .get_mut(&group)
            .ok_or(MarkerError::UnknownAxes(group))?
            .add(figure, measure, target)?;
        self.touch_background();
        Ok(position)
    }

    /// Add a marker at a sample index of the group's reference curve.
    pub fn add_marker_at_index(
        &mut self,
        figure: &Figure,
        axes: AxesId,
        index: usize,
    ) -> Result<usize, MarkerError> {
        self.add_marker(figure, axes, MarkerTarget::Index(index))
    }

    /// Add one marker per x-value; the last one ends up active.
    pub fn add_markers(
        &mut self,
        figure: &Figure,
        axes: AxesId,
        xs: &[f64],
    ) -> Result<Vec<usize>, MarkerError> {
        xs.iter()
            .map(|&x| self.add_marker(figure, axes, MarkerTarget::x(x)))
            .collect()
    }

    /// Add a marker nearest a device point inside the group's axes.
    pub fn add_marker_at_display(
        &mut self,
        figure: &Figure,
        axes: AxesId,
        point: Point,
    ) -> Result<usize, MarkerError> {
        let target = self.target_at(figure, self.group_of(axes)?, point)?;
        self.add_marker(figure, axes, target)
    }

    /// Delete the marker at `position`. Returns the new active position.
    pub fn delete_marker(
        &mut self,
        axes: AxesId,
        position: usize,
    ) -> Result<Option<usize>, MarkerError> {
        let group = self.group_of(axes)?;
        let active = self.set_mut(group)?.delete(position);
        self.touch_background();
        Ok(active)
    }

    /// Delete every marker of the group of `axes`.
    pub fn delete_all(&mut self, axes: AxesId) -> Result<(), MarkerError> {
        let group = self.group_of(axes)?;
        self.set_mut(group)?.delete_all();
        self.touch_background();
        Ok(())
    }

    /// Delete every marker on the figure.
    pub fn remove_all(&mut self) -> Redraw {
        for set in self.sets.values_mut() {
            set.delete_all();
        }
        self.touch_background();
        Redraw::Full
    }

    /// Merge options into the configuration of one group.
    pub fn set_params(
        &mut self,
        figure: &Figure,
        axes: AxesId,
        options: impl IntoIterator<Item = MarkerOption>,
    ) -> Result<(), MarkerError> {
        let group = self.group_of(axes)?;
        let set = self.set_mut(group)?;
        set.set_params(options);
        self.refresh_group(figure, group)
    }

    /// Set one option of a group by name. Unknown keys are logged and ignored.
    pub fn set_named(
        &mut self,
        figure: &Figure,
        axes: AxesId,
        key: &str,
        value: OptionValue,
    ) -> Result<bool, MarkerError> {
        let group = self.group_of(axes)?;
        let applied = self.set_mut(group)?.set_named(key, value);
        if applied {
            self.refresh_group(figure, group)?;
        }
        Ok(applied)
    }

    /// Exclude a curve of `axes` from snapping.
    pub fn ignore_curve(&mut self, axes: AxesId, curve: CurveId) -> Result<(), MarkerError> {
        let group = self.group_of(axes)?;
        self.set_mut(group)?.ignore_curve(CurveKey { axes, curve });
        Ok(())
    }

    /// Link the group of `axes` with the groups of `others`.
    pub fn link(
        &mut self,
        axes: AxesId,
        others: impl IntoIterator<Item = AxesId>,
    ) -> Result<(), MarkerError> {
        let group = self.group_of(axes)?;
        for other in others {
            let other = self.group_of(other)?;
            self.links.link(group, other);
        }
        Ok(())
    }

    /// Link every group on the figure.
    pub fn link_all(&mut self) {
        let groups: Vec<_> = self.sets.keys().copied().collect();
        self.links.link_all(groups);
    }

    /// Detach the group of `axes` from every group it is linked to.
    pub fn unlink(&mut self, axes: AxesId) -> Result<(), MarkerError> {
        let group = self.group_of(axes)?;
        self.links.unlink(group);
        Ok(())
    }

    // Link-aware operations, driven by the interaction controller.

    /// Add a marker on `group`, then one on every linked group at the same sample index.
    pub fn add_linked(
        &mut self,
        figure: &Figure,
        group: AxesId,
        target: MarkerTarget,
    ) -> Result<LinkOutcome, MarkerError> {
        self.sync(figure)?;
        let group = self.group_of(group)?;
        let measure = self.measure.as_ref();
        let origin = self
            .sets
            .get_mut(&group)
            .ok_or(MarkerError::UnknownAxes(group))?;
        let position = origin.add(figure, measure, target)?;
        let index = active_index_of(origin)?;

        let mut outcome = LinkOutcome::new(Redraw::Full);
        for linked in self.links.linked(group) {
            let result = match self.sets.get_mut(&linked) {
                Some(set) => set
                    .add(figure, measure, MarkerTarget::Index(index))
                    .map(|_| ()),
                None => Err(MarkerError::UnknownAxes(linked)),
            };
            outcome.record(result);
        }
        log::debug!("{group}: linked add at index {index}");
        let activated = self.activate_linked(group, Some(position))?;
        outcome.errors.extend(activated.errors);
        Ok(outcome)
    }

    /// Move the active marker of `group`, then move every linked group's active marker
    /// to the origin's resulting sample index.
    pub fn move_linked(
        &mut self,
        figure: &Figure,
        group: AxesId,
        target: MarkerTarget,
    ) -> Result<LinkOutcome, MarkerError> {
        self.sync(figure)?;
        let group = self.group_of(group)?;
        let measure = self.measure.as_ref();
        let origin = self
            .sets
            .get_mut(&group)
            .ok_or(MarkerError::UnknownAxes(group))?;
        origin.move_active(figure, measure, target)?;
        let index = active_index_of(origin)?;

        let mut blit = vec![group];
        let mut outcome = LinkOutcome::default();
        for linked in self.links.linked(group) {
            let result = match self.sets.get_mut(&linked) {
                Some(set) => set.move_active(figure, measure, MarkerTarget::Index(index)),
                None => Err(MarkerError::UnknownAxes(linked)),
            };
            if result.is_ok() {
                blit.push(linked);
            }
            outcome.record(result);
        }
        outcome.redraw = Redraw::Blit(blit);
        Ok(outcome)
    }

    /// Shift the active marker of `group` and of every linked group by one step. Each
    /// group resolves its own step size.
    pub fn shift_linked(
        &mut self,
        figure: &Figure,
        group: AxesId,
        direction: Direction,
    ) -> Result<LinkOutcome, MarkerError> {
        self.sync(figure)?;
        let group = self.group_of(group)?;
        let measure = self.measure.as_ref();
        self.sets
            .get_mut(&group)
            .ok_or(MarkerError::UnknownAxes(group))?
            .shift_active(figure, measure, direction)?;

        let mut blit = vec![group];
        let mut outcome = LinkOutcome::default();
        for linked in self.links.linked(group) {
            let result = match self.sets.get_mut(&linked) {
                Some(set) => set.shift_active(figure, measure, direction),
                None => Err(MarkerError::UnknownAxes(linked)),
            };
            if result.is_ok() {
                blit.push(linked);
            }
            outcome.record(result);
        }
        outcome.redraw = Redraw::Blit(blit);
        Ok(outcome)
    }

    /// Delete the active marker of `group` and the marker at the same position in every
    /// linked group. The origin's new active position is applied to all of them.
    pub fn delete_linked(
        &mut self,
        figure: &Figure,
        group: AxesId,
    ) -> Result<LinkOutcome, MarkerError> {
        self.sync(figure)?;
        let group = self.group_of(group)?;
        let origin = self.set_mut(group)?;
        let position = origin
            .active_index()
            .ok_or(MarkerError::NoActiveMarker { axes: group })?;
        let active = origin.delete(position);

        let mut outcome = LinkOutcome::new(Redraw::Full);
        for linked in self.links.linked(group) {
            let result = match self.sets.get_mut(&linked) {
                Some(set) if position < set.len() => {
                    set.delete(position);
                    Ok(())
                }
                Some(set) => Err(MarkerError::LinkIndexMismatch {
                    axes: linked,
                    index: position,
                    len: set.len(),
                }),
                None => Err(MarkerError::UnknownAxes(linked)),
            };
            outcome.record(result);
        }
        log::debug!("{group}: linked delete of marker {position}");
        let activated = self.activate_linked(group, active)?;
        outcome.errors.extend(activated.errors);
        Ok(outcome)
    }

    /// Make the marker at `position` active on `group` and on every linked group.
    pub fn activate_linked(
        &mut self,
        group: AxesId,
        position: Option<usize>,
    ) -> Result<LinkOutcome, MarkerError> {
        let group = self.group_of(group)?;
        self.set_mut(group)?.set_active(position)?;
        let mut outcome = LinkOutcome::new(Redraw::Full);
        for linked in self.links.linked(group) {
            let result = match self.sets.get_mut(&linked) {
                Some(set) => set.set_active(position),
                None => Err(MarkerError::UnknownAxes(linked)),
            };
            outcome.record(result);
        }
        self.touch_background();
        Ok(outcome)
    }

    /// Position of the first marker of `group` whose labels contain a device point.
    pub fn marker_at(&self, figure: &Figure, group: AxesId, point: Point) -> Option<usize> {
        self.sets.get(&group)?.marker_at(figure, point)
    }

    /// Snap target for a device point, in the data space of `group`.
    pub fn target_at(
        &self,
        figure: &Figure,
        group: AxesId,
        point: Point,
    ) -> Result<MarkerTarget, MarkerError> {
        let transform = figure.transform(group)?;
        let data = transform
            .display_to_data(Vec2::new(point.x, point.y))
            .ok_or(MarkerError::InvalidAxisLimits(group))?;
        Ok(MarkerTarget::xy(data.x, data.y))
    }

    /// Glyphs to paint, split into cached background and active overlay.
    pub fn paint_list(&self) -> PaintList<'_> {
        let mut list = PaintList::default();
        for set in self.sets.values() {
            for (i, marker) in set.markers().iter().enumerate() {
                let target = if set.active_index() == Some(i) {
                    &mut list.overlay
                } else {
                    &mut list.background
                };
                target.extend(marker.glyphs());
            }
        }
        list
    }

    /// Active marker of the group `axes` belongs to.
    pub fn active_marker(&self, axes: AxesId) -> Option<&Marker> {
        self.markers(axes).ok()?.active()
    }

    fn refresh_group(&mut self, figure: &Figure, group: AxesId) -> Result<(), MarkerError> {
        let measure = self.measure.as_ref();
        self.sets
            .get_mut(&group)
            .ok_or(MarkerError::UnknownAxes(group))?
            .refresh(figure, measure)?;
        self.touch_background();
        Ok(())
    }

    fn set_mut(&mut self, group: AxesId) -> Result<&mut MarkerSet, MarkerError> {
        self.sets
            .get_mut(&group)
            .ok_or(MarkerError::UnknownAxes(group))
    }

    fn touch_background(&mut self) {
        self.background_version = self.background_version.wrapping_add(1);
    }
}

fn active_index_of(set: &MarkerSet) -> Result<usize, MarkerError> {
    set.active()
        .map(Marker::index)
        .ok_or(MarkerError::NoActiveMarker { axes: set.group() })
}

/// Sum of the cleared-generation counters over a group's axes.
fn group_generation(figure: &Figure, group: AxesId) -> Result<u64, MarkerError> {
    let mut sum = 0u64;
    for id in figure.shared_x_siblings(group)? {
        sum = sum.wrapping_add(figure.axes_ref(id)?.generation);
    }
    Ok(sum)
}
