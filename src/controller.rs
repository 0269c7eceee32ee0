//! Pointer and keyboard routing for markers on one figure.

use std::time::{Duration, Instant};

use iced::Point;

use crate::{
    MarkerError,
    figure::{AxesId, Figure},
    manager::{LinkOutcome, MarkerManager},
    marker::Direction,
    message::{MarkerEvent, MarkerKey},
};

/// Key releases are held back this long so auto-repeat bursts read as one held key.
pub const KEY_RELEASE_DEBOUNCE: Duration = Duration::from_millis(50);

/// Finite-state event router translating input into marker operations.
///
/// Events are handled one at a time and completely; debounced key releases are applied
/// from [`handle`](Self::handle) or [`tick`](Self::tick) on the same thread.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    /// Group under the pointer when the button went down; drags only move its marker.
    drag_group: Option<AxesId>,
    shift_held: bool,
    /// Set while a pan/zoom gesture is in progress.
    zoom_mode_active: bool,
    /// Release queued for the debounce window, with the instant it takes effect.
    pending_key_release: Option<(MarkerKey, Instant)>,
    key_pressed: bool,
    /// Last pointer position; keyboard input targets the group under it.
    last_pointer: Option<Point>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shift_held(&self) -> bool {
        self.shift_held
    }

    pub fn zoom_mode_active(&self) -> bool {
        self.zoom_mode_active
    }

    pub fn drag_group(&self) -> Option<AxesId> {
        self.drag_group
    }

    /// Handle one event at `now`.
    ///
    /// Errors of the operation on the target group are returned; failures on linked
    /// groups are collected in the outcome.
    pub fn handle(
        &mut self,
        figure: &Figure,
        manager: &mut MarkerManager,
        event: MarkerEvent,
        now: Instant,
    ) -> Result<LinkOutcome, MarkerError> {
        self.tick(now);
        let synced = manager.sync(figure)?;
        log::trace!("marker event {event:?}");

        let mut outcome = match event {
            MarkerEvent::NavigationStarted => {
                self.zoom_mode_active = true;
                self.drag_group = None;
                LinkOutcome::default()
            }
            MarkerEvent::NavigationEnded => {
                self.zoom_mode_active = false;
                LinkOutcome::default()
            }
            MarkerEvent::PointerPressed(p) => self.on_press(figure, manager, p)?,
            MarkerEvent::PointerMoved(p) => self.on_move(figure, manager, p)?,
            MarkerEvent::PointerReleased(p) => self.on_release(figure, manager, p)?,
            MarkerEvent::KeyPressed(key) => self.on_key_press(figure, manager, key)?,
            MarkerEvent::KeyReleased(key) => {
                if self.key_pressed {
                    self.pending_key_release = Some((key, now + KEY_RELEASE_DEBOUNCE));
                }
                LinkOutcome::default()
            }
        };
        outcome.redraw = synced.merge(outcome.redraw);
        Ok(outcome)
    }

    /// Apply a debounced key release whose window has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if let Some((key, deadline)) = self.pending_key_release
            && now >= deadline
        {
            self.pending_key_release = None;
            self.key_pressed = false;
            if key == MarkerKey::Shift {
                self.shift_held = false;
            }
            log::trace!("key {key:?} released");
        }
    }

    /// Whether a debounced release is still waiting for [`tick`](Self::tick).
    pub fn has_pending_release(&self) -> bool {
        self.pending_key_release.is_some()
    }

    /// Group under a device point, unless a pan/zoom gesture is in progress.
    fn target_group(&self, figure: &Figure, manager: &MarkerManager, p: Point) -> Option<AxesId> {
        if self.zoom_mode_active {
            return None;
        }
        manager.group_of(figure.axes_at(p)?).ok()
    }

    fn on_press(
        &mut self,
        figure: &Figure,
        manager: &mut MarkerManager,
        p: Point,
    ) -> Result<LinkOutcome, MarkerError> {
        self.last_pointer = Some(p);
        self.drag_group = self.target_group(figure, manager, p);
        let Some(group) = self.drag_group else {
            return Ok(LinkOutcome::default());
        };
        let hit = manager.marker_at(figure, group, p);
        let active = manager.markers(group)?.active_index();
        match hit {
            Some(m) if active != Some(m) => manager.activate_linked(group, Some(m)),
            _ => Ok(LinkOutcome::default()),
        }
    }

    fn on_move(
        &mut self,
        figure: &Figure,
        manager: &mut MarkerManager,
        p: Point,
    ) -> Result<LinkOutcome, MarkerError> {
        self.last_pointer = Some(p);
        let Some(group) = self.target_group(figure, manager, p) else {
            return Ok(LinkOutcome::default());
        };
        if self.drag_group != Some(group) || manager.active_marker(group).is_none() {
            return Ok(LinkOutcome::default());
        }
        let target = manager.target_at(figure, group, p)?;
        manager.move_linked(figure, group, target)
    }

    fn on_release(
        &mut self,
        figure: &Figure,
        manager: &mut MarkerManager,
        p: Point,
    ) -> Result<LinkOutcome, MarkerError> {
        self.last_pointer = Some(p);
        // A release without a press on some axes group is a no-op.
        if self.drag_group.take().is_none() {
            return Ok(LinkOutcome::default());
        }
        let Some(group) = self.target_group(figure, manager, p) else {
            return Ok(LinkOutcome::default());
        };

        let hit = manager.marker_at(figure, group, p);
        let has_active = manager.active_marker(group).is_some();
        match hit {
            None if !has_active || self.shift_held => {
                let target = manager.target_at(figure, group, p)?;
                manager.add_linked(figure, group, target)
            }
            Some(m) => manager.activate_linked(group, Some(m)),
            None => {
                let target = manager.target_at(figure, group, p)?;
                manager.move_linked(figure, group, target)
            }
        }
    }

    fn on_key_press(
        &mut self,
        figure: &Figure,
        manager: &mut MarkerManager,
        key: MarkerKey,
    ) -> Result<LinkOutcome, MarkerError> {
        self.pending_key_release = None;
        self.key_pressed = true;
        if key == MarkerKey::Shift {
            self.shift_held = true;
            return Ok(LinkOutcome::default());
        }

        let group = self
            .last_pointer
            .and_then(|p| self.target_group(figure, manager, p));
        let Some(group) = group else {
            return Ok(LinkOutcome::default());
        };
        if manager.active_marker(group).is_none() {
            return Ok(LinkOutcome::default());
        }
        match key {
            MarkerKey::Left => manager.shift_linked(figure, group, Direction::Backward),
            MarkerKey::Right => manager.shift_linked(figure, group, Direction::Forward),
            MarkerKey::Delete => manager.delete_linked(figure, group),
            MarkerKey::Shift => Ok(LinkOutcome::default()),
        }
    }
}
