//! Iced canvas widget hosting a figure with interactive markers.

use std::time::Instant;

use glam::DVec2;
use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke};
use iced::{
    Color, Element, Length, Point, Rectangle, Renderer, Size, Theme, keyboard, mouse, window,
};

use crate::{
    MarkerError,
    controller::InteractionController,
    figure::{AxesId, Figure},
    glyph::{Glyph, IndexLine, LabelBox, ValueDot},
    manager::MarkerManager,
    message::{MarkerEvent, MarkerKey, MarkerMessage, Redraw},
    transform::AxesTransform,
};

/// A figure, its marker state and the controller routing input to it.
///
/// Curves and non-active markers are drawn into a cached background that is only
/// rebuilt when the manager's background version changes. Active markers are painted
/// on top every frame.
pub struct MarkerPlot {
    figure: Figure,
    manager: MarkerManager,
    controller: InteractionController,
    background: canvas::Cache,
    /// Manager background version the cache was drawn for.
    background_version: u64,
    last_redraw: Redraw,
    enabled: bool,
}

/// Per-canvas interaction state.
#[derive(Debug, Default)]
pub struct CanvasState {
    size: Option<Size>,
}

impl MarkerPlot {
    /// Wrap a figure whose markers were enabled with `manager`.
    pub fn new(figure: Figure, manager: MarkerManager) -> Self {
        let background_version = manager.background_version();
        Self {
            figure,
            manager,
            controller: InteractionController::new(),
            background: canvas::Cache::new(),
            background_version,
            last_redraw: Redraw::Full,
            enabled: true,
        }
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    pub fn manager(&self) -> &MarkerManager {
        &self.manager
    }

    /// Mutable access to the marker manager for programmatic marker operations.
    ///
    /// Operations take the figure as an argument; it is handed out alongside.
    pub fn manager_mut(&mut self) -> (&Figure, &mut MarkerManager) {
        self.background.clear();
        (&self.figure, &mut self.manager)
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn markers_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn marker interaction on or off. Disabling removes every marker and stops
    /// routing pointer and keyboard input.
    pub fn set_markers_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            let redraw = self.manager.remove_all();
            self.controller = InteractionController::new();
            self.apply(redraw);
        }
        self.enabled = enabled;
    }

    /// Redraw request produced by the last update.
    pub fn last_redraw(&self) -> &Redraw {
        &self.last_redraw
    }

    /// Edit the figure (add curves, clear axes, change limits). Marker state is brought
    /// up to date afterwards.
    pub fn edit_figure<R>(&mut self, edit: impl FnOnce(&mut Figure) -> R) -> Result<R, MarkerError> {
        let out = edit(&mut self.figure);
        let redraw = self.manager.sync(&self.figure)?;
        self.apply(redraw);
        Ok(out)
    }

    /// Handle a message sent by the widget.
    pub fn update(&mut self, msg: MarkerMessage) {
        let result = match msg {
            MarkerMessage::Event(_) if !self.enabled => Ok(Redraw::None),
            MarkerMessage::Event(event) => self
                .controller
                .handle(&self.figure, &mut self.manager, event, Instant::now())
                .map(|outcome| outcome.redraw),
            MarkerMessage::Resized(size) => {
                self.figure.resize(size);
                self.manager.sync(&self.figure)
            }
            MarkerMessage::Tick => {
                self.controller.tick(Instant::now());
                Ok(Redraw::None)
            }
            MarkerMessage::RemoveAll => Ok(self.manager.remove_all()),
        };
        match result {
            Ok(redraw) => self.apply(redraw),
            Err(e) => log::warn!("marker update failed: {e}"),
        }
    }

    /// View the plot.
    pub fn view(&self) -> Element<'_, MarkerMessage> {
        canvas::Canvas::new(self)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn apply(&mut self, redraw: Redraw) {
        if redraw == Redraw::Full || self.manager.background_version() != self.background_version
        {
            self.background.clear();
            self.background_version = self.manager.background_version();
        }
        self.last_redraw = redraw;
    }

    fn draw_background(&self, frame: &mut Frame, theme: &Theme) {
        let palette = theme.palette();
        for id in self.figure.paint_order() {
            let (Some(axes), Ok(transform)) = (self.figure.get(id), self.figure.transform(id))
            else {
                continue;
            };
            let bounds = transform.bounds();
            if axes.patch_visible() {
                let rect = Path::rectangle(bounds.position(), bounds.size());
                frame.fill(&rect, palette.background);
                frame.stroke(
                    &rect,
                    Stroke::default()
                        .with_color(Color {
                            a: 0.6,
                            ..palette.text
                        })
                        .with_width(1.0),
                );
            }
            for curve in axes.curves().filter(|c| c.visible) {
                let path = Path::new(|b| {
                    let mut pen_down = false;
                    for p in &curve.positions {
                        match transform.data_to_display(DVec2::new(p[0], p[1])) {
                            Some(d) if pen_down => b.line_to(Point::new(d.x, d.y)),
                            Some(d) => {
                                b.move_to(Point::new(d.x, d.y));
                                pen_down = true;
                            }
                            None => pen_down = false,
                        }
                    }
                });
                frame.stroke(
                    &path,
                    Stroke::default()
                        .with_color(curve.color)
                        .with_width(curve.width),
                );
            }
        }
        self.paint_glyphs(frame, &self.manager.paint_list().background);
    }

    fn paint_glyphs(&self, frame: &mut Frame, glyphs: &[Glyph<'_>]) {
        let mut last: Option<(AxesId, AxesTransform)> = None;
        for glyph in glyphs {
            let axes = match glyph {
                Glyph::IndexLine(l) => l.axes,
                Glyph::Dot(d) => d.axes,
                Glyph::Label(l) => l.axes,
            };
            let transform = match last {
                Some((id, t)) if id == axes => t,
                _ => match self.figure.transform(axes) {
                    Ok(t) => {
                        last = Some((axes, t));
                        t
                    }
                    Err(_) => continue,
                },
            };
            match glyph {
                Glyph::IndexLine(line) => paint_index_line(frame, &transform, line),
                Glyph::Dot(dot) => paint_dot(frame, &transform, dot),
                Glyph::Label(label) => paint_label(frame, &transform, label),
            }
        }
    }
}

fn paint_index_line(frame: &mut Frame, transform: &AxesTransform, line: &IndexLine) {
    if !line.visible {
        return;
    }
    let Some(xa) = transform.x_to_normalized(line.x) else {
        return;
    };
    if !(0.0..=1.0).contains(&xa) {
        return;
    }
    let top = transform.to_display(DVec2::new(xa, 1.0));
    let bottom = transform.to_display(DVec2::new(xa, 0.0));
    frame.stroke(
        &Path::line(Point::new(top.x, top.y), Point::new(bottom.x, bottom.y)),
        Stroke::default()
            .with_color(line.color)
            .with_width(line.width),
    );
}

fn paint_dot(frame: &mut Frame, transform: &AxesTransform, dot: &ValueDot) {
    if !dot.visible {
        return;
    }
    if let Some(d) = transform.data_to_display(dot.position) {
        frame.fill(&Path::circle(Point::new(d.x, d.y), dot.radius), dot.color);
    }
}

fn paint_label(frame: &mut Frame, transform: &AxesTransform, label: &LabelBox) {
    if !label.visible || label.text.is_empty() {
        return;
    }
    let (min, max) = label.corners();
    let bottom_left = transform.to_display(min);
    let top_right = transform.to_display(max);
    let top_left = Point::new(bottom_left.x, top_right.y);
    let size = Size::new(top_right.x - bottom_left.x, bottom_left.y - top_right.y);
    let rect = Path::rectangle(top_left, size);
    frame.fill(
        &rect,
        Color {
            a: label.alpha,
            ..Color::BLACK
        },
    );
    frame.stroke(
        &rect,
        Stroke::default()
            .with_color(Color {
                a: label.alpha,
                ..label.border
            })
            .with_width(1.6),
    );
    frame.fill_text(canvas::Text {
        content: label.text.clone(),
        position: Point::new(
            top_left.x + size.width / 2.0,
            top_left.y + size.height / 2.0,
        ),
        color: Color::WHITE,
        size: label.font_size.into(),
        align_x: iced::Alignment::Center.into(),
        align_y: iced::Alignment::Center.into(),
        ..Default::default()
    });
}

fn marker_key(key: &keyboard::Key) -> Option<MarkerKey> {
    use keyboard::key::Named;
    match key {
        keyboard::Key::Named(Named::ArrowLeft) => Some(MarkerKey::Left),
        keyboard::Key::Named(Named::ArrowRight) => Some(MarkerKey::Right),
        keyboard::Key::Named(Named::Delete | Named::Backspace) => Some(MarkerKey::Delete),
        keyboard::Key::Named(Named::Shift) => Some(MarkerKey::Shift),
        _ => None,
    }
}

impl canvas::Program<MarkerMessage> for MarkerPlot {
    type State = CanvasState;

    fn update(
        &self,
        state: &mut Self::State,
        event: &iced::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<MarkerMessage>> {
        if state.size != Some(bounds.size()) {
            state.size = Some(bounds.size());
            return Some(canvas::Action::publish(MarkerMessage::Resized(
                bounds.size(),
            )));
        }

        if !self.enabled {
            return None;
        }

        let event = match event {
            // Releases outside the canvas still end a drag that started inside it.
            iced::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
                if cursor.position_in(bounds).is_none() =>
            {
                self.controller.drag_group()?;
                let p = cursor
                    .position()
                    .map_or(Point::new(-1.0, -1.0), |p| {
                        Point::new(p.x - bounds.x, p.y - bounds.y)
                    });
                return Some(canvas::Action::publish(MarkerMessage::Event(
                    MarkerEvent::PointerReleased(p),
                )));
            }
            iced::Event::Mouse(mouse_event) => {
                let p = cursor.position_in(bounds)?;
                match mouse_event {
                    mouse::Event::ButtonPressed(mouse::Button::Left) => {
                        MarkerEvent::PointerPressed(p)
                    }
                    mouse::Event::ButtonReleased(mouse::Button::Left) => {
                        MarkerEvent::PointerReleased(p)
                    }
                    mouse::Event::CursorMoved { .. } => MarkerEvent::PointerMoved(p),
                    _ => return None,
                }
            }
            iced::Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) => {
                MarkerEvent::KeyPressed(marker_key(key)?)
            }
            iced::Event::Keyboard(keyboard::Event::KeyReleased { key, .. }) => {
                MarkerEvent::KeyReleased(marker_key(key)?)
            }
            iced::Event::Window(window::Event::RedrawRequested(_))
                if self.controller.has_pending_release() =>
            {
                return Some(canvas::Action::publish(MarkerMessage::Tick));
            }
            _ => return None,
        };
        Some(canvas::Action::publish(MarkerMessage::Event(event)).and_capture())
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let background = self.background.draw(renderer, bounds.size(), |frame| {
            self.draw_background(frame, theme);
        });

        let mut overlay = Frame::new(renderer, bounds.size());
        self.paint_glyphs(&mut overlay, &self.manager.paint_list().overlay);

        vec![background, overlay.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        match cursor.position_in(bounds) {
            Some(p) if self.enabled && self.figure.axes_at(p).is_some() => {
                mouse::Interaction::Crosshair
            }
            _ => mouse::Interaction::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Curve, MarkerPlotBuilder};

    fn plot() -> MarkerPlot {
        let x: Vec<f64> = (0..=10).map(f64::from).collect();
        MarkerPlotBuilder::new()
            .grid(1, 1)
            .add_curve(0, Curve::from_xy(&x, &[5.0; 11]))
            .with_x_lim(0, 0.0, 10.0)
            .with_y_lim(0, 0.0, 10.0)
            .build()
            .unwrap()
    }

    fn click(plot: &mut MarkerPlot) {
        let id = plot.figure().axes().next().unwrap().id;
        let p = plot.figure().device_bounds(id).unwrap().center();
        plot.update(MarkerMessage::Event(MarkerEvent::PointerPressed(p)));
        plot.update(MarkerMessage::Event(MarkerEvent::PointerReleased(p)));
    }

    fn marker_count(plot: &MarkerPlot) -> usize {
        let id = plot.figure().axes().next().unwrap().id;
        plot.manager().markers(id).unwrap().len()
    }

    #[test]
    fn click_through_update_adds_marker() {
        let mut plot = plot();
        plot.update(MarkerMessage::Resized(Size::new(400.0, 300.0)));
        assert_eq!(plot.figure().size(), Size::new(400.0, 300.0));
        click(&mut plot);
        assert_eq!(marker_count(&plot), 1);
        assert_eq!(plot.last_redraw(), &Redraw::Full);

        plot.update(MarkerMessage::RemoveAll);
        assert_eq!(marker_count(&plot), 0);
    }

    #[test]
    fn release_outside_canvas_is_forwarded_during_drag() {
        let mut plot = plot();
        let bounds = Rectangle::new(Point::ORIGIN, plot.figure().size());
        let mut state = CanvasState {
            size: Some(bounds.size()),
        };
        let release = iced::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left));
        let outside = mouse::Cursor::Available(Point::new(-50.0, 20.0));

        let forward = |plot: &MarkerPlot, state: &mut CanvasState| {
            <MarkerPlot as canvas::Program<MarkerMessage>>::update(
                plot, state, &release, bounds, outside,
            )
            .is_some()
        };
        assert!(!forward(&plot, &mut state));

        let id = plot.figure().axes().next().unwrap().id;
        let p = plot.figure().device_bounds(id).unwrap().center();
        MarkerPlot::update(
            &mut plot,
            MarkerMessage::Event(MarkerEvent::PointerPressed(p)),
        );
        assert!(plot.controller().drag_group().is_some());
        assert!(forward(&plot, &mut state));
    }

    #[test]
    fn disabled_plot_ignores_input() {
        let mut plot = plot();
        click(&mut plot);
        plot.set_markers_enabled(false);
        assert_eq!(marker_count(&plot), 0);
        click(&mut plot);
        assert_eq!(marker_count(&plot), 0);

        plot.set_markers_enabled(true);
        click(&mut plot);
        assert_eq!(marker_count(&plot), 1);
    }
}
