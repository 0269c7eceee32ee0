use iced::{Point, Size};

use crate::figure::AxesId;

/// Keys the marker controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    Left,
    Right,
    Delete,
    Shift,
}

/// Input delivered to the [`InteractionController`](crate::InteractionController).
///
/// Pointer positions are device coordinates on the figure surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerEvent {
    PointerPressed(Point),
    PointerMoved(Point),
    PointerReleased(Point),
    KeyPressed(MarkerKey),
    KeyReleased(MarkerKey),
    /// A pan/zoom gesture started; marker interaction is suspended until it ends.
    NavigationStarted,
    NavigationEnded,
}

/// What has to be repainted after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Redraw {
    #[default]
    None,
    /// Restore the cached background of these groups and repaint their active markers.
    Blit(Vec<AxesId>),
    /// Repaint everything and recapture the cached backgrounds.
    Full,
}

impl Redraw {
    /// Combine two requests into one covering both.
    pub fn merge(self, other: Redraw) -> Redraw {
        match (self, other) {
            (Redraw::Full, _) | (_, Redraw::Full) => Redraw::Full,
            (Redraw::None, r) | (r, Redraw::None) => r,
            (Redraw::Blit(mut a), Redraw::Blit(b)) => {
                for g in b {
                    if !a.contains(&g) {
                        a.push(g);
                    }
                }
                Redraw::Blit(a)
            }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Redraw::None)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Messages sent by the marker plot widget to the application.
///
/// Forward them to [`MarkerPlot::update`](crate::MarkerPlot::update).
pub enum MarkerMessage {
    /// Translated pointer or keyboard input.
    Event(MarkerEvent),
    /// The drawable area changed size.
    Resized(Size),
    /// Periodic tick that flushes debounced key releases.
    Tick,
    /// Remove every marker on the figure.
    RemoveAll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_redraw_requests() {
        let a = Redraw::Blit(vec![AxesId(1)]);
        let b = Redraw::Blit(vec![AxesId(2), AxesId(1)]);
        assert_eq!(
            a.clone().merge(b),
            Redraw::Blit(vec![AxesId(1), AxesId(2)])
        );
        assert_eq!(a.clone().merge(Redraw::None), a);
        assert_eq!(Redraw::None.merge(Redraw::Full), Redraw::Full);
    }
}
