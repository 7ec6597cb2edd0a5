//! Programmatic navigation to a highlight and the focus grace period
//!
//! Scrolling to a highlight focuses it. The renderer reports the resulting
//! scroll like any other, so the listener that clears focus is detached
//! before the jump and only re-attached once the grace period is over.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::debug;

use crate::geometry::{PageNumber, Point, ScaledPosition, Viewport, to_viewport};
use crate::highlight::HighlightId;

pub const DEFAULT_SCROLL_MARGIN: f64 = 10.0;
pub const DEFAULT_FOCUS_GRACE: Duration = Duration::from_millis(100);

/// Destination handed to the renderer's scroll-into-view
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollTarget {
    pub page_number: PageNumber,
    /// Page-local pixel the top-left of the page viewport should land on
    pub viewport_point: Point,
    /// Same destination in document points
    pub pdf_point: Point,
    pub scale: f64,
}

impl ScrollTarget {
    /// Target that brings `position` into view with `margin` pixels of
    /// headroom above it
    #[must_use]
    pub fn for_position(position: &ScaledPosition, viewport: &Viewport, margin: f64) -> Self {
        let rect = to_viewport(
            &position.bounding_rect,
            viewport,
            position.use_pdf_coordinates,
        );
        let viewport_point = Point::new(rect.left.max(0.0), (rect.top - margin).max(0.0));
        let pdf_point = viewport
            .page_transform()
            .invert()
            .map_or_else(
                || {
                    Point::new(
                        viewport_point.x / viewport.scale,
                        viewport_point.y / viewport.scale,
                    )
                },
                |inverse| inverse.apply(viewport_point),
            );

        Self {
            page_number: position.page_number,
            viewport_point,
            pdf_point,
            scale: viewport.scale,
        }
    }
}

/// Tracks whether user scrolling should currently clear focus
#[derive(Clone, Debug)]
pub struct ScrollController {
    margin: f64,
    grace: Duration,
    listening: bool,
    reattach_at: Option<Instant>,
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_MARGIN, DEFAULT_FOCUS_GRACE)
    }
}

impl ScrollController {
    #[must_use]
    pub fn new(margin: f64, grace: Duration) -> Self {
        Self {
            margin,
            grace,
            listening: false,
            reattach_at: None,
        }
    }

    #[must_use]
    pub fn margin(&self) -> f64 {
        self.margin
    }

    #[must_use]
    pub fn target(&self, position: &ScaledPosition, viewport: &Viewport) -> ScrollTarget {
        ScrollTarget::for_position(position, viewport, self.margin)
    }

    /// A programmatic scroll is about to happen
    pub fn begin(&mut self, now: Instant) {
        self.listening = false;
        self.reattach_at = Some(now + self.grace);
    }

    /// Re-attach the listener once the grace period is over
    pub fn poll(&mut self, now: Instant) {
        if self.reattach_at.is_some_and(|at| now >= at) {
            self.reattach_at = None;
            self.listening = true;
        }
    }

    /// Handle a scroll event. Returns true when it should clear focus; the
    /// listener then detaches until the next programmatic scroll.
    pub fn on_scroll(&mut self, now: Instant) -> bool {
        self.poll(now);
        if self.listening {
            self.listening = false;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Detach for good
    pub fn detach(&mut self) {
        self.listening = false;
        self.reattach_at = None;
    }
}

/// Handle the host keeps to request navigation by id.
///
/// Requests are queued and resolved by the highlighter on its next tick.
#[derive(Clone, Debug, Default)]
pub struct ScrollRequests {
    queue: Rc<RefCell<VecDeque<HighlightId>>>,
}

impl ScrollRequests {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_to(&self, id: HighlightId) {
        debug!("Scroll to {id} requested");
        self.queue.borrow_mut().push_back(id);
    }

    pub fn drain(&self) -> Vec<HighlightId> {
        self.queue.borrow_mut().drain(..).collect()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rotation, ScaledRect};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn position() -> ScaledPosition {
        ScaledPosition {
            page_number: 3,
            bounding_rect: ScaledRect::new(10.0, 5.0, 40.0, 20.0),
            rects: Vec::new(),
            use_pdf_coordinates: false,
        }
    }

    #[test]
    fn own_scroll_does_not_clear_focus() {
        let t0 = Instant::now();
        let mut scroll = ScrollController::default();
        scroll.begin(t0);
        assert!(!scroll.on_scroll(t0 + ms(50)));
        assert!(scroll.on_scroll(t0 + ms(150)));
        // Detached until the next programmatic scroll
        assert!(!scroll.on_scroll(t0 + ms(300)));
    }

    #[test]
    fn listener_is_off_before_first_jump() {
        let mut scroll = ScrollController::default();
        assert!(!scroll.on_scroll(Instant::now()));
    }

    #[test]
    fn new_jump_restarts_grace() {
        let t0 = Instant::now();
        let mut scroll = ScrollController::default();
        scroll.begin(t0);
        scroll.begin(t0 + ms(90));
        assert!(!scroll.on_scroll(t0 + ms(120)));
        assert!(scroll.on_scroll(t0 + ms(190)));
    }

    #[test]
    fn target_subtracts_margin_and_clamps() {
        let vp = Viewport::new(600.0, 800.0, 1.0, Rotation::None);
        let target = ScrollTarget::for_position(&position(), &vp, 10.0);
        assert_eq!(target.page_number, 3);
        assert_eq!(target.viewport_point, Point::new(10.0, 0.0));

        let zoomed = Viewport::new(1200.0, 1600.0, 2.0, Rotation::None);
        let target = ScrollTarget::for_position(&position(), &zoomed, 10.0);
        assert_eq!(target.viewport_point, Point::new(20.0, 0.0));
        assert_eq!(target.scale, 2.0);
    }

    #[test]
    fn pdf_point_is_inverse_of_page_transform() {
        let vp = Viewport::new(600.0, 800.0, 1.0, Rotation::None);
        let mut pos = position();
        pos.bounding_rect = ScaledRect::new(10.0, 100.0, 40.0, 20.0);
        let target = ScrollTarget::for_position(&pos, &vp, 10.0);
        assert_eq!(target.viewport_point, Point::new(10.0, 90.0));
        // y axis flips: 800 - 90
        assert!((target.pdf_point.x - 10.0).abs() < 1e-9);
        assert!((target.pdf_point.y - 710.0).abs() < 1e-9);
    }

    #[test]
    fn rotated_target_follows_transform() {
        let vp = Viewport::new(600.0, 800.0, 1.0, Rotation::Clockwise);
        let target = ScrollTarget::for_position(&position(), &vp, 10.0);
        // 90° places the rect at (600 - 25, 10)
        assert_eq!(target.viewport_point, Point::new(575.0, 0.0));
    }

    #[test]
    fn requests_are_shared_between_clones() {
        let requests = ScrollRequests::new();
        let host_side = requests.clone();
        host_side.scroll_to(HighlightId::new("a"));
        assert!(requests.has_pending());
        assert_eq!(requests.drain(), vec![HighlightId::new("a")]);
        assert!(!host_side.has_pending());
    }
}
