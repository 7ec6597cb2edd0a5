//! Freeform rectangle selection by pointer drag

use image::RgbaImage;
use log::debug;

use crate::geometry::{PageNumber, Point, Rect, Viewport, ViewportPosition};
use crate::highlight::{Content, GhostHighlight};
use crate::screenshot::capture_area;

/// Drag currently in progress, absolute container pixels
#[derive(Clone, Copy, Debug, PartialEq)]
struct Drag {
    page_number: PageNumber,
    page_offset: Point,
    start: Point,
    end: Point,
}

impl Drag {
    fn page_rect(&self) -> Rect {
        Rect::from_corners(self.start, self.end).relative_to(self.page_offset)
    }
}

/// Tracks one area drag from pointer-down to pointer-up
#[derive(Clone, Debug)]
pub struct AreaSelectionController {
    min_size: f64,
    drag: Option<Drag>,
}

impl Default for AreaSelectionController {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl AreaSelectionController {
    #[must_use]
    pub fn new(min_size: f64) -> Self {
        Self {
            min_size,
            drag: None,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn start(&mut self, page_number: PageNumber, page_offset: Point, at: Point) {
        self.drag = Some(Drag {
            page_number,
            page_offset,
            start: at,
            end: at,
        });
    }

    pub fn update(&mut self, at: Point) {
        if let Some(drag) = &mut self.drag {
            drag.end = at;
        }
    }

    /// Current rubber-band rectangle, page-local pixels
    #[must_use]
    pub fn preview(&self) -> Option<(PageNumber, Rect)> {
        self.drag.map(|d| (d.page_number, d.page_rect()))
    }

    /// End the drag. Returns the page-local rectangle, or `None` when the
    /// drag is smaller than the minimum size on either axis.
    pub fn finish(&mut self, at: Point) -> Option<(PageNumber, Rect)> {
        let mut drag = self.drag.take()?;
        drag.end = at;
        let rect = drag.page_rect();
        if rect.width < self.min_size || rect.height < self.min_size {
            debug!(
                "Area drag of {:.1}x{:.1} below minimum size, ignoring",
                rect.width, rect.height
            );
            return None;
        }
        Some((drag.page_number, rect))
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }
}

/// Ghost for an area selection: a bounding box only, with a capture of the
/// region as content
#[must_use]
pub fn area_ghost(
    page_number: PageNumber,
    rect: Rect,
    viewport: &Viewport,
    canvas: Option<&RgbaImage>,
) -> GhostHighlight {
    let image = capture_area(canvas, &rect);
    let position = ViewportPosition::area(page_number, rect).to_scaled(viewport);
    GhostHighlight::new(position, Content::image(image))
}
